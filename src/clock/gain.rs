// Shared gain - Lock-free volume parameter
// Uses atomic operations so a UI thread can read the level the conductor writes

use super::GainControl;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe volume in [0.0, 1.0]
/// Converts f32 to u32 bits for atomic storage
#[derive(Debug, Clone)]
pub struct SharedGain {
    inner: Arc<AtomicU32>,
}

impl SharedGain {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(Self::clamp(value).to_bits())),
        }
    }

    fn clamp(value: f32) -> f32 {
        if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
    }
}

impl GainControl for SharedGain {
    fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }

    fn set(&mut self, value: f32) {
        self.inner
            .store(Self::clamp(value).to_bits(), Ordering::Relaxed);
    }
}

impl Default for SharedGain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_is_clamped() {
        let mut gain = SharedGain::new(3.0);
        assert_eq!(gain.get(), 1.0);

        gain.set(-0.5);
        assert_eq!(gain.get(), 0.0);

        gain.set(0.25);
        assert_eq!(gain.get(), 0.25);
    }

    #[test]
    fn test_clones_share_value() {
        let mut gain = SharedGain::default();
        let observer = gain.clone();
        gain.set(0.5);
        assert_eq!(observer.get(), 0.5);
    }
}
