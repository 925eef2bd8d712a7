// Fixed spectrum - Frequency provider returning a preset bin buffer

use super::FrequencyProvider;
use std::sync::{Arc, Mutex};

/// Frequency provider backed by a shared buffer
///
/// An analyser thread (or a test) writes bins with [`FixedSpectrum::update`];
/// the conductor samples them once per fired event.
#[derive(Debug, Clone, Default)]
pub struct FixedSpectrum {
    bins: Arc<Mutex<Vec<u8>>>,
}

impl FixedSpectrum {
    pub fn new(bins: Vec<u8>) -> Self {
        Self {
            bins: Arc::new(Mutex::new(bins)),
        }
    }

    /// Replace the current bins
    pub fn update(&self, bins: &[u8]) {
        if let Ok(mut current) = self.bins.lock() {
            current.clear();
            current.extend_from_slice(bins);
        }
    }
}

impl FrequencyProvider for FixedSpectrum {
    fn bins(&mut self) -> Vec<u8> {
        self.bins.lock().map(|b| b.clone()).unwrap_or_default()
    }
}
