// Frequency snapshot - Decorrelated copy of the analyser bins
// Sample order is shuffled before the bins are attached to an event payload

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffles frequency bins into a fresh buffer per event
///
/// The shuffle drops the bin-to-frequency mapping. Listeners only get the
/// magnitude distribution of the signal at hit time.
pub struct Decorrelator {
    rng: StdRng,
}

impl Decorrelator {
    /// Seeded shuffler, or entropy-seeded when `seed` is `None`
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn decorrelate(&mut self, bins: &[u8]) -> Vec<u8> {
        let mut copy = bins.to_vec();
        copy.shuffle(&mut self.rng);
        copy
    }
}

impl Default for Decorrelator {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorrelate_is_permutation() {
        let bins: Vec<u8> = (0..64).collect();
        let mut decorrelator = Decorrelator::new(Some(7));
        let shuffled = decorrelator.decorrelate(&bins);

        assert_eq!(shuffled.len(), bins.len());
        let mut sorted = shuffled.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, bins);
        assert_ne!(shuffled, bins);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let bins: Vec<u8> = (0..32).collect();
        let a = Decorrelator::new(Some(42)).decorrelate(&bins);
        let b = Decorrelator::new(Some(42)).decorrelate(&bins);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_bins() {
        let mut decorrelator = Decorrelator::default();
        assert!(decorrelator.decorrelate(&[]).is_empty());
    }
}
