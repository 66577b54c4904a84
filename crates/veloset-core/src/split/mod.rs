use log::debug;
use rand::rngs::SmallRng;
use rand::seq::index::sample;
use rand::SeedableRng;

use crate::errors::PrepError;

/// Result of one split. `retained` and `holdout` are disjoint, sorted
/// ascending, and together cover every index below the split length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub retained: Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Seeded uniform partitioner for window indices.
///
/// The draw is uniform over indices, not over time: adjacent windows share
/// almost their entire history, so the holdout set contains near-duplicates
/// of retained windows and accuracy measured on it overstates how well a
/// model generalizes to unseen motion. This matches the evaluation protocol
/// of the experiments this pipeline reproduces; callers who need a
/// leakage-free estimate must hold out a contiguous time range instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSplitter {
    seed: u64,
}

impl DatasetSplitter {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws `ceil(len * holdout_fraction)` indices without replacement.
    ///
    /// The fraction must lie strictly inside (0, 1) and `len` must be
    /// nonzero. Identical seed, length, and fraction always reproduce the
    /// identical partition.
    pub fn split(&self, len: usize, holdout_fraction: f64) -> Result<SplitIndices, PrepError> {
        if !(holdout_fraction > 0.0 && holdout_fraction < 1.0) {
            return Err(PrepError::Config(format!(
                "holdout fraction must lie strictly inside (0, 1), got {holdout_fraction}"
            )));
        }
        if len == 0 {
            return Err(PrepError::Range(
                "cannot split an empty window set".to_string(),
            ));
        }
        // fraction < 1 bounds the ceiling by len, so the draw cannot overrun.
        let holdout_size = (len as f64 * holdout_fraction).ceil() as usize;
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut holdout = sample(&mut rng, len, holdout_size).into_vec();
        holdout.sort_unstable();

        let mut in_holdout = vec![false; len];
        for &index in &holdout {
            in_holdout[index] = true;
        }
        let retained: Vec<usize> = (0..len).filter(|&i| !in_holdout[i]).collect();
        debug!(
            target: "veloset_core::split",
            "Split {} windows into {} retained and {} holdout (seed {})",
            len,
            retained.len(),
            holdout.len(),
            self.seed
        );
        Ok(SplitIndices { retained, holdout })
    }
}
