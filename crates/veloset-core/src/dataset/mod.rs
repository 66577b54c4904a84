use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::samples::{GtSeries, ImuSeries};
use crate::window::{SampleRow, WindowSet};

/// Contract a data source must satisfy to feed the preparation pipeline.
///
/// Concrete readers (EuRoC and friends) live outside this crate; the
/// pipeline only ever sees aligned accessors, a sampling frequency for the
/// filter design, and a directory for diagnostics.
pub trait InertialDataset {
    fn imu_series(&self) -> &ImuSeries;
    fn gt_series(&self) -> &GtSeries;
    fn sampling_frequency_hz(&self) -> f64;
    fn dataset_directory(&self) -> &Path;
}

/// One fixed-length history tensor, zero padding included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowTensor {
    pub rows: Vec<SampleRow>,
}

/// One mini-batch of training examples.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub histories: Vec<WindowTensor>,
    pub targets: Vec<f64>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Iterator over mini-batches drawn from one partition of a window set.
///
/// Batches follow the partition's index order; the final batch is short
/// when the partition size is not a multiple of the batch size.
pub struct Batches<'a> {
    windows: &'a WindowSet,
    indices: &'a [usize],
    batch_size: usize,
    cursor: usize,
}

impl<'a> Batches<'a> {
    pub(crate) fn new(windows: &'a WindowSet, indices: &'a [usize], batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self {
            windows,
            indices,
            batch_size,
            cursor: 0,
        }
    }
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.cursor >= self.indices.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.indices.len());
        let selection = &self.indices[self.cursor..end];
        self.cursor = end;

        let mut histories = Vec::with_capacity(selection.len());
        let mut targets = Vec::with_capacity(selection.len());
        for &index in selection {
            let view = self.windows.window(index);
            histories.push(WindowTensor {
                rows: view.to_rows(),
            });
            targets.push(view.target);
        }
        Some(Batch { histories, targets })
    }
}
