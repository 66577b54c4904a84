use log::debug;

use crate::errors::PrepError;
use crate::samples::{GtSeries, ImuSeries};

/// Gyro x, y, z followed by acc x, y, z for one timestep.
pub type SampleRow = [f64; 6];

/// Causal sliding windows over an aligned, scaled series.
///
/// Rows live once in a shared arena; each window is an index range into it
/// plus a padding count, so no sample is duplicated until a consumer
/// materializes a tensor. Window `i` covers the closed index range
/// `[i + 1 - L, i]` clipped at zero, which makes it impossible for a window
/// to read past its anchor: windows near the start shrink and get zero rows
/// in front instead of borrowing from the future.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    window_len: usize,
    rows: Vec<SampleRow>,
    targets: Vec<f64>,
}

/// Borrowed view of one window.
#[derive(Debug, Clone, Copy)]
pub struct WindowView<'a> {
    /// Number of zero rows in front of `history`. Nonzero only for anchors
    /// with fewer than `window_len` samples behind them.
    pub padding: usize,
    /// Real rows, oldest first, ending at the anchor timestep.
    pub history: &'a [SampleRow],
    /// Ground-truth speed at the anchor, meters per second.
    pub target: f64,
}

impl WindowView<'_> {
    /// Materializes the fixed-length tensor, zero padding first.
    pub fn to_rows(&self) -> Vec<SampleRow> {
        let mut rows = vec![[0.0; 6]; self.padding];
        rows.extend_from_slice(self.history);
        rows
    }
}

/// Builds one window per input timestep and pairs it with the Euclidean
/// norm of the ground-truth velocity at the same index.
pub fn build(imu: &ImuSeries, gt: &GtSeries, window_len: usize) -> Result<WindowSet, PrepError> {
    if window_len == 0 {
        return Err(PrepError::Config(
            "window length must be at least 1".to_string(),
        ));
    }
    if imu.len() != gt.len() {
        return Err(PrepError::Shape(format!(
            "IMU series has {} samples but ground truth has {}",
            imu.len(),
            gt.len()
        )));
    }
    let rows = imu
        .samples()
        .iter()
        .map(|s| [s.gyro.x, s.gyro.y, s.gyro.z, s.acc.x, s.acc.y, s.acc.z])
        .collect();
    let targets = gt.samples().iter().map(|s| s.velocity.norm()).collect();
    debug!(
        target: "veloset_core::window",
        "Built {} windows of length {}",
        imu.len(),
        window_len
    );
    Ok(WindowSet {
        window_len,
        rows,
        targets,
    })
}

impl WindowSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// View of window `index`. Panics if the index is out of bounds.
    pub fn window(&self, index: usize) -> WindowView<'_> {
        assert!(
            index < self.len(),
            "window index {index} out of bounds for {} windows",
            self.len()
        );
        let end = index + 1;
        let start = end.saturating_sub(self.window_len);
        WindowView {
            padding: self.window_len - (end - start),
            history: &self.rows[start..end],
            target: self.targets[index],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = WindowView<'_>> {
        (0..self.len()).map(|index| self.window(index))
    }
}
