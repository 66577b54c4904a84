use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::PrepError;
use crate::persist::{write_atomic, ArchiveError};
use crate::samples::{ImuSample, ImuSeries};

/// Min and max captured for one channel group at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub min: f64,
    pub max: f64,
}

impl ScalerParams {
    /// Captures the extrema of `values`.
    ///
    /// Fails on empty input, on non-finite values, and on a constant group,
    /// where the transform would divide by zero.
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Result<Self, PrepError> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut count = 0usize;
        for value in values {
            if !value.is_finite() {
                return Err(PrepError::Range(format!(
                    "non-finite value {value} in channel group"
                )));
            }
            min = min.min(value);
            max = max.max(value);
            count += 1;
        }
        if count == 0 {
            return Err(PrepError::Range(
                "scaler fit requires at least one value".to_string(),
            ));
        }
        if min == max {
            return Err(PrepError::DegenerateRange(format!(
                "channel group is constant at {min}, min-max scaling is undefined"
            )));
        }
        Ok(Self { min, max })
    }

    /// Maps `value` with the affine transform captured at fit time. Values
    /// inside the fitted range land in [0, 1]; values outside it do not get
    /// clamped.
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

/// Independent range scalers for the gyroscope and accelerometer groups.
///
/// Each group pools all three axes and every timestep into a single min and
/// max rather than scaling per axis, so relative magnitudes between axes of
/// one instrument survive the transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupScalers {
    pub gyro: ScalerParams,
    pub acc: ScalerParams,
}

impl GroupScalers {
    /// Fits both groups on an already filtered series.
    pub fn fit(series: &ImuSeries) -> Result<Self, PrepError> {
        let gyro = ScalerParams::fit(
            series
                .samples()
                .iter()
                .flat_map(|s| [s.gyro.x, s.gyro.y, s.gyro.z]),
        )?;
        let acc = ScalerParams::fit(
            series
                .samples()
                .iter()
                .flat_map(|s| [s.acc.x, s.acc.y, s.acc.z]),
        )?;
        info!(
            target: "veloset_core::scale",
            "Fitted scalers: gyro [{:.6}, {:.6}], acc [{:.6}, {:.6}]",
            gyro.min,
            gyro.max,
            acc.min,
            acc.max
        );
        Ok(Self { gyro, acc })
    }

    /// Applies the captured transforms to every sample. Never refits; reusing
    /// one fitted instance across train, validation, and test series is the
    /// whole point of persisting it.
    pub fn transform_series(&self, series: &ImuSeries) -> ImuSeries {
        let samples = series
            .samples()
            .iter()
            .map(|s| ImuSample {
                timestamp: s.timestamp,
                gyro: s.gyro.map(|v| self.gyro.transform(v)),
                acc: s.acc.map(|v| self.acc.transform(v)),
            })
            .collect();
        ImuSeries::from_samples(samples, series.unit())
    }

    /// Saves the fitted parameters as JSON at an explicit path chosen by the
    /// caller's configuration.
    pub fn save_json(&self, path: &Path) -> Result<(), ArchiveError> {
        let payload = serde_json::to_vec_pretty(self).map_err(ArchiveError::Json)?;
        write_atomic(path, &payload).map_err(ArchiveError::Io)
    }

    /// Restores previously fitted parameters. JSON stores f64 values in
    /// shortest round-trip form, so a reload reproduces the fit bit for bit.
    pub fn load_json(path: &Path) -> Result<Self, ArchiveError> {
        let bytes = fs::read(path).map_err(ArchiveError::Io)?;
        serde_json::from_slice(&bytes).map_err(ArchiveError::Json)
    }
}
