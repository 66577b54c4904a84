mod derive;

pub use derive::{angular_velocity_from_orientations, velocity_from_positions};

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Timestamp unit declared by a data source.
///
/// Conversions to seconds always go through [`TimeUnit::seconds_per_tick`];
/// no stage is allowed to guess the unit from timestamp magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Seconds,
    Nanoseconds,
}

impl TimeUnit {
    pub fn seconds_per_tick(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Nanoseconds => 1e-9,
        }
    }
}

/// One inertial measurement: body-frame angular rate and specific force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Timestamp in the owning series' [`TimeUnit`].
    pub timestamp: f64,
    /// Angular rate in rad/s.
    pub gyro: Vector3<f64>,
    /// Specific force in m/s^2.
    pub acc: Vector3<f64>,
}

/// One ground-truth state estimate from the dataset's reference system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GtSample {
    /// Timestamp in the owning series' [`TimeUnit`].
    pub timestamp: f64,
    /// Position in the world frame, meters.
    pub position: Vector3<f64>,
    /// Body-to-world rotation.
    pub orientation: UnitQuaternion<f64>,
    /// Linear velocity in the world frame, m/s.
    pub velocity: Vector3<f64>,
    /// Angular rate in rad/s.
    pub angular_velocity: Vector3<f64>,
    /// Linear acceleration in m/s^2.
    pub acceleration: Vector3<f64>,
}

/// Time-ordered IMU measurements plus their declared timestamp unit.
///
/// Construction panics if timestamps are not strictly ascending; readers
/// must validate ordering on their own inputs and report a proper error
/// before building a series.
#[derive(Debug, Clone, PartialEq)]
pub struct ImuSeries {
    samples: Vec<ImuSample>,
    unit: TimeUnit,
}

impl ImuSeries {
    pub fn from_samples(samples: Vec<ImuSample>, unit: TimeUnit) -> Self {
        assert_strictly_ascending(samples.iter().map(|s| s.timestamp), "IMU");
        Self { samples, unit }
    }

    pub fn samples(&self) -> &[ImuSample] {
        &self.samples
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<f64> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.samples.last().map(|s| s.timestamp)
    }
}

/// Time-ordered ground-truth states plus their declared timestamp unit.
#[derive(Debug, Clone, PartialEq)]
pub struct GtSeries {
    samples: Vec<GtSample>,
    unit: TimeUnit,
}

impl GtSeries {
    pub fn from_samples(samples: Vec<GtSample>, unit: TimeUnit) -> Self {
        assert_strictly_ascending(samples.iter().map(|s| s.timestamp), "ground-truth");
        Self { samples, unit }
    }

    pub fn samples(&self) -> &[GtSample] {
        &self.samples
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<f64> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.samples.last().map(|s| s.timestamp)
    }
}

fn assert_strictly_ascending(timestamps: impl Iterator<Item = f64>, label: &str) {
    let mut previous: Option<f64> = None;
    for (index, timestamp) in timestamps.enumerate() {
        assert!(
            timestamp.is_finite(),
            "{label} timestamp at index {index} is not finite"
        );
        if let Some(prev) = previous {
            assert!(
                timestamp > prev,
                "{label} series must be strictly ascending in time (index {index}: {timestamp} after {prev})"
            );
        }
        previous = Some(timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imu_sample(timestamp: f64) -> ImuSample {
        ImuSample {
            timestamp,
            gyro: Vector3::zeros(),
            acc: Vector3::zeros(),
        }
    }

    #[test]
    fn series_preserves_order_and_unit() {
        let series = ImuSeries::from_samples(
            vec![imu_sample(1.0), imu_sample(2.0), imu_sample(3.5)],
            TimeUnit::Seconds,
        );
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_timestamp(), Some(1.0));
        assert_eq!(series.last_timestamp(), Some(3.5));
        assert_eq!(series.unit(), TimeUnit::Seconds);
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn series_rejects_unordered_timestamps() {
        ImuSeries::from_samples(
            vec![imu_sample(2.0), imu_sample(1.0)],
            TimeUnit::Seconds,
        );
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn series_rejects_duplicate_timestamps() {
        ImuSeries::from_samples(
            vec![imu_sample(1.0), imu_sample(1.0)],
            TimeUnit::Seconds,
        );
    }

    #[test]
    fn nanosecond_ticks_convert_to_seconds() {
        assert_eq!(TimeUnit::Nanoseconds.seconds_per_tick(), 1e-9);
        assert_eq!(TimeUnit::Seconds.seconds_per_tick(), 1.0);
    }
}
