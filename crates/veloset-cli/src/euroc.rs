use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Reader;
use log::info;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::Deserialize;

use veloset_core::dataset::InertialDataset;
use veloset_core::samples::{
    angular_velocity_from_orientations, velocity_from_positions, GtSample, GtSeries, ImuSample,
    ImuSeries, TimeUnit,
};

use crate::errors::{CliError, Result};

const IMU_DATA: &str = "mav0/imu0/data.csv";
const IMU_SENSOR: &str = "mav0/imu0/sensor.yaml";
const GROUND_TRUTH_DATA: &str = "mav0/state_groundtruth_estimate0/data.csv";

/// Reader for one EuRoC MAV sequence directory.
///
/// Expects the ASL folder layout: `mav0/imu0/data.csv` with nanosecond
/// timestamps, gyro, and accelerometer columns, `mav0/imu0/sensor.yaml`
/// carrying `rate_hz`, and `mav0/state_groundtruth_estimate0/data.csv` with
/// timestamp, position, quaternion (w, x, y, z), velocity, angular velocity,
/// and acceleration columns.
#[derive(Debug)]
pub struct EurocDataset {
    directory: PathBuf,
    imu: ImuSeries,
    gt: GtSeries,
    rate_hz: f64,
}

impl EurocDataset {
    pub fn load(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let rate_hz = read_imu_rate(&directory.join(IMU_SENSOR))?;
        let imu_samples = read_imu_csv(&directory.join(IMU_DATA))?;
        let gt_samples = read_ground_truth_csv(&directory.join(GROUND_TRUTH_DATA))?;
        info!(
            target: "veloset_cli::euroc",
            "Loaded {}: {} IMU samples at {} Hz, {} ground-truth states",
            directory.display(),
            imu_samples.len(),
            rate_hz,
            gt_samples.len()
        );
        Ok(Self {
            directory,
            imu: ImuSeries::from_samples(imu_samples, TimeUnit::Nanoseconds),
            gt: GtSeries::from_samples(gt_samples, TimeUnit::Nanoseconds),
            rate_hz,
        })
    }

    /// Replaces the shipped velocity and angular velocity columns with values
    /// derived from the pose columns. Useful when a sequence's estimator
    /// output is untrustworthy or absent.
    pub fn rederive_motion(self) -> Result<Self> {
        let gt = velocity_from_positions(&self.gt)?;
        let gt = angular_velocity_from_orientations(&gt)?;
        info!(
            target: "veloset_cli::euroc",
            "Re-derived ground-truth motion from pose for {}",
            self.directory.display()
        );
        Ok(Self { gt, ..self })
    }
}

impl InertialDataset for EurocDataset {
    fn imu_series(&self) -> &ImuSeries {
        &self.imu
    }

    fn gt_series(&self) -> &GtSeries {
        &self.gt
    }

    fn sampling_frequency_hz(&self) -> f64 {
        self.rate_hz
    }

    fn dataset_directory(&self) -> &Path {
        &self.directory
    }
}

#[derive(Debug, Deserialize)]
struct ImuSensorYaml {
    rate_hz: f64,
}

fn read_imu_rate(path: &Path) -> Result<f64> {
    if !path.exists() {
        return Err(CliError::DatasetFileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let sensor: ImuSensorYaml = serde_yaml::from_str(&contents)?;
    if !sensor.rate_hz.is_finite() || sensor.rate_hz <= 0.0 {
        return Err(CliError::SensorConfig(format!(
            "rate_hz must be positive, got {} in {}",
            sensor.rate_hz,
            path.display()
        )));
    }
    Ok(sensor.rate_hz)
}

fn read_imu_csv(path: &Path) -> Result<Vec<ImuSample>> {
    if !path.exists() {
        return Err(CliError::DatasetFileNotFound(path.display().to_string()));
    }
    let mut reader = Reader::from_reader(File::open(path)?);
    let mut samples = Vec::new();
    let mut previous_ts = f64::NEG_INFINITY;

    for (index, record) in reader.records().enumerate() {
        // Line 1 is the header the csv reader consumed.
        let line = index + 2;
        let record = record?;
        if record.len() < 7 {
            return Err(CliError::ImuFormat {
                line,
                message: format!("expected 7 columns, found {}", record.len()),
            });
        }
        let timestamp = imu_field(&record, 0, line, "timestamp")?;
        if !timestamp.is_finite() {
            return Err(CliError::ImuFormat {
                line,
                message: format!("timestamp {timestamp} is not finite"),
            });
        }
        if timestamp <= previous_ts {
            return Err(CliError::ImuFormat {
                line,
                message: format!(
                    "timestamps must be strictly increasing ({timestamp} after {previous_ts})"
                ),
            });
        }
        previous_ts = timestamp;
        samples.push(ImuSample {
            timestamp,
            gyro: Vector3::new(
                imu_field(&record, 1, line, "gyro x")?,
                imu_field(&record, 2, line, "gyro y")?,
                imu_field(&record, 3, line, "gyro z")?,
            ),
            acc: Vector3::new(
                imu_field(&record, 4, line, "acc x")?,
                imu_field(&record, 5, line, "acc y")?,
                imu_field(&record, 6, line, "acc z")?,
            ),
        });
    }
    if samples.is_empty() {
        return Err(CliError::ImuFormat {
            line: 2,
            message: "file contains no IMU records".to_string(),
        });
    }
    Ok(samples)
}

fn read_ground_truth_csv(path: &Path) -> Result<Vec<GtSample>> {
    if !path.exists() {
        return Err(CliError::DatasetFileNotFound(path.display().to_string()));
    }
    let mut reader = Reader::from_reader(File::open(path)?);
    let mut samples = Vec::new();
    let mut previous_ts = f64::NEG_INFINITY;

    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = record?;
        if record.len() < 17 {
            return Err(CliError::GroundTruthFormat {
                line,
                message: format!("expected 17 columns, found {}", record.len()),
            });
        }
        let timestamp = gt_field(&record, 0, line, "timestamp")?;
        if !timestamp.is_finite() {
            return Err(CliError::GroundTruthFormat {
                line,
                message: format!("timestamp {timestamp} is not finite"),
            });
        }
        if timestamp <= previous_ts {
            return Err(CliError::GroundTruthFormat {
                line,
                message: format!(
                    "timestamps must be strictly increasing ({timestamp} after {previous_ts})"
                ),
            });
        }
        previous_ts = timestamp;

        let quaternion = Quaternion::new(
            gt_field(&record, 4, line, "quaternion w")?,
            gt_field(&record, 5, line, "quaternion x")?,
            gt_field(&record, 6, line, "quaternion y")?,
            gt_field(&record, 7, line, "quaternion z")?,
        );
        let orientation = UnitQuaternion::try_new(quaternion, 1e-9).ok_or_else(|| {
            CliError::GroundTruthFormat {
                line,
                message: "orientation quaternion has near-zero norm".to_string(),
            }
        })?;

        samples.push(GtSample {
            timestamp,
            position: Vector3::new(
                gt_field(&record, 1, line, "position x")?,
                gt_field(&record, 2, line, "position y")?,
                gt_field(&record, 3, line, "position z")?,
            ),
            orientation,
            velocity: Vector3::new(
                gt_field(&record, 8, line, "velocity x")?,
                gt_field(&record, 9, line, "velocity y")?,
                gt_field(&record, 10, line, "velocity z")?,
            ),
            angular_velocity: Vector3::new(
                gt_field(&record, 11, line, "angular velocity x")?,
                gt_field(&record, 12, line, "angular velocity y")?,
                gt_field(&record, 13, line, "angular velocity z")?,
            ),
            acceleration: Vector3::new(
                gt_field(&record, 14, line, "acceleration x")?,
                gt_field(&record, 15, line, "acceleration y")?,
                gt_field(&record, 16, line, "acceleration z")?,
            ),
        });
    }
    if samples.len() < 2 {
        return Err(CliError::GroundTruthFormat {
            line: 2,
            message: format!(
                "file must contain at least two ground-truth records, found {}",
                samples.len()
            ),
        });
    }
    Ok(samples)
}

fn imu_field(record: &csv::StringRecord, index: usize, line: usize, label: &str) -> Result<f64> {
    parse_field(record, index, label).map_err(|message| CliError::ImuFormat { line, message })
}

fn gt_field(record: &csv::StringRecord, index: usize, line: usize, label: &str) -> Result<f64> {
    parse_field(record, index, label)
        .map_err(|message| CliError::GroundTruthFormat { line, message })
}

fn parse_field(
    record: &csv::StringRecord,
    index: usize,
    label: &str,
) -> std::result::Result<f64, String> {
    let raw = record
        .get(index)
        .ok_or_else(|| format!("missing {label} column"))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid {label} value {raw:?}: {err}"))
}
