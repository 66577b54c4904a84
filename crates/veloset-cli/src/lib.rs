pub mod config;
pub mod errors;
pub mod euroc;

use std::fs;
use std::path::PathBuf;

use log::info;
use serde::Serialize;

use veloset_core::persist::SplitArchive;
use veloset_core::pipeline::prepare_dataset;

use crate::config::RunConfig;
use crate::errors::Result;
use crate::euroc::EurocDataset;

pub const SCALER_FILE: &str = "scalers.json";
pub const TRAIN_FILE: &str = "train.vset";
pub const VALIDATION_FILE: &str = "validation.vset";
pub const TEST_FILE: &str = "test.vset";

/// Summary of one preparation run, printed by the binary and written as
/// JSON next to the artifacts for downstream tooling.
#[derive(Debug, Clone, Serialize)]
pub struct PreparationReport {
    pub dataset_dir: PathBuf,
    pub output_dir: PathBuf,
    pub window_count: usize,
    pub window_len: usize,
    pub train_windows: usize,
    pub validation_windows: usize,
    pub test_windows: usize,
    pub gyro_range: [f64; 2],
    pub acc_range: [f64; 2],
}

/// Loads an EuRoC sequence, runs the preparation pipeline, and persists the
/// scaler parameters plus one archive per partition under the configured
/// output directory.
pub struct DatasetPreparer {
    config: RunConfig,
}

impl DatasetPreparer {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<PreparationReport> {
        let mut dataset = EurocDataset::load(&self.config.dataset_dir)?;
        if self.config.derive_motion_from_pose {
            dataset = dataset.rederive_motion()?;
        }

        let prepared = prepare_dataset(&dataset, self.config.pipeline)?;

        fs::create_dir_all(&self.config.output_dir)?;
        prepared
            .scalers
            .save_json(&self.config.output_dir.join(SCALER_FILE))?;
        for (name, indices) in [
            (TRAIN_FILE, &prepared.train),
            (VALIDATION_FILE, &prepared.validation),
            (TEST_FILE, &prepared.test),
        ] {
            SplitArchive::from_partition(&prepared.windows, indices)
                .write(&self.config.output_dir.join(name))?;
        }

        let report = PreparationReport {
            dataset_dir: self.config.dataset_dir.clone(),
            output_dir: self.config.output_dir.clone(),
            window_count: prepared.windows.len(),
            window_len: prepared.windows.window_len(),
            train_windows: prepared.train.len(),
            validation_windows: prepared.validation.len(),
            test_windows: prepared.test.len(),
            gyro_range: [prepared.scalers.gyro.min, prepared.scalers.gyro.max],
            acc_range: [prepared.scalers.acc.min, prepared.scalers.acc.max],
        };
        fs::write(
            self.config.output_dir.join("report.json"),
            serde_json::to_vec_pretty(&report)?,
        )?;
        info!(
            target: "veloset_cli",
            "Prepared {} windows from {} ({} train, {} validation, {} test)",
            report.window_count,
            report.dataset_dir.display(),
            report.train_windows,
            report.validation_windows,
            report.test_windows
        );
        Ok(report)
    }
}
