use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use veloset_core::pipeline::PipelineConfig;

use crate::errors::{CliError, Result};

/// Run configuration for the `veloset` binary, loaded from a YAML file.
///
/// Output locations are explicit configuration: every artifact of a run
/// lands under `output_dir`, and nothing is resolved through ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// EuRoC sequence directory containing `mav0/`.
    pub dataset_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub pipeline: PipelineConfig,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Re-derive ground-truth velocity and angular velocity from the pose
    /// columns instead of trusting the shipped estimates.
    #[serde(default)]
    pub derive_motion_from_pose: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("veloset-output")
}

fn default_batch_size() -> usize {
    32
}

impl RunConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CliError::DatasetFileNotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        let config: RunConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(CliError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.pipeline.window_len == 0 {
            return Err(CliError::InvalidConfig(
                "pipeline.window_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use veloset_core::filter::FilterMode;

    use super::*;

    const MINIMAL_YAML: &str = "\
dataset_dir: /data/euroc/MH_01_easy
pipeline:
  window_len: 200
  filter:
    cutoff_hz: 15.0
";

    const FULL_YAML: &str = "\
dataset_dir: /data/euroc/V1_02_medium
output_dir: /tmp/prepared
batch_size: 64
derive_motion_from_pose: true
pipeline:
  window_len: 100
  test_fraction: 0.2
  validation_fraction: 0.05
  seed: 77
  filter:
    order: 6
    cutoff_hz: 10.0
    mode: zero_phase
";

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let (_dir, path) = write_config(MINIMAL_YAML);
        let config = RunConfig::from_yaml_file(&path).unwrap();

        assert_eq!(config.dataset_dir, PathBuf::from("/data/euroc/MH_01_easy"));
        assert_eq!(config.output_dir, PathBuf::from("veloset-output"));
        assert_eq!(config.batch_size, 32);
        assert!(!config.derive_motion_from_pose);
        assert_eq!(config.pipeline.window_len, 200);
        assert_eq!(config.pipeline.filter.order, 10);
        assert_eq!(config.pipeline.filter.mode, FilterMode::Causal);
        assert_eq!(config.pipeline.test_fraction, 0.1);
        assert_eq!(config.pipeline.validation_fraction, 0.1);
        assert_eq!(config.pipeline.seed, 0);
    }

    #[test]
    fn full_config_overrides_everything() {
        let (_dir, path) = write_config(FULL_YAML);
        let config = RunConfig::from_yaml_file(&path).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/prepared"));
        assert_eq!(config.batch_size, 64);
        assert!(config.derive_motion_from_pose);
        assert_eq!(config.pipeline.filter.order, 6);
        assert_eq!(config.pipeline.filter.mode, FilterMode::ZeroPhase);
        assert_eq!(config.pipeline.seed, 77);
        assert_eq!(config.pipeline.test_fraction, 0.2);
    }

    #[test]
    fn zero_window_len_is_rejected() {
        let (_dir, path) = write_config(
            "dataset_dir: /data\npipeline:\n  window_len: 0\n  filter:\n    cutoff_hz: 5.0\n",
        );
        assert!(matches!(
            RunConfig::from_yaml_file(&path),
            Err(CliError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let (_dir, path) = write_config(
            "dataset_dir: /data\nbatch_size: 0\npipeline:\n  window_len: 10\n  filter:\n    cutoff_hz: 5.0\n",
        );
        assert!(matches!(
            RunConfig::from_yaml_file(&path),
            Err(CliError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_config_file_is_reported() {
        assert!(matches!(
            RunConfig::from_yaml_file("/nonexistent/run.yaml"),
            Err(CliError::DatasetFileNotFound(_))
        ));
    }
}
