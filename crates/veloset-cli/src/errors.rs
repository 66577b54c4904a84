use thiserror::Error;

use veloset_core::errors::PrepError;
use veloset_core::persist::ArchiveError;
use veloset_core::pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("dataset file not found: {0}")]
    DatasetFileNotFound(String),

    #[error("IMU file format error at line {line}: {message}")]
    ImuFormat { line: usize, message: String },

    #[error("ground-truth file format error at line {line}: {message}")]
    GroundTruthFormat { line: usize, message: String },

    #[error("sensor calibration error: {0}")]
    SensorConfig(String),

    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error("ground-truth derivation failed: {0}")]
    Derivation(#[from] PrepError),

    #[error("dataset preparation failed: {0}")]
    Preparation(#[from] PipelineError),

    #[error("output persistence failed: {0}")]
    Persistence(#[from] ArchiveError),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
