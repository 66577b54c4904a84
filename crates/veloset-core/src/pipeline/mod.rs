use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::align;
use crate::dataset::{Batches, InertialDataset};
use crate::errors::PrepError;
use crate::filter::{design, FilterMode, SignalFilter};
use crate::samples::{GtSeries, ImuSeries};
use crate::scale::GroupScalers;
use crate::split::DatasetSplitter;
use crate::window::{self, WindowSet};

/// Preparation stage identifiers, used to report where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Align,
    Filter,
    Scale,
    Window,
    Split,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Align => "align",
            Stage::Filter => "filter",
            Stage::Scale => "scale",
            Stage::Window => "window",
            Stage::Split => "split",
        };
        f.write_str(name)
    }
}

/// Error from [`Pipeline::prepare`], tagged with the failing stage.
#[derive(Debug)]
pub struct PipelineError {
    pub stage: Stage,
    pub source: PrepError,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dataset preparation failed in the {} stage: {}",
            self.stage, self.source
        )
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Low-pass filter portion of the pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default = "default_filter_order")]
    pub order: usize,
    /// Cutoff in Hz, validated against the source's Nyquist frequency at
    /// design time.
    pub cutoff_hz: f64,
    #[serde(default = "default_filter_mode")]
    pub mode: FilterMode,
}

fn default_filter_order() -> usize {
    10
}

fn default_filter_mode() -> FilterMode {
    FilterMode::Causal
}

/// Everything [`Pipeline::prepare`] needs beyond the input series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Window length L in samples.
    pub window_len: usize,
    pub filter: FilterSettings,
    #[serde(default = "default_holdout_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_holdout_fraction")]
    pub validation_fraction: f64,
    /// Seed for the test split. The validation split runs with `seed + 1`
    /// so one configured value pins down both partitions.
    #[serde(default)]
    pub seed: u64,
}

fn default_holdout_fraction() -> f64 {
    0.1
}

/// Output of a full preparation run.
///
/// `train`, `validation`, and `test` index into `windows` and are pairwise
/// disjoint; together they cover every window exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDataset {
    pub windows: WindowSet,
    pub scalers: GroupScalers,
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl PreparedDataset {
    pub fn train_batches(&self, batch_size: usize) -> Batches<'_> {
        Batches::new(&self.windows, &self.train, batch_size)
    }

    pub fn validation_batches(&self, batch_size: usize) -> Batches<'_> {
        Batches::new(&self.windows, &self.validation, batch_size)
    }

    pub fn test_batches(&self, batch_size: usize) -> Batches<'_> {
        Batches::new(&self.windows, &self.test, batch_size)
    }
}

/// Deterministic composition of the five preparation stages.
///
/// Order is fixed: align, filter, fit and apply scalers, window, split.
/// Scaling happens before windowing so that padding rows stay exactly zero
/// in the materialized tensors. Any stage failure aborts the whole run.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn prepare(
        &self,
        imu: &ImuSeries,
        gt: &GtSeries,
        sampling_frequency_hz: f64,
    ) -> Result<PreparedDataset, PipelineError> {
        let (imu, gt) = align::align(imu, gt).map_err(|source| PipelineError {
            stage: Stage::Align,
            source,
        })?;

        let filter_config = &self.config.filter;
        let coefficients = design(
            filter_config.order,
            filter_config.cutoff_hz,
            sampling_frequency_hz,
        )
        .map_err(|source| PipelineError {
            stage: Stage::Filter,
            source,
        })?;
        let filter = SignalFilter::new(coefficients, filter_config.mode);
        let filtered = filter.apply_series(&imu).map_err(|source| PipelineError {
            stage: Stage::Filter,
            source,
        })?;

        let scalers = GroupScalers::fit(&filtered).map_err(|source| PipelineError {
            stage: Stage::Scale,
            source,
        })?;
        let scaled = scalers.transform_series(&filtered);

        let windows =
            window::build(&scaled, &gt, self.config.window_len).map_err(|source| PipelineError {
                stage: Stage::Window,
                source,
            })?;

        let test_split = DatasetSplitter::new(self.config.seed)
            .split(windows.len(), self.config.test_fraction)
            .map_err(|source| PipelineError {
                stage: Stage::Split,
                source,
            })?;
        let validation_split = DatasetSplitter::new(self.config.seed.wrapping_add(1))
            .split(test_split.retained.len(), self.config.validation_fraction)
            .map_err(|source| PipelineError {
                stage: Stage::Split,
                source,
            })?;

        // The validation draw indexes into the retained pool; map it back to
        // absolute window indices before handing it out.
        let validation: Vec<usize> = validation_split
            .holdout
            .iter()
            .map(|&i| test_split.retained[i])
            .collect();
        let train: Vec<usize> = validation_split
            .retained
            .iter()
            .map(|&i| test_split.retained[i])
            .collect();

        info!(
            target: "veloset_core::pipeline",
            "Prepared {} windows of length {}: {} train, {} validation, {} test",
            windows.len(),
            self.config.window_len,
            train.len(),
            validation.len(),
            test_split.holdout.len()
        );
        Ok(PreparedDataset {
            windows,
            scalers,
            train,
            validation,
            test: test_split.holdout,
        })
    }
}

/// Runs the pipeline against any [`InertialDataset`] source.
pub fn prepare_dataset<D: InertialDataset>(
    source: &D,
    config: PipelineConfig,
) -> Result<PreparedDataset, PipelineError> {
    Pipeline::new(config).prepare(
        source.imu_series(),
        source.gt_series(),
        source.sampling_frequency_hz(),
    )
}
