use thiserror::Error;

/// Failure taxonomy shared by the preparation stages.
///
/// Every variant aborts the run it occurs in; nothing in this crate retries
/// or substitutes defaults for malformed input.
#[derive(Debug, Error)]
pub enum PrepError {
    /// The data does not span the requested operation (ground truth too
    /// short to bracket any IMU sample, empty series after trimming).
    #[error("range error: {0}")]
    Range(String),

    /// A configuration value lies outside its valid domain.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A channel group is constant at fit time, so min-max scaling would
    /// divide by zero.
    #[error("degenerate value range: {0}")]
    DegenerateRange(String),

    /// Two inputs that must agree in length or layout do not.
    #[error("shape mismatch: {0}")]
    Shape(String),
}
