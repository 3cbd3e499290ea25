//! Error types for v0qa-core.

use thiserror::Error;

/// Result type alias for v0qa operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for v0qa operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration error detected while validating user settings.
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Invalid histogram axis definition.
    #[error("invalid binning for axis '{axis}': {reason}")]
    InvalidBinning { axis: String, reason: String },

    /// A record refers to a row that does not exist in its event.
    #[error("dangling {kind} reference: index {index} out of {len}")]
    DanglingReference {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// Two registries with different layouts cannot be merged.
    #[error("histogram layout mismatch: {0}")]
    LayoutMismatch(String),
}

/// Configuration errors.
///
/// These are raised once, by [`crate::config::AnalysisConfig::validate`],
/// before any event is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Detector selection switch outside {-1, 0, 1}.
    #[error("invalid {detector} selection for {daughter} daughter: {value} (expected -1, 0 or 1)")]
    InvalidDetectorSelection {
        detector: &'static str,
        daughter: &'static str,
        value: i32,
    },

    /// Tracking PID hypothesis outside {-1, 0..=4}.
    #[error("invalid PID selection for {daughter} daughter: {value} (expected -1 or 0..=4)")]
    InvalidPidHypothesis { daughter: &'static str, value: i32 },

    /// Neither the data nor the MC pipeline is enabled.
    #[error("no processing mode enabled")]
    NoProcessingMode,

    /// A numeric threshold is not a finite number.
    #[error("threshold '{name}' is not finite: {value}")]
    NonFiniteThreshold { name: &'static str, value: String },
}
