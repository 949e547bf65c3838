//! Error types for respiro-core

use thiserror::Error;

/// Errors produced while validating an engine configuration.
///
/// The running engine itself is infallible: once constructed, sensor intake
/// and metric queries cannot fail observably. Only configuration is checked.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be finite and positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("sensitivity alpha must be finite and positive, got {0}")]
    InvalidAlpha(f32),

    #[error("apnea timeout must be non-zero")]
    InvalidApneaTimeout,
}
