//! Error types for the pitch shifter.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PitchShiftError {
    /// Rejected configuration; the previously active one stays in effect.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("invalid pitch ratio: {0} is not finite")]
    InvalidRatio(f32),
}

pub type Result<T> = std::result::Result<T, PitchShiftError>;
