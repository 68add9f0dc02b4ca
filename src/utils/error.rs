//! Error types for adsequencer
//!
//! Ad failures (`adserror`, `adtimeout`) are ordinary state machine edges and
//! never show up here. This module only covers protocol misuse by callers,
//! configuration problems and scenario loading.

use thiserror::Error;

/// Main error type for adsequencer
#[derive(Error, Debug)]
pub enum AdsError {
    /// The recycled-surface check was asked for while no snapshot exists
    #[error("You cannot use video_element_recycled while there is no snapshot")]
    NoSnapshot,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Scenario script errors
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for Results in adsequencer
pub type Result<T> = std::result::Result<T, AdsError>;

/// Extension trait for converting other errors to AdsError
pub trait IntoAdsError<T> {
    /// Convert this error into an AdsError with the given context
    fn config_err(self, context: &str) -> Result<T>;
    fn scenario_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoAdsError<T> for std::result::Result<T, E> {
    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| AdsError::Config(format!("{}: {}", context, e)))
    }

    fn scenario_err(self, context: &str) -> Result<T> {
        self.map_err(|e| AdsError::Scenario(format!("{}: {}", context, e)))
    }
}
