//! Utility module for adsequencer
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::AdsConfig;
pub use error::{AdsError, Result};

/// Format a millisecond clock reading for log output
///
/// Returns "S.mmm" for readings under a minute and "M:SS.mmm" otherwise.
pub fn format_clock(at: std::time::Duration) -> String {
    let total_ms = at.as_millis();
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    if minutes > 0 {
        format!("{}:{:02}.{:03}", minutes, seconds, millis)
    } else {
        format!("{}.{:03}", seconds, millis)
    }
}
