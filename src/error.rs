/**
 * Error kinds raised while scanning, matching and tagging photos
 */

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeotagError {
    #[error("{0}")]
    Precondition(String),

    #[error("Malformed timestamp: {0:?} (expected YYYY:MM:DD HH:MM:SS)")]
    MalformedTimestamp(String),

    #[error("Failed to read metadata from {path}: {reason}")]
    MetadataRead { path: PathBuf, reason: String },

    #[error("Failed to write GPS data to {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Invalid file pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl GeotagError {
    pub fn metadata_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        GeotagError::MetadataRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        GeotagError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeotagError>;
