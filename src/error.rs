//! Error types for passfilter.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for filtering runs.
#[derive(Error, Debug)]
pub enum FilterError {
    /// Minimum length is larger than maximum length
    #[error("min length ({min}) must be less than or equal to max length ({max})")]
    InvalidLengthRange { min: usize, max: usize },

    /// Pattern rule failed to compile
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A pipeline tunable is out of range
    #[error("invalid {name}: {reason}")]
    InvalidTunable { name: &'static str, reason: String },

    /// Input could not be opened
    #[error("cannot read the file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input metadata could not be read
    #[error("could not get the file stat for {path:?}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input is a directory, socket or similar
    #[error("input is not a regular file: {path:?}")]
    NotAFile { path: PathBuf },

    /// Read failed in the middle of the input
    #[error("read failed at byte offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// Called from a rayon worker thread, where the reader loop could starve
    /// the pool it feeds
    #[error("cannot run from inside a rayon worker thread")]
    InsideThreadPool,

    /// Accepted lines could not be written
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}

impl FilterError {
    /// Whether the error was raised before anything was read.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidLengthRange { .. } | Self::InvalidPattern { .. } | Self::InvalidTunable { .. }
        )
    }
}

/// Result type alias for passfilter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
