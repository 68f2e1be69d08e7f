//! Failure taxonomy of an assembly run
//!
//! Every variant is terminal: the run stops at the first failure and no
//! retry is attempted.

use std::path::PathBuf;
use thiserror::Error;

use crate::application::assembler::SegmentKind;
use crate::application::ports::{CompileError, SinkError};
use crate::domain::errors::DomainError;
use crate::format::EncodeError;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("Environment unsupported: {0}")]
    EnvironmentUnsupported(String),

    #[error("Invalid option #{index}: {reason}")]
    InvalidOption { index: usize, reason: String },

    #[error("Malformed entry {snapshot}: {reason}")]
    MalformedEntry { snapshot: String, reason: String },

    #[error("Failed to compile {snapshot}: {source}")]
    CompileFailure {
        snapshot: String,
        #[source]
        source: CompileError,
    },

    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {segment} ({origin}): {source}")]
    Read {
        segment: SegmentKind,
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Segment sequence violated: {0}")]
    SequenceViolation(String),

    #[error("Assembly aborted after an earlier failure")]
    Aborted,
}

impl PackError {
    /// Whether the failure came from reading a source or writing the sink
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            PackError::File { .. } | PackError::Read { .. } | PackError::Io(_)
        )
    }
}

impl From<DomainError> for PackError {
    fn from(err: DomainError) -> Self {
        PackError::MalformedEntry {
            snapshot: err.snapshot().unwrap_or("<unknown>").to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<SinkError> for PackError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(e) => PackError::Io(e),
            SinkError::Closed => PackError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "output sink already closed",
            )),
            SinkError::OutputIsStub(path) => PackError::File {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "output would overwrite the stub",
                ),
            },
        }
    }
}
