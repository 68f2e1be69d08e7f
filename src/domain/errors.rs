use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid snapshot id: {0}")]
    InvalidSnapshotId(String),

    #[error("Entry {snapshot} has no source (expected a file or a buffer)")]
    MissingSource { snapshot: String },

    #[error("Entry {snapshot} has more than one source")]
    AmbiguousSource { snapshot: String },
}

impl DomainError {
    /// Snapshot the error refers to, if any
    pub fn snapshot(&self) -> Option<&str> {
        match self {
            DomainError::MissingSource { snapshot } | DomainError::AmbiguousSource { snapshot } => {
                Some(snapshot)
            }
            DomainError::InvalidSnapshotId(_) => None,
        }
    }
}
