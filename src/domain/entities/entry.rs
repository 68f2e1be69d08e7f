use bytes::Bytes;
use std::path::PathBuf;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{SnapshotId, StorageKind};

/// Where an entry's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// Read from disk while the entry is written
    File(PathBuf),
    /// Already in memory
    Buffer(Bytes),
}

/// Logical identity of an entry inside the virtual filesystem index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub snapshot: SnapshotId,
    pub storage_kind: StorageKind,
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.snapshot, self.storage_kind)
    }
}

/// One unit destined for the payload region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    snapshot: SnapshotId,
    storage_kind: StorageKind,
    source: EntrySource,
}

impl Entry {
    pub fn new(snapshot: SnapshotId, storage_kind: StorageKind, source: EntrySource) -> Self {
        Self {
            snapshot,
            storage_kind,
            source,
        }
    }

    pub fn file(snapshot: SnapshotId, storage_kind: StorageKind, path: impl Into<PathBuf>) -> Self {
        Self::new(snapshot, storage_kind, EntrySource::File(path.into()))
    }

    pub fn buffer(snapshot: SnapshotId, storage_kind: StorageKind, bytes: impl Into<Bytes>) -> Self {
        Self::new(snapshot, storage_kind, EntrySource::Buffer(bytes.into()))
    }

    /// Build an entry from loosely shaped input where the source is optional.
    ///
    /// Exactly one of `file` or `buffer` must be present.
    pub fn from_parts(
        snapshot: SnapshotId,
        storage_kind: StorageKind,
        file: Option<PathBuf>,
        buffer: Option<Bytes>,
    ) -> Result<Self, DomainError> {
        match (file, buffer) {
            (Some(path), None) => Ok(Self::file(snapshot, storage_kind, path)),
            (None, Some(bytes)) => Ok(Self::buffer(snapshot, storage_kind, bytes)),
            (None, None) => Err(DomainError::MissingSource {
                snapshot: snapshot.to_string(),
            }),
            (Some(_), Some(_)) => Err(DomainError::AmbiguousSource {
                snapshot: snapshot.to_string(),
            }),
        }
    }

    pub fn snapshot(&self) -> &SnapshotId {
        &self.snapshot
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage_kind
    }

    pub fn source(&self) -> &EntrySource {
        &self.source
    }

    pub fn into_parts(self) -> (EntryKey, EntrySource) {
        (
            EntryKey {
                snapshot: self.snapshot,
                storage_kind: self.storage_kind,
            },
            self.source,
        )
    }
}
