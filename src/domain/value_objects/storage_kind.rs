use serde::{Deserialize, Serialize};

/// Classification of an entry's bytes inside the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Executable code, handed to the compile collaborator before embedding
    Code,
    /// Opaque content, embedded verbatim
    Content,
}

impl StorageKind {
    /// Numeric store code the runtime loader uses as the index key
    pub fn code(&self) -> u8 {
        match self {
            StorageKind::Code => 0,
            StorageKind::Content => 1,
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKind::Code => write!(f, "code"),
            StorageKind::Content => write!(f, "content"),
        }
    }
}
