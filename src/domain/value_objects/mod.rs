mod snapshot_id;
mod storage_kind;

pub use snapshot_id::SnapshotId;
pub use storage_kind::StorageKind;
