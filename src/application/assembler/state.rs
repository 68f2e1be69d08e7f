use tracing::warn;

use crate::domain::entities::{EntryKey, Extent, Stripe, VirtualFilesystem};

/// Counters and index owned by one assembly run
#[derive(Debug, Default)]
pub struct AssemblyState {
    /// Next free offset of the payload region, after the header box
    payload_position: u64,
    /// Bytes of the payload region so far, header box included
    payload_length: u64,
    vfs: VirtualFilesystem,
}

impl AssemblyState {
    /// Fresh state with every snapshot of `stripe` present in the index
    pub fn seeded(stripe: &Stripe) -> Self {
        let mut vfs = VirtualFilesystem::new();
        for snapshot in stripe.snapshots() {
            vfs.seed(snapshot);
        }
        Self {
            vfs,
            ..Self::default()
        }
    }

    /// Record a fully written entry at the current payload position
    pub fn record(&mut self, key: &EntryKey, byte_length: u64) -> &VirtualFilesystem {
        let extent = Extent::new(self.payload_position, byte_length);
        if let Some(previous) = self.vfs.record(&key.snapshot, key.storage_kind, extent) {
            warn!(
                entry = %key,
                previous_offset = previous.offset,
                "Entry recorded twice; index keeps the later extent"
            );
        }
        self.payload_position += byte_length;
        &self.vfs
    }

    pub fn add_payload_bytes(&mut self, byte_length: u64) {
        self.payload_length += byte_length;
    }

    pub fn payload_position(&self) -> u64 {
        self.payload_position
    }

    pub fn payload_length(&self) -> u64 {
        self.payload_length
    }

    pub fn vfs(&self) -> &VirtualFilesystem {
        &self.vfs
    }

    pub fn into_vfs(self) -> VirtualFilesystem {
        self.vfs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Entry;
    use crate::domain::value_objects::{SnapshotId, StorageKind};

    fn key(name: &str, kind: StorageKind) -> EntryKey {
        EntryKey {
            snapshot: SnapshotId::new(name).unwrap(),
            storage_kind: kind,
        }
    }

    #[test]
    fn test_seeded_contains_all_snapshots() {
        let stripe: Stripe = vec![
            Entry::buffer(SnapshotId::new("/a").unwrap(), StorageKind::Code, "x"),
            Entry::buffer(SnapshotId::new("/b").unwrap(), StorageKind::Content, "y"),
        ]
        .into();
        let state = AssemblyState::seeded(&stripe);
        assert_eq!(state.vfs().snapshot_count(), 2);
        assert_eq!(state.payload_position(), 0);
    }

    #[test]
    fn test_record_advances_position() {
        let mut state = AssemblyState::default();
        state.record(&key("/a", StorageKind::Code), 10);
        state.record(&key("/a", StorageKind::Content), 20);
        let vfs = state.record(&key("/b", StorageKind::Content), 5);

        assert_eq!(
            vfs.get(&SnapshotId::new("/a").unwrap(), StorageKind::Code),
            Some(Extent::new(0, 10))
        );
        assert_eq!(
            vfs.get(&SnapshotId::new("/a").unwrap(), StorageKind::Content),
            Some(Extent::new(10, 20))
        );
        assert_eq!(
            vfs.get(&SnapshotId::new("/b").unwrap(), StorageKind::Content),
            Some(Extent::new(30, 5))
        );
        assert_eq!(state.payload_position(), 35);
    }

    #[test]
    fn test_payload_length_is_independent_of_position() {
        let mut state = AssemblyState::default();
        state.add_payload_bytes(16);
        state.record(&key("/a", StorageKind::Content), 100);
        state.add_payload_bytes(100);
        assert_eq!(state.payload_length(), 116);
        assert_eq!(state.payload_position(), 100);
    }
}
