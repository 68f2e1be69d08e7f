use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::value_objects::{SnapshotId, StorageKind};

/// Physical location of an entry, relative to the first byte after the
/// payload header box. Serialized as `[offset, length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u64, u64)", into = "(u64, u64)")]
pub struct Extent {
    pub offset: u64,
    pub length: u64,
}

impl Extent {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// First offset past the extent
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

impl From<(u64, u64)> for Extent {
    fn from((offset, length): (u64, u64)) -> Self {
        Self { offset, length }
    }
}

impl From<Extent> for (u64, u64) {
    fn from(extent: Extent) -> Self {
        (extent.offset, extent.length)
    }
}

/// Index from snapshot and storage kind to payload extent.
///
/// Serializes to `{"<snapshot>": {"<store code>": [offset, length]}}`,
/// the shape the runtime loader reads out of the prelude.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFilesystem {
    snapshots: BTreeMap<SnapshotId, BTreeMap<StorageKind, Extent>>,
}

impl VirtualFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot with no recorded extents yet
    pub fn seed(&mut self, snapshot: &SnapshotId) {
        self.snapshots.entry(snapshot.clone()).or_default();
    }

    /// Record an extent, returning the one it replaced for the same key
    pub fn record(
        &mut self,
        snapshot: &SnapshotId,
        storage_kind: StorageKind,
        extent: Extent,
    ) -> Option<Extent> {
        self.snapshots
            .entry(snapshot.clone())
            .or_default()
            .insert(storage_kind, extent)
    }

    pub fn get(&self, snapshot: &SnapshotId, storage_kind: StorageKind) -> Option<Extent> {
        self.snapshots
            .get(snapshot)
            .and_then(|stores| stores.get(&storage_kind))
            .copied()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// All recorded extents, ordered by snapshot then storage kind
    pub fn extents(&self) -> impl Iterator<Item = (&SnapshotId, StorageKind, Extent)> {
        self.snapshots.iter().flat_map(|(snapshot, stores)| {
            stores
                .iter()
                .map(move |(kind, extent)| (snapshot, *kind, *extent))
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

struct StoreMap<'a>(&'a BTreeMap<StorageKind, Extent>);

impl Serialize for StoreMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (kind, extent) in self.0 {
            map.serialize_entry(&kind.code(), extent)?;
        }
        map.end()
    }
}

impl Serialize for VirtualFilesystem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.snapshots.len()))?;
        for (snapshot, stores) in &self.snapshots {
            map.serialize_entry(snapshot.as_str(), &StoreMap(stores))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(name: &str) -> SnapshotId {
        SnapshotId::new(name).unwrap()
    }

    #[test]
    fn test_empty_serializes_to_empty_object() {
        let vfs = VirtualFilesystem::new();
        assert!(vfs.is_empty());
        assert_eq!(vfs.to_json().unwrap(), "{}");
    }

    #[test]
    fn test_seeded_snapshot_serializes_empty_map() {
        let mut vfs = VirtualFilesystem::new();
        vfs.seed(&snap("/app"));
        vfs.seed(&snap("/app"));
        assert_eq!(vfs.snapshot_count(), 1);
        assert_eq!(vfs.to_json().unwrap(), r#"{"/app":{}}"#);
    }

    #[test]
    fn test_record_uses_store_codes_as_keys() {
        let mut vfs = VirtualFilesystem::new();
        vfs.record(&snap("/app/a.js"), StorageKind::Code, Extent::new(0, 12));
        vfs.record(&snap("/app/a.js"), StorageKind::Content, Extent::new(12, 30));
        assert_eq!(
            vfs.to_json().unwrap(),
            r#"{"/app/a.js":{"0":[0,12],"1":[12,30]}}"#
        );
    }

    #[test]
    fn test_record_replaces_same_key() {
        let mut vfs = VirtualFilesystem::new();
        let key = snap("/app");
        assert!(vfs.record(&key, StorageKind::Content, Extent::new(0, 1)).is_none());
        let previous = vfs.record(&key, StorageKind::Content, Extent::new(1, 2));
        assert_eq!(previous, Some(Extent::new(0, 1)));
        assert_eq!(vfs.get(&key, StorageKind::Content), Some(Extent::new(1, 2)));
    }

    #[test]
    fn test_extents_are_ordered_by_snapshot_then_kind() {
        let mut vfs = VirtualFilesystem::new();
        vfs.seed(&snap("/empty"));
        vfs.record(&snap("/b"), StorageKind::Content, Extent::new(0, 3));
        vfs.record(&snap("/a"), StorageKind::Content, Extent::new(3, 4));
        vfs.record(&snap("/a"), StorageKind::Code, Extent::new(7, 2));

        let listed: Vec<_> = vfs
            .extents()
            .map(|(snapshot, kind, extent)| (snapshot.to_string(), kind, extent))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("/a".to_string(), StorageKind::Code, Extent::new(7, 2)),
                ("/a".to_string(), StorageKind::Content, Extent::new(3, 4)),
                ("/b".to_string(), StorageKind::Content, Extent::new(0, 3)),
            ]
        );
    }

    #[test]
    fn test_extent_end() {
        assert_eq!(Extent::new(0, 10).end(), 10);
        assert_eq!(Extent::new(10, 0).end(), 10);
    }

    #[test]
    fn test_extent_serializes_as_pair() {
        assert_eq!(serde_json::to_string(&Extent::new(4, 5)).unwrap(), "[4,5]");
        let extent: Extent = serde_json::from_str("[7,8]").unwrap();
        assert_eq!(extent, Extent::new(7, 8));
    }
}
