//! Keyed store of tile records and their lifecycle state.

use crate::grid::coords::{TileCoord, TileKey};
use crate::prelude::{HashMap, Instant};
use crate::traits::ResourceHandle;
use crate::TileLoadError;

/// Lifecycle state of a tile record.
///
/// `Requested → {Loaded, Errored} → Active`, with `Stale` as the demoted
/// state of an `Active` tile that fell out of range and is only kept for
/// fade continuity. `Errored` records never reach `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilePhase {
    Requested,
    Loaded,
    Errored,
    Active,
    Stale,
}

/// A single tile slot, owned exclusively by [`TileCache`].
#[derive(Debug, Clone)]
pub struct TileRecord {
    /// Normalized coordinate this record was created for.
    pub coords: TileCoord,
    pub key: TileKey,
    /// Resource token, present once the fetch succeeded. Owned by the
    /// rendering collaborator; released on prune.
    pub handle: Option<ResourceHandle>,
    pub phase: TilePhase,
    /// Whether the tile lies inside the latest computed range.
    pub current: bool,
    pub error: Option<TileLoadError>,
    pub requested_at: Instant,
    pub loaded_at: Option<Instant>,
}

impl TileRecord {
    /// Fresh record for a coordinate entering the target range.
    pub fn requested(coords: TileCoord) -> Self {
        let coords = coords.normalized();
        Self {
            coords,
            key: coords.key(),
            handle: None,
            phase: TilePhase::Requested,
            current: true,
            error: None,
            requested_at: Instant::now(),
            loaded_at: None,
        }
    }

    /// Marks the record as outside the target range. Active tiles demote to
    /// `Stale` so the fade/prune machinery can still see them.
    pub fn mark_not_current(&mut self) {
        self.current = false;
        if self.phase == TilePhase::Active {
            self.phase = TilePhase::Stale;
        }
    }

    /// Marks the record as inside the target range again. A stale tile goes
    /// straight back to `Active`; errored tiles stay errored.
    pub fn mark_current(&mut self) {
        self.current = true;
        if self.phase == TilePhase::Stale {
            self.phase = TilePhase::Active;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase != TilePhase::Requested
    }
}

/// Map from tile key to record. All lifecycle mutation goes through the
/// owning [`TileGrid`](crate::grid::TileGrid); the cache itself only
/// enforces the one-record-per-key invariant.
#[derive(Debug, Default)]
pub struct TileCache {
    records: HashMap<TileKey, TileRecord>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TileKey) -> Option<&TileRecord> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &TileKey) -> Option<&mut TileRecord> {
        self.records.get_mut(key)
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.records.contains_key(key)
    }

    /// Registers a record under its key. Inserting over an existing key is a
    /// logic error: asserted in debug builds, and the existing record is
    /// never overwritten.
    pub fn insert(&mut self, record: TileRecord) {
        debug_assert!(
            !self.records.contains_key(&record.key),
            "duplicate tile record for key {}",
            record.key
        );
        self.records.entry(record.key).or_insert(record);
    }

    pub fn remove(&mut self, key: &TileKey) -> Option<TileRecord> {
        self.records.remove(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &TileRecord> {
        self.records.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut TileRecord> {
        self.records.values_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sweeps `current = false` over every record matching the predicate.
    pub fn mark_not_current<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&TileRecord) -> bool,
    {
        for record in self.records.values_mut() {
            if predicate(record) {
                record.mark_not_current();
            }
        }
    }

    /// Drains every record with `current == false` out of the cache.
    pub fn take_not_current(&mut self) -> Vec<TileRecord> {
        let keys: Vec<TileKey> = self
            .records
            .iter()
            .filter(|(_, record)| !record.current)
            .map(|(key, _)| *key)
            .collect();
        keys.iter()
            .filter_map(|key| self.records.remove(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: i32, y: i32, z: u8) -> TileRecord {
        TileRecord::requested(TileCoord::new(x, y, z))
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut cache = TileCache::new();
        let rec = record(3, 4, 5);
        let key = rec.key;
        cache.insert(rec);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key));
        assert_eq!(cache.get(&key).unwrap().phase, TilePhase::Requested);
        assert!(cache.remove(&key).is_some());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_requested_record_normalizes_coords() {
        let rec = record(-1, 0, 1);
        assert_eq!(rec.coords, TileCoord::new(1, 0, 1));
        assert_eq!(rec.key, TileCoord::new(1, 0, 1).key());
        assert!(rec.current);
    }

    #[test]
    #[should_panic(expected = "duplicate tile record")]
    #[cfg(debug_assertions)]
    fn test_duplicate_insert_asserts() {
        let mut cache = TileCache::new();
        cache.insert(record(1, 1, 3));
        cache.insert(record(1, 1, 3));
    }

    #[test]
    fn test_mark_not_current_sweep() {
        let mut cache = TileCache::new();
        cache.insert(record(0, 0, 4));
        cache.insert(record(1, 0, 5));
        cache.mark_not_current(|rec| rec.coords.z != 5);
        assert!(!cache.get(&TileCoord::new(0, 0, 4).key()).unwrap().current);
        assert!(cache.get(&TileCoord::new(1, 0, 5).key()).unwrap().current);
    }

    #[test]
    fn test_stale_demotion_and_promotion() {
        let mut rec = record(2, 2, 6);
        rec.phase = TilePhase::Active;
        rec.mark_not_current();
        assert_eq!(rec.phase, TilePhase::Stale);
        rec.mark_current();
        assert_eq!(rec.phase, TilePhase::Active);

        // errored tiles never come back as active
        let mut errored = record(3, 2, 6);
        errored.phase = TilePhase::Errored;
        errored.mark_not_current();
        assert_eq!(errored.phase, TilePhase::Errored);
        errored.mark_current();
        assert_eq!(errored.phase, TilePhase::Errored);
    }

    #[test]
    fn test_take_not_current() {
        let mut cache = TileCache::new();
        cache.insert(record(0, 0, 7));
        cache.insert(record(1, 0, 7));
        cache.insert(record(2, 0, 7));
        cache.mark_not_current(|rec| rec.coords.x > 0);
        let evicted = cache.take_not_current();
        assert_eq!(evicted.len(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&TileCoord::new(0, 0, 7).key()));
    }
}
