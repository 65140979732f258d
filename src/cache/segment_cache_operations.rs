//! Segment cache operations - Pure DOP functions
//!
//! A query names a segment identity. If it matches the loaded one (handle
//! and descriptor both) the decoded segment is reused, otherwise it is
//! fetched, decoded and swapped in. A failed load changes nothing.

use super::segment_cache_data::{CacheSlot, CacheStats, SegmentCacheData, SharedSegmentCache};
use crate::error::{DskError, DskResult, OptionExt};
use crate::segment::{decode_segment, LoadedSegment, SegmentIdentity};
use crate::storage::SegmentSource;
use parking_lot::Mutex;
use std::sync::Arc;

pub fn create_segment_cache() -> SegmentCacheData {
    SegmentCacheData::default()
}

pub fn create_shared_segment_cache() -> SharedSegmentCache {
    Arc::new(Mutex::new(create_segment_cache()))
}

/// Identity of the loaded segment, if any
pub fn current_identity(cache: &SegmentCacheData) -> Option<SegmentIdentity> {
    match &cache.slot {
        CacheSlot::Loaded { identity, .. } => Some(*identity),
        CacheSlot::Empty => None,
    }
}

pub fn cache_stats(cache: &SegmentCacheData) -> CacheStats {
    cache.stats
}

/// Drop the loaded segment, e.g. when its container closes
pub fn clear_cache(cache: &mut SegmentCacheData) {
    if let CacheSlot::Loaded { identity, .. } = &cache.slot {
        log::debug!(
            "[SegmentCache] Cleared segment {} of container {}",
            identity.dla,
            identity.handle.0
        );
    }
    cache.slot = CacheSlot::Empty;
}

/// Decoded segment for `identity`, loading it on a miss
pub fn cached_segment<'a, S>(
    cache: &'a mut SegmentCacheData,
    source: &S,
    identity: &SegmentIdentity,
) -> DskResult<&'a LoadedSegment>
where
    S: SegmentSource + ?Sized,
{
    if current_identity(cache).as_ref() == Some(identity) {
        cache.stats.hits += 1;
    } else {
        cache.stats.misses += 1;
        let loaded = source
            .fetch_segment(identity)
            .and_then(|components| decode_segment(&components));
        let segment = match loaded {
            Ok(segment) => segment,
            Err(e) => {
                cache.stats.failed_loads += 1;
                log::warn!(
                    "[SegmentCache] Failed to load segment {} of container {}: {}",
                    identity.dla,
                    identity.handle.0,
                    e
                );
                return Err(e);
            }
        };
        log::debug!(
            "[SegmentCache] Loaded segment {} of container {} ({} plates)",
            identity.dla,
            identity.handle.0,
            segment.plate_set.plates.len()
        );
        cache.slot = CacheSlot::Loaded {
            identity: *identity,
            segment,
        };
    }

    match &cache.slot {
        CacheSlot::Loaded { segment, .. } => Some(segment),
        CacheSlot::Empty => None,
    }
    .ok_or_dsk(|| DskError::SegmentNotFound {
        handle: identity.handle.0,
        descriptor: identity.dla.to_string(),
    })
}

/// Run `answer` against the segment for `identity` with the cache locked
/// for the whole call
pub fn with_cached_segment<S, R, F>(
    cache: &SharedSegmentCache,
    source: &S,
    identity: &SegmentIdentity,
    answer: F,
) -> DskResult<R>
where
    S: SegmentSource + ?Sized,
    F: FnOnce(&LoadedSegment) -> DskResult<R>,
{
    let mut guard = cache.lock();
    let segment = cached_segment(&mut guard, source, identity)?;
    answer(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::plate_set::box_plate_set;
    use crate::segment::{ContainerHandle, DlaDescriptor, DskDescriptor, SegmentComponents};
    use crate::storage::{create_container, create_container_store, write_segment, ContainerStoreData};
    use crate::voxel_index::build_spatial_index;
    use std::cell::Cell;

    /// Counts fetches so tests can see hits and misses from the outside
    struct CountingSource<'a> {
        store: &'a ContainerStoreData,
        fetches: Cell<usize>,
    }

    impl SegmentSource for CountingSource<'_> {
        fn fetch_segment(&self, identity: &SegmentIdentity) -> DskResult<SegmentComponents> {
            self.fetches.set(self.fetches.get() + 1);
            self.store.fetch_segment(identity)
        }
    }

    fn store_with_boxes(halves: &[f64]) -> (ContainerStoreData, Vec<SegmentIdentity>) {
        let mut store = create_container_store();
        let handle = create_container(&mut store);
        let identities = halves
            .iter()
            .map(|&half| {
                let plates = box_plate_set(half, half, half).expect("box");
                let index = build_spatial_index(&plates, &IndexConfig::default()).expect("index");
                let descriptor = DskDescriptor {
                    coordinate_bounds: [[-half, half], [-half, half], [-half, half]],
                    ..DskDescriptor::default()
                };
                let dla = write_segment(&mut store, handle, &descriptor, &plates, &index)
                    .expect("write");
                SegmentIdentity { handle, dla }
            })
            .collect();
        (store, identities)
    }

    #[test]
    fn test_hit_and_miss() {
        let (store, ids) = store_with_boxes(&[1.0, 2.0]);
        let source = CountingSource {
            store: &store,
            fetches: Cell::new(0),
        };
        let mut cache = create_segment_cache();
        assert_eq!(current_identity(&cache), None);

        cached_segment(&mut cache, &source, &ids[0]).expect("load a");
        cached_segment(&mut cache, &source, &ids[0]).expect("hit a");
        assert_eq!(source.fetches.get(), 1);
        assert_eq!(cache_stats(&cache), CacheStats { hits: 1, misses: 1, failed_loads: 0 });

        let b = cached_segment(&mut cache, &source, &ids[1]).expect("load b");
        assert_eq!(b.plate_set.vertices[7].x, 2.0);
        assert_eq!(current_identity(&cache), Some(ids[1]));

        // Capacity is one: returning to the first segment is a full miss
        cached_segment(&mut cache, &source, &ids[0]).expect("reload a");
        assert_eq!(source.fetches.get(), 3);
    }

    #[test]
    fn test_failed_load_keeps_previous_segment() {
        let (store, ids) = store_with_boxes(&[1.0]);
        let mut cache = create_segment_cache();
        let before = cached_segment(&mut cache, &store, &ids[0]).expect("load").clone();

        let missing = SegmentIdentity {
            handle: ContainerHandle(99),
            dla: DlaDescriptor::default(),
        };
        assert!(matches!(
            cached_segment(&mut cache, &store, &missing),
            Err(DskError::SegmentNotFound { handle: 99, .. })
        ));
        assert_eq!(current_identity(&cache), Some(ids[0]));
        assert_eq!(cache.stats.failed_loads, 1);

        let after = cached_segment(&mut cache, &store, &ids[0]).expect("hit");
        assert_eq!(after, &before);
        assert_eq!(cache.stats.hits, 1);
    }

    #[test]
    fn test_corrupt_segment_is_not_cached() {
        struct Corrupt;
        impl SegmentSource for Corrupt {
            fn fetch_segment(&self, _: &SegmentIdentity) -> DskResult<SegmentComponents> {
                Ok(SegmentComponents {
                    ints: vec![3, 1, 0],
                    doubles: vec![0.0; 5],
                })
            }
        }

        let mut cache = create_segment_cache();
        let id = SegmentIdentity {
            handle: ContainerHandle(1),
            dla: DlaDescriptor::default(),
        };
        assert!(matches!(
            cached_segment(&mut cache, &Corrupt, &id),
            Err(DskError::MalformedIndex { .. })
        ));
        assert_eq!(cache.slot, CacheSlot::Empty);
    }

    #[test]
    fn test_clear_and_shared_cache() {
        let (store, ids) = store_with_boxes(&[1.0]);
        let shared = create_shared_segment_cache();
        let plates = with_cached_segment(&shared, &store, &ids[0], |segment| {
            Ok(segment.plate_set.plates.len())
        })
        .expect("query");
        assert_eq!(plates, 12);
        assert_eq!(current_identity(&shared.lock()), Some(ids[0]));

        clear_cache(&mut shared.lock());
        assert_eq!(current_identity(&shared.lock()), None);
    }
}
