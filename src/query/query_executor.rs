/// Segment Query Executor
///
/// Keyword fetches, range accessors and geometric queries against stored
/// segments. Every call names a segment identity and is answered from the
/// segment cache, which stays locked for the whole call.
use super::intercept_operations::{intercept, nearest_point};
use super::keyword::{Keyword, KeywordKind};
use super::query_data::{BoundingSummary, NearestPlatePoint, PlateIntercept, PlateModelCounts};
use crate::cache::{with_cached_segment, SharedSegmentCache};
use crate::error::{DskError, DskResult};
use crate::plate_set::{
    coordinate_range_bounds, plate_count, plate_normal, plate_range, vertex_count, vertex_range,
    CoordinateRange,
};
use crate::segment::{descriptor_to_array, DskDescriptor, LoadedSegment, SegmentIdentity};
use crate::storage::SegmentSource;
use crate::voxel_index::total_voxels;
use glam::DVec3;
use std::borrow::Cow;

/// Integer array a keyword names within a segment
fn integer_values(segment: &LoadedSegment, keyword: Keyword) -> Cow<'_, [i32]> {
    let index = &segment.index;
    let one = |value: usize| Cow::Owned(vec![value as i32]);
    match keyword {
        Keyword::VertexCount => one(vertex_count(&segment.plate_set)),
        Keyword::PlateCount => one(plate_count(&segment.plate_set)),
        Keyword::TotalVoxelCount => one(total_voxels(&index.grid)),
        Keyword::VoxelGridExtent => Cow::Owned(index.grid.extents.iter().map(|&n| n as i32).collect()),
        Keyword::CoarseScale => one(index.grid.coarse_scale as usize),
        Keyword::VoxelPointerSize => one(index.voxel_pointers.len()),
        Keyword::VoxelListSize => one(index.voxel_plate_list.len()),
        Keyword::VertexListSize => one(index.vertex_plate_list.len()),
        Keyword::Plates => Cow::Owned(
            segment
                .plate_set
                .plates
                .iter()
                .flatten()
                .map(|&id| id as i32)
                .collect(),
        ),
        Keyword::VoxelPointers => Cow::Borrowed(index.voxel_pointers.as_slice()),
        Keyword::VoxelPlateList => Cow::Borrowed(index.voxel_plate_list.as_slice()),
        Keyword::VertexPointers => Cow::Borrowed(index.vertex_pointers.as_slice()),
        Keyword::VertexPlateList => Cow::Borrowed(index.vertex_plate_list.as_slice()),
        Keyword::CoarseGridPointers => Cow::Borrowed(index.coarse_pointers.as_slice()),
        Keyword::Descriptor
        | Keyword::VertexBounds
        | Keyword::VoxelOrigin
        | Keyword::VoxelSize
        | Keyword::Vertices => Cow::Borrowed(&[][..]),
    }
}

/// Double array a keyword names within a segment
fn double_values(segment: &LoadedSegment, keyword: Keyword) -> Vec<f64> {
    match keyword {
        Keyword::Descriptor => descriptor_to_array(&segment.descriptor).to_vec(),
        Keyword::VertexBounds => {
            let b = &segment.index.vertex_bounds;
            vec![b.min.x, b.max.x, b.min.y, b.max.y, b.min.z, b.max.z]
        }
        Keyword::VoxelOrigin => segment.index.grid.origin.to_array().to_vec(),
        Keyword::VoxelSize => vec![segment.index.grid.voxel_size],
        Keyword::Vertices => segment
            .plate_set
            .vertices
            .iter()
            .flat_map(|v| v.to_array())
            .collect(),
        _ => Vec::new(),
    }
}

fn check_kind(keyword: Keyword, expected: KeywordKind) -> DskResult<()> {
    if keyword.kind() != expected {
        return Err(DskError::UnsupportedKeyword {
            keyword: keyword.name().to_string(),
        });
    }
    Ok(())
}

fn check_room(room: i64) -> DskResult<()> {
    if room <= 0 {
        return Err(DskError::value_out_of_range("room", room));
    }
    Ok(())
}

/// At most `room` elements from 0-based `start`; `start` may equal the length
fn window<T: Copy>(values: &[T], start: i64, room: i64) -> DskResult<Vec<T>> {
    let len = values.len() as i64;
    if start < 0 || start > len {
        return Err(DskError::index_out_of_range("start", start, 0, len));
    }
    let end = start.saturating_add(room).min(len);
    Ok(values[start as usize..end as usize].to_vec())
}

/// Query executor over a segment source and a shared cache
pub struct QueryExecutor<'a, S: SegmentSource + ?Sized> {
    cache: &'a SharedSegmentCache,
    source: &'a S,
}

impl<'a, S: SegmentSource + ?Sized> QueryExecutor<'a, S> {
    pub fn new(cache: &'a SharedSegmentCache, source: &'a S) -> Self {
        Self { cache, source }
    }

    fn with_segment<R, F>(&self, identity: &SegmentIdentity, answer: F) -> DskResult<R>
    where
        F: FnOnce(&LoadedSegment) -> DskResult<R>,
    {
        with_cached_segment(self.cache, self.source, identity, answer)
    }

    // ========================================================================
    // KEYWORD FETCHES
    // ========================================================================

    /// Up to `room` elements of an integer keyword's array from 0-based `start`
    pub fn fetch_ints(
        &self,
        identity: &SegmentIdentity,
        keyword: Keyword,
        start: i64,
        room: i64,
    ) -> DskResult<Vec<i32>> {
        check_kind(keyword, KeywordKind::Integer)?;
        check_room(room)?;
        self.with_segment(identity, |segment| {
            window(&integer_values(segment, keyword), start, room)
        })
    }

    /// Up to `room` elements of a double keyword's array from 0-based `start`
    pub fn fetch_doubles(
        &self,
        identity: &SegmentIdentity,
        keyword: Keyword,
        start: i64,
        room: i64,
    ) -> DskResult<Vec<f64>> {
        check_kind(keyword, KeywordKind::Double)?;
        check_room(room)?;
        self.with_segment(identity, |segment| {
            window(&double_values(segment, keyword), start, room)
        })
    }

    /// Value of a single-valued integer keyword
    pub fn scalar(&self, identity: &SegmentIdentity, keyword: Keyword) -> DskResult<i32> {
        if !keyword.is_scalar() {
            return Err(DskError::UnsupportedKeyword {
                keyword: keyword.name().to_string(),
            });
        }
        self.with_segment(identity, |segment| Ok(integer_values(segment, keyword)[0]))
    }

    // ========================================================================
    // PLATE MODEL ACCESSORS
    // ========================================================================

    /// Vertices `start_id ..` (1-based), at most `count`, truncated at the end
    pub fn vertices(
        &self,
        identity: &SegmentIdentity,
        start_id: i64,
        count: i64,
    ) -> DskResult<Vec<DVec3>> {
        self.with_segment(identity, |segment| {
            vertex_range(&segment.plate_set, start_id, count)
        })
    }

    /// Plates `start_id ..` (1-based), at most `count`, truncated at the end
    pub fn plates(
        &self,
        identity: &SegmentIdentity,
        start_id: i64,
        count: i64,
    ) -> DskResult<Vec<[u32; 3]>> {
        self.with_segment(identity, |segment| {
            plate_range(&segment.plate_set, start_id, count)
        })
    }

    pub fn plate_normal(&self, identity: &SegmentIdentity, plate_id: i64) -> DskResult<DVec3> {
        self.with_segment(identity, |segment| plate_normal(&segment.plate_set, plate_id))
    }

    pub fn counts(&self, identity: &SegmentIdentity) -> DskResult<PlateModelCounts> {
        self.with_segment(identity, |segment| {
            Ok(PlateModelCounts {
                vertex_count: vertex_count(&segment.plate_set),
                plate_count: plate_count(&segment.plate_set),
            })
        })
    }

    pub fn bounding_summary(&self, identity: &SegmentIdentity) -> DskResult<BoundingSummary> {
        self.with_segment(identity, |segment| {
            let index = &segment.index;
            Ok(BoundingSummary {
                vertex_count: vertex_count(&segment.plate_set),
                plate_count: plate_count(&segment.plate_set),
                total_voxels: total_voxels(&index.grid),
                vertex_bounds: index.vertex_bounds,
                voxel_origin: index.grid.origin,
                voxel_size: index.grid.voxel_size,
                grid_extents: index.grid.extents,
                coarse_scale: index.grid.coarse_scale,
                voxel_pointer_size: index.voxel_pointers.len(),
                voxel_list_size: index.voxel_plate_list.len(),
                vertex_list_size: index.vertex_plate_list.len(),
            })
        })
    }

    pub fn descriptor(&self, identity: &SegmentIdentity) -> DskResult<DskDescriptor> {
        self.with_segment(identity, |segment| Ok(segment.descriptor.clone()))
    }

    /// Range of the third coordinate in the segment's coordinate system
    pub fn coordinate_range(&self, identity: &SegmentIdentity) -> DskResult<CoordinateRange> {
        self.with_segment(identity, |segment| {
            coordinate_range_bounds(&segment.plate_set, segment.descriptor.coordinate_system)
        })
    }

    // ========================================================================
    // GEOMETRIC QUERIES
    // ========================================================================

    pub fn intercept(
        &self,
        identity: &SegmentIdentity,
        vertex: DVec3,
        direction: DVec3,
    ) -> DskResult<Option<PlateIntercept>> {
        self.with_segment(identity, |segment| {
            intercept(&segment.plate_set, &segment.index, vertex, direction)
        })
    }

    pub fn nearest_point(
        &self,
        identity: &SegmentIdentity,
        point: DVec3,
    ) -> DskResult<NearestPlatePoint> {
        self.with_segment(identity, |segment| {
            nearest_point(&segment.plate_set, &segment.index, point)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{cache_stats, create_shared_segment_cache};
    use crate::config::IndexConfig;
    use crate::plate_set::{box_plate_set, ellipsoid_plate_set};
    use crate::segment::CoordinateSystem;
    use crate::storage::{create_container, create_container_store, write_segment, ContainerStoreData};
    use crate::voxel_index::{build_spatial_index, to_dp_component};

    fn mars_store() -> (ContainerStoreData, SegmentIdentity) {
        let mut store = create_container_store();
        let handle = create_container(&mut store);
        let plates = ellipsoid_plate_set(3396.19, 3396.19, 3376.20, 20, 10).expect("ellipsoid");
        let index = build_spatial_index(&plates, &IndexConfig::default()).expect("index");
        let descriptor = DskDescriptor {
            coordinate_system: CoordinateSystem::Latitudinal,
            coordinate_bounds: [
                [-std::f64::consts::PI, std::f64::consts::PI],
                [-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2],
                [3300.0, 3400.0],
            ],
            ..DskDescriptor::default()
        };
        let dla = write_segment(&mut store, handle, &descriptor, &plates, &index).expect("write");
        (store, SegmentIdentity { handle, dla })
    }

    #[test]
    fn test_total_voxels_matches_extents() {
        let (store, id) = mars_store();
        let cache = create_shared_segment_cache();
        let executor = QueryExecutor::new(&cache, &store);

        let extents = executor
            .fetch_ints(&id, "voxel-grid-extent".parse().expect("keyword"), 0, 3)
            .expect("extents");
        let total = executor
            .scalar(&id, "total-voxel-count".parse().expect("keyword"))
            .expect("total");
        assert_eq!(total, extents.iter().product::<i32>());
        assert_eq!(executor.scalar(&id, Keyword::PlateCount).expect("np"), 360);

        // One load for every query above
        let stats = cache_stats(&cache.lock());
        assert_eq!((stats.misses, stats.hits), (1, 2));
    }

    #[test]
    fn test_fetch_errors() {
        let (store, id) = mars_store();
        let cache = create_shared_segment_cache();
        let executor = QueryExecutor::new(&cache, &store);

        assert!(matches!(
            executor.fetch_ints(&id, Keyword::VoxelSize, 0, 1),
            Err(DskError::UnsupportedKeyword { .. })
        ));
        assert!(matches!(
            executor.fetch_doubles(&id, Keyword::Plates, 0, 1),
            Err(DskError::UnsupportedKeyword { .. })
        ));
        assert!(matches!(
            executor.fetch_ints(&id, Keyword::Plates, 0, 0),
            Err(DskError::ValueOutOfRange { name: "room", .. })
        ));
        assert!(matches!(
            executor.fetch_ints(&id, Keyword::Plates, -1, 10),
            Err(DskError::IndexOutOfRange { index: -1, min: 0, max: 1080, .. })
        ));
        assert!(matches!(
            executor.fetch_ints(&id, Keyword::Plates, 1081, 10),
            Err(DskError::IndexOutOfRange { .. })
        ));
        assert!(executor.fetch_ints(&id, Keyword::Plates, 1080, 10).expect("at end").is_empty());
        assert!(matches!(
            executor.scalar(&id, Keyword::VoxelGridExtent),
            Err(DskError::UnsupportedKeyword { .. })
        ));
    }

    #[test]
    fn test_room_truncates() {
        let (store, id) = mars_store();
        let cache = create_shared_segment_cache();
        let executor = QueryExecutor::new(&cache, &store);

        let all = executor.fetch_ints(&id, Keyword::Plates, 0, i64::MAX).expect("plates");
        assert_eq!(all.len(), 1080);
        let tail = executor.fetch_ints(&id, Keyword::Plates, 1075, 100).expect("tail");
        assert_eq!(tail, all[1075..].to_vec());

        let verts = executor.fetch_doubles(&id, Keyword::Vertices, 3, 3).expect("vertex 2");
        let second = executor.vertices(&id, 2, 1).expect("vertex 2");
        assert_eq!(verts, second[0].to_array().to_vec());
    }

    #[test]
    fn test_accessors() {
        let (store, id) = mars_store();
        let cache = create_shared_segment_cache();
        let executor = QueryExecutor::new(&cache, &store);

        let counts = executor.counts(&id).expect("counts");
        assert_eq!((counts.vertex_count, counts.plate_count), (182, 360));

        let summary = executor.bounding_summary(&id).expect("summary");
        assert_eq!(summary.total_voxels, summary.grid_extents.iter().map(|&n| n as usize).product());
        assert_eq!(summary.coarse_scale, 10);
        assert!((summary.vertex_bounds.max.z - 3376.20).abs() < 1e-9);

        let size = executor.fetch_doubles(&id, Keyword::VoxelSize, 0, 1).expect("size");
        assert_eq!(size, vec![summary.voxel_size]);

        let range = executor.coordinate_range(&id).expect("radius range");
        assert!(range.max <= 3396.19 + 1e-9 && range.min < range.max);
        assert_eq!(
            executor.descriptor(&id).expect("descriptor").coordinate_system,
            CoordinateSystem::Latitudinal
        );
    }

    #[test]
    fn test_double_keywords_match_dp_component() {
        let (store, id) = mars_store();
        let cache = create_shared_segment_cache();
        let executor = QueryExecutor::new(&cache, &store);
        let index = build_spatial_index(
            &ellipsoid_plate_set(3396.19, 3396.19, 3376.20, 20, 10).expect("ellipsoid"),
            &IndexConfig::default(),
        )
        .expect("index");
        let dps = to_dp_component(&index);

        let mut fetched = executor.fetch_doubles(&id, Keyword::VertexBounds, 0, 6).expect("bounds");
        fetched.extend(executor.fetch_doubles(&id, Keyword::VoxelOrigin, 0, 3).expect("origin"));
        fetched.extend(executor.fetch_doubles(&id, Keyword::VoxelSize, 0, 1).expect("size"));
        assert_eq!(fetched, dps);

        // Repeated fetches answer from the cached segment
        let again = executor.fetch_doubles(&id, Keyword::VertexBounds, 2, 2).expect("bounds");
        assert_eq!(again, dps[2..4].to_vec());
        assert_eq!(cache_stats(&cache.lock()).misses, 1);
    }

    #[test]
    fn test_geometric_queries_through_cache() {
        let mut store = create_container_store();
        let handle = create_container(&mut store);
        let plates = box_plate_set(1.0, 1.0, 1.0).expect("box");
        let index = build_spatial_index(&plates, &IndexConfig::default()).expect("index");
        let descriptor = DskDescriptor {
            coordinate_bounds: [[-1.0, 1.0], [-1.0, 1.0], [-1.0, 1.0]],
            ..DskDescriptor::default()
        };
        let dla = write_segment(&mut store, handle, &descriptor, &plates, &index).expect("write");
        let id = SegmentIdentity { handle, dla };

        let cache = create_shared_segment_cache();
        let executor = QueryExecutor::new(&cache, &store);
        let hit = executor
            .intercept(&id, DVec3::new(5.0, 0.1, 0.2), -DVec3::X)
            .expect("valid ray")
            .expect("hit");
        assert!((hit.point - DVec3::new(1.0, 0.1, 0.2)).length() < 1e-12);

        let near = executor.nearest_point(&id, DVec3::new(0.0, 0.0, 4.0)).expect("near");
        assert!((near.distance - 3.0).abs() < 1e-12);

        let first = executor.plate_normal(&id, hit.plate_id).expect("normal");
        assert_eq!(first, DVec3::X);
    }
}
