//! Container storage operations - Pure DOP functions
//!
//! In-memory containers addressed by handle. Segments are appended to a
//! container's integer and double spaces and located by their DLA descriptor.

use super::container_data::{
    ContainerData, ContainerStoreData, CONTAINER_HEADER_SIZE, CONTAINER_MAGIC, CONTAINER_VERSION,
};
use crate::error::{DskError, DskResult, ErrorContext, OptionExt};
use crate::plate_set::PlateSetData;
use crate::segment::{
    encode_segment, ContainerHandle, DlaDescriptor, DskDescriptor, SegmentComponents,
    SegmentIdentity,
};
use crate::voxel_index::SpatialIndexData;
use std::path::Path;

/// Boundary between the query cache and wherever segments live
pub trait SegmentSource {
    /// Raw arrays of the segment named by `identity`
    fn fetch_segment(&self, identity: &SegmentIdentity) -> DskResult<SegmentComponents>;
}

impl SegmentSource for ContainerStoreData {
    fn fetch_segment(&self, identity: &SegmentIdentity) -> DskResult<SegmentComponents> {
        fetch_components(self, identity)
    }
}

pub fn create_container_store() -> ContainerStoreData {
    ContainerStoreData {
        containers: Default::default(),
        next_handle: 1,
    }
}

fn open_handle(store: &mut ContainerStoreData, container: ContainerData) -> ContainerHandle {
    let handle = ContainerHandle(store.next_handle);
    store.next_handle += 1;
    store.containers.insert(handle, container);
    handle
}

fn container(store: &ContainerStoreData, handle: ContainerHandle) -> DskResult<&ContainerData> {
    store.containers.get(&handle).ok_or_dsk(|| {
        DskError::invalid_input(format!("container handle {} is not open", handle.0))
    })
}

// ============================================================================
// CONTAINER LIFECYCLE
// ============================================================================

/// Open a new empty container
pub fn create_container(store: &mut ContainerStoreData) -> ContainerHandle {
    let handle = open_handle(store, ContainerData::default());
    log::debug!("[Storage] Created container {}", handle.0);
    handle
}

/// Close a container; its handle becomes invalid
pub fn close_container(store: &mut ContainerStoreData, handle: ContainerHandle) -> DskResult<()> {
    if store.containers.remove(&handle).is_none() {
        return Err(DskError::invalid_input(format!(
            "container handle {} is not open",
            handle.0
        )));
    }
    log::debug!("[Storage] Closed container {}", handle.0);
    Ok(())
}

// ============================================================================
// SEGMENTS
// ============================================================================

/// Append a type 2 segment and return where it landed
pub fn write_segment(
    store: &mut ContainerStoreData,
    handle: ContainerHandle,
    descriptor: &DskDescriptor,
    plate_set: &PlateSetData,
    index: &SpatialIndexData,
) -> DskResult<DlaDescriptor> {
    container(store, handle)?;
    // Encode first so a rejected segment leaves the container untouched
    let components = encode_segment(descriptor, plate_set, index)?;

    let target = store.containers.get_mut(&handle).ok_or_dsk(|| {
        DskError::invalid_input(format!("container handle {} is not open", handle.0))
    })?;
    let dla = DlaDescriptor {
        int_base: target.ints.len(),
        int_size: components.ints.len(),
        dp_base: target.doubles.len(),
        dp_size: components.doubles.len(),
        char_base: 0,
        char_size: 0,
    };
    target.ints.extend_from_slice(&components.ints);
    target.doubles.extend_from_slice(&components.doubles);
    target.segments.push(dla);

    log::info!(
        "[Storage] Wrote segment {} of container {} ({} integers, {} doubles)",
        target.segments.len(),
        handle.0,
        dla.int_size,
        dla.dp_size
    );
    Ok(dla)
}

/// First segment of a container, `None` if it has none
pub fn first_segment(
    store: &ContainerStoreData,
    handle: ContainerHandle,
) -> DskResult<Option<DlaDescriptor>> {
    Ok(container(store, handle)?.segments.first().copied())
}

/// Segment following `current`, `None` after the last one
pub fn next_segment(
    store: &ContainerStoreData,
    handle: ContainerHandle,
    current: &DlaDescriptor,
) -> DskResult<Option<DlaDescriptor>> {
    let segments = &container(store, handle)?.segments;
    let position = segments
        .iter()
        .position(|dla| dla == current)
        .ok_or_dsk(|| DskError::SegmentNotFound {
            handle: handle.0,
            descriptor: current.to_string(),
        })?;
    Ok(segments.get(position + 1).copied())
}

/// Every segment of a container in write order
pub fn segment_identities(
    store: &ContainerStoreData,
    handle: ContainerHandle,
) -> DskResult<Vec<SegmentIdentity>> {
    Ok(container(store, handle)?
        .segments
        .iter()
        .map(|&dla| SegmentIdentity { handle, dla })
        .collect())
}

/// Copy a segment's arrays out of its container
pub fn fetch_components(
    store: &ContainerStoreData,
    identity: &SegmentIdentity,
) -> DskResult<SegmentComponents> {
    let not_found = || DskError::SegmentNotFound {
        handle: identity.handle.0,
        descriptor: identity.dla.to_string(),
    };
    let source = store.containers.get(&identity.handle).ok_or_dsk(not_found)?;
    if !source.segments.contains(&identity.dla) {
        return Err(not_found());
    }

    let dla = &identity.dla;
    let outside = || DskError::malformed(format!("segment {} lies outside its container", dla));
    let ints = dla
        .int_base
        .checked_add(dla.int_size)
        .and_then(|end| source.ints.get(dla.int_base..end))
        .ok_or_dsk(outside)?;
    let doubles = dla
        .dp_base
        .checked_add(dla.dp_size)
        .and_then(|end| source.doubles.get(dla.dp_base..end))
        .ok_or_dsk(outside)?;

    Ok(SegmentComponents {
        ints: ints.to_vec(),
        doubles: doubles.to_vec(),
    })
}

// ============================================================================
// PERSISTENCE
// ============================================================================

fn io_error(path: &Path, error: std::io::Error) -> DskError {
    DskError::Io {
        path: path.display().to_string(),
        error,
    }
}

/// Fixed header (magic, version, CRC-32, payload length) then the bincode payload
fn container_image(container: &ContainerData) -> DskResult<Vec<u8>> {
    let payload = bincode::serialize(container).context("container image")?;

    let mut bytes = Vec::with_capacity(CONTAINER_HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&CONTAINER_MAGIC);
    bytes.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Write a container to disk: fixed header then the bincode payload.
/// The file is written beside the target and renamed into place.
pub fn save_container(
    store: &ContainerStoreData,
    handle: ContainerHandle,
    path: &Path,
) -> DskResult<()> {
    let bytes = container_image(container(store, handle)?)?;

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, &bytes).map_err(|e| io_error(&temp_path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| io_error(path, e))?;

    log::info!(
        "[Storage] Saved container {} to {} ({} bytes)",
        handle.0,
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// Read a saved container and open it under a fresh handle
pub fn open_container(store: &mut ContainerStoreData, path: &Path) -> DskResult<ContainerHandle> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    let container = parse_container(&bytes)?;
    let segments = container.segments.len();
    let handle = open_handle(store, container);
    log::info!(
        "[Storage] Opened {} as container {} with {} segments",
        path.display(),
        handle.0,
        segments
    );
    Ok(handle)
}

fn parse_container(bytes: &[u8]) -> DskResult<ContainerData> {
    if bytes.len() < CONTAINER_HEADER_SIZE {
        return Err(DskError::malformed(format!(
            "container file is {} bytes, shorter than its header",
            bytes.len()
        )));
    }
    let (header, payload) = bytes.split_at(CONTAINER_HEADER_SIZE);
    if header[0..4] != CONTAINER_MAGIC {
        return Err(DskError::malformed("container file has the wrong magic bytes"));
    }

    let word = |at: usize| u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);
    let version = word(4);
    if version != CONTAINER_VERSION {
        return Err(DskError::malformed(format!(
            "container version {} is not supported",
            version
        )));
    }
    let checksum = word(8);
    let mut length = [0u8; 8];
    length.copy_from_slice(&header[12..20]);
    let length = u64::from_le_bytes(length);
    if length != payload.len() as u64 {
        return Err(DskError::malformed(format!(
            "container payload is {} bytes, header says {}",
            payload.len(),
            length
        )));
    }
    if crc32fast::hash(payload) != checksum {
        return Err(DskError::malformed("container checksum mismatch"));
    }

    let container: ContainerData = bincode::deserialize(payload)
        .map_err(|e| DskError::malformed(format!("container payload: {}", e)))?;
    for dla in &container.segments {
        let fits = |base: usize, size: usize, len: usize| {
            base.checked_add(size).is_some_and(|end| end <= len)
        };
        if !fits(dla.int_base, dla.int_size, container.ints.len())
            || !fits(dla.dp_base, dla.dp_size, container.doubles.len())
        {
            return Err(DskError::malformed(format!(
                "segment {} lies outside its container",
                dla
            )));
        }
    }
    Ok(container)
}
