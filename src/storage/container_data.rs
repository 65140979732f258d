//! Container storage data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in container_operations.rs

use crate::segment::{ContainerHandle, DlaDescriptor};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Magic bytes opening a saved container file
pub const CONTAINER_MAGIC: [u8; 4] = *b"DSKC";

/// Saved container format version
pub const CONTAINER_VERSION: u32 = 1;

/// Header length: magic, version, payload checksum, payload length
pub const CONTAINER_HEADER_SIZE: usize = 4 + 4 + 4 + 8;

/// One container: shared integer and double address spaces plus the segment
/// directory in write order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerData {
    pub ints: Vec<i32>,
    pub doubles: Vec<f64>,
    pub segments: Vec<DlaDescriptor>,
}

/// All open containers, by handle
#[derive(Debug, Default)]
pub struct ContainerStoreData {
    pub containers: FxHashMap<ContainerHandle, ContainerData>,
    /// Next handle to hand out; handles are never reused
    pub next_handle: u32,
}
