//! Error handling for the DSK engine
//!
//! Every fallible operation returns [`DskResult`]. Variants carry the offending
//! value so callers can match on kind and value without parsing messages.

use std::fmt;

/// Array or workspace bound a builder or writer can overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapacityBound {
    /// Total (voxel, plate) insertions made while binning
    Workspace,
    VoxelPointers,
    VoxelPlateList,
    /// Size of the whole flat integer spatial index component
    IntegerComponent,
    CoarseGrid,
    VoxelCount,
    Vertices,
    Plates,
}

impl fmt::Display for CapacityBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapacityBound::Workspace => "workspace",
            CapacityBound::VoxelPointers => "voxel pointer array",
            CapacityBound::VoxelPlateList => "voxel-plate list",
            CapacityBound::IntegerComponent => "integer spatial index component",
            CapacityBound::CoarseGrid => "coarse voxel grid",
            CapacityBound::VoxelCount => "fine voxel count",
            CapacityBound::Vertices => "vertex count",
            CapacityBound::Plates => "plate count",
        };
        f.write_str(name)
    }
}

/// Main error type for the DSK engine
#[derive(Debug, thiserror::Error)]
pub enum DskError {
    // Builder Errors
    #[error("Capacity exceeded for {bound}: required {required}, limit {limit}")]
    CapacityExceeded {
        bound: CapacityBound,
        required: usize,
        limit: usize,
    },

    #[error("Degenerate geometry: {reason}")]
    DegenerateGeometry { reason: String },

    // Query Errors
    #[error("Unsupported keyword: {keyword}")]
    UnsupportedKeyword { keyword: String },

    #[error("Value out of range: {name} = {value}")]
    ValueOutOfRange { name: &'static str, value: String },

    #[error("Index out of range: {name} = {index}, valid range [{min}, {max}]")]
    IndexOutOfRange {
        name: &'static str,
        index: i64,
        min: i64,
        max: i64,
    },

    #[error("Ray direction is the zero vector")]
    InvalidDirection,

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // Segment Errors
    #[error("Segment not found: container {handle}, descriptor {descriptor}")]
    SegmentNotFound { handle: u32, descriptor: String },

    #[error("Malformed spatial index: {reason}")]
    MalformedIndex { reason: String },

    // System Errors
    #[error("IO error at {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("Serialization error in {context}: {error}")]
    Serialization { context: String, error: String },

    // Configuration Errors
    #[error("Invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },
}

/// Type alias for Results in the DSK engine
pub type DskResult<T> = Result<T, DskError>;

impl DskError {
    pub fn capacity(bound: CapacityBound, required: usize, limit: usize) -> Self {
        DskError::CapacityExceeded {
            bound,
            required,
            limit,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        DskError::MalformedIndex {
            reason: reason.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        DskError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        DskError::DegenerateGeometry {
            reason: reason.into(),
        }
    }

    pub fn value_out_of_range(name: &'static str, value: impl fmt::Display) -> Self {
        DskError::ValueOutOfRange {
            name,
            value: value.to_string(),
        }
    }

    pub fn index_out_of_range(name: &'static str, index: i64, min: i64, max: i64) -> Self {
        DskError::IndexOutOfRange {
            name,
            index,
            min,
            max,
        }
    }
}

// Helper functions for common error patterns

/// Convert Option to Result with a lazily built error
pub trait OptionExt<T> {
    fn ok_or_dsk<F>(self, f: F) -> DskResult<T>
    where
        F: FnOnce() -> DskError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_dsk<F>(self, f: F) -> DskResult<T>
    where
        F: FnOnce() -> DskError,
    {
        self.ok_or_else(f)
    }
}

/// Extension trait for turning foreign errors into serialization errors
pub trait ErrorContext<T> {
    fn context(self, context: &str) -> DskResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: fmt::Display,
{
    fn context(self, context: &str) -> DskResult<T> {
        self.map_err(|e| DskError::Serialization {
            context: context.to_string(),
            error: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DskError::capacity(CapacityBound::VoxelPlateList, 12, 10);
        assert_eq!(
            err.to_string(),
            "Capacity exceeded for voxel-plate list: required 12, limit 10"
        );

        let err = DskError::index_out_of_range("start", -1, 0, 3);
        assert_eq!(
            err.to_string(),
            "Index out of range: start = -1, valid range [0, 3]"
        );
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_dsk(|| DskError::malformed("test"));
        assert!(matches!(result, Err(DskError::MalformedIndex { .. })));
    }

    #[test]
    fn test_error_context() {
        let result: Result<i32, String> = Err("bad bytes".to_string());
        match result.context("decoding container") {
            Err(DskError::Serialization { context, error }) => {
                assert_eq!(context, "decoding container");
                assert_eq!(error, "bad bytes");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
