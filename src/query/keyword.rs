//! Keyword enumeration of the diagnostic fetch surface
//!
//! Each keyword names one fixed array of a type 2 segment. Codes and names
//! are a stable contract; new keywords are appended.

use crate::error::{DskError, DskResult};
use std::fmt;
use std::str::FromStr;

/// Element type of a keyword's array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    Integer,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    VertexCount = 1,
    PlateCount = 2,
    TotalVoxelCount = 3,
    VoxelGridExtent = 4,
    CoarseScale = 5,
    VoxelPointerSize = 6,
    VoxelListSize = 7,
    VertexListSize = 8,
    Plates = 9,
    VoxelPointers = 10,
    VoxelPlateList = 11,
    VertexPointers = 12,
    VertexPlateList = 13,
    CoarseGridPointers = 14,
    Descriptor = 15,
    VertexBounds = 16,
    VoxelOrigin = 17,
    VoxelSize = 18,
    Vertices = 19,
}

const ALL_KEYWORDS: [Keyword; 19] = [
    Keyword::VertexCount,
    Keyword::PlateCount,
    Keyword::TotalVoxelCount,
    Keyword::VoxelGridExtent,
    Keyword::CoarseScale,
    Keyword::VoxelPointerSize,
    Keyword::VoxelListSize,
    Keyword::VertexListSize,
    Keyword::Plates,
    Keyword::VoxelPointers,
    Keyword::VoxelPlateList,
    Keyword::VertexPointers,
    Keyword::VertexPlateList,
    Keyword::CoarseGridPointers,
    Keyword::Descriptor,
    Keyword::VertexBounds,
    Keyword::VoxelOrigin,
    Keyword::VoxelSize,
    Keyword::Vertices,
];

impl Keyword {
    pub fn all() -> &'static [Keyword] {
        &ALL_KEYWORDS
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> DskResult<Self> {
        ALL_KEYWORDS
            .iter()
            .copied()
            .find(|k| k.code() == code)
            .ok_or_else(|| DskError::UnsupportedKeyword {
                keyword: code.to_string(),
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Keyword::VertexCount => "vertex-count",
            Keyword::PlateCount => "plate-count",
            Keyword::TotalVoxelCount => "total-voxel-count",
            Keyword::VoxelGridExtent => "voxel-grid-extent",
            Keyword::CoarseScale => "coarse-scale",
            Keyword::VoxelPointerSize => "voxel-pointer-size",
            Keyword::VoxelListSize => "voxel-list-size",
            Keyword::VertexListSize => "vertex-list-size",
            Keyword::Plates => "plates",
            Keyword::VoxelPointers => "voxel-pointers",
            Keyword::VoxelPlateList => "voxel-plate-list",
            Keyword::VertexPointers => "vertex-pointers",
            Keyword::VertexPlateList => "vertex-plate-list",
            Keyword::CoarseGridPointers => "coarse-grid-pointers",
            Keyword::Descriptor => "descriptor",
            Keyword::VertexBounds => "vertex-bounds",
            Keyword::VoxelOrigin => "voxel-origin",
            Keyword::VoxelSize => "voxel-size",
            Keyword::Vertices => "vertices",
        }
    }

    pub fn kind(self) -> KeywordKind {
        match self {
            Keyword::Descriptor
            | Keyword::VertexBounds
            | Keyword::VoxelOrigin
            | Keyword::VoxelSize
            | Keyword::Vertices => KeywordKind::Double,
            _ => KeywordKind::Integer,
        }
    }

    /// Integer keywords holding exactly one value
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Keyword::VertexCount
                | Keyword::PlateCount
                | Keyword::TotalVoxelCount
                | Keyword::CoarseScale
                | Keyword::VoxelPointerSize
                | Keyword::VoxelListSize
                | Keyword::VertexListSize
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Keyword {
    type Err = DskError;

    fn from_str(name: &str) -> DskResult<Self> {
        ALL_KEYWORDS
            .iter()
            .copied()
            .find(|k| k.name() == name)
            .ok_or_else(|| DskError::UnsupportedKeyword {
                keyword: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        for (position, keyword) in Keyword::all().iter().enumerate() {
            assert_eq!(keyword.code(), position as i32 + 1);
            assert_eq!(Keyword::from_code(keyword.code()).expect("known"), *keyword);
            assert_eq!(keyword.name().parse::<Keyword>().expect("known"), *keyword);
        }
        assert_eq!(Keyword::CoarseGridPointers.code(), 14);
        assert_eq!(Keyword::Vertices.code(), 19);
    }

    #[test]
    fn test_unknown_keywords() {
        assert!(matches!(
            Keyword::from_code(0),
            Err(DskError::UnsupportedKeyword { .. })
        ));
        assert!(matches!(
            Keyword::from_code(20),
            Err(DskError::UnsupportedKeyword { .. })
        ));
        match "voxel-count".parse::<Keyword>() {
            Err(DskError::UnsupportedKeyword { keyword }) => assert_eq!(keyword, "voxel-count"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Keyword::Plates.kind(), KeywordKind::Integer);
        assert_eq!(Keyword::VoxelSize.kind(), KeywordKind::Double);
        assert!(Keyword::TotalVoxelCount.is_scalar());
        assert!(!Keyword::VoxelGridExtent.is_scalar());
        assert!(!Keyword::VoxelSize.is_scalar());
    }
}
