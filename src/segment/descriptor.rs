//! DSK segment descriptor
//!
//! Metadata stored ahead of every segment: surface and body identity, frame,
//! coordinate system with its parameters and bounds, and the time span of
//! validity. Serialised as the 24-element legacy double array.

use crate::constants::descriptor_layout::*;
use crate::constants::DSK_TYPE_PLATE_MODEL;
use crate::error::{DskError, DskResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Data class of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataClass {
    /// Single-valued surface: one radius per direction from the center
    SingleValued = 1,
    /// General surface: arbitrary closed or open shapes
    General = 2,
}

impl DataClass {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(DataClass::SingleValued),
            2 => Some(DataClass::General),
            _ => None,
        }
    }
}

/// Coordinate system used for the segment's coverage bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// Longitude, latitude, radius
    Latitudinal = 1,
    /// Radius, longitude, Z
    Cylindrical = 2,
    /// X, Y, Z
    Rectangular = 3,
    /// Longitude, latitude, altitude over a reference spheroid
    Planetodetic = 4,
}

impl CoordinateSystem {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(CoordinateSystem::Latitudinal),
            2 => Some(CoordinateSystem::Cylindrical),
            3 => Some(CoordinateSystem::Rectangular),
            4 => Some(CoordinateSystem::Planetodetic),
            _ => None,
        }
    }
}

/// DSK descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DskDescriptor {
    pub surface_id: i32,
    pub center_id: i32,
    pub data_class: DataClass,
    pub data_type: i32,
    pub frame_id: i32,
    pub coordinate_system: CoordinateSystem,
    /// Coordinate system parameters; planetodetic uses
    /// `[equatorial radius, flattening]`, the rest are zero
    pub parameters: [f64; NSYPAR],
    /// `[min, max]` of each of the three coordinates
    pub coordinate_bounds: [[f64; 2]; 3],
    /// `[begin, end]` of the validity interval, seconds past J2000 TDB
    pub time_bounds: [f64; 2],
}

impl Default for DskDescriptor {
    fn default() -> Self {
        Self {
            surface_id: 0,
            center_id: 0,
            data_class: DataClass::General,
            data_type: DSK_TYPE_PLATE_MODEL,
            frame_id: 0,
            coordinate_system: CoordinateSystem::Rectangular,
            parameters: [0.0; NSYPAR],
            coordinate_bounds: [[0.0; 2]; 3],
            time_bounds: [0.0; 2],
        }
    }
}

/// Flatten a descriptor into the 24-element legacy layout
pub fn descriptor_to_array(descriptor: &DskDescriptor) -> [f64; DSK_DESCRIPTOR_SIZE] {
    let mut out = [0.0; DSK_DESCRIPTOR_SIZE];
    out[SRFIDX] = descriptor.surface_id as f64;
    out[CTRIDX] = descriptor.center_id as f64;
    out[CLSIDX] = descriptor.data_class.code() as f64;
    out[TYPIDX] = descriptor.data_type as f64;
    out[FRMIDX] = descriptor.frame_id as f64;
    out[SYSIDX] = descriptor.coordinate_system.code() as f64;
    out[PARIDX..PARIDX + NSYPAR].copy_from_slice(&descriptor.parameters);

    let bounds = &descriptor.coordinate_bounds;
    out[MN1IDX] = bounds[0][0];
    out[MX1IDX] = bounds[0][1];
    out[MN2IDX] = bounds[1][0];
    out[MX2IDX] = bounds[1][1];
    out[MN3IDX] = bounds[2][0];
    out[MX3IDX] = bounds[2][1];

    out[BTMIDX] = descriptor.time_bounds[0];
    out[ETMIDX] = descriptor.time_bounds[1];
    out
}

/// Parse the 24-element legacy layout
pub fn descriptor_from_array(values: &[f64]) -> DskResult<DskDescriptor> {
    if values.len() != DSK_DESCRIPTOR_SIZE {
        return Err(DskError::malformed(format!(
            "DSK descriptor has {} elements, expected {}",
            values.len(),
            DSK_DESCRIPTOR_SIZE
        )));
    }

    let int_at = |idx: usize, what: &str| -> DskResult<i32> {
        let value = values[idx];
        if value.fract() != 0.0 || value.abs() > i32::MAX as f64 {
            return Err(DskError::malformed(format!(
                "DSK descriptor {} is not an integer: {}",
                what, value
            )));
        }
        Ok(value as i32)
    };

    let class_code = int_at(CLSIDX, "data class")?;
    let data_class = DataClass::from_code(class_code)
        .ok_or_else(|| DskError::malformed(format!("unknown data class {}", class_code)))?;
    let system_code = int_at(SYSIDX, "coordinate system")?;
    let coordinate_system = CoordinateSystem::from_code(system_code).ok_or_else(|| {
        DskError::malformed(format!("unknown coordinate system {}", system_code))
    })?;

    let mut parameters = [0.0; NSYPAR];
    parameters.copy_from_slice(&values[PARIDX..PARIDX + NSYPAR]);

    Ok(DskDescriptor {
        surface_id: int_at(SRFIDX, "surface ID")?,
        center_id: int_at(CTRIDX, "center ID")?,
        data_class,
        data_type: int_at(TYPIDX, "data type")?,
        frame_id: int_at(FRMIDX, "frame ID")?,
        coordinate_system,
        parameters,
        coordinate_bounds: [
            [values[MN1IDX], values[MX1IDX]],
            [values[MN2IDX], values[MX2IDX]],
            [values[MN3IDX], values[MX3IDX]],
        ],
        time_bounds: [values[BTMIDX], values[ETMIDX]],
    })
}

/// Check a descriptor before it is written to a type 2 segment
pub fn validate_descriptor(descriptor: &DskDescriptor) -> DskResult<()> {
    if descriptor.data_type != DSK_TYPE_PLATE_MODEL {
        return Err(DskError::value_out_of_range(
            "data type",
            descriptor.data_type,
        ));
    }

    let all_values = descriptor
        .parameters
        .iter()
        .chain(descriptor.coordinate_bounds.iter().flatten())
        .chain(descriptor.time_bounds.iter());
    if all_values.into_iter().any(|v| !v.is_finite()) {
        return Err(DskError::invalid_input("DSK descriptor holds a non-finite value"));
    }

    let [begin, end] = descriptor.time_bounds;
    if begin > end {
        return Err(DskError::value_out_of_range(
            "time bounds",
            format!("[{}, {}]", begin, end),
        ));
    }

    for (axis, [lo, hi]) in descriptor.coordinate_bounds.iter().copied().enumerate() {
        if lo >= hi {
            return Err(DskError::value_out_of_range(
                coordinate_name(descriptor.coordinate_system, axis),
                format!("[{}, {}]", lo, hi),
            ));
        }
    }

    let bounds = &descriptor.coordinate_bounds;
    match descriptor.coordinate_system {
        CoordinateSystem::Latitudinal | CoordinateSystem::Planetodetic => {
            check_longitude(bounds[0])?;
            let [lat_lo, lat_hi] = bounds[1];
            if lat_lo < -FRAC_PI_2 || lat_hi > FRAC_PI_2 {
                return Err(DskError::value_out_of_range(
                    "latitude bounds",
                    format!("[{}, {}]", lat_lo, lat_hi),
                ));
            }
            if descriptor.coordinate_system == CoordinateSystem::Latitudinal && bounds[2][0] < 0.0
            {
                return Err(DskError::value_out_of_range("radius bounds", bounds[2][0]));
            }
            if descriptor.coordinate_system == CoordinateSystem::Planetodetic {
                let [re, flattening] = [descriptor.parameters[0], descriptor.parameters[1]];
                if re <= 0.0 {
                    return Err(DskError::value_out_of_range("equatorial radius", re));
                }
                if flattening >= 1.0 {
                    return Err(DskError::value_out_of_range("flattening", flattening));
                }
            }
        }
        CoordinateSystem::Cylindrical => {
            check_longitude(bounds[1])?;
            if bounds[0][0] < 0.0 {
                return Err(DskError::value_out_of_range("radius bounds", bounds[0][0]));
            }
        }
        CoordinateSystem::Rectangular => {}
    }

    Ok(())
}

fn check_longitude([lo, hi]: [f64; 2]) -> DskResult<()> {
    if lo < -TAU || hi > TAU || hi - lo > TAU {
        return Err(DskError::value_out_of_range(
            "longitude bounds",
            format!("[{}, {}]", lo, hi),
        ));
    }
    Ok(())
}

fn coordinate_name(system: CoordinateSystem, axis: usize) -> &'static str {
    const LATITUDINAL: [&str; 3] = ["longitude bounds", "latitude bounds", "radius bounds"];
    const CYLINDRICAL: [&str; 3] = ["radius bounds", "longitude bounds", "z bounds"];
    const RECTANGULAR: [&str; 3] = ["x bounds", "y bounds", "z bounds"];
    const PLANETODETIC: [&str; 3] = ["longitude bounds", "latitude bounds", "altitude bounds"];
    let names = match system {
        CoordinateSystem::Latitudinal => LATITUDINAL,
        CoordinateSystem::Cylindrical => CYLINDRICAL,
        CoordinateSystem::Rectangular => RECTANGULAR,
        CoordinateSystem::Planetodetic => PLANETODETIC,
    };
    names[axis.min(2)]
}
