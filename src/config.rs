//! Spatial index builder configuration
//!
//! Builder hints and capacity limits. Loaded from TOML or built in code;
//! every field has a default so partial files are accepted.

use crate::constants::builder_defaults::*;
use crate::constants::capacity::{MAX_COARSE_CELLS, MAX_VOXELS};
use crate::error::{DskError, DskResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for building a voxel grid spatial index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Fine voxel scale; `None` picks `max(1, np^0.23 / 8)` from the plate count
    pub fine_scale: Option<f64>,
    /// Coarse cell edge length in fine voxels
    pub coarse_scale: u32,
    /// Maximum number of (voxel, plate) insertions made while binning
    pub work_size: usize,
    pub voxel_pointer_capacity: usize,
    pub voxel_list_capacity: usize,
    /// Maximum size of the flat integer spatial index component
    pub integer_capacity: usize,
    pub build_vertex_plate_map: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            fine_scale: None,
            coarse_scale: DEFAULT_COARSE_SCALE,
            work_size: DEFAULT_WORK_SIZE,
            voxel_pointer_capacity: DEFAULT_VOXEL_POINTER_CAPACITY,
            voxel_list_capacity: DEFAULT_VOXEL_LIST_CAPACITY,
            integer_capacity: DEFAULT_INTEGER_CAPACITY,
            build_vertex_plate_map: true,
        }
    }
}

impl IndexConfig {
    /// Default configuration with an explicit fine scale
    pub fn with_fine_scale(fine_scale: f64) -> Self {
        Self {
            fine_scale: Some(fine_scale),
            ..Self::default()
        }
    }

    /// Fine scale heuristic used when none is configured
    pub fn default_fine_scale(plate_count: usize) -> f64 {
        ((plate_count as f64).powf(0.23) / 8.0).max(1.0)
    }

    /// Fine scale for a plate set of the given size
    pub fn resolved_fine_scale(&self, plate_count: usize) -> f64 {
        self.fine_scale
            .unwrap_or_else(|| Self::default_fine_scale(plate_count))
    }

    /// Validate configuration
    pub fn validate(&self) -> DskResult<()> {
        if let Some(scale) = self.fine_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(invalid("fine_scale", scale, "must be finite and positive"));
            }
        }

        if self.coarse_scale == 0 {
            return Err(invalid("coarse_scale", self.coarse_scale, "must be at least 1"));
        }

        let coarse_cube = (self.coarse_scale as u64).pow(3);
        if coarse_cube > MAX_VOXELS as u64 {
            return Err(invalid(
                "coarse_scale",
                self.coarse_scale,
                "coarse cell holds more fine voxels than a grid may contain",
            ));
        }

        if self.work_size == 0 {
            return Err(invalid("work_size", self.work_size, "must be positive"));
        }
        if self.voxel_pointer_capacity == 0 {
            return Err(invalid(
                "voxel_pointer_capacity",
                self.voxel_pointer_capacity,
                "must be positive",
            ));
        }
        if self.voxel_list_capacity == 0 {
            return Err(invalid(
                "voxel_list_capacity",
                self.voxel_list_capacity,
                "must be positive",
            ));
        }
        if self.integer_capacity <= MAX_COARSE_CELLS {
            return Err(invalid(
                "integer_capacity",
                self.integer_capacity,
                "must exceed the fixed coarse grid region",
            ));
        }

        log::debug!(
            "[IndexConfig] Validated: fine_scale={:?}, coarse_scale={}, work_size={}",
            self.fine_scale,
            self.coarse_scale,
            self.work_size
        );

        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> DskError {
    DskError::InvalidConfig {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse and validate a configuration from TOML text
pub fn parse_index_config(text: &str) -> DskResult<IndexConfig> {
    let config: IndexConfig = toml::from_str(text).map_err(|e| DskError::InvalidConfig {
        field: "<toml>".to_string(),
        value: String::new(),
        reason: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a configuration from a TOML file
pub fn load_index_config(path: &Path) -> DskResult<IndexConfig> {
    let text = std::fs::read_to_string(path).map_err(|error| DskError::Io {
        path: path.display().to_string(),
        error,
    })?;
    log::info!("[IndexConfig] Loading configuration from {}", path.display());
    parse_index_config(&text)
}

/// Render a configuration as TOML text
pub fn index_config_to_toml(config: &IndexConfig) -> DskResult<String> {
    use crate::error::ErrorContext;
    toml::to_string(config).context("index config")
}
