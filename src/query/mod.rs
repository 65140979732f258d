//! Spatial Index Query Façade
//!
//! Keyword-addressed fetches over stored segments and the ray/point query
//! engine built on the voxel index.

pub mod keyword;

// Data structures
pub mod query_data;

// Pure functions
pub mod intercept_operations;

// Executor
pub mod query_executor;

pub use keyword::{Keyword, KeywordKind};
pub use query_data::{BoundingSummary, NearestPlatePoint, PlateIntercept, PlateModelCounts};

pub use intercept_operations::{intercept, nearest_point};
pub use query_executor::QueryExecutor;
