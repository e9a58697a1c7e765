//! # rvnmet Core
//!
//! Core types and I/O for meteorological station infilling.
//!
//! This crate provides:
//! - `ObservationTable`: per-station, per-date observations
//! - `Projection`: WGS84 → planar coordinate transforms
//! - CSV reading and writing of observation tables

pub mod crs;
pub mod error;
pub mod io;
pub mod table;

pub use crs::{Projection, DEFAULT_EPSG};
pub use error::{Error, Result};
pub use table::{Column, ColumnData, ObservationRow, ObservationTable};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Projection;
    pub use crate::error::{Error, Result};
    pub use crate::table::{Column, ColumnData, ObservationRow, ObservationTable};
}
