//! # rvnmet Algorithms
//!
//! Gap-filling of meteorological station observations.
//!
//! ## Modules
//!
//! - **reproject**: WGS84 station coordinates → planar coordinates
//! - **interpolation**: donor search, IDW estimation, table infilling

pub mod interpolation;
pub(crate) mod maybe_rayon;
pub mod reproject;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        idw_estimate, infill, DonorIndex, IdwParams, InfillParams, InfillResult,
        MissingDataWarning, VariableStats,
    };
    pub use crate::reproject::{project_points, reproject, PlanarPoint};
    pub use rvnmet_core::prelude::*;
}
