//! Spatial infilling of station observations
//!
//! - Donor search: valid rows on the same date, indexed per variable
//! - IDW: Inverse Distance Weighting of donor values
//! - Infill: per-variable driver writing estimates into missing cells

mod donor;
mod idw;
mod infill;

pub use donor::DonorIndex;
pub use idw::{idw_estimate, IdwParams};
pub use infill::{
    infill, InfillParams, InfillResult, MissingDataWarning, VariableStats, DEFAULT_VARIABLES,
};

/// A row able to supply a value for a missing cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Donor {
    /// Row index in the input table
    pub row: usize,
    /// The donor's value for the variable being infilled
    pub value: f64,
    /// Planar distance to the target row
    pub distance: f64,
}
