//! Station reprojection
//!
//! Every row's WGS84 longitude/latitude is projected once, up front, for the
//! whole table: any station may end up as a donor for another, whether or not
//! its own cells need infilling.

use rvnmet_core::{ObservationTable, Projection, Result};
use serde::{Deserialize, Serialize};

use crate::maybe_rayon::*;

/// Projected easting column added to infilled tables
pub const X_PROJ_COLUMN: &str = "x_proj";
/// Projected northing column added to infilled tables
pub const Y_PROJ_COLUMN: &str = "y_proj";

/// A planar (projected) coordinate, in projection units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist_sq(&self, other: &PlanarPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &PlanarPoint) -> f64 {
        self.dist_sq(other).sqrt()
    }
}

/// Project every row of `table`; the result is indexed by row.
pub fn project_points(table: &ObservationTable, projection: &Projection) -> Vec<PlanarPoint> {
    let lons = table.lons();
    let lats = table.lats();
    (0..table.n_rows())
        .into_par_iter()
        .map(|row| {
            let (x, y) = projection.project(lons[row], lats[row]);
            PlanarPoint::new(x, y)
        })
        .collect()
}

/// Copy of `table` with [`X_PROJ_COLUMN`] and [`Y_PROJ_COLUMN`] set.
///
/// Existing projected columns (from an earlier run) are overwritten in place.
pub fn reproject(table: &ObservationTable, projection: &Projection) -> Result<ObservationTable> {
    let points = project_points(table, projection);
    let mut output = table.clone();
    attach_points(&mut output, &points)?;
    Ok(output)
}

/// Write projected coordinates into `table`, one point per row.
pub(crate) fn attach_points(table: &mut ObservationTable, points: &[PlanarPoint]) -> Result<()> {
    table.set_numeric(X_PROJ_COLUMN, points.iter().map(|p| Some(p.x)).collect())?;
    table.set_numeric(Y_PROJ_COLUMN, points.iter().map(|p| Some(p.y)).collect())?;
    Ok(())
}
