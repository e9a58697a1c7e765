//! Inverse Distance Weighting (IDW) estimation
//!
//! Combines donor values into a single estimate, weighting each donor by
//! the reciprocal of its distance raised to a power parameter.
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use rvnmet_core::{Error, Result};
use serde::{Deserialize, Serialize};

use super::Donor;

/// Parameters for IDW estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdwParams {
    /// Power parameter (default: 2.0).
    /// Higher values give more weight to nearby donors.
    pub power: f64,
    /// Donors at or below this distance are used directly
    /// (avoids the singularity at distance 0).
    pub snap_distance: f64,
    /// Maximum search radius. Donors beyond this distance are ignored.
    /// `None` means every donor on the date is used.
    pub max_radius: Option<f64>,
    /// Maximum number of nearest donors to use.
    /// `None` means use all donors within radius.
    pub max_donors: Option<usize>,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            snap_distance: 1e-10,
            max_radius: None,
            max_donors: None,
        }
    }
}

impl IdwParams {
    /// Reject parameters that would make the weights meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.power.is_finite() || self.power <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "power",
                value: self.power.to_string(),
                reason: "must be a finite number greater than 0".into(),
            });
        }
        if !self.snap_distance.is_finite() || self.snap_distance < 0.0 {
            return Err(Error::InvalidParameter {
                name: "snap_distance",
                value: self.snap_distance.to_string(),
                reason: "must be a finite number >= 0".into(),
            });
        }
        if let Some(r) = self.max_radius {
            if !r.is_finite() || r <= 0.0 {
                return Err(Error::InvalidParameter {
                    name: "max_radius",
                    value: r.to_string(),
                    reason: "must be a finite number greater than 0".into(),
                });
            }
        }
        if self.max_donors == Some(0) {
            return Err(Error::InvalidParameter {
                name: "max_donors",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Estimate a value from its donors.
///
/// ```text
/// z = Σ(wi * zi) / Σ(wi)
/// where wi = 1 / di^p
/// ```
///
/// - no donors → `None`
/// - one donor → its value, unweighted
/// - any donor within `snap_distance` → the first such donor's value
pub fn idw_estimate(donors: &[Donor], power: f64, snap_distance: f64) -> Option<f64> {
    let first = match donors {
        [] => return None,
        [only] => return Some(only.value),
        [first, ..] => first,
    };

    if let Some(snapped) = donors.iter().find(|d| d.distance <= snap_distance) {
        return Some(snapped.value);
    }

    let mut sum_w = 0.0;
    let mut sum_wz = 0.0;
    for d in donors {
        let w = 1.0 / d.distance.powf(power);
        sum_w += w;
        sum_wz += w * d.value;
    }

    let estimate = sum_wz / sum_w;
    if estimate.is_finite() {
        Some(estimate)
    } else {
        // Weights overflowed; the nearest donor dominates anyway
        let nearest = donors
            .iter()
            .fold(first, |best, d| if d.distance < best.distance { d } else { best });
        Some(nearest.value)
    }
}
