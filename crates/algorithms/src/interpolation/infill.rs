//! IDW infilling of an observation table
//!
//! For every requested variable, each missing cell of the output rows is
//! estimated from the other stations' valid values on the same date,
//! weighted by inverse planar distance. Estimates only ever read the input
//! table, never other estimates, so cells are computed independently and
//! written back once per variable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

use rvnmet_core::{Error, ObservationTable, Projection, Result, DEFAULT_EPSG};

use super::{idw_estimate, DonorIndex, IdwParams};
use crate::maybe_rayon::*;
use crate::reproject::{attach_points, project_points};

/// Variables infilled when the caller does not name any
pub const DEFAULT_VARIABLES: [&str; 3] = ["max_temp", "min_temp", "total_precip"];

/// Parameters for [`infill`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfillParams {
    /// Numeric columns to infill, processed in order
    pub variables: Vec<String>,
    /// Stations to infill and return. `None` means every station.
    /// Stations outside this set still act as donors.
    pub key_stations: Option<Vec<String>>,
    /// EPSG code of the planar projection used for distances
    /// (default: 26917, NAD83 / UTM zone 17N). Pick one that suits the
    /// station locations; a distant zone skews distances without error.
    pub projection: u32,
    /// Weighting and donor selection
    pub idw: IdwParams,
}

impl Default for InfillParams {
    fn default() -> Self {
        Self {
            variables: DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect(),
            key_stations: None,
            projection: DEFAULT_EPSG,
            idw: IdwParams::default(),
        }
    }
}

impl InfillParams {
    pub fn validate(&self) -> Result<()> {
        if self.variables.is_empty() {
            return Err(Error::InvalidParameter {
                name: "variables",
                value: "[]".into(),
                reason: "at least one variable is required".into(),
            });
        }
        let mut seen = HashSet::new();
        for v in &self.variables {
            if !seen.insert(v.as_str()) {
                return Err(Error::InvalidParameter {
                    name: "variables",
                    value: v.clone(),
                    reason: "listed more than once".into(),
                });
            }
        }
        self.idw.validate()
    }
}

/// A cell left missing because no donor held a value on its date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingDataWarning {
    pub station: String,
    pub date: NaiveDate,
    pub variable: String,
}

impl fmt::Display for MissingDataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no donor for {} at station {} on {}",
            self.variable, self.station, self.date
        )
    }
}

/// Per-variable counts from one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableStats {
    pub variable: String,
    /// Missing cells among the output rows before infilling
    pub missing: usize,
    /// Cells that received an estimate
    pub filled: usize,
    /// Cells still missing afterwards
    pub unfilled: usize,
}

/// Output of [`infill`]
#[derive(Debug, Clone)]
pub struct InfillResult {
    /// Infilled copy of the input (or of its key-station rows), with
    /// projected coordinate columns added
    pub table: ObservationTable,
    /// One entry per cell left missing
    pub warnings: Vec<MissingDataWarning>,
    /// Counts per variable, in processing order
    pub stats: Vec<VariableStats>,
}

impl InfillResult {
    /// Total number of cells filled across variables
    pub fn filled(&self) -> usize {
        self.stats.iter().map(|s| s.filled).sum()
    }

    /// True when no requested cell was left missing
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Fill missing values of `params.variables` by inverse distance weighting.
///
/// # Algorithm
///
/// 1. Resolve the projection and project every input row once.
/// 2. Copy the input, restricted to the key stations when given.
/// 3. Per variable, index the input's valid rows by date, then for each
///    missing output cell gather same-date donors from the full input and
///    combine them with [`idw_estimate`].
///
/// Non-missing cells are never modified, so running this again on its own
/// output leaves earlier estimates untouched.
///
/// # Errors
/// Fails before producing any output on an invalid projection, invalid
/// parameters, or a variable that is absent or not numeric. Cells without
/// donors are not errors: they stay missing and are reported in
/// [`InfillResult::warnings`].
pub fn infill(table: &ObservationTable, params: &InfillParams) -> Result<InfillResult> {
    params.validate()?;
    let projection = Projection::from_epsg(params.projection)?;
    for variable in &params.variables {
        table.numeric(variable)?;
    }

    let points = project_points(table, &projection);

    let (target_rows, mut output) = match &params.key_stations {
        Some(keys) => {
            let keep: HashSet<&str> = keys.iter().map(String::as_str).collect();
            let rows = table.rows_for_stations(&keep);
            let present: HashSet<&str> = rows.iter().map(|&r| table.station(r)).collect();
            for key in keep.difference(&present) {
                warn!(station = %key, "key station has no rows in the input table");
            }
            let subset = table.select_rows(&rows);
            (rows, subset)
        }
        None => ((0..table.n_rows()).collect::<Vec<_>>(), table.clone()),
    };

    let target_points: Vec<_> = target_rows.iter().map(|&r| points[r]).collect();
    attach_points(&mut output, &target_points)?;

    info!(
        rows = target_rows.len(),
        donors = table.n_rows(),
        projection = %projection,
        "infilling {} variable(s)",
        params.variables.len()
    );

    let mut warnings = Vec::new();
    let mut stats = Vec::with_capacity(params.variables.len());

    for variable in &params.variables {
        let values = table.numeric(variable)?;
        let index = DonorIndex::build(table.dates(), values);

        let missing: Vec<usize> = (0..target_rows.len())
            .filter(|&out_row| values[target_rows[out_row]].is_none())
            .collect();
        let n_missing = missing.len();

        let estimates: Vec<(usize, Option<f64>)> = missing
            .into_par_iter()
            .map(|out_row| {
                let row = target_rows[out_row];
                let donors = index.donors(row, table.date(row), &points, values, &params.idw);
                let estimate =
                    idw_estimate(&donors, params.idw.power, params.idw.snap_distance);
                (out_row, estimate)
            })
            .collect();

        let cells = output.numeric_mut(variable)?;
        let mut filled = 0;
        for (out_row, estimate) in estimates {
            match estimate {
                Some(value) => {
                    cells[out_row] = Some(value);
                    filled += 1;
                }
                None => {
                    let row = target_rows[out_row];
                    let warning = MissingDataWarning {
                        station: table.station(row).to_string(),
                        date: table.date(row),
                        variable: variable.clone(),
                    };
                    debug!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        let unfilled = n_missing - filled;
        if unfilled > 0 {
            warn!(
                variable = %variable,
                unfilled,
                "cells left missing: no donor station on those dates"
            );
        }
        debug!(variable = %variable, missing = n_missing, filled, "variable done");

        stats.push(VariableStats {
            variable: variable.clone(),
            missing: n_missing,
            filled,
            unfilled,
        });
    }

    Ok(InfillResult {
        table: output,
        warnings,
        stats,
    })
}
