//! Donor search
//!
//! A donor for a missing cell is any row on the same date with a valid
//! value for the same variable. Rows are grouped by date once per variable,
//! so each lookup only touches that date's valid rows.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::{Donor, IdwParams};
use crate::reproject::PlanarPoint;

/// Date → rows holding a valid value, for one variable
#[derive(Debug, Clone, Default)]
pub struct DonorIndex {
    by_date: HashMap<NaiveDate, Vec<usize>>,
}

impl DonorIndex {
    /// Index the rows of `values` that are present, grouped by `dates`.
    ///
    /// `dates` and `values` are parallel columns of the same table.
    pub fn build(dates: &[NaiveDate], values: &[Option<f64>]) -> Self {
        let mut by_date: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
        for (row, (date, value)) in dates.iter().zip(values).enumerate() {
            if value.is_some() {
                by_date.entry(*date).or_default().push(row);
            }
        }
        Self { by_date }
    }

    /// Rows with a valid value on `date`, in table order
    pub fn candidates(&self, date: NaiveDate) -> &[usize] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct dates with at least one valid value
    pub fn n_dates(&self) -> usize {
        self.by_date.len()
    }

    /// Donors for `target`, with their planar distance to it.
    ///
    /// Applies `max_radius` and then `max_donors` (nearest first, ties kept
    /// in table order). The target row itself is never its own donor, and
    /// rows at a non-finite distance are skipped.
    pub fn donors(
        &self,
        target: usize,
        date: NaiveDate,
        points: &[PlanarPoint],
        values: &[Option<f64>],
        params: &IdwParams,
    ) -> Vec<Donor> {
        let origin = points[target];
        let mut donors: Vec<Donor> = self
            .candidates(date)
            .iter()
            .filter(|&&row| row != target)
            .filter_map(|&row| {
                let value = values[row]?;
                Some(Donor {
                    row,
                    value,
                    distance: origin.distance(&points[row]),
                })
            })
            .filter(|d| d.distance.is_finite())
            .filter(|d| params.max_radius.map_or(true, |r| d.distance <= r))
            .collect();

        if let Some(max) = params.max_donors {
            if donors.len() > max {
                donors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
                donors.truncate(max);
            }
        }

        donors
    }
}
