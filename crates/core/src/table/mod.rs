//! Station observation tables
//!
//! Columnar storage with one row per station per date. Four fields are
//! required and typed (station identifier, date, longitude, latitude); every
//! other column is carried as a named [`Column`] in input order.

mod column;

pub use column::{Column, ColumnData};

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::error::{Error, Result};

/// Station identifier column name
pub const STATION_COLUMN: &str = "station_name";
/// Observation date column name
pub const DATE_COLUMN: &str = "date";
/// WGS84 longitude column name (degrees)
pub const LON_COLUMN: &str = "lon";
/// WGS84 latitude column name (degrees)
pub const LAT_COLUMN: &str = "lat";

/// Names that cannot be used for additional columns
pub const REQUIRED_COLUMNS: [&str; 4] = [STATION_COLUMN, DATE_COLUMN, LON_COLUMN, LAT_COLUMN];

/// Valid WGS84 longitudes (degrees)
pub const LON_RANGE: (f64, f64) = (-180.0, 180.0);
/// Valid WGS84 latitudes (degrees)
pub const LAT_RANGE: (f64, f64) = (-90.0, 90.0);

/// Reject non-finite or out-of-range geodetic coordinates.
///
/// A bad coordinate would project to NaN and poison every distance on its date.
pub fn check_coordinate(
    name: &'static str,
    value: f64,
    range: (f64, f64),
    row: usize,
) -> Result<()> {
    if value.is_finite() && value >= range.0 && value <= range.1 {
        return Ok(());
    }
    Err(Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: format!("row {} must be a finite value in [{}, {}]", row, range.0, range.1),
    })
}

/// One row, used to build small tables by hand
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub station: String,
    pub date: NaiveDate,
    pub lon: f64,
    pub lat: f64,
    pub values: Vec<Option<f64>>,
}

impl ObservationRow {
    pub fn new(station: impl Into<String>, date: NaiveDate, lon: f64, lat: f64) -> Self {
        Self {
            station: station.into(),
            date,
            lon,
            lat,
            values: Vec::new(),
        }
    }

    pub fn with_values(mut self, values: Vec<Option<f64>>) -> Self {
        self.values = values;
        self
    }
}

/// Per-station, per-date observations
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    stations: Vec<String>,
    dates: Vec<NaiveDate>,
    lon: Vec<f64>,
    lat: Vec<f64>,
    columns: Vec<Column>,
}

impl ObservationTable {
    /// Create a table from the required fields, with no additional columns.
    pub fn new(
        stations: Vec<String>,
        dates: Vec<NaiveDate>,
        lon: Vec<f64>,
        lat: Vec<f64>,
    ) -> Result<Self> {
        let n = stations.len();
        for (name, len) in [
            (DATE_COLUMN, dates.len()),
            (LON_COLUMN, lon.len()),
            (LAT_COLUMN, lat.len()),
        ] {
            if len != n {
                return Err(Error::LengthMismatch {
                    column: name.to_string(),
                    expected: n,
                    actual: len,
                });
            }
        }

        for (row, (&x, &y)) in lon.iter().zip(&lat).enumerate() {
            check_coordinate(LON_COLUMN, x, LON_RANGE, row)?;
            check_coordinate(LAT_COLUMN, y, LAT_RANGE, row)?;
        }

        Ok(Self {
            stations,
            dates,
            lon,
            lat,
            columns: Vec::new(),
        })
    }

    /// Build a table from rows, one numeric column per entry of `variables`.
    pub fn from_rows(variables: &[&str], rows: Vec<ObservationRow>) -> Result<Self> {
        let n = rows.len();
        let mut stations = Vec::with_capacity(n);
        let mut dates = Vec::with_capacity(n);
        let mut lon = Vec::with_capacity(n);
        let mut lat = Vec::with_capacity(n);
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(n); variables.len()];

        for row in rows {
            if row.values.len() != variables.len() {
                return Err(Error::LengthMismatch {
                    column: format!("values of {} on {}", row.station, row.date),
                    expected: variables.len(),
                    actual: row.values.len(),
                });
            }
            for (col, v) in values.iter_mut().zip(row.values) {
                col.push(v);
            }
            stations.push(row.station);
            dates.push(row.date);
            lon.push(row.lon);
            lat.push(row.lat);
        }

        let mut table = Self::new(stations, dates, lon, lat)?;
        for (name, col) in variables.iter().zip(values) {
            table.push_column(Column::numeric(*name, col))?;
        }
        Ok(table)
    }

    /// Append a column, builder style
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.push_column(column)?;
        Ok(self)
    }

    /// Append a column. Fails on a length mismatch or a name already in use.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if REQUIRED_COLUMNS.contains(&column.name()) || self.column(column.name()).is_some() {
            return Err(Error::DuplicateColumn(column.name().to_string()));
        }
        self.check_len(&column)?;
        self.columns.push(column);
        Ok(())
    }

    /// Replace the numeric column `name`, or append it if absent.
    pub fn set_numeric(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if REQUIRED_COLUMNS.contains(&name) {
            return Err(Error::DuplicateColumn(name.to_string()));
        }
        let column = Column::numeric(name, values);
        self.check_len(&column)?;
        match self.columns.iter_mut().find(|c| c.name() == name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    fn check_len(&self, column: &Column) -> Result<()> {
        if column.len() != self.n_rows() {
            return Err(Error::LengthMismatch {
                column: column.name().to_string(),
                expected: self.n_rows(),
                actual: column.len(),
            });
        }
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn station(&self, row: usize) -> &str {
        &self.stations[row]
    }

    pub fn date(&self, row: usize) -> NaiveDate {
        self.dates[row]
    }

    pub fn lon(&self, row: usize) -> f64 {
        self.lon[row]
    }

    pub fn lat(&self, row: usize) -> f64 {
        self.lat[row]
    }

    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn lons(&self) -> &[f64] {
        &self.lon
    }

    pub fn lats(&self) -> &[f64] {
        &self.lat
    }

    /// Additional columns in input order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Cells of numeric column `name`
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        let column = self
            .column(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        column
            .as_numeric()
            .ok_or_else(|| Error::NotNumeric(name.to_string()))
    }

    /// Mutable cells of numeric column `name`. The column length is fixed.
    pub fn numeric_mut(&mut self, name: &str) -> Result<&mut [Option<f64>]> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        match column.data_mut() {
            ColumnData::Numeric(v) => Ok(v.as_mut_slice()),
            ColumnData::Text(_) => Err(Error::NotNumeric(name.to_string())),
        }
    }

    /// Value of numeric column `name` at `row`
    pub fn value(&self, row: usize, name: &str) -> Result<Option<f64>> {
        Ok(self.numeric(name)?.get(row).copied().flatten())
    }

    /// Copy of the table restricted to `rows`, in that order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            stations: rows.iter().map(|&r| self.stations[r].clone()).collect(),
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            lon: rows.iter().map(|&r| self.lon[r]).collect(),
            lat: rows.iter().map(|&r| self.lat[r]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name(), c.data().select(rows)))
                .collect(),
        }
    }

    /// Indices of rows whose station is in `keep`, in table order
    pub fn rows_for_stations(&self, keep: &HashSet<&str>) -> Vec<usize> {
        self.stations
            .iter()
            .enumerate()
            .filter(|(_, s)| keep.contains(s.as_str()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Distinct station identifiers in order of first appearance
    pub fn unique_stations(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.stations
            .iter()
            .map(String::as_str)
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Earliest and latest date, `None` for an empty table
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.dates.iter().min()?;
        let max = self.dates.iter().max()?;
        Some((*min, *max))
    }

    /// Number of missing cells in numeric column `name`
    pub fn missing_count(&self, name: &str) -> Result<usize> {
        Ok(self.numeric(name)?.iter().filter(|v| v.is_none()).count())
    }
}
