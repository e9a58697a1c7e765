//! CSV observation tables
//!
//! The header must contain `station_name`, `date` (`YYYY-MM-DD`), `lon` and
//! `lat`. Every other column becomes numeric when all of its non-missing
//! cells parse as `f64`, and text otherwise. Missing cells are written back
//! as empty fields.

use chrono::NaiveDate;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::table::{
    Column, ColumnData, ObservationTable, DATE_COLUMN, LAT_COLUMN, LAT_RANGE, LON_COLUMN,
    LON_RANGE, STATION_COLUMN,
};

/// Date format used for the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Cell contents read as missing (compared after trimming)
pub const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "nan"];

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// Read an observation table from a CSV file
pub fn read_observations_csv<P: AsRef<Path>>(path: P) -> Result<ObservationTable> {
    let file = File::open(path.as_ref())?;
    read_observations(file)
}

/// Read an observation table from any CSV source
pub fn read_observations<R: Read>(reader: R) -> Result<ObservationTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    };
    let station_idx = position(STATION_COLUMN)?;
    let date_idx = position(DATE_COLUMN)?;
    let lon_idx = position(LON_COLUMN)?;
    let lat_idx = position(LAT_COLUMN)?;
    let required = [station_idx, date_idx, lon_idx, lat_idx];

    let mut stations = Vec::new();
    let mut dates = Vec::new();
    let mut lon = Vec::new();
    let mut lat = Vec::new();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = i + 2;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        stations.push(cell(station_idx).to_string());
        dates.push(
            NaiveDate::parse_from_str(cell(date_idx), DATE_FORMAT).map_err(|e| Error::Parse {
                line,
                column: DATE_COLUMN.to_string(),
                value: cell(date_idx).to_string(),
                reason: e.to_string(),
            })?,
        );
        lon.push(parse_coordinate(cell(lon_idx), line, LON_COLUMN, LON_RANGE)?);
        lat.push(parse_coordinate(cell(lat_idx), line, LAT_COLUMN, LAT_RANGE)?);

        for (idx, column) in raw.iter_mut().enumerate() {
            if !required.contains(&idx) {
                column.push(cell(idx).to_string());
            }
        }
    }

    let mut table = ObservationTable::new(stations, dates, lon, lat)?;
    for (idx, cells) in raw.into_iter().enumerate() {
        if required.contains(&idx) {
            continue;
        }
        table.push_column(infer_column(&headers[idx], cells))?;
    }

    Ok(table)
}

fn parse_coordinate(cell: &str, line: usize, column: &str, range: (f64, f64)) -> Result<f64> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= range.0 && *v <= range.1)
        .ok_or_else(|| Error::Parse {
            line,
            column: column.to_string(),
            value: cell.to_string(),
            reason: format!("expected a finite number in [{}, {}]", range.0, range.1),
        })
}

fn infer_column(name: &str, cells: Vec<String>) -> Column {
    let numeric: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|c| {
            if is_missing(c) {
                Some(None)
            } else {
                c.parse::<f64>().ok().map(Some)
            }
        })
        .collect();

    match numeric {
        Some(values) => Column::numeric(name, values),
        None => Column::text(
            name,
            cells
                .into_iter()
                .map(|c| if is_missing(&c) { None } else { Some(c) })
                .collect(),
        ),
    }
}

/// Write an observation table to a CSV file
pub fn write_observations_csv<P: AsRef<Path>>(table: &ObservationTable, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_observations(table, file)
}

/// Write an observation table to any CSV sink.
///
/// Required columns come first, then the additional columns in table order.
pub fn write_observations<W: Write>(table: &ObservationTable, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![STATION_COLUMN, DATE_COLUMN, LON_COLUMN, LAT_COLUMN];
    header.extend(table.columns().iter().map(Column::name));
    writer.write_record(&header)?;

    let mut record: Vec<String> = Vec::with_capacity(header.len());
    for row in 0..table.n_rows() {
        record.clear();
        record.push(table.station(row).to_string());
        record.push(table.date(row).format(DATE_FORMAT).to_string());
        record.push(table.lon(row).to_string());
        record.push(table.lat(row).to_string());
        for column in table.columns() {
            let cell = match column.data() {
                ColumnData::Numeric(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
                ColumnData::Text(v) => v[row].clone().unwrap_or_default(),
            };
            record.push(cell);
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
