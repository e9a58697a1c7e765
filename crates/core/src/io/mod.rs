//! I/O operations for reading and writing observation tables

mod csv_table;

pub use csv_table::{
    read_observations, read_observations_csv, write_observations, write_observations_csv,
    DATE_FORMAT, MISSING_MARKERS,
};
