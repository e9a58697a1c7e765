//! End-to-end behaviour of the infilling engine on small station networks.
//!
//! Stations sit around Toronto so that the default NAD83 / UTM 17N
//! projection applies. Expected IDW values are recomputed from the
//! projected coordinates the engine writes back into its output.

use approx::assert_relative_eq;
use chrono::NaiveDate;

use rvnmet_algorithms::interpolation::{infill, IdwParams, InfillParams};
use rvnmet_algorithms::reproject::{project_points, X_PROJ_COLUMN, Y_PROJ_COLUMN};
use rvnmet_core::{Column, ObservationRow, ObservationTable, Projection};

const VARS: [&str; 3] = ["max_temp", "min_temp", "total_precip"];

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, d).unwrap()
}

/// (station, lon, lat)
const STATIONS: [(&str, f64, f64); 4] = [
    ("TORONTO", -79.40, 43.67),
    ("PEARSON", -79.63, 43.68),
    ("BUTTONVILLE", -79.37, 43.86),
    ("OSHAWA", -78.90, 43.92),
];

fn row(station: usize, d: u32, values: [Option<f64>; 3]) -> ObservationRow {
    let (name, lon, lat) = STATIONS[station];
    ObservationRow::new(name, day(d), lon, lat).with_values(values.to_vec())
}

fn params() -> InfillParams {
    InfillParams::default()
}

fn xy(table: &ObservationTable, row: usize) -> (f64, f64) {
    (
        table.value(row, X_PROJ_COLUMN).unwrap().unwrap(),
        table.value(row, Y_PROJ_COLUMN).unwrap().unwrap(),
    )
}

fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

// ---------------------------------------------------------------------------
// No missing data
// ---------------------------------------------------------------------------

#[test]
fn complete_table_is_unchanged() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [Some(1.0), Some(-4.0), Some(0.0)]),
            row(1, 1, [Some(1.5), Some(-5.0), Some(2.2)]),
            row(0, 2, [Some(3.0), Some(-1.0), Some(0.4)]),
        ],
    )
    .unwrap();

    let result = infill(&t, &params()).unwrap();
    assert!(result.is_complete());
    assert_eq!(result.filled(), 0);

    let out = &result.table;
    assert_eq!(out.n_rows(), t.n_rows());
    assert_eq!(out.columns().len(), t.columns().len() + 2);
    for (orig, copy) in t.columns().iter().zip(out.columns()) {
        assert_eq!(orig, copy);
    }
    assert_eq!(out.stations(), t.stations());
    assert_eq!(out.dates(), t.dates());
}

// ---------------------------------------------------------------------------
// Estimates
// ---------------------------------------------------------------------------

#[test]
fn single_donor_value_is_copied_exactly() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [None, Some(-4.0), None]),
            row(1, 1, [Some(-0.3), Some(-5.0), None]),
            row(2, 1, [None, Some(-6.0), None]),
        ],
    )
    .unwrap();

    let result = infill(&t, &params()).unwrap();
    let out = &result.table;
    assert_eq!(out.value(0, "max_temp").unwrap(), Some(-0.3));
    assert_eq!(out.value(2, "max_temp").unwrap(), Some(-0.3));
    assert_eq!(out.value(1, "max_temp").unwrap(), Some(-0.3));
}

#[test]
fn two_donor_estimate_matches_formula() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [None, Some(0.0), Some(0.0)]),
            row(1, 1, [Some(5.0), Some(0.0), Some(0.0)]),
            row(3, 1, [Some(8.0), Some(0.0), Some(0.0)]),
        ],
    )
    .unwrap();

    let result = infill(&t, &params()).unwrap();
    let out = &result.table;

    let d1 = dist(xy(out, 0), xy(out, 1));
    let d2 = dist(xy(out, 0), xy(out, 2));
    let expected = (5.0 / d1.powi(2) + 8.0 / d2.powi(2)) / (1.0 / d1.powi(2) + 1.0 / d2.powi(2));

    let got = out.value(0, "max_temp").unwrap().unwrap();
    assert_relative_eq!(got, expected, max_relative = 1e-12);
    // Pearson is closer to Toronto than Oshawa is
    assert!(d1 < d2);
    assert!(got > 5.0 && got < 6.5, "got {}", got);
}

#[test]
fn custom_power_is_applied() {
    let t = ObservationTable::from_rows(
        &["max_temp"],
        vec![
            ObservationRow::new("T", day(1), -79.40, 43.67).with_values(vec![None]),
            ObservationRow::new("P", day(1), -79.63, 43.68).with_values(vec![Some(5.0)]),
            ObservationRow::new("O", day(1), -78.90, 43.92).with_values(vec![Some(8.0)]),
        ],
    )
    .unwrap();

    let p = InfillParams {
        variables: vec!["max_temp".into()],
        idw: IdwParams {
            power: 1.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let out = infill(&t, &p).unwrap().table;

    let d1 = dist(xy(&out, 0), xy(&out, 1));
    let d2 = dist(xy(&out, 0), xy(&out, 2));
    let expected = (5.0 / d1 + 8.0 / d2) / (1.0 / d1 + 1.0 / d2);
    assert_relative_eq!(out.value(0, "max_temp").unwrap().unwrap(), expected, max_relative = 1e-12);
}

#[test]
fn equal_donor_values_give_that_value() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [Some(2.0), Some(2.0), None]),
            row(1, 1, [Some(2.0), Some(2.0), Some(12.5)]),
            row(2, 1, [Some(2.0), Some(2.0), Some(12.5)]),
            row(3, 1, [Some(2.0), Some(2.0), Some(12.5)]),
        ],
    )
    .unwrap();

    let out = infill(&t, &params()).unwrap().table;
    assert_relative_eq!(
        out.value(0, "total_precip").unwrap().unwrap(),
        12.5,
        max_relative = 1e-12
    );
}

#[test]
fn colocated_donor_is_authoritative() {
    // Two rows for the same station and date: the valid one sits at distance 0
    let t = ObservationTable::from_rows(
        &["max_temp"],
        vec![
            ObservationRow::new("T", day(1), -79.40, 43.67).with_values(vec![None]),
            ObservationRow::new("T2", day(1), -79.40, 43.67).with_values(vec![Some(3.5)]),
            ObservationRow::new("O", day(1), -78.90, 43.92).with_values(vec![Some(8.0)]),
        ],
    )
    .unwrap();

    let p = InfillParams {
        variables: vec!["max_temp".into()],
        ..Default::default()
    };
    let out = infill(&t, &p).unwrap().table;
    assert_eq!(out.value(0, "max_temp").unwrap(), Some(3.5));
}

#[test]
fn donors_are_matched_by_date_only() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [None, Some(0.0), Some(0.0)]),
            row(1, 2, [Some(100.0), Some(0.0), Some(0.0)]),
            row(2, 1, [Some(4.0), Some(0.0), Some(0.0)]),
        ],
    )
    .unwrap();

    let out = infill(&t, &params()).unwrap().table;
    assert_eq!(out.value(0, "max_temp").unwrap(), Some(4.0));
}

// ---------------------------------------------------------------------------
// Missing donors
// ---------------------------------------------------------------------------

#[test]
fn no_donor_leaves_cell_missing_and_reports_date() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [Some(1.0), Some(-1.0), None]),
            row(1, 1, [Some(1.0), Some(-1.0), None]),
            row(0, 2, [Some(1.0), Some(-1.0), Some(3.0)]),
        ],
    )
    .unwrap();

    let result = infill(&t, &params()).unwrap();
    let out = &result.table;
    assert_eq!(out.value(0, "total_precip").unwrap(), None);
    assert_eq!(out.value(1, "total_precip").unwrap(), None);

    assert_eq!(result.warnings.len(), 2);
    assert!(result.warnings.iter().all(|w| w.date == day(1)));
    assert!(result.warnings.iter().all(|w| w.variable == "total_precip"));
    assert!(result.warnings[0].to_string().contains("2018-01-01"));

    let precip = result.stats.iter().find(|s| s.variable == "total_precip").unwrap();
    assert_eq!((precip.missing, precip.filled, precip.unfilled), (2, 0, 2));
}

#[test]
fn radius_limit_can_leave_cells_missing() {
    let t = ObservationTable::from_rows(
        &["max_temp"],
        vec![
            ObservationRow::new("T", day(1), -79.40, 43.67).with_values(vec![None]),
            ObservationRow::new("O", day(1), -78.90, 43.92).with_values(vec![Some(8.0)]),
        ],
    )
    .unwrap();

    let p = InfillParams {
        variables: vec!["max_temp".into()],
        idw: IdwParams {
            max_radius: Some(1_000.0),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = infill(&t, &p).unwrap();
    assert_eq!(result.table.value(0, "max_temp").unwrap(), None);
    assert_eq!(result.warnings.len(), 1);
}

// ---------------------------------------------------------------------------
// Key stations
// ---------------------------------------------------------------------------

#[test]
fn key_stations_restrict_output_but_not_donors() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [None, Some(-2.0), Some(0.0)]),
            row(1, 1, [Some(6.0), None, Some(1.0)]),
            row(2, 1, [None, Some(-3.0), None]),
            row(0, 2, [Some(7.0), Some(-1.0), Some(0.0)]),
        ],
    )
    .unwrap();

    let p = InfillParams {
        key_stations: Some(vec!["TORONTO".into()]),
        ..Default::default()
    };
    let result = infill(&t, &p).unwrap();
    let out = &result.table;

    assert_eq!(out.n_rows(), 2);
    assert!(out.stations().iter().all(|s| s == "TORONTO"));
    assert_eq!(out.dates(), &[day(1), day(2)]);

    // Filled from PEARSON, a non-key station
    assert_eq!(out.value(0, "max_temp").unwrap(), Some(6.0));
    assert_eq!(out.value(1, "max_temp").unwrap(), Some(7.0));

    // Non-key gaps are neither filled nor reported
    assert!(result.is_complete());
    assert_eq!(t.value(1, "min_temp").unwrap(), None);
}

#[test]
fn unknown_key_station_yields_empty_output() {
    let t = ObservationTable::from_rows(&VARS, vec![row(0, 1, [None, None, None])]).unwrap();
    let p = InfillParams {
        key_stations: Some(vec!["NOWHERE".into()]),
        ..Default::default()
    };
    let result = infill(&t, &p).unwrap();
    assert!(result.table.is_empty());
    assert_eq!(result.table.columns().len(), 5);
}

// ---------------------------------------------------------------------------
// Projection & repeated runs
// ---------------------------------------------------------------------------

#[test]
fn projection_independent_of_row_order_and_missingness() {
    let a = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [None, None, None]),
            row(3, 1, [Some(1.0), Some(1.0), Some(1.0)]),
        ],
    )
    .unwrap();
    let b = ObservationTable::from_rows(
        &VARS,
        vec![
            row(3, 1, [None, Some(2.0), None]),
            row(0, 1, [Some(9.0), Some(9.0), Some(9.0)]),
        ],
    )
    .unwrap();

    let proj = Projection::default();
    let pa = project_points(&a, &proj);
    let pb = project_points(&b, &proj);
    assert_eq!(pa[0], pb[1]);
    assert_eq!(pa[1], pb[0]);

    let out_a = infill(&a, &params()).unwrap().table;
    let out_b = infill(&b, &params()).unwrap().table;
    assert_eq!(xy(&out_a, 0), xy(&out_b, 1));
}

#[test]
fn rerun_on_output_keeps_filled_values() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [None, Some(-2.0), None]),
            row(1, 1, [Some(6.0), None, Some(1.0)]),
            row(2, 1, [Some(4.0), Some(-3.0), Some(0.5)]),
            row(3, 2, [None, Some(-8.0), None]),
        ],
    )
    .unwrap();

    let first = infill(&t, &params()).unwrap();
    let second = infill(&first.table, &params()).unwrap();

    assert_eq!(second.table, first.table);
    assert_eq!(second.filled(), 0);
    // Day 2 has a single station, so its gaps survive both runs
    assert_eq!(second.warnings, first.warnings);
}

#[test]
fn extra_columns_pass_through() {
    let t = ObservationTable::from_rows(
        &VARS,
        vec![
            row(0, 1, [None, Some(1.0), Some(1.0)]),
            row(1, 1, [Some(2.0), Some(1.0), Some(1.0)]),
        ],
    )
    .unwrap()
    .with_column(Column::text("flag", vec![Some("E".into()), None]))
    .unwrap();

    let out = infill(&t, &params()).unwrap().table;
    assert_eq!(out.column("flag"), t.column("flag"));
    assert_eq!(out.columns()[3].name(), "flag");
}

#[test]
fn invalid_projection_aborts() {
    let t = ObservationTable::from_rows(&VARS, vec![row(0, 1, [None, None, None])]).unwrap();
    let p = InfillParams {
        projection: 99_999,
        ..Default::default()
    };
    assert!(infill(&t, &p).is_err());
}
