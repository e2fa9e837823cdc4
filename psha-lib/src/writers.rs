//! # Data Writers for Hazard Curve Output Files
//!
//! This module provides utilities for writing per-site hazard curves to
//! delimited text files in the same shape the expected-results reader
//! consumes: a header row, then one row per site with semicolon-separated
//! exceedance values.
//!
//! ## Example Output Format (tab-delimited)
//!
//! ```text
//! name	lon	lat	values
//! site a	142.6	50.1	0.015;0.009;0.004
//! ```
//!
//! ## See Also
//!
//! - [`crate::calc::HazardResult`]
//! - [`crate::readers::read_expected_curves`]
//! - [`csv`](https://docs.rs/csv/)

use std::fs::File;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;

use crate::calc::HazardResult;
use crate::error::{HazardError, Result};
use crate::imt::Imt;

/// One output row: a named site and its semicolon-joined curve values.
#[derive(Debug, Serialize)]
pub struct SiteCurveRow {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub values: String,
}

/// Build the output row for one result's Poisson probability curve.
///
/// # Errors
///
/// [`HazardError::MissingModelCurve`] when the result holds no curve for
/// `imt`.
pub fn curve_row(result: &HazardResult, imt: Imt) -> Result<SiteCurveRow> {
    let curve = result
        .probability(imt)
        .ok_or(HazardError::MissingModelCurve { imt })?;
    let values = curve
        .ys()
        .iter()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(";");
    let site = result.site();
    Ok(SiteCurveRow {
        name: site.name.clone(),
        lon: site.lon,
        lat: site.lat,
        values,
    })
}

/// Writes per-site probability curves for `imt` to a delimited file, one row
/// per result, with a header row.
///
/// # Arguments
///
/// * `path` — The output file path.
/// * `delim` — Delimiter character (e.g., `b','` for comma, `b'\t'` for tab).
/// * `results` — Computed hazard results, one per site.
/// * `imt` — The intensity measure to export.
///
/// # Errors
///
/// Returns an error if the file cannot be created, a result lacks `imt`, or
/// serialization fails.
pub fn write_hazard_results<P: AsRef<Path>>(
    path: P,
    delim: u8,
    results: &[HazardResult],
    imt: Imt,
) -> Result<()> {
    let file = File::create(path)?;
    let mut wtr = WriterBuilder::new()
        .delimiter(delim)
        .has_headers(true)
        .from_writer(file);

    for result in results {
        wtr.serialize(curve_row(result, imt)?)?;
    }
    wtr.flush()?;
    Ok(())
}
