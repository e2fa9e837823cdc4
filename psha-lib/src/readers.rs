//! # Data Readers for Site and Expected-Result Files
//!
//! This module provides utilities for reading tabular input into the hazard
//! library: site lists for calculation runs, and expected-result files used
//! to validate computed curves.
//!
//! ## Features
//!
//! - Load site rows (name, longitude, latitude, Vs30, optional basin depths)
//!   with configurable delimiter characters (e.g., tab, comma).
//! - Load expected per-site curve rows in the validation format: a header
//!   line, then `name, lon, lat, v1;v2;...;vN` with semicolon-separated
//!   exceedance values.
//! - The per-value match rule used by the validation harness.
//!
//! ## Example Site File Format (tab-delimited, no header)
//!
//! ```text
//! site a	142.523	52.913	300
//! site b	142.600	50.100	350	0.25	1.1
//! ```
//!
//! Columns are interpreted as:
//!
//! 1. name (string)
//! 2. longitude (f64)
//! 3. latitude (f64)
//! 4. Vs30 (f64)
//! 5. z1p0, km (optional, f64)
//! 6. z2p5, km (optional, f64)
//!
//! ## See Also
//!
//! - [`crate::site::Site`]
//! - [`csv`](https://docs.rs/csv/)

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;

use crate::error::{HazardError, Result};
use crate::site::Site;

#[derive(Debug, Deserialize)]
struct SiteRecord {
    name: String,
    lon: f64,
    lat: f64,
    vs30: f64,
    #[serde(default)]
    z1p0: Option<f64>,
    #[serde(default)]
    z2p5: Option<f64>,
}

/// Reads a list of [`Site`]s from a delimited text file.
///
/// The file is assumed to have **no header row**; the delimiter can be
/// specified to support flexible formats (e.g., tab, comma). Trailing basin
/// depth columns are optional. Every row passes through the site builder,
/// so invalid locations or Vs30 values are rejected with the site's name.
///
/// # Arguments
///
/// * `path` — Path to the input file.
/// * `delim` — Delimiter character (e.g., `b'\t'` for tab, `b','` for comma).
///
/// # Example
///
/// ```rust
/// use psha_lib::readers::read_sites;
///
/// let sites = read_sites("tests/data/sites.csv", b'\t').unwrap();
/// println!("First site: {:?}", sites[0]);
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a row fails to
/// deserialize, or a site fails validation.
pub fn read_sites<P: AsRef<Path>>(path: P, delim: u8) -> Result<Vec<Site>> {
    let file = File::open(path)?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut sites = Vec::new();
    for result in rdr.deserialize() {
        let record: SiteRecord = result?;
        let mut builder = Site::builder()
            .name(record.name)
            .location(record.lon, record.lat)
            .vs30(record.vs30);
        if let Some(z1p0) = record.z1p0 {
            builder = builder.z1p0(z1p0);
        }
        if let Some(z2p5) = record.z2p5 {
            builder = builder.z2p5(z2p5);
        }
        sites.push(builder.build()?);
    }
    Ok(sites)
}

/// One expected-result row: a named site and its exceedance values over the
/// model's declared amplitude levels.
#[derive(Debug, Clone)]
pub struct ExpectedCurve {
    pub site_name: String,
    pub lon: f64,
    pub lat: f64,
    pub values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ExpectedRecord {
    name: String,
    lon: f64,
    lat: f64,
    values: String,
}

/// Reads an expected-results file: one header line, then one row per site
/// with semicolon-separated exceedance values.
///
/// # Errors
///
/// Returns an error on I/O failure, a malformed row, or a value that does
/// not parse as a float.
pub fn read_expected_curves<P: AsRef<Path>>(path: P) -> Result<Vec<ExpectedCurve>> {
    let file = File::open(path)?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut curves = Vec::new();
    for result in rdr.deserialize() {
        let record: ExpectedRecord = result?;
        let values = record
            .values
            .split(';')
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|e| HazardError::InvalidExpected {
                        name: record.name.clone(),
                        detail: format!("`{v}`: {e}"),
                    })
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.is_empty() {
            return Err(HazardError::InvalidExpected {
                name: record.name,
                detail: "no values".to_string(),
            });
        }
        curves.push(ExpectedCurve {
            site_name: record.name,
            lon: record.lon,
            lat: record.lat,
            values,
        });
    }
    Ok(curves)
}

/// The validation match rule: values agree when bitwise equal as doubles or
/// within the relative tolerance.
pub fn matches_expected(actual: f64, expected: f64, tolerance: f64) -> bool {
    actual.to_bits() == expected.to_bits()
        || ((actual - expected) / expected).abs() < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_rule() {
        assert!(matches_expected(0.1, 0.1, 1e-9));
        assert!(matches_expected(0.102, 0.1, 0.05));
        assert!(!matches_expected(0.11, 0.1, 0.05));
        // Bitwise branch covers an expected value of zero.
        assert!(matches_expected(0.0, 0.0, 0.05));
        assert!(!matches_expected(1e-300, 0.0, 0.05));
    }
}
