//! Library error type and `Result` alias.
//!
//! All fallible operations in this crate return [`HazardError`]. Configuration
//! and model-data problems abort a calculation as a whole; no partial result
//! is ever returned.

use thiserror::Error;

use crate::gmm::Gmm;
use crate::imt::Imt;

pub type Result<T> = std::result::Result<T, HazardError>;

/// Errors raised by hazard model construction and calculation.
#[derive(Debug, Error)]
pub enum HazardError {
    // Configuration errors, detected while building config or model values
    // or at the first pipeline stage that can observe them.
    #[error("no model curve configured for {imt}")]
    MissingModelCurve { imt: Imt },

    #[error("calculation config declares no IMTs")]
    EmptyImts,

    #[error("model curve for {imt} must hold at least two strictly increasing levels")]
    InvalidCurve { imt: Imt },

    #[error("{context}: weights sum to {sum}, expected 1")]
    InvalidWeights { context: String, sum: f64 },

    #[error("source set `{name}` has weight {weight}, expected a value in (0, 1]")]
    InvalidSetWeight { name: String, weight: f64 },

    #[error("{gmm} does not support {imt}")]
    UnsupportedImt { gmm: Gmm, imt: Imt },

    #[error("{gmm} returned a non-finite value for {imt} at input {index}")]
    NonFiniteGroundMotion { gmm: Gmm, imt: Imt, index: usize },

    #[error("truncation level {level} must be finite and non-negative")]
    InvalidTruncation { level: f64 },

    // Model-data errors. Carry the identity of the offending source.
    #[error("source `{name}` has no ruptures")]
    EmptySource { name: String },

    #[error("source set `{name}` is empty")]
    EmptySourceSet { name: String },

    #[error("source `{source_name}`: {detail}")]
    InvalidRupture { source_name: String, detail: String },

    #[error("source `{source_name}` produced a non-finite site distance")]
    NonFiniteDistance { source_name: String },

    #[error("site `{name}`: {detail}")]
    InvalidSite { name: String, detail: String },

    #[error("invalid expected-results row for `{name}`: {detail}")]
    InvalidExpected { name: String, detail: String },

    /// A caller-requested cancellation observed at a stage boundary.
    /// Not retryable inside the core.
    #[error("hazard calculation cancelled")]
    Cancelled,

    // I/O errors from the CSV readers and writers.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
