//! # The Hazard Calculation Pipeline
//!
//! The four-stage transform from a hazard model and a site to per-IMT
//! exceedance curves, replicated per source and then consolidated:
//!
//! ```text
//! Source -> InputList -> GroundMotions -> HazardCurves -> HazardCurveSet -> HazardResult
//! ```
//!
//! 1. [`input`] — expand each source into per-rupture inputs with site
//!    distances computed once.
//! 2. [`ground_motions`] — evaluate every (GMM, IMT) pair on every input.
//! 3. [`curves`] — integrate truncated-normal exceedance against the model
//!    curve and sum rate-scaled contributions; cluster and fault-system
//!    sources override this stage.
//! 4. [`consolidate`] — apply GMM logic-tree weights per set, then set
//!    weights per model, and materialize the result in both the log-x rate
//!    and linear-x Poisson-probability forms.
//!
//! [`pipeline`] holds the entry point, the sequential/parallel execution
//! glue and the cancellation flag. Every stage is a pure function of its
//! inputs; the only mutable state is the builder lifecycle of the value
//! types, each sealed before crossing a thread boundary.

pub mod consolidate;
pub mod curves;
pub mod ground_motions;
pub mod input;
pub mod pipeline;

pub use consolidate::{HazardCurveSet, HazardResult};
pub use curves::HazardCurves;
pub use ground_motions::GroundMotions;
pub use input::{HazardInput, InputList};
pub use pipeline::{CancelFlag, compute_hazard, compute_hazard_cancellable};
