//! # `psha_lib`
//!
//! **A performant, modular Rust library for probabilistic seismic hazard
//! analysis (PSHA).**
//!
//! Given an earthquake source model and a logic tree of GMPE (Ground Motion
//! Prediction Equation) models, this crate computes, for each intensity
//! measure type of interest, the annual rate and Poisson probability at which
//! ground motion at a site exceeds a ladder of amplitude levels.
//!
//! ## Features
//!
//! - Modular ground motion model interface via the
//!   [`GroundMotionModel`](crate::gmm::GroundMotionModel) trait, with the
//!   **Morikawa & Fujiwara (2013)** GMPE family built in ([`mf2013`](crate::mf2013)).
//! - A closed earthquake source taxonomy (fault, interface, grid, area,
//!   cluster, fault-system) with per-type rupture iteration ([`source`](crate::source),
//!   [`system`](crate::system)).
//! - The four-stage hazard pipeline — rupture inputs, ground motions,
//!   exceedance curves, consolidation — in [`calc`](crate::calc), with
//!   sequential and Rayon-parallel execution producing bitwise-identical
//!   results.
//! - Truncated log-normal exceedance models ([`exceedance`](crate::exceedance)).
//! - CSV-based readers and writers for site lists and per-site hazard curves.
//! - Built-in demo hazard models and default calculation configs
//!   ([`config`](crate::config)).
//!
//! ## Module Overview
//!
//! - [`calc`](crate::calc) — The hazard calculation pipeline and its entry point.
//! - [`config`](crate::config) — Calculation configuration and built-in demo models.
//! - [`curve`](crate::curve) — Shared-axis hazard curve container and arithmetic.
//! - [`error`](crate::error) — Library error type and `Result` alias.
//! - [`exceedance`](crate::exceedance) — Truncated-normal exceedance model variants.
//! - [`gmm`](crate::gmm) — GMM identifiers, the model trait and logic-tree weight sets.
//! - [`imt`](crate::imt) — Intensity measure types.
//! - [`mf2013`](crate::mf2013) — Morikawa & Fujiwara (2013) GMPE implementation.
//! - [`mfd`](crate::mfd) — Magnitude-frequency distributions.
//! - [`model`](crate::model) — `SourceSet` and `HazardModel` containers.
//! - [`readers`](crate::readers) — CSV input loaders for sites and expected results.
//! - [`site`](crate::site) — Site definitions.
//! - [`source`](crate::source) — Ruptures and the ordinary source taxonomy.
//! - [`surface`](crate::surface) — Rupture surface geometry and site distances.
//! - [`system`](crate::system) — Pre-indexed fault-system source sets.
//! - [`writers`](crate::writers) — CSV output writers for hazard curves.
//!
//! ## Example
//!
//! ```rust
//! use psha_lib::calc::compute_hazard;
//! use psha_lib::config::{demo_models, CalcConfig};
//! use psha_lib::imt::Imt;
//! use psha_lib::site::Site;
//!
//! let model = demo_models().get("demo_single_fault").unwrap();
//! let config = CalcConfig::builder().imts(vec![Imt::Pga]).build().unwrap();
//! let site = Site::builder()
//!     .name("test site")
//!     .location(142.5, 50.0)
//!     .vs30(400.0)
//!     .build()
//!     .unwrap();
//!
//! let result = compute_hazard(model, &config, &site, None).unwrap();
//! println!("{:?}", result.probability(Imt::Pga));
//! ```
//!
//! ## Parallelism
//!
//! This crate uses [`Rayon`](https://docs.rs/rayon/latest/rayon/) for
//! data-parallel fan-out over source sets and sources. The caller supplies an
//! optional [`rayon::ThreadPool`]; without one the calculation runs on the
//! calling thread. Both modes reduce in source declaration order and yield
//! bitwise-identical curves.
//!
//! ## Future Work
//!
//! Planned extensions include:
//!
//! - Additional GMPE model families
//! - Hazard disaggregation
//! - Uniform hazard spectra
//! - Model loaders for standard exchange formats
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0 ([Apache-2.0](http://www.apache.org/licenses/LICENSE-2.0))
//!
//! ---
//!
//! ```text
//! Copyright 2025 Andrey Stepnov, GEOPHYSTECH LLC
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! you may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.
//! ```
//! ---

pub mod calc;
pub mod config;
pub mod curve;
pub mod error;
pub mod exceedance;
pub mod gmm;
pub mod imt;
pub mod mf2013;
pub mod mfd;
pub mod model;
pub mod readers;
pub mod site;
pub mod source;
pub mod surface;
pub mod system;
pub mod writers;

#[cfg(test)]
mod testutil;
