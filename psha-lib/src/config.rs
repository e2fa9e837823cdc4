//! Calculation configuration and built-in demo models.
//!
//! [`CalcConfig`] fixes everything about a calculation that is not the model
//! or the site: the IMTs of interest, the per-IMT amplitude ladder, the
//! exceedance model and its truncation level, the source distance cutoff and
//! the Poisson exposure window. Default amplitude ladders and a small map of
//! named demo hazard models are initialized once behind [`OnceLock`]s and
//! shared read-only.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use crate::curve::Curve;
use crate::error::{HazardError, Result};
use crate::exceedance::ExceedanceModel;
use crate::gmm::{Gmm, GmmSet};
use crate::imt::Imt;
use crate::mfd::Mfd;
use crate::model::{HazardModel, SourceSet};
use crate::source::{ClusterSource, FaultSource, GridSource, Source};

/// Default amplitude levels for acceleration measures, g.
const IMLS_ACCEL: [f64; 20] = [
    0.0025, 0.0045, 0.0075, 0.0113, 0.0169, 0.0253, 0.0380, 0.0570, 0.0854, 0.128, 0.192,
    0.288, 0.432, 0.649, 0.973, 1.46, 2.19, 3.28, 4.92, 7.38,
];

/// Default amplitude levels for PGV, cm/s.
const IMLS_PGV: [f64; 20] = [
    0.0100, 0.0178, 0.0312, 0.0552, 0.0976, 0.173, 0.305, 0.539, 0.953, 1.68, 2.98, 5.26,
    9.30, 16.4, 29.1, 51.3, 90.8, 160.0, 284.0, 501.0,
];

static DEFAULT_CURVES: OnceLock<BTreeMap<Imt, Arc<[f64]>>> = OnceLock::new();

/// The default per-IMT model curves, x-values as natural-log amplitudes.
pub fn default_model_curves() -> &'static BTreeMap<Imt, Arc<[f64]>> {
    DEFAULT_CURVES.get_or_init(|| {
        let accel: Arc<[f64]> = IMLS_ACCEL.iter().map(|v| v.ln()).collect();
        let pgv: Arc<[f64]> = IMLS_PGV.iter().map(|v| v.ln()).collect();
        BTreeMap::from([
            (Imt::Pga, Arc::clone(&accel)),
            (Imt::Pgv, pgv),
            (Imt::Sa0P3, Arc::clone(&accel)),
            (Imt::Sa1P0, Arc::clone(&accel)),
            (Imt::Sa3P0, accel),
        ])
    })
}

/// Immutable calculation configuration.
#[derive(Debug, Clone)]
pub struct CalcConfig {
    imts: Vec<Imt>,
    curves: BTreeMap<Imt, Arc<[f64]>>,
    exceedance: ExceedanceModel,
    truncation: f64,
    max_distance_km: f64,
    timespan: f64,
}

impl CalcConfig {
    pub fn builder() -> CalcConfigBuilder {
        CalcConfigBuilder::default()
    }

    /// IMTs to compute curves for, in declared order.
    pub fn imts(&self) -> &[Imt] {
        &self.imts
    }

    /// The x-axis (natural-log amplitudes) for `imt`.
    pub fn model_curve(&self, imt: Imt) -> Result<&Arc<[f64]>> {
        self.curves
            .get(&imt)
            .ok_or(HazardError::MissingModelCurve { imt })
    }

    /// An all-zero curve over the model curve for `imt`.
    pub fn zeroed_curve(&self, imt: Imt) -> Result<Curve> {
        Ok(Curve::zeroed(Arc::clone(self.model_curve(imt)?)))
    }

    pub fn exceedance(&self) -> ExceedanceModel {
        self.exceedance
    }

    /// Truncation level in sigma units.
    pub fn truncation(&self) -> f64 {
        self.truncation
    }

    /// Source distance cutoff, km.
    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    /// Poisson exposure window, years.
    pub fn timespan(&self) -> f64 {
        self.timespan
    }
}

/// Single-use builder for [`CalcConfig`].
#[derive(Debug)]
pub struct CalcConfigBuilder {
    imts: Vec<Imt>,
    curves: BTreeMap<Imt, Arc<[f64]>>,
    exceedance: ExceedanceModel,
    truncation: f64,
    max_distance_km: f64,
    timespan: f64,
}

impl Default for CalcConfigBuilder {
    fn default() -> Self {
        Self {
            imts: vec![Imt::Pga],
            curves: BTreeMap::new(),
            exceedance: ExceedanceModel::TruncationUpperOnly,
            truncation: 3.0,
            max_distance_km: 300.0,
            timespan: 1.0,
        }
    }
}

impl CalcConfigBuilder {
    pub fn imts(mut self, imts: Vec<Imt>) -> Self {
        self.imts = imts;
        self
    }

    /// Override the amplitude ladder for `imt`. Levels are linear amplitudes
    /// (g, or cm/s for PGV) and must be strictly increasing; they are stored
    /// as natural logs.
    pub fn model_curve(mut self, imt: Imt, levels: &[f64]) -> Self {
        self.curves
            .insert(imt, levels.iter().map(|v| v.ln()).collect());
        self
    }

    pub fn exceedance(mut self, model: ExceedanceModel) -> Self {
        self.exceedance = model;
        self
    }

    pub fn truncation(mut self, level: f64) -> Self {
        self.truncation = level;
        self
    }

    pub fn max_distance(mut self, km: f64) -> Self {
        self.max_distance_km = km;
        self
    }

    pub fn timespan(mut self, years: f64) -> Self {
        self.timespan = years;
        self
    }

    /// Seal the config. IMTs without an explicit ladder receive the default
    /// one.
    pub fn build(mut self) -> Result<CalcConfig> {
        if self.imts.is_empty() {
            return Err(HazardError::EmptyImts);
        }
        for &imt in &self.imts {
            if !self.curves.contains_key(&imt) {
                let default = default_model_curves()
                    .get(&imt)
                    .ok_or(HazardError::MissingModelCurve { imt })?;
                self.curves.insert(imt, Arc::clone(default));
            }
        }
        for (&imt, xs) in &self.curves {
            let increasing = xs.len() >= 2
                && xs
                    .windows(2)
                    .all(|w| w[0].is_finite() && w[1].is_finite() && w[0] < w[1]);
            if !increasing {
                return Err(HazardError::InvalidCurve { imt });
            }
        }
        if !(self.truncation.is_finite() && self.truncation >= 0.0) {
            return Err(HazardError::InvalidTruncation {
                level: self.truncation,
            });
        }
        Ok(CalcConfig {
            imts: self.imts,
            curves: self.curves,
            exceedance: self.exceedance,
            truncation: self.truncation,
            max_distance_km: self.max_distance_km,
            timespan: self.timespan,
        })
    }
}

static DEMO_MODELS: OnceLock<HashMap<&'static str, HazardModel>> = OnceLock::new();

/// Lazily initializes and returns the built-in demo hazard models.
///
/// The map contains small, fully sealed models keyed by descriptive string
/// identifiers: `"demo_single_fault"`, `"demo_grid"` and `"demo_cluster"`.
/// They exercise the ordinary, gridded and cluster pipelines respectively
/// and back the CLI when no external model loader is wired in.
///
/// # Example
///
/// ```rust
/// use psha_lib::config::demo_models;
///
/// let models = demo_models();
/// let model = models.get("demo_single_fault").unwrap();
/// println!("{} sets", model.source_sets().len());
/// ```
///
/// # Thread Safety
///
/// Internally uses `OnceLock`; the map is initialized once and shared
/// read-only across threads.
pub fn demo_models() -> &'static HashMap<&'static str, HazardModel> {
    DEMO_MODELS.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert("demo_single_fault", demo_single_fault());
        map.insert("demo_grid", demo_grid());
        map.insert("demo_cluster", demo_cluster());
        map
    })
}

fn crustal_interplate_tree() -> GmmSet {
    GmmSet::builder()
        .weights([(Gmm::Mf2013Crustal, 0.6), (Gmm::Mf2013Interplate, 0.4)])
        .far_weights([(Gmm::Mf2013Crustal, 0.5), (Gmm::Mf2013Interplate, 0.5)])
        .cutoff(100.0)
        .blend_band(40.0)
        .build()
        .expect("demo gmm tree weights close")
}

fn demo_single_fault() -> HazardModel {
    let fault = FaultSource::builder()
        .name("Central fault")
        .trace((142.5, 50.2), (142.7, 50.8))
        .dip(60.0)
        .z_top(1.0)
        .width(14.0)
        .rake(90.0)
        .mfd(Mfd::GutenbergRichter {
            a: 4.2,
            b: 1.0,
            m_min: 5.0,
            m_max: 7.5,
            d_mag: 0.1,
        })
        .build()
        .expect("demo fault definition is valid");
    let set = SourceSet::builder()
        .name("demo faults")
        .id(1)
        .weight(1.0)
        .gmms(crustal_interplate_tree())
        .sources(vec![Source::Fault(fault)])
        .build()
        .expect("demo fault set is valid");
    HazardModel::builder()
        .name("demo_single_fault")
        .source_set(set)
        .build()
        .expect("demo model is valid")
}

fn demo_grid() -> HazardModel {
    let mut builder = GridSource::builder().name("Background seismicity");
    for i in 0..3 {
        for j in 0..3 {
            let lon = 142.6 + 0.4 * i as f64;
            let lat = 50.0 + 0.4 * j as f64;
            builder = builder.node(
                lon,
                lat,
                10.0,
                Mfd::GutenbergRichter {
                    a: 3.2,
                    b: 0.9,
                    m_min: 5.0,
                    m_max: 7.0,
                    d_mag: 0.2,
                },
            );
        }
    }
    let grid = builder.build().expect("demo grid definition is valid");
    let set = SourceSet::builder()
        .name("demo grid")
        .id(2)
        .weight(1.0)
        .gmms(GmmSet::single(Gmm::Mf2013Crustal))
        .sources(vec![Source::Grid(grid)])
        .build()
        .expect("demo grid set is valid");
    HazardModel::builder()
        .name("demo_grid")
        .source_set(set)
        .build()
        .expect("demo model is valid")
}

fn demo_cluster() -> HazardModel {
    let segment = |name: &str, trace: ((f64, f64), (f64, f64)), mag: f64| {
        FaultSource::builder()
            .name(name)
            .trace(trace.0, trace.1)
            .dip(50.0)
            .z_top(0.5)
            .width(12.0)
            .rake(90.0)
            .mfd(Mfd::Single { mag, rate: 1.0 })
            .build()
            .expect("demo segment definition is valid")
    };
    let cluster = ClusterSource::builder()
        .name("Paired segments")
        .rate(0.002)
        .segment(segment(
            "segment a",
            ((142.4, 50.1), (142.5, 50.45)),
            6.8,
        ))
        .segment(segment(
            "segment b",
            ((142.5, 50.45), (142.65, 50.8)),
            7.0,
        ))
        .build()
        .expect("demo cluster definition is valid");
    let set = SourceSet::builder()
        .name("demo clusters")
        .id(3)
        .weight(1.0)
        .gmms(GmmSet::single(Gmm::Mf2013Crustal))
        .clusters(vec![cluster])
        .build()
        .expect("demo cluster set is valid");
    HazardModel::builder()
        .name("demo_cluster")
        .source_set(set)
        .build()
        .expect("demo model is valid")
}
