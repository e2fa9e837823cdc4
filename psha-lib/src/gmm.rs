//! Ground motion model identifiers, the model trait and logic-tree weight
//! sets.
//!
//! A [`Gmm`] names one registered GMPE implementation. A [`GmmSet`] is the
//! epistemic logic tree of a source set: two weighted maps of models, one for
//! sources near the site and one for distant sources, with a linear blend
//! across an interpolation band around the cutoff distance.
//!
//! All (IMT, GMM)-keyed tables in this crate are `BTreeMap`s so that
//! iteration order — and therefore floating-point accumulation order — is
//! fixed regardless of execution mode.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calc::input::HazardInput;
use crate::error::{HazardError, Result};
use crate::imt::Imt;
use crate::mf2013;

/// Tolerance inside which a logic-tree weight map must sum to one.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Registered ground motion model identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Gmm {
    /// Morikawa & Fujiwara (2013), crustal coefficients.
    Mf2013Crustal,
    /// Morikawa & Fujiwara (2013), interplate coefficients.
    Mf2013Interplate,
    /// Morikawa & Fujiwara (2013), intraplate coefficients.
    Mf2013Intraplate,
}

impl Gmm {
    /// The model instance for one IMT.
    ///
    /// # Errors
    ///
    /// [`HazardError::UnsupportedImt`] when the model publishes no
    /// coefficients for `imt`.
    pub fn instance(&self, imt: Imt) -> Result<&'static dyn GroundMotionModel> {
        mf2013::instance(*self, imt)
            .map(|m| m as &'static dyn GroundMotionModel)
            .ok_or(HazardError::UnsupportedImt { gmm: *self, imt })
    }
}

impl fmt::Display for Gmm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gmm::Mf2013Crustal => "MF2013 (crustal)",
            Gmm::Mf2013Interplate => "MF2013 (interplate)",
            Gmm::Mf2013Intraplate => "MF2013 (intraplate)",
        };
        write!(f, "{label}")
    }
}

/// One ground-motion sample: natural-log mean amplitude and its sigma, both
/// in ln units of g (or ln cm/s for PGV).
#[derive(Debug, Clone, Copy)]
pub struct GroundMotion {
    pub mean: f64,
    pub sigma: f64,
}

/// An empirical log-normal predictor of a single IMT.
///
/// Implementations must return finite `mean` and positive finite `sigma` for
/// every input; the pipeline treats anything else as a fatal configuration
/// error.
pub trait GroundMotionModel: Send + Sync {
    /// Evaluate the model for one rupture input.
    fn calc(&self, input: &HazardInput) -> GroundMotion;
}

/// Dense table of model instances, one per (GMM, IMT) pair, resolved once
/// before the pipeline runs so unsupported combinations fail fast.
#[derive(Clone)]
pub struct GmmInstanceTable {
    map: BTreeMap<(Gmm, Imt), &'static dyn GroundMotionModel>,
}

impl GmmInstanceTable {
    /// Resolve instances for every combination of `gmms` and `imts`.
    pub fn build(gmms: impl IntoIterator<Item = Gmm>, imts: &[Imt]) -> Result<Self> {
        let mut map = BTreeMap::new();
        for gmm in gmms {
            for &imt in imts {
                map.insert((gmm, imt), gmm.instance(imt)?);
            }
        }
        Ok(Self { map })
    }

    pub fn get(&self, gmm: Gmm, imt: Imt) -> Result<&'static dyn GroundMotionModel> {
        self.map
            .get(&(gmm, imt))
            .copied()
            .ok_or(HazardError::UnsupportedImt { gmm, imt })
    }
}

impl fmt::Debug for GmmInstanceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GmmInstanceTable")
            .field("pairs", &self.map.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The GMM logic tree of one source set: near- and far-field weight maps
/// around a cutoff distance, blended linearly across an interpolation band.
#[derive(Debug, Clone)]
pub struct GmmSet {
    near: BTreeMap<Gmm, f64>,
    far: BTreeMap<Gmm, f64>,
    cutoff_km: f64,
    blend_band_km: f64,
}

impl GmmSet {
    /// Start a new single-use builder.
    pub fn builder() -> GmmSetBuilder {
        GmmSetBuilder::default()
    }

    /// A single-model set with weight one in both distance regimes.
    pub fn single(gmm: Gmm) -> GmmSet {
        GmmSet {
            near: BTreeMap::from([(gmm, 1.0)]),
            far: BTreeMap::from([(gmm, 1.0)]),
            cutoff_km: f64::INFINITY,
            blend_band_km: 0.0,
        }
    }

    /// The models of this set, in fixed order.
    pub fn gmms(&self) -> impl Iterator<Item = Gmm> + '_ {
        self.near.keys().copied()
    }

    /// The logic-tree weight of `gmm` for a source whose minimum rJB is
    /// `distance_km`.
    pub fn weight(&self, gmm: Gmm, distance_km: f64) -> f64 {
        let near = self.near.get(&gmm).copied().unwrap_or(0.0);
        let far = self.far.get(&gmm).copied().unwrap_or(0.0);
        let half = self.blend_band_km / 2.0;
        if distance_km <= self.cutoff_km - half {
            near
        } else if distance_km >= self.cutoff_km + half {
            far
        } else {
            let c = (distance_km - self.cutoff_km + half) / self.blend_band_km;
            near * (1.0 - c) + far * c
        }
    }
}

/// Single-use builder for [`GmmSet`]. Validates weight closure in both
/// distance regimes.
#[derive(Debug, Default)]
pub struct GmmSetBuilder {
    near: BTreeMap<Gmm, f64>,
    far: Option<BTreeMap<Gmm, f64>>,
    cutoff_km: Option<f64>,
    blend_band_km: f64,
}

impl GmmSetBuilder {
    /// Weights for sources within the cutoff distance. Also used beyond the
    /// cutoff unless [`far_weights`](Self::far_weights) is set.
    pub fn weights(mut self, weights: impl IntoIterator<Item = (Gmm, f64)>) -> Self {
        self.near = weights.into_iter().collect();
        self
    }

    /// Weights for sources beyond the cutoff distance.
    pub fn far_weights(mut self, weights: impl IntoIterator<Item = (Gmm, f64)>) -> Self {
        self.far = Some(weights.into_iter().collect());
        self
    }

    /// Distance separating the two weight regimes, km.
    pub fn cutoff(mut self, cutoff_km: f64) -> Self {
        self.cutoff_km = Some(cutoff_km);
        self
    }

    /// Width of the linear interpolation band straddling the cutoff, km.
    pub fn blend_band(mut self, band_km: f64) -> Self {
        self.blend_band_km = band_km;
        self
    }

    /// Seal the set.
    ///
    /// # Errors
    ///
    /// [`HazardError::InvalidWeights`] when either regime's weights do not
    /// sum to one within `1e-9`, when the set is empty, or when the two
    /// regimes do not cover the same models.
    pub fn build(self) -> Result<GmmSet> {
        let near = self.near;
        let far = self.far.unwrap_or_else(|| near.clone());
        for (label, map) in [("near-field gmm", &near), ("far-field gmm", &far)] {
            let sum: f64 = map.values().sum();
            if map.is_empty() || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(HazardError::InvalidWeights {
                    context: label.to_string(),
                    sum,
                });
            }
        }
        if !near.keys().eq(far.keys()) {
            return Err(HazardError::InvalidWeights {
                context: "near- and far-field gmm sets differ".to_string(),
                sum: far.values().sum(),
            });
        }
        Ok(GmmSet {
            near,
            far,
            cutoff_km: self.cutoff_km.unwrap_or(f64::INFINITY),
            blend_band_km: self.blend_band_km.max(0.0),
        })
    }
}
