//! Implementation of Morikawa & Fujiwara (2013) Ground Motion Prediction
//! Equations (GMPE).
//!
//! This module defines the coefficient tables and calculation logic for the
//! MF2013 model family as used by the hazard pipeline: each instance predicts
//! the natural-log mean and sigma of one intensity measure for a rupture
//! input. Acceleration measures are returned in ln units of g, PGV in
//! ln cm/s.

use std::collections::BTreeMap;
use std::f64::consts::LN_10;
use std::sync::OnceLock;

use crate::calc::input::HazardInput;
use crate::gmm::{Gmm, GroundMotion, GroundMotionModel};
use crate::imt::Imt;

/// Standard acceleration due to gravity, m/s²; converts the published
/// cm/s² medians into g.
const GRAVITY: f64 = 9.81;

/// Fallback depth (m) to the subsurface layer where the shear-wave velocity
/// reaches 1400 m/s, for sites that carry no deep-profile information.
const DEFAULT_DL_M: f64 = 250.0;

/// Morikawa & Fujiwara (2013) coefficients for one (region, IMT) pair.
#[derive(Debug)]
pub struct Mf2013 {
    /// Magnitude upper limit (Mw0)
    pub mw0: f64,
    /// Coefficient for magnitude scaling
    pub a: f64,
    /// Coefficient for distance scaling
    pub b: f64,
    /// Constant term
    pub c: f64,
    /// Distance damping parameter
    pub d: f64,
    /// Exponent scaling factor for distance damping
    pub e: f64,
    /// Standard deviation of the log10 ground motion
    pub sigma: f64,
    /// Coefficient for deep sedimentary layer correction
    pub pd: f64,
    /// Minimum depth for deep sedimentary layer correction
    pub dl_min: f64,
    /// Reference depth for deep layer correction
    pub d0: f64,
    /// Coefficient for Vs30 amplification term
    pub ps: f64,
    /// Maximum Vs30 considered for amplification (Vs_max)
    pub vs_max: f64,
    /// Reference Vs30 value (V0)
    pub v0: f64,
    /// The intensity measure these coefficients predict.
    pub imt: Imt,
}

impl Mf2013 {
    /// Median motion as log10 of cm/s² (PGA, PSA) or cm/s (PGV).
    ///
    /// # Arguments
    ///
    /// * `r_rup` - Rupture distance (km).
    /// * `mag` - Moment magnitude.
    /// * `vs30` - Average shear-wave velocity in the top 30 meters (m/s).
    /// * `dl` - Depth to the 1400 m/s shear-wave velocity layer (m).
    fn log10_median(&self, r_rup: f64, mag: f64, vs30: f64, dl: f64) -> f64 {
        let magnitude = mag.min(self.mw0);
        let a_m_w = self.a * magnitude;

        // Main GMPE equation (log10 of predicted motion)
        let log_a = (a_m_w + self.b * r_rup + self.c)
            - (r_rup + self.d * 10.0_f64.powf(self.e * magnitude)).log10();

        // Amplification by deep sedimentary layers
        let g_d = self.pd * (dl.max(self.dl_min) / self.d0).log10();

        // Vs30 site amplification
        let gs = self.ps * (vs30.min(self.vs_max) / self.v0).log10();

        log_a + g_d + gs
    }
}

impl GroundMotionModel for Mf2013 {
    /// Compute the log-normal ground motion for one rupture input.
    ///
    /// The site's `z1p0` (km) stands in for the depth to the 1400 m/s layer
    /// when present; otherwise [`DEFAULT_DL_M`] applies.
    fn calc(&self, input: &HazardInput) -> GroundMotion {
        let dl = match input.z1p0 {
            Some(z1p0) => z1p0 * 1000.0,
            None => DEFAULT_DL_M,
        };
        let log10_median = self.log10_median(input.rrup, input.mag, input.vs30, dl);
        // cm/s² to ln g for accelerations; PGV stays in cm/s.
        let mean = if self.imt.is_acceleration() {
            log10_median * LN_10 - (100.0 * GRAVITY).ln()
        } else {
            log10_median * LN_10
        };
        GroundMotion {
            mean,
            sigma: self.sigma * LN_10,
        }
    }
}

static INSTANCES: OnceLock<BTreeMap<(Gmm, Imt), Mf2013>> = OnceLock::new();

/// Coefficient lookup for one (model, IMT) pair.
///
/// Returns `None` for combinations with no published coefficients. The table
/// is initialized once and is safe to access from multiple threads.
pub fn instance(gmm: Gmm, imt: Imt) -> Option<&'static Mf2013> {
    INSTANCES.get_or_init(build_table).get(&(gmm, imt))
}

#[rustfmt::skip]
fn build_table() -> BTreeMap<(Gmm, Imt), Mf2013> {
    let mut map = BTreeMap::new();

    // Shared site/basin terms per IMT; b and c vary by tectonic region.
    // Crustal PGA
    map.insert((Gmm::Mf2013Crustal, Imt::Pga), Mf2013 {
        mw0: 8.1, a: 0.5507, b: -0.004531, c: 0.4631, d: 0.006875, e: 0.5,
        sigma: 0.377556, pd: 0.0663, dl_min: 100., d0: 250.,
        ps: -0.3709, vs_max: 1950., v0: 350., imt: Imt::Pga,
    });
    // Interplate PGA
    map.insert((Gmm::Mf2013Interplate, Imt::Pga), Mf2013 {
        mw0: 8.1, a: 0.5507, b: -0.004716, c: 0.5418, d: 0.006875, e: 0.5,
        sigma: 0.377556, pd: 0.0663, dl_min: 100., d0: 250.,
        ps: -0.3709, vs_max: 1950., v0: 350., imt: Imt::Pga,
    });
    // Intraplate PGA
    map.insert((Gmm::Mf2013Intraplate, Imt::Pga), Mf2013 {
        mw0: 8.1, a: 0.5507, b: -0.005273, c: 0.9338, d: 0.006875, e: 0.5,
        sigma: 0.377556, pd: 0.0663, dl_min: 100., d0: 250.,
        ps: -0.3709, vs_max: 1950., v0: 350., imt: Imt::Pga,
    });

    // Crustal PGV
    map.insert((Gmm::Mf2013Crustal, Imt::Pgv), Mf2013 {
        mw0: 8.1, a: 0.6014, b: -0.002602, c: -1.1779, d: 0.002109, e: 0.5,
        sigma: 0.341184, pd: 0.2317, dl_min: 60., d0: 250.,
        ps: -0.5546, vs_max: 1100., v0: 350., imt: Imt::Pgv,
    });
    // Interplate PGV
    map.insert((Gmm::Mf2013Interplate, Imt::Pgv), Mf2013 {
        mw0: 8.1, a: 0.6014, b: -0.002375, c: -1.2682, d: 0.002109, e: 0.5,
        sigma: 0.341184, pd: 0.2317, dl_min: 60., d0: 250.,
        ps: -0.5546, vs_max: 1100., v0: 350., imt: Imt::Pgv,
    });
    // Intraplate PGV
    map.insert((Gmm::Mf2013Intraplate, Imt::Pgv), Mf2013 {
        mw0: 8.1, a: 0.6014, b: -0.003435, c: -0.8601, d: 0.002109, e: 0.5,
        sigma: 0.341184, pd: 0.2317, dl_min: 60., d0: 250.,
        ps: -0.5546, vs_max: 1100., v0: 350., imt: Imt::Pgv,
    });

    // Crustal PSA 0.3s
    map.insert((Gmm::Mf2013Crustal, Imt::Sa0P3), Mf2013 {
        mw0: 8.1, a: 0.563, b: -0.004033, c: 0.639, d: 0.005205, e: 0.5,
        sigma: 0.407229, pd: 0.1006, dl_min: 21., d0: 250.,
        ps: -0.6217, vs_max: 2000., v0: 350., imt: Imt::Sa0P3,
    });
    // Interplate PSA 0.3s
    map.insert((Gmm::Mf2013Interplate, Imt::Sa0P3), Mf2013 {
        mw0: 8.1, a: 0.563, b: -0.00388, c: 0.6544, d: 0.005205, e: 0.5,
        sigma: 0.407229, pd: 0.1006, dl_min: 21., d0: 250.,
        ps: -0.6217, vs_max: 2000., v0: 350., imt: Imt::Sa0P3,
    });
    // Intraplate PSA 0.3s
    map.insert((Gmm::Mf2013Intraplate, Imt::Sa0P3), Mf2013 {
        mw0: 8.1, a: 0.563, b: -0.004427, c: 1.0482, d: 0.005205, e: 0.5,
        sigma: 0.407229, pd: 0.1006, dl_min: 21., d0: 250.,
        ps: -0.6217, vs_max: 2000., v0: 350., imt: Imt::Sa0P3,
    });

    // Crustal PSA 1.0s
    map.insert((Gmm::Mf2013Crustal, Imt::Sa1P0), Mf2013 {
        mw0: 8.1, a: 0.6011, b: -0.001955, c: -0.2766, d: 0.00055, e: 0.5,
        sigma: 0.410513, pd: 0.2744, dl_min: 39.32, d0: 250.,
        ps: -0.6755, vs_max: 1423.23, v0: 350., imt: Imt::Sa1P0,
    });
    // Interplate PSA 1.0s
    map.insert((Gmm::Mf2013Interplate, Imt::Sa1P0), Mf2013 {
        mw0: 8.1, a: 0.6011, b: -0.001256, c: -0.4191, d: 0.00055, e: 0.5,
        sigma: 0.410513, pd: 0.2744, dl_min: 39.32, d0: 250.,
        ps: -0.6755, vs_max: 1423.23, v0: 350., imt: Imt::Sa1P0,
    });
    // Intraplate PSA 1.0s
    map.insert((Gmm::Mf2013Intraplate, Imt::Sa1P0), Mf2013 {
        mw0: 8.1, a: 0.6011, b: -0.00229, c: -0.024, d: 0.00055, e: 0.5,
        sigma: 0.410513, pd: 0.2744, dl_min: 39.32, d0: 250.,
        ps: -0.6755, vs_max: 1423.23, v0: 350., imt: Imt::Sa1P0,
    });

    // Crustal PSA 3.0s
    map.insert((Gmm::Mf2013Crustal, Imt::Sa3P0), Mf2013 {
        mw0: 8.1, a: 0.7089, b: -0.001276, c: -1.6579, d: 0.001021, e: 0.5,
        sigma: 0.379064, pd: 0.3996, dl_min: 69.69, d0: 250.,
        ps: -0.4398, vs_max: 864.01, v0: 350., imt: Imt::Sa3P0,
    });
    // Interplate PSA 3.0s
    map.insert((Gmm::Mf2013Interplate, Imt::Sa3P0), Mf2013 {
        mw0: 8.1, a: 0.7089, b: -0.00047, c: -1.9088, d: 0.001021, e: 0.5,
        sigma: 0.379064, pd: 0.3996, dl_min: 69.69, d0: 250.,
        ps: -0.4398, vs_max: 864.01, v0: 350., imt: Imt::Sa3P0,
    });
    // Intraplate PSA 3.0s
    map.insert((Gmm::Mf2013Intraplate, Imt::Sa3P0), Mf2013 {
        mw0: 8.1, a: 0.7089, b: -0.001086, c: -1.5998, d: 0.001021, e: 0.5,
        sigma: 0.379064, pd: 0.3996, dl_min: 69.69, d0: 250.,
        ps: -0.4398, vs_max: 864.01, v0: 350., imt: Imt::Sa3P0,
    });

    map
}
