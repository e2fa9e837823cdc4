//! Truncated-normal exceedance model variants.
//!
//! Stage 3 of the pipeline integrates one of these models against the
//! configured amplitude ladder: given the log-normal ground motion
//! (`mean`, `sigma`) of a rupture, each variant answers the probability that
//! motion exceeds amplitude `exp(x)` for every x-value of the model curve.
//! Means, sigmas and x-values all live in the same natural-log domain.
//!
//! The variant set is closed and dispatched by match; no trait object is
//! involved.

use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::imt::Imt;

/// Complementary standard normal CDF.
fn phi_c(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

/// CEUS maximum intensity clamp, in ln units of g.
fn ceus_max_intensity(imt: Imt) -> f64 {
    match imt {
        Imt::Pga => 3.0f64.ln(),
        imt if imt.is_acceleration() => 6.0f64.ln(),
        _ => f64::INFINITY,
    }
}

/// Exceedance probability model for a truncated log-normal ground motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceedanceModel {
    /// Untruncated normal exceedance.
    None,
    /// Probability zeroed above `mean + truncation * sigma`, renormalized so
    /// the lower tail is preserved.
    TruncationUpperOnly,
    /// Probability bounded on both sides of the mean at
    /// `truncation * sigma`.
    TruncationLowerUpper,
    /// Upper-only truncation plus the NSHM CEUS maximum-intensity clamp
    /// (3 g PGA, 6 g spectral acceleration).
    NshmCeusMaxIntensity,
}

impl ExceedanceModel {
    /// Probability that motion exceeds `x` given the log-normal
    /// (`mean`, `sigma`) truncated at `truncation` sigma units.
    ///
    /// `sigma == 0` degenerates to a delta at the mean: a unit step down at
    /// `x == mean`.
    pub fn exceedance(&self, mean: f64, sigma: f64, truncation: f64, imt: Imt, x: f64) -> f64 {
        if sigma == 0.0 {
            return if x < mean { 1.0 } else { 0.0 };
        }
        let z = (x - mean) / sigma;
        match self {
            ExceedanceModel::None => phi_c(z),
            ExceedanceModel::TruncationUpperOnly => truncated_upper(z, truncation),
            ExceedanceModel::TruncationLowerUpper => {
                let p_hi = phi_c(truncation);
                let p_lo = phi_c(-truncation);
                ((phi_c(z) - p_hi) / (p_lo - p_hi)).clamp(0.0, 1.0)
            }
            ExceedanceModel::NshmCeusMaxIntensity => {
                if x >= ceus_max_intensity(imt) {
                    0.0
                } else {
                    truncated_upper(z, truncation)
                }
            }
        }
    }

    /// Fill `out` with exceedance probabilities over the ladder `xs`.
    /// `out` is a caller-owned scratch buffer aligned with `xs`.
    pub fn fill(
        &self,
        mean: f64,
        sigma: f64,
        truncation: f64,
        imt: Imt,
        xs: &[f64],
        out: &mut [f64],
    ) {
        debug_assert_eq!(xs.len(), out.len());
        for (x, p) in xs.iter().zip(out.iter_mut()) {
            *p = self.exceedance(mean, sigma, truncation, imt, *x);
        }
    }
}

fn truncated_upper(z: f64, truncation: f64) -> f64 {
    let p_hi = phi_c(truncation);
    ((phi_c(z) - p_hi) / (1.0 - p_hi)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::approx_eq;

    const TRUNC: f64 = 3.0;

    #[test]
    fn test_untruncated_median() {
        let p = ExceedanceModel::None.exceedance(-1.0, 0.6, TRUNC, Imt::Pga, -1.0);
        assert!(approx_eq(p, 0.5, 1e-12));
    }

    #[test]
    fn test_sigma_zero_is_step() {
        let model = ExceedanceModel::TruncationUpperOnly;
        assert_eq!(model.exceedance(0.0, 0.0, TRUNC, Imt::Pga, -0.1), 1.0);
        assert_eq!(model.exceedance(0.0, 0.0, TRUNC, Imt::Pga, 0.0), 0.0);
        assert_eq!(model.exceedance(0.0, 0.0, TRUNC, Imt::Pga, 0.1), 0.0);
    }

    #[test]
    fn test_upper_truncation_bounds() {
        let model = ExceedanceModel::TruncationUpperOnly;
        // Zero at and beyond the truncation point.
        let p = model.exceedance(0.0, 1.0, TRUNC, Imt::Pga, 3.0);
        assert_eq!(p, 0.0);
        let p = model.exceedance(0.0, 1.0, TRUNC, Imt::Pga, 5.0);
        assert_eq!(p, 0.0);
        // Far below the mean the lower tail survives renormalization.
        let p = model.exceedance(0.0, 1.0, TRUNC, Imt::Pga, -10.0);
        assert!(approx_eq(p, 1.0, 1e-9));
    }

    #[test]
    fn test_lower_upper_truncation_bounds() {
        let model = ExceedanceModel::TruncationLowerUpper;
        assert_eq!(model.exceedance(0.0, 1.0, TRUNC, Imt::Pga, -3.0), 1.0);
        assert_eq!(model.exceedance(0.0, 1.0, TRUNC, Imt::Pga, 3.0), 0.0);
        let mid = model.exceedance(0.0, 1.0, TRUNC, Imt::Pga, 0.0);
        assert!(approx_eq(mid, 0.5, 1e-12));
    }

    #[test]
    fn test_ceus_clamp() {
        let model = ExceedanceModel::NshmCeusMaxIntensity;
        // Even an extreme mean yields nothing above 3 g PGA.
        let p = model.exceedance(2.0, 1.0, TRUNC, Imt::Pga, 3.0f64.ln() + 0.01);
        assert_eq!(p, 0.0);
        // Below the clamp it matches the plain upper truncation.
        let x = 0.5;
        let clamped = model.exceedance(0.0, 1.0, TRUNC, Imt::Pga, x);
        let plain = ExceedanceModel::TruncationUpperOnly.exceedance(0.0, 1.0, TRUNC, Imt::Pga, x);
        assert_eq!(clamped, plain);
    }

    #[test]
    fn test_fill_is_non_increasing() {
        let xs: Vec<f64> = (0..20).map(|i| -4.0 + i as f64 * 0.4).collect();
        let mut out = vec![0.0; xs.len()];
        for model in [
            ExceedanceModel::None,
            ExceedanceModel::TruncationUpperOnly,
            ExceedanceModel::TruncationLowerUpper,
            ExceedanceModel::NshmCeusMaxIntensity,
        ] {
            model.fill(-1.0, 0.7, TRUNC, Imt::Pga, &xs, &mut out);
            assert!(out.windows(2).all(|w| w[0] >= w[1]), "{model:?}");
            assert!(out.iter().all(|p| (0.0..=1.0).contains(p)), "{model:?}");
        }
    }
}
