//! Stage 3: integrate exceedance against the model curve.
//!
//! For every (IMT, GMM) pair, each input contributes its truncated-normal
//! exceedance curve scaled by the rupture's annual rate; the sum over inputs
//! is the source's rate curve. Cluster sources replace Poisson rate addition
//! with independent-event combination across segments; fault-system sets
//! materialize one bulk input list through a section bitset before running
//! the same integration.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::calc::ground_motions::{GroundMotions, inputs_to_ground_motions};
use crate::calc::input::{InputList, build_input};
use crate::config::CalcConfig;
use crate::curve::Curve;
use crate::error::{HazardError, Result};
use crate::gmm::{Gmm, GmmInstanceTable, GmmSet};
use crate::imt::Imt;
use crate::site::Site;
use crate::source::ClusterSource;
use crate::system::SystemSourceSet;

/// Per-source rate curves keyed (IMT, GMM), with the scalars the
/// consolidator needs carried forward from the earlier stages.
#[derive(Debug, Clone)]
pub struct HazardCurves {
    pub(crate) source_name: String,
    pub(crate) min_rjb: f64,
    pub(crate) curves: BTreeMap<Imt, BTreeMap<Gmm, Curve>>,
}

impl HazardCurves {
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn get(&self, imt: Imt, gmm: Gmm) -> Option<&Curve> {
        self.curves.get(&imt).and_then(|row| row.get(&gmm))
    }
}

/// Per-cluster rate curves. Retained individually inside the curve set so
/// downstream disaggregation can trace back to single clusters.
#[derive(Debug, Clone)]
pub struct ClusterCurves {
    pub(crate) cluster_name: String,
    pub(crate) min_rjb: f64,
    pub(crate) curves: BTreeMap<Imt, BTreeMap<Gmm, Curve>>,
}

/// Sum rate-scaled exceedance over the inputs of one source.
pub fn ground_motions_to_curves(
    gms: &GroundMotions,
    config: &CalcConfig,
) -> Result<HazardCurves> {
    let exceedance = config.exceedance();
    let truncation = config.truncation();
    let rates: Vec<f64> = gms.inputs().inputs().iter().map(|i| i.rate).collect();

    let mut curves: BTreeMap<Imt, BTreeMap<Gmm, Curve>> = BTreeMap::new();
    for (&imt, row) in &gms.table {
        let xs = config.model_curve(imt)?;
        let mut scratch = vec![0.0; xs.len()];
        let mut out_row = BTreeMap::new();
        for (&gmm, vector) in row {
            let mut gmm_curve = config.zeroed_curve(imt)?;
            for (i, rate) in rates.iter().enumerate() {
                exceedance.fill(
                    vector.means[i],
                    vector.sigmas[i],
                    truncation,
                    imt,
                    xs,
                    &mut scratch,
                );
                gmm_curve.add_scaled_slice(&scratch, *rate);
            }
            out_row.insert(gmm, gmm_curve);
        }
        curves.insert(imt, out_row);
    }
    Ok(HazardCurves {
        source_name: gms.inputs().source_name().to_string(),
        min_rjb: gms.inputs().min_rjb(),
        curves,
    })
}

/// The cluster specialization of stages 1-3.
///
/// Each segment's ruptures are magnitude variants whose rates are weights;
/// per (IMT, GMM) the segment curves are exceedance probabilities, combined
/// across segments as `1 - prod(1 - p_i)` and scaled by the cluster's
/// recurrence rate.
pub fn cluster_to_curves(
    cluster: &ClusterSource,
    site: &Site,
    gmms: &GmmSet,
    config: &CalcConfig,
    instances: &GmmInstanceTable,
) -> Result<ClusterCurves> {
    let exceedance = config.exceedance();
    let truncation = config.truncation();

    // Stages 1-2 per segment.
    let mut segment_motions = Vec::with_capacity(cluster.segments().len());
    let mut min_rjb = f64::INFINITY;
    for segment in cluster.segments() {
        let inputs = InputList::from_ruptures(&segment.name, segment.ruptures(), site)?;
        min_rjb = min_rjb.min(inputs.min_rjb());
        segment_motions.push(inputs_to_ground_motions(inputs, gmms, config.imts(), instances)?);
    }

    let mut curves: BTreeMap<Imt, BTreeMap<Gmm, Curve>> = BTreeMap::new();
    for &imt in config.imts() {
        let xs = config.model_curve(imt)?;
        let mut scratch = vec![0.0; xs.len()];
        let mut out_row = BTreeMap::new();
        for gmm in gmms.gmms() {
            // Complement product across independently rupturing segments.
            let mut complement = vec![1.0; xs.len()];
            for gms in &segment_motions {
                let vector = gms
                    .get(imt, gmm)
                    .ok_or(HazardError::UnsupportedImt { gmm, imt })?;
                let mut segment_prob = vec![0.0; xs.len()];
                for (i, input) in gms.inputs().inputs().iter().enumerate() {
                    exceedance.fill(
                        vector.means[i],
                        vector.sigmas[i],
                        truncation,
                        imt,
                        xs,
                        &mut scratch,
                    );
                    for (p, s) in segment_prob.iter_mut().zip(scratch.iter()) {
                        *p += input.rate * s;
                    }
                }
                for (c, p) in complement.iter_mut().zip(segment_prob.iter()) {
                    *c *= 1.0 - p;
                }
            }
            let ys = complement
                .iter()
                .map(|c| cluster.rate * (1.0 - c))
                .collect();
            out_row.insert(gmm, Curve::new(Arc::clone(xs), ys));
        }
        curves.insert(imt, out_row);
    }
    Ok(ClusterCurves {
        cluster_name: cluster.name.clone(),
        min_rjb,
        curves,
    })
}

/// The fault-system specialization of stage 1: per-section distances are
/// computed once, a bitset keeps the sections within `cutoff_km`, and each
/// participating rupture takes its geometry from its closest section. The
/// selected inputs then flow through stages 2-3 in bulk.
pub fn system_to_curves(
    system: &SystemSourceSet,
    site: &Site,
    gmms: &GmmSet,
    config: &CalcConfig,
    instances: &GmmInstanceTable,
    cutoff_km: f64,
) -> Result<HazardCurves> {
    let (bits, distances) = system.sections_within(site.location(), cutoff_km)?;

    let mut inputs = Vec::new();
    let mut min_rjb = f64::INFINITY;
    if bits.count() > 0 {
        for rupture in system.ruptures() {
            if !rupture.sections.iter().any(|&i| bits.get(i)) {
                continue;
            }
            let closest = rupture
                .sections
                .iter()
                .copied()
                .min_by(|&a, &b| distances[a].total_cmp(&distances[b]))
                .ok_or_else(|| HazardError::InvalidRupture {
                    source_name: system.name().to_string(),
                    detail: "rupture references no sections".to_string(),
                })?;
            let input = build_input(
                rupture.rate,
                rupture.mag,
                rupture.rake,
                &system.sections()[closest],
                site,
            )
            .ok_or_else(|| HazardError::NonFiniteDistance {
                source_name: system.name().to_string(),
            })?;
            min_rjb = min_rjb.min(input.rjb);
            inputs.push(input);
        }
    }

    // Nothing in range: a zero contribution, not an error.
    if inputs.is_empty() {
        let mut curves = BTreeMap::new();
        for &imt in config.imts() {
            let mut row = BTreeMap::new();
            for gmm in gmms.gmms() {
                row.insert(gmm, config.zeroed_curve(imt)?);
            }
            curves.insert(imt, row);
        }
        return Ok(HazardCurves {
            source_name: system.name().to_string(),
            min_rjb,
            curves,
        });
    }

    let list = InputList {
        source_name: system.name().to_string(),
        min_rjb,
        inputs,
    };
    let gms = inputs_to_ground_motions(list, gmms, config.imts(), instances)?;
    ground_motions_to_curves(&gms, config)
}
