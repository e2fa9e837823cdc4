//! Stages 4-5: merge per-source curves into set totals, and set totals into
//! the terminal result.
//!
//! GMM logic-tree weights apply here, per curve, before anything rolls into
//! a set total; the set weight applies exactly once, when a curve set folds
//! into the model total. Keeping the two weighting points apart preserves
//! the epistemic branches for downstream reuse.
//!
//! Consolidation always folds collected, declaration-ordered curves
//! sequentially, which is what makes parallel and sequential runs bitwise
//! identical.

use std::collections::BTreeMap;

use crate::calc::curves::{ClusterCurves, HazardCurves};
use crate::config::CalcConfig;
use crate::curve::Curve;
use crate::error::Result;
use crate::gmm::Gmm;
use crate::imt::Imt;
use crate::model::{HazardModel, SourceSet, SourceType};
use crate::site::Site;

/// The consolidated curves of one source set: per-IMT totals, per-GMM
/// aggregates, and — for cluster sets — the retained per-cluster curves.
/// Set-weight is NOT yet applied.
#[derive(Debug, Clone)]
pub struct HazardCurveSet {
    pub(crate) set_name: String,
    pub(crate) set_weight: f64,
    pub(crate) source_type: SourceType,
    pub(crate) totals: BTreeMap<Imt, Curve>,
    pub(crate) by_gmm: BTreeMap<Imt, BTreeMap<Gmm, Curve>>,
    pub(crate) by_cluster: BTreeMap<Imt, Vec<(String, Curve)>>,
}

impl HazardCurveSet {
    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn total(&self, imt: Imt) -> Option<&Curve> {
        self.totals.get(&imt)
    }

    pub fn gmm_curve(&self, imt: Imt, gmm: Gmm) -> Option<&Curve> {
        self.by_gmm.get(&imt).and_then(|row| row.get(&gmm))
    }

    /// Per-cluster weighted curves, present only for cluster sets.
    pub fn cluster_curves(&self, imt: Imt) -> &[(String, Curve)] {
        self.by_cluster.get(&imt).map(Vec::as_slice).unwrap_or(&[])
    }

    fn empty(set: &SourceSet, config: &CalcConfig) -> Result<Self> {
        let mut totals = BTreeMap::new();
        let mut by_gmm = BTreeMap::new();
        for &imt in config.imts() {
            totals.insert(imt, config.zeroed_curve(imt)?);
            let mut row = BTreeMap::new();
            for gmm in set.gmms().gmms() {
                row.insert(gmm, config.zeroed_curve(imt)?);
            }
            by_gmm.insert(imt, row);
        }
        Ok(Self {
            set_name: set.name().to_string(),
            set_weight: set.weight(),
            source_type: set.source_type(),
            totals,
            by_gmm,
            by_cluster: BTreeMap::new(),
        })
    }
}

/// Stage 4 for ordinary and system sets: weight each per-source GMM curve by
/// the logic tree at the source's distance and accumulate.
pub fn consolidate_set(
    set: &SourceSet,
    config: &CalcConfig,
    curves: &[HazardCurves],
) -> Result<HazardCurveSet> {
    let mut out = HazardCurveSet::empty(set, config)?;
    for source_curves in curves {
        accumulate(&mut out, set, source_curves.min_rjb, &source_curves.curves);
    }
    Ok(out)
}

/// Stage 4 for cluster sets: as [`consolidate_set`], but the weighted total
/// of every cluster is also retained by name.
pub fn consolidate_cluster_set(
    set: &SourceSet,
    config: &CalcConfig,
    curves: &[ClusterCurves],
) -> Result<HazardCurveSet> {
    let mut out = HazardCurveSet::empty(set, config)?;
    for cluster in curves {
        accumulate(&mut out, set, cluster.min_rjb, &cluster.curves);
        for (&imt, row) in &cluster.curves {
            let mut weighted = config.zeroed_curve(imt)?;
            for (&gmm, curve) in row {
                weighted.add_scaled(curve, set.gmms().weight(gmm, cluster.min_rjb));
            }
            out.by_cluster
                .entry(imt)
                .or_default()
                .push((cluster.cluster_name.clone(), weighted));
        }
    }
    Ok(out)
}

fn accumulate(
    out: &mut HazardCurveSet,
    set: &SourceSet,
    min_rjb: f64,
    curves: &BTreeMap<Imt, BTreeMap<Gmm, Curve>>,
) {
    for (imt, row) in curves {
        for (gmm, curve) in row {
            let weight = set.gmms().weight(*gmm, min_rjb);
            if let Some(aggregate) = out.by_gmm.get_mut(imt).and_then(|r| r.get_mut(gmm)) {
                aggregate.add_scaled(curve, weight);
            }
            if let Some(total) = out.totals.get_mut(imt) {
                total.add_scaled(curve, weight);
            }
        }
    }
}

/// The terminal value of a calculation: per-IMT total curves in both the
/// log-x annual-rate and linear-x Poisson-probability forms, plus a
/// per-source-type roll-up.
#[derive(Debug, Clone)]
pub struct HazardResult {
    site: Site,
    model_name: String,
    timespan: f64,
    total: BTreeMap<Imt, Curve>,
    probability: BTreeMap<Imt, Curve>,
    by_type: BTreeMap<SourceType, BTreeMap<Imt, Curve>>,
}

impl HazardResult {
    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Poisson exposure window used for the probability curves, years.
    pub fn timespan(&self) -> f64 {
        self.timespan
    }

    /// Total annual-rate curve in the log-amplitude domain.
    pub fn total(&self, imt: Imt) -> Option<&Curve> {
        self.total.get(&imt)
    }

    /// Total exceedance-probability curve over linear amplitudes.
    pub fn probability(&self, imt: Imt) -> Option<&Curve> {
        self.probability.get(&imt)
    }

    /// Annual-rate roll-up by source type.
    pub fn by_type(&self) -> &BTreeMap<SourceType, BTreeMap<Imt, Curve>> {
        &self.by_type
    }
}

/// Stage 5: fold every curve set, scaled by its set weight, into the model
/// total and the per-type roll-up, then materialize both curve forms.
pub fn consolidate_model(
    model: &HazardModel,
    config: &CalcConfig,
    site: &Site,
    curve_sets: &[HazardCurveSet],
) -> Result<HazardResult> {
    let mut total: BTreeMap<Imt, Curve> = BTreeMap::new();
    for &imt in config.imts() {
        total.insert(imt, config.zeroed_curve(imt)?);
    }
    let mut by_type: BTreeMap<SourceType, BTreeMap<Imt, Curve>> = BTreeMap::new();

    for set in curve_sets {
        for (&imt, curve) in &set.totals {
            if let Some(model_total) = total.get_mut(&imt) {
                model_total.add_scaled(curve, set.set_weight);
            }
            let row = by_type.entry(set.source_type).or_default();
            match row.get_mut(&imt) {
                Some(type_total) => type_total.add_scaled(curve, set.set_weight),
                None => {
                    row.insert(imt, curve.scaled(set.set_weight));
                }
            }
        }
    }

    let probability = total
        .iter()
        .map(|(&imt, curve)| (imt, curve.to_poisson(config.timespan())))
        .collect();

    Ok(HazardResult {
        site: site.clone(),
        model_name: model.name().to_string(),
        timespan: config.timespan(),
        total,
        probability,
        by_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::approx_eq;
    use crate::calc::curves::ground_motions_to_curves;
    use crate::calc::ground_motions::inputs_to_ground_motions;
    use crate::calc::input::source_to_inputs;
    use crate::gmm::{GmmInstanceTable, GmmSet};
    use crate::mfd::Mfd;
    use crate::source::{FaultSource, Source};

    fn fixture() -> (SourceSet, CalcConfig, Site, Vec<HazardCurves>) {
        let source = Source::Fault(
            FaultSource::builder()
                .name("f1")
                .trace((142.0, 50.0), (142.0, 50.5))
                .width(12.0)
                .mfd(Mfd::Single { mag: 6.5, rate: 0.01 })
                .build()
                .unwrap(),
        );
        let config = CalcConfig::builder().imts(vec![Imt::Pga]).build().unwrap();
        let site = Site::builder()
            .name("s1")
            .location(142.2, 50.25)
            .vs30(400.0)
            .build()
            .unwrap();
        let set = SourceSet::builder()
            .name("faults")
            .weight(0.5)
            .gmms(GmmSet::single(crate::gmm::Gmm::Mf2013Crustal))
            .sources(vec![source.clone()])
            .build()
            .unwrap();
        let instances = GmmInstanceTable::build(set.gmms().gmms(), config.imts()).unwrap();
        let inputs = source_to_inputs(&source, &site).unwrap();
        let gms = inputs_to_ground_motions(inputs, set.gmms(), config.imts(), &instances).unwrap();
        let curves = vec![ground_motions_to_curves(&gms, &config).unwrap()];
        (set, config, site, curves)
    }

    #[test]
    fn test_set_weight_not_applied_at_stage_four() {
        let (set, config, _, curves) = fixture();
        let curve_set = consolidate_set(&set, &config, &curves).unwrap();
        let total = curve_set.total(Imt::Pga).unwrap();
        let source = curves[0].get(Imt::Pga, crate::gmm::Gmm::Mf2013Crustal).unwrap();
        // Single source, single unit-weight gmm: total equals the source
        // curve untouched by the 0.5 set weight.
        for (t, s) in total.ys().iter().zip(source.ys().iter()) {
            assert_eq!(t, s);
        }
    }

    #[test]
    fn test_idempotent_consolidation() {
        let (set, config, site, curves) = fixture();
        let model = HazardModel::builder()
            .name("m")
            .source_set(set.clone())
            .build()
            .unwrap();
        let curve_set = consolidate_set(&set, &config, &curves).unwrap();
        let expected = curve_set.total(Imt::Pga).unwrap().scaled(set.weight());
        let result =
            consolidate_model(&model, &config, &site, std::slice::from_ref(&curve_set)).unwrap();
        let total = result.total(Imt::Pga).unwrap();
        for (t, e) in total.ys().iter().zip(expected.ys().iter()) {
            assert_eq!(t, e);
        }
        // Per-type roll-up carries the same single contribution.
        let rolled = &result.by_type()[&SourceType::Fault][&Imt::Pga];
        for (r, e) in rolled.ys().iter().zip(expected.ys().iter()) {
            assert_eq!(r, e);
        }
    }

    #[test]
    fn test_log_linear_consistency() {
        let (set, config, site, curves) = fixture();
        let model = HazardModel::builder()
            .name("m")
            .source_set(set.clone())
            .build()
            .unwrap();
        let curve_set = consolidate_set(&set, &config, &curves).unwrap();
        let result =
            consolidate_model(&model, &config, &site, std::slice::from_ref(&curve_set)).unwrap();
        let rates = result.total(Imt::Pga).unwrap();
        let probs = result.probability(Imt::Pga).unwrap();
        for i in 0..rates.len() {
            let expected = 1.0 - (-rates.ys()[i] * config.timespan()).exp();
            assert_eq!(probs.ys()[i], expected);
            assert!(approx_eq(probs.xs()[i], rates.xs()[i].exp(), 1e-12));
        }
    }
}
