//! The calculation entry point and its execution modes.
//!
//! [`compute_hazard`] runs the four-stage pipeline over every source set of
//! a model, either on the calling thread or fanned out on a caller-supplied
//! [`rayon::ThreadPool`]. Tasks are keyed by declaration index and reduced
//! in index order — never completion order — so both modes produce bitwise
//! identical results.
//!
//! A [`CancelFlag`] is observed at every stage boundary; once raised, the
//! calculation fails whole with [`HazardError::Cancelled`] and partial curve
//! sets are discarded.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::ThreadPool;
use rayon::prelude::*;

use crate::calc::consolidate::{
    HazardCurveSet, HazardResult, consolidate_cluster_set, consolidate_model, consolidate_set,
};
use crate::calc::curves::{cluster_to_curves, ground_motions_to_curves, system_to_curves};
use crate::calc::ground_motions::inputs_to_ground_motions;
use crate::calc::input::source_to_inputs;
use crate::config::CalcConfig;
use crate::error::{HazardError, Result};
use crate::gmm::{Gmm, GmmInstanceTable};
use crate::model::{HazardModel, SourceSet, Sources};
use crate::site::Site;

/// Shared cancellation flag. Cloning hands out another handle to the same
/// flag; raising it makes every outstanding task exit at its next stage
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(HazardError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Compute the hazard at `site` for `model` under `config`.
///
/// With `pool` absent the pipeline runs sequentially on the calling thread;
/// with a pool, source sets and the sources within them become independent
/// tasks. Both modes yield bitwise-identical results.
///
/// # Errors
///
/// Configuration and model-data errors abort the whole calculation; see
/// [`HazardError`]. No partial result is returned.
pub fn compute_hazard(
    model: &HazardModel,
    config: &CalcConfig,
    site: &Site,
    pool: Option<&ThreadPool>,
) -> Result<HazardResult> {
    compute_hazard_cancellable(model, config, site, pool, &CancelFlag::new())
}

/// As [`compute_hazard`], observing `cancel` at every stage boundary.
pub fn compute_hazard_cancellable(
    model: &HazardModel,
    config: &CalcConfig,
    site: &Site,
    pool: Option<&ThreadPool>,
    cancel: &CancelFlag,
) -> Result<HazardResult> {
    cancel.check()?;

    // Resolve every (gmm, imt) instance up front so unsupported
    // combinations fail before any curve work starts.
    let gmms: BTreeSet<Gmm> = model
        .source_sets()
        .iter()
        .flat_map(|set| set.gmms().gmms())
        .collect();
    let instances = GmmInstanceTable::build(gmms, config.imts())?;

    let curve_sets: Vec<HazardCurveSet> = map_ordered(pool, model.source_sets(), |set| {
        calc_source_set(set, config, site, &instances, pool, cancel)
    })?;

    cancel.check()?;
    consolidate_model(model, config, site, &curve_sets)
}

/// Run stages 1-4 for one source set.
fn calc_source_set(
    set: &SourceSet,
    config: &CalcConfig,
    site: &Site,
    instances: &GmmInstanceTable,
    pool: Option<&ThreadPool>,
    cancel: &CancelFlag,
) -> Result<HazardCurveSet> {
    cancel.check()?;
    let cutoff_km = set.distance_filter_km().unwrap_or(config.max_distance_km());
    match set.sources() {
        Sources::Ordinary(sources) => {
            // Set-level pre-filter; rupture order inside a source is never
            // disturbed.
            let in_range: Vec<_> = sources
                .iter()
                .filter(|s| s.min_rjb(site.location()) <= cutoff_km)
                .collect();
            let curves = map_ordered(pool, &in_range, |source| {
                cancel.check()?;
                let inputs = source_to_inputs(source, site)?;
                let gms =
                    inputs_to_ground_motions(inputs, set.gmms(), config.imts(), instances)?;
                ground_motions_to_curves(&gms, config)
            })?;
            cancel.check()?;
            consolidate_set(set, config, &curves)
        }
        Sources::Cluster(clusters) => {
            let in_range: Vec<_> = clusters
                .iter()
                .filter(|c| c.min_rjb(site.location()) <= cutoff_km)
                .collect();
            let curves = map_ordered(pool, &in_range, |cluster| {
                cancel.check()?;
                cluster_to_curves(cluster, site, set.gmms(), config, instances)
            })?;
            cancel.check()?;
            consolidate_cluster_set(set, config, &curves)
        }
        Sources::System(system) => {
            let curves =
                system_to_curves(system, site, set.gmms(), config, instances, cutoff_km)?;
            cancel.check()?;
            consolidate_set(set, config, std::slice::from_ref(&curves))
        }
    }
}

/// Map `f` over `items`, sequentially or on `pool`, preserving item order in
/// the output either way.
fn map_ordered<T, U, F>(pool: Option<&ThreadPool>, items: &[T], f: F) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> Result<U> + Send + Sync,
{
    match pool {
        Some(pool) => pool.install(|| items.par_iter().map(|item| f(item)).collect()),
        None => items.iter().map(|item| f(item)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::demo_models;
    use crate::imt::Imt;

    fn site() -> Site {
        Site::builder()
            .name("s1")
            .location(142.6, 50.4)
            .vs30(400.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_cancelled_before_start() {
        let model = demo_models().get("demo_single_fault").unwrap();
        let config = CalcConfig::builder().build().unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = compute_hazard_cancellable(model, &config, &site(), None, &cancel);
        assert!(matches!(result, Err(HazardError::Cancelled)));
    }

    #[test]
    fn test_sequential_demo_run() {
        let model = demo_models().get("demo_single_fault").unwrap();
        let config = CalcConfig::builder().build().unwrap();
        let result = compute_hazard(model, &config, &site(), None).unwrap();
        let total = result.total(Imt::Pga).unwrap();
        assert!(total.ys()[0] > 0.0);
        assert!(total.ys().windows(2).all(|w| w[0] >= w[1]));
    }
}
