//! Stage 1: expand a source into per-rupture inputs.
//!
//! For every rupture of a source, the surface is queried once for its site
//! distances, dip, width and depth; the hypocentral depth is derived and the
//! result is frozen into a [`HazardInput`]. Distances are never recomputed
//! downstream. Ruptures beyond the distance cutoff are still emitted —
//! filtering happens at the source-set level to preserve rupture ordering.

use crate::error::{HazardError, Result};
use crate::site::Site;
use crate::source::{Rupture, Source};
use crate::surface::RuptureSurface;

/// Everything a GMM needs to evaluate one rupture at one site.
#[derive(Debug, Clone)]
pub struct HazardInput {
    /// Annual rate of the rupture (or its variant weight inside a cluster).
    pub rate: f64,
    pub mag: f64,
    pub rjb: f64,
    pub rrup: f64,
    pub rx: f64,
    pub dip: f64,
    pub width: f64,
    pub z_top: f64,
    /// Hypocentral depth, km: mid-width down dip, clamped above the bottom
    /// edge of the surface.
    pub z_hyp: f64,
    pub rake: f64,
    pub vs30: f64,
    pub vs_inferred: bool,
    pub z1p0: Option<f64>,
    pub z2p5: Option<f64>,
}

/// The ordered rupture inputs of one source at one site.
#[derive(Debug, Clone)]
pub struct InputList {
    pub(crate) source_name: String,
    /// Minimum rJB over the inputs; drives GMM branch selection.
    pub(crate) min_rjb: f64,
    pub(crate) inputs: Vec<HazardInput>,
}

impl InputList {
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn min_rjb(&self) -> f64 {
        self.min_rjb
    }

    pub fn inputs(&self) -> &[HazardInput] {
        &self.inputs
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Build inputs for `ruptures` in declared order.
    pub(crate) fn from_ruptures(name: &str, ruptures: &[Rupture], site: &Site) -> Result<InputList> {
        if ruptures.is_empty() {
            return Err(HazardError::EmptySource {
                name: name.to_string(),
            });
        }
        let mut inputs = Vec::with_capacity(ruptures.len());
        let mut min_rjb = f64::INFINITY;
        for rupture in ruptures {
            let input = build_input(rupture.rate, rupture.mag, rupture.rake, &rupture.surface, site)
                .ok_or_else(|| HazardError::NonFiniteDistance {
                    source_name: name.to_string(),
                })?;
            min_rjb = min_rjb.min(input.rjb);
            inputs.push(input);
        }
        Ok(InputList {
            source_name: name.to_string(),
            min_rjb,
            inputs,
        })
    }
}

/// Compute one input from rupture attributes and the captured site. Returns
/// `None` when the surface yields a non-finite distance.
pub(crate) fn build_input(
    rate: f64,
    mag: f64,
    rake: f64,
    surface: &RuptureSurface,
    site: &Site,
) -> Option<HazardInput> {
    let distances = surface.distance_to(site.location());
    if !distances.is_finite() {
        return None;
    }
    let dip = surface.dip();
    let width = surface.width();
    let z_top = surface.z_top();
    // Hypocenter at mid-width down dip, never below the bottom edge.
    let z_hyp = (z_top + dip.to_radians().sin() * width / 2.0).min(surface.z_bottom());
    Some(HazardInput {
        rate,
        mag,
        rjb: distances.rjb,
        rrup: distances.rrup,
        rx: distances.rx,
        dip,
        width,
        z_top,
        z_hyp,
        rake,
        vs30: site.vs30,
        vs_inferred: site.vs_inferred,
        z1p0: site.z1p0,
        z2p5: site.z2p5,
    })
}

/// Expand `source` into its input list against `site`.
pub fn source_to_inputs(source: &Source, site: &Site) -> Result<InputList> {
    InputList::from_ruptures(source.name(), source.ruptures(), site)
}
