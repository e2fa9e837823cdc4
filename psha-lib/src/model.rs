//! `SourceSet` and `HazardModel` containers.
//!
//! A [`SourceSet`] is one logic-tree branch: a weighted bundle of sources
//! sharing a GMM logic tree and an optional distance filter. A
//! [`HazardModel`] is the ordered collection of source sets a calculation
//! runs over. Both are immutable after their single-use builders seal them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HazardError, Result};
use crate::gmm::GmmSet;
use crate::source::{ClusterSource, Source};
use crate::system::SystemSourceSet;

/// The closed source taxonomy tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SourceType {
    Area,
    Cluster,
    Fault,
    Grid,
    Interface,
    System,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceType::Area => "area",
            SourceType::Cluster => "cluster",
            SourceType::Fault => "fault",
            SourceType::Grid => "grid",
            SourceType::Interface => "interface",
            SourceType::System => "system",
        };
        write!(f, "{label}")
    }
}

/// The payload of a source set. Ordinary sources fan out per source;
/// clusters and systems run their specialized pipelines.
#[derive(Debug, Clone)]
pub enum Sources {
    Ordinary(Vec<Source>),
    Cluster(Vec<ClusterSource>),
    System(SystemSourceSet),
}

/// One logic-tree branch of the hazard model.
#[derive(Debug, Clone)]
pub struct SourceSet {
    name: String,
    id: u32,
    weight: f64,
    gmms: GmmSet,
    sources: Sources,
    distance_filter_km: Option<f64>,
}

impl SourceSet {
    pub fn builder() -> SourceSetBuilder {
        SourceSetBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Outer logic-tree weight, applied once when this set's curves fold
    /// into the model total.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn gmms(&self) -> &GmmSet {
        &self.gmms
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// Set-level distance filter, km; overrides the config cutoff.
    pub fn distance_filter_km(&self) -> Option<f64> {
        self.distance_filter_km
    }

    pub fn source_type(&self) -> SourceType {
        match &self.sources {
            Sources::Ordinary(sources) => sources
                .first()
                .map(Source::source_type)
                .unwrap_or(SourceType::Fault),
            Sources::Cluster(_) => SourceType::Cluster,
            Sources::System(_) => SourceType::System,
        }
    }
}

/// Single-use builder for [`SourceSet`].
#[derive(Debug, Default)]
pub struct SourceSetBuilder {
    name: Option<String>,
    id: u32,
    weight: Option<f64>,
    gmms: Option<GmmSet>,
    sources: Option<Sources>,
    distance_filter_km: Option<f64>,
}

impl SourceSetBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Outer logic-tree weight in (0, 1].
    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn gmms(mut self, gmms: GmmSet) -> Self {
        self.gmms = Some(gmms);
        self
    }

    pub fn sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = Some(Sources::Ordinary(sources));
        self
    }

    pub fn clusters(mut self, clusters: Vec<ClusterSource>) -> Self {
        self.sources = Some(Sources::Cluster(clusters));
        self
    }

    pub fn system(mut self, system: SystemSourceSet) -> Self {
        self.sources = Some(Sources::System(system));
        self
    }

    /// Set-level distance filter, km.
    pub fn distance_filter(mut self, km: f64) -> Self {
        self.distance_filter_km = Some(km);
        self
    }

    pub fn build(self) -> Result<SourceSet> {
        let name = self.name.unwrap_or_else(|| "unnamed set".to_string());
        let weight = self.weight.unwrap_or(1.0);
        if !(weight.is_finite() && weight > 0.0 && weight <= 1.0) {
            return Err(HazardError::InvalidSetWeight { name, weight });
        }
        let gmms = self
            .gmms
            .ok_or_else(|| HazardError::InvalidWeights {
                context: format!("source set `{name}` has no gmm logic tree"),
                sum: 0.0,
            })?;
        let sources = self
            .sources
            .ok_or_else(|| HazardError::EmptySourceSet { name: name.clone() })?;
        let empty = match &sources {
            Sources::Ordinary(s) => s.is_empty(),
            Sources::Cluster(c) => c.is_empty(),
            Sources::System(sys) => sys.ruptures().is_empty(),
        };
        if empty {
            return Err(HazardError::EmptySourceSet { name });
        }
        Ok(SourceSet {
            name,
            id: self.id,
            weight,
            gmms,
            sources,
            distance_filter_km: self.distance_filter_km,
        })
    }
}

/// A complete, sealed hazard model: ordered source sets.
#[derive(Debug, Clone)]
pub struct HazardModel {
    name: String,
    source_sets: Vec<SourceSet>,
}

impl HazardModel {
    pub fn builder() -> HazardModelBuilder {
        HazardModelBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source sets in declared order.
    pub fn source_sets(&self) -> &[SourceSet] {
        &self.source_sets
    }
}

/// Single-use builder for [`HazardModel`].
#[derive(Debug, Default)]
pub struct HazardModelBuilder {
    name: Option<String>,
    source_sets: Vec<SourceSet>,
}

impl HazardModelBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn source_set(mut self, set: SourceSet) -> Self {
        self.source_sets.push(set);
        self
    }

    pub fn build(self) -> Result<HazardModel> {
        let name = self.name.unwrap_or_else(|| "unnamed model".to_string());
        if self.source_sets.is_empty() {
            return Err(HazardError::EmptySourceSet { name });
        }
        Ok(HazardModel {
            name,
            source_sets: self.source_sets,
        })
    }
}
