//! Pre-indexed fault-system source sets.
//!
//! A [`SystemSourceSet`] holds the rupture table of an inversion-style fault
//! model: many thousands of ruptures sharing geometry through a common table
//! of fault sections. Per-section distances to a site are computed once; a
//! word-packed [`BitSet`] marks the sections inside the distance cutoff, and
//! a rupture participates when any of its sections is marked. The selected
//! ruptures are materialized into a single input list and flow through the
//! normal ground-motion and curve stages in bulk.

use std::sync::Arc;

use geo::Point;

use crate::error::{HazardError, Result};
use crate::surface::RuptureSurface;

/// A fixed-size set of section indices, packed into 64-bit words.
#[derive(Debug, Clone)]
pub(crate) struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.words[index / 64] |= 1 << (index % 64);
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// One rupture of the system: its magnitude, rate, rake and the sections it
/// breaks, by index into the section table.
#[derive(Debug, Clone)]
pub struct SystemRupture {
    pub mag: f64,
    pub rate: f64,
    pub rake: f64,
    pub sections: Vec<usize>,
}

/// The section and rupture tables of one fault-system model.
#[derive(Debug, Clone)]
pub struct SystemSourceSet {
    name: String,
    sections: Vec<Arc<RuptureSurface>>,
    ruptures: Vec<SystemRupture>,
}

impl SystemSourceSet {
    pub fn builder() -> SystemSourceSetBuilder {
        SystemSourceSetBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> &[Arc<RuptureSurface>] {
        &self.sections
    }

    pub fn ruptures(&self) -> &[SystemRupture] {
        &self.ruptures
    }

    /// Mark the sections whose rJB is within `cutoff_km` of `site`, and
    /// return the per-section rJB values alongside.
    pub(crate) fn sections_within(
        &self,
        site: Point<f64>,
        cutoff_km: f64,
    ) -> Result<(BitSet, Vec<f64>)> {
        let mut bits = BitSet::new(self.sections.len());
        let mut distances = Vec::with_capacity(self.sections.len());
        for (i, section) in self.sections.iter().enumerate() {
            let d = section.distance_to(site);
            if !d.is_finite() {
                return Err(HazardError::NonFiniteDistance {
                    source_name: self.name.clone(),
                });
            }
            if d.rjb <= cutoff_km {
                bits.set(i);
            }
            distances.push(d.rjb);
        }
        Ok((bits, distances))
    }
}

/// Single-use builder for [`SystemSourceSet`].
#[derive(Debug, Default)]
pub struct SystemSourceSetBuilder {
    name: Option<String>,
    sections: Vec<Arc<RuptureSurface>>,
    ruptures: Vec<SystemRupture>,
}

impl SystemSourceSetBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a section surface; returns its index order implicitly.
    pub fn section(mut self, surface: RuptureSurface) -> Self {
        self.sections.push(Arc::new(surface));
        self
    }

    pub fn rupture(mut self, mag: f64, rate: f64, rake: f64, sections: Vec<usize>) -> Self {
        self.ruptures.push(SystemRupture {
            mag,
            rate,
            rake,
            sections,
        });
        self
    }

    pub fn build(self) -> Result<SystemSourceSet> {
        let name = self.name.unwrap_or_else(|| "unnamed system".to_string());
        if self.sections.is_empty() || self.ruptures.is_empty() {
            return Err(HazardError::EmptySource { name });
        }
        for rupture in &self.ruptures {
            if rupture.sections.is_empty() {
                return Err(HazardError::InvalidRupture {
                    source_name: name.clone(),
                    detail: "rupture references no sections".to_string(),
                });
            }
            if let Some(&bad) = rupture
                .sections
                .iter()
                .find(|&&i| i >= self.sections.len())
            {
                return Err(HazardError::InvalidRupture {
                    source_name: name.clone(),
                    detail: format!("section index {bad} out of range"),
                });
            }
            if !(rupture.rate.is_finite() && rupture.rate >= 0.0) || !rupture.mag.is_finite() {
                return Err(HazardError::InvalidRupture {
                    source_name: name.clone(),
                    detail: format!(
                        "rupture (mag {}, rate {}) is not finite",
                        rupture.mag, rupture.rate
                    ),
                });
            }
        }
        Ok(SystemSourceSet {
            name,
            sections: self.sections,
            ruptures: self.ruptures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PointSurface;

    fn point_section(lon: f64, lat: f64) -> RuptureSurface {
        RuptureSurface::Point(PointSurface {
            location: Point::new(lon, lat),
            depth: 8.0,
        })
    }

    #[test]
    fn test_bitset() {
        let mut bits = BitSet::new(130);
        bits.set(0);
        bits.set(64);
        bits.set(129);
        assert!(bits.get(0) && bits.get(64) && bits.get(129));
        assert!(!bits.get(1) && !bits.get(63) && !bits.get(128));
        assert_eq!(bits.count(), 3);
    }

    #[test]
    fn test_builder_rejects_out_of_range_section() {
        let result = SystemSourceSet::builder()
            .name("sys")
            .section(point_section(142.0, 50.0))
            .rupture(6.5, 0.001, 0.0, vec![0, 3])
            .build();
        assert!(matches!(result, Err(HazardError::InvalidRupture { .. })));
    }

    #[test]
    fn test_sections_within_cutoff() {
        let sys = SystemSourceSet::builder()
            .name("sys")
            .section(point_section(142.0, 50.0))
            .section(point_section(145.0, 50.0))
            .rupture(6.5, 0.001, 0.0, vec![0])
            .rupture(7.0, 0.0005, 0.0, vec![0, 1])
            .build()
            .unwrap();
        let site = Point::new(142.1, 50.0);
        let (bits, distances) = sys.sections_within(site, 100.0).unwrap();
        assert!(bits.get(0));
        assert!(!bits.get(1));
        assert_eq!(distances.len(), 2);
        assert!(distances[0] < distances[1]);
    }
}
