//! Site definitions.
//!
//! A [`Site`] bundles the location and near-surface properties a GMPE needs
//! to evaluate ground motion at a point of interest. Sites are immutable
//! values produced by a single-use [`SiteBuilder`].

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::error::{HazardError, Result};

/// Reference shear-wave velocity (m/s) assumed when a site reports none.
pub const DEFAULT_VS30: f64 = 760.0;

/// A geographic site with the near-surface properties used by GMPEs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// Site name, used to pair computed curves with expected-result rows.
    pub name: String,
    /// Longitude in decimal degrees. Example: `142.23567`
    pub lon: f64,
    /// Latitude in decimal degrees. Example: `50.35927`
    pub lat: f64,
    /// Average shear-wave velocity (m/s) in the top 30 meters of soil.
    pub vs30: f64,
    /// Whether `vs30` was inferred rather than measured.
    #[serde(default)]
    pub vs_inferred: bool,
    /// Depth (km) to the 1.0 km/s shear-wave horizon, when known.
    #[serde(default)]
    pub z1p0: Option<f64>,
    /// Depth (km) to the 2.5 km/s shear-wave horizon, when known.
    #[serde(default)]
    pub z2p5: Option<f64>,
}

impl Site {
    /// Start a new single-use site builder.
    pub fn builder() -> SiteBuilder {
        SiteBuilder::default()
    }

    /// Site location as a geographic point.
    pub fn location(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Single-use builder for [`Site`]. `build()` consumes the builder; a sealed
/// site cannot be reopened.
#[derive(Debug, Default)]
pub struct SiteBuilder {
    name: Option<String>,
    lon: Option<f64>,
    lat: Option<f64>,
    vs30: Option<f64>,
    vs_inferred: bool,
    z1p0: Option<f64>,
    z2p5: Option<f64>,
}

impl SiteBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Longitude and latitude in decimal degrees.
    pub fn location(mut self, lon: f64, lat: f64) -> Self {
        self.lon = Some(lon);
        self.lat = Some(lat);
        self
    }

    pub fn vs30(mut self, vs30: f64) -> Self {
        self.vs30 = Some(vs30);
        self
    }

    pub fn vs_inferred(mut self, inferred: bool) -> Self {
        self.vs_inferred = inferred;
        self
    }

    /// Depth (km) to the 1.0 km/s shear-wave horizon.
    pub fn z1p0(mut self, z1p0: f64) -> Self {
        self.z1p0 = Some(z1p0);
        self
    }

    /// Depth (km) to the 2.5 km/s shear-wave horizon.
    pub fn z2p5(mut self, z2p5: f64) -> Self {
        self.z2p5 = Some(z2p5);
        self
    }

    /// Seal the site.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::InvalidSite`] for a missing or non-finite
    /// location, or a non-positive `vs30`.
    pub fn build(self) -> Result<Site> {
        let name = self.name.unwrap_or_else(|| "unnamed".to_string());
        let (lon, lat) = match (self.lon, self.lat) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => (lon, lat),
            _ => {
                return Err(HazardError::InvalidSite {
                    name,
                    detail: "location is missing or non-finite".to_string(),
                });
            }
        };
        let vs30 = self.vs30.unwrap_or(DEFAULT_VS30);
        if !(vs30.is_finite() && vs30 > 0.0) {
            return Err(HazardError::InvalidSite {
                name,
                detail: format!("vs30 {vs30} must be finite and positive"),
            });
        }
        Ok(Site {
            name,
            lon,
            lat,
            vs30,
            vs_inferred: self.vs_inferred,
            z1p0: self.z1p0,
            z2p5: self.z2p5,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let site = Site::builder().location(142.5, 50.0).build().unwrap();
        assert_eq!(site.name, "unnamed");
        assert_eq!(site.vs30, DEFAULT_VS30);
        assert!(!site.vs_inferred);
        assert!(site.z1p0.is_none());
    }

    #[test]
    fn test_builder_rejects_missing_location() {
        assert!(Site::builder().name("s1").vs30(400.0).build().is_err());
    }

    #[test]
    fn test_builder_rejects_bad_vs30() {
        assert!(
            Site::builder()
                .location(142.5, 50.0)
                .vs30(-10.0)
                .build()
                .is_err()
        );
    }
}
