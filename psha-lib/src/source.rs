//! Ruptures and the ordinary source taxonomy.
//!
//! A [`Source`] is a generator of [`Rupture`]s. The taxonomy is a closed
//! tagged variant — fault, interface, grid and area — each materialized by a
//! single-use builder from a surface description plus a magnitude-frequency
//! distribution. Cluster sources, which combine their segments with
//! independent-event rules, live here as well; fault-system sets are in
//! [`crate::system`].
//!
//! Ruptures are ordered; the pipeline iterates them in declared order and
//! never reorders, so results are reproducible.

use std::sync::Arc;

use geo::{BoundingRect, Contains, Point, Polygon};

use crate::error::{HazardError, Result};
use crate::gmm::WEIGHT_TOLERANCE;
use crate::mfd::Mfd;
use crate::model::SourceType;
use crate::surface::{PlanarSurface, PointSurface, RuptureSurface};

/// One potential earthquake: annual rate, magnitude, slip sense and
/// geometry. Surfaces are shared between the ruptures of one source.
#[derive(Debug, Clone)]
pub struct Rupture {
    pub rate: f64,
    pub mag: f64,
    pub rake: f64,
    pub surface: Arc<RuptureSurface>,
}

/// An ordinary (non-cluster, non-system) earthquake source.
#[derive(Debug, Clone)]
pub enum Source {
    Fault(FaultSource),
    Interface(FaultSource),
    Grid(GridSource),
    Area(AreaSource),
}

impl Source {
    pub fn name(&self) -> &str {
        match self {
            Source::Fault(s) | Source::Interface(s) => &s.name,
            Source::Grid(s) => &s.name,
            Source::Area(s) => &s.name,
        }
    }

    /// Ruptures in declared order.
    pub fn ruptures(&self) -> &[Rupture] {
        match self {
            Source::Fault(s) | Source::Interface(s) => &s.ruptures,
            Source::Grid(s) => &s.ruptures,
            Source::Area(s) => &s.ruptures,
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            Source::Fault(_) => SourceType::Fault,
            Source::Interface(_) => SourceType::Interface,
            Source::Grid(_) => SourceType::Grid,
            Source::Area(_) => SourceType::Area,
        }
    }

    /// Minimum rJB over this source's surfaces, used by the set-level
    /// distance filter and GMM branch selection.
    pub fn min_rjb(&self, site: Point<f64>) -> f64 {
        match self {
            Source::Fault(s) | Source::Interface(s) => s.surface.distance_to(site).rjb,
            Source::Grid(s) => min_rjb_over(&s.surfaces, site),
            Source::Area(s) => min_rjb_over(&s.surfaces, site),
        }
    }
}

fn min_rjb_over(surfaces: &[Arc<RuptureSurface>], site: Point<f64>) -> f64 {
    surfaces
        .iter()
        .map(|s| s.distance_to(site).rjb)
        .fold(f64::INFINITY, f64::min)
}

/// A finite fault with one planar surface and an MFD of rupture magnitudes.
#[derive(Debug, Clone)]
pub struct FaultSource {
    pub name: String,
    pub(crate) surface: Arc<RuptureSurface>,
    pub(crate) ruptures: Vec<Rupture>,
}

impl FaultSource {
    pub fn builder() -> FaultSourceBuilder {
        FaultSourceBuilder::default()
    }

    pub fn ruptures(&self) -> &[Rupture] {
        &self.ruptures
    }

    pub(crate) fn min_rjb(&self, site: Point<f64>) -> f64 {
        self.surface.distance_to(site).rjb
    }
}

/// Single-use builder for [`FaultSource`].
#[derive(Debug, Default)]
pub struct FaultSourceBuilder {
    name: Option<String>,
    trace: Option<(Point<f64>, Point<f64>)>,
    dip: Option<f64>,
    z_top: f64,
    width: Option<f64>,
    rake: f64,
    mfd: Option<Mfd>,
}

impl FaultSourceBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Surface trace endpoints in strike order, (lon, lat) degrees.
    pub fn trace(mut self, p1: (f64, f64), p2: (f64, f64)) -> Self {
        self.trace = Some((Point::new(p1.0, p1.1), Point::new(p2.0, p2.1)));
        self
    }

    /// Dip in degrees, (0, 90].
    pub fn dip(mut self, dip: f64) -> Self {
        self.dip = Some(dip);
        self
    }

    /// Depth to the top of rupture, km.
    pub fn z_top(mut self, z_top: f64) -> Self {
        self.z_top = z_top;
        self
    }

    /// Down-dip width, km.
    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Rake in degrees.
    pub fn rake(mut self, rake: f64) -> Self {
        self.rake = rake;
        self
    }

    pub fn mfd(mut self, mfd: Mfd) -> Self {
        self.mfd = Some(mfd);
        self
    }

    pub fn build(self) -> Result<FaultSource> {
        let name = self.name.unwrap_or_else(|| "unnamed fault".to_string());
        let invalid = |detail: String| HazardError::InvalidRupture {
            source_name: name.clone(),
            detail,
        };
        let trace = self
            .trace
            .ok_or_else(|| invalid("missing surface trace".to_string()))?;
        let dip = self.dip.unwrap_or(90.0);
        if !(dip > 0.0 && dip <= 90.0) {
            return Err(invalid(format!("dip {dip} outside (0, 90]")));
        }
        let width = self
            .width
            .ok_or_else(|| invalid("missing down-dip width".to_string()))?;
        if !(width.is_finite() && width > 0.0) {
            return Err(invalid(format!("width {width} must be positive")));
        }
        if !(self.z_top.is_finite() && self.z_top >= 0.0) {
            return Err(invalid(format!("z_top {} must be non-negative", self.z_top)));
        }
        let mfd = self
            .mfd
            .ok_or_else(|| invalid("missing magnitude-frequency distribution".to_string()))?;

        let surface = Arc::new(RuptureSurface::Plane(PlanarSurface {
            trace,
            dip,
            z_top: self.z_top,
            width,
        }));
        let ruptures = materialize(&name, &mfd, self.rake, &surface)?;
        Ok(FaultSource {
            name,
            surface,
            ruptures,
        })
    }
}

/// A gridded-seismicity source: point ruptures at depth, each node carrying
/// its own MFD.
#[derive(Debug, Clone)]
pub struct GridSource {
    pub name: String,
    pub(crate) surfaces: Vec<Arc<RuptureSurface>>,
    pub(crate) ruptures: Vec<Rupture>,
}

impl GridSource {
    pub fn builder() -> GridSourceBuilder {
        GridSourceBuilder::default()
    }
}

/// Single-use builder for [`GridSource`]. Ruptures materialize node-major in
/// insertion order.
#[derive(Debug, Default)]
pub struct GridSourceBuilder {
    name: Option<String>,
    rake: f64,
    nodes: Vec<(Point<f64>, f64, Mfd)>,
}

impl GridSourceBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn rake(mut self, rake: f64) -> Self {
        self.rake = rake;
        self
    }

    /// Add one grid node at (lon, lat) degrees and `depth` km.
    pub fn node(mut self, lon: f64, lat: f64, depth: f64, mfd: Mfd) -> Self {
        self.nodes.push((Point::new(lon, lat), depth, mfd));
        self
    }

    pub fn build(self) -> Result<GridSource> {
        let name = self.name.unwrap_or_else(|| "unnamed grid".to_string());
        if self.nodes.is_empty() {
            return Err(HazardError::EmptySource { name });
        }
        let mut surfaces = Vec::with_capacity(self.nodes.len());
        let mut ruptures = Vec::new();
        for (location, depth, mfd) in self.nodes {
            if !(depth.is_finite() && depth >= 0.0) {
                return Err(HazardError::InvalidRupture {
                    source_name: name.clone(),
                    detail: format!("node depth {depth} must be non-negative"),
                });
            }
            let surface = Arc::new(RuptureSurface::Point(PointSurface { location, depth }));
            ruptures.extend(materialize(&name, &mfd, self.rake, &surface)?);
            surfaces.push(surface);
        }
        Ok(GridSource {
            name,
            surfaces,
            ruptures,
        })
    }
}

/// An area source: a polygon gridded into point ruptures, the MFD rates
/// split evenly across the grid nodes.
#[derive(Debug, Clone)]
pub struct AreaSource {
    pub name: String,
    pub border: Polygon<f64>,
    pub(crate) surfaces: Vec<Arc<RuptureSurface>>,
    pub(crate) ruptures: Vec<Rupture>,
}

impl AreaSource {
    pub fn builder() -> AreaSourceBuilder {
        AreaSourceBuilder {
            name: None,
            border: None,
            spacing_deg: 0.1,
            depth: 5.0,
            rake: 0.0,
            mfd: None,
        }
    }
}

/// Single-use builder for [`AreaSource`].
#[derive(Debug)]
pub struct AreaSourceBuilder {
    name: Option<String>,
    border: Option<Polygon<f64>>,
    spacing_deg: f64,
    depth: f64,
    rake: f64,
    mfd: Option<Mfd>,
}

impl AreaSourceBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn border(mut self, border: Polygon<f64>) -> Self {
        self.border = Some(border);
        self
    }

    /// Grid node spacing in degrees.
    pub fn spacing(mut self, spacing_deg: f64) -> Self {
        self.spacing_deg = spacing_deg;
        self
    }

    /// Rupture depth for every node, km.
    pub fn depth(mut self, depth: f64) -> Self {
        self.depth = depth;
        self
    }

    pub fn rake(mut self, rake: f64) -> Self {
        self.rake = rake;
        self
    }

    pub fn mfd(mut self, mfd: Mfd) -> Self {
        self.mfd = Some(mfd);
        self
    }

    pub fn build(self) -> Result<AreaSource> {
        let name = self.name.unwrap_or_else(|| "unnamed area".to_string());
        let invalid = |detail: String| HazardError::InvalidRupture {
            source_name: name.clone(),
            detail,
        };
        let border = self.border.ok_or_else(|| invalid("missing border".to_string()))?;
        if !(self.spacing_deg.is_finite() && self.spacing_deg > 0.0) {
            return Err(invalid(format!(
                "grid spacing {} must be positive",
                self.spacing_deg
            )));
        }
        let mfd = self
            .mfd
            .ok_or_else(|| invalid("missing magnitude-frequency distribution".to_string()))?;
        let rect = border
            .bounding_rect()
            .ok_or_else(|| invalid("degenerate border".to_string()))?;

        // Grid the bounding box, keeping nodes the border contains.
        let mut nodes = Vec::new();
        let mut lat = rect.min().y + self.spacing_deg / 2.0;
        while lat < rect.max().y {
            let mut lon = rect.min().x + self.spacing_deg / 2.0;
            while lon < rect.max().x {
                let p = Point::new(lon, lat);
                if border.contains(&p) {
                    nodes.push(p);
                }
                lon += self.spacing_deg;
            }
            lat += self.spacing_deg;
        }
        if nodes.is_empty() {
            return Err(HazardError::EmptySource { name });
        }

        let share = 1.0 / nodes.len() as f64;
        let mut surfaces = Vec::with_capacity(nodes.len());
        let mut ruptures = Vec::new();
        for location in nodes {
            let surface = Arc::new(RuptureSurface::Point(PointSurface {
                location,
                depth: self.depth,
            }));
            for (mag, rate) in mfd.rates() {
                ruptures.push(validated_rupture(&name, rate * share, mag, self.rake, &surface)?);
            }
            surfaces.push(surface);
        }
        Ok(AreaSource {
            name,
            border,
            surfaces,
            ruptures,
        })
    }
}

/// N fault segments assumed to rupture independently within one
/// Poisson-rate envelope. Segment rupture "rates" are weights over magnitude
/// variants and must sum to one per segment.
#[derive(Debug, Clone)]
pub struct ClusterSource {
    pub name: String,
    /// Annual recurrence rate of the cluster event.
    pub rate: f64,
    pub(crate) segments: Vec<FaultSource>,
}

impl ClusterSource {
    pub fn builder() -> ClusterSourceBuilder {
        ClusterSourceBuilder::default()
    }

    pub fn segments(&self) -> &[FaultSource] {
        &self.segments
    }

    pub(crate) fn min_rjb(&self, site: Point<f64>) -> f64 {
        self.segments
            .iter()
            .map(|s| s.min_rjb(site))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Single-use builder for [`ClusterSource`].
#[derive(Debug, Default)]
pub struct ClusterSourceBuilder {
    name: Option<String>,
    rate: Option<f64>,
    segments: Vec<FaultSource>,
}

impl ClusterSourceBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Annual recurrence rate of the cluster event.
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn segment(mut self, segment: FaultSource) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn build(self) -> Result<ClusterSource> {
        let name = self.name.unwrap_or_else(|| "unnamed cluster".to_string());
        let rate = self.rate.unwrap_or(f64::NAN);
        if !(rate.is_finite() && rate > 0.0) {
            return Err(HazardError::InvalidRupture {
                source_name: name,
                detail: format!("cluster rate {rate} must be positive"),
            });
        }
        if self.segments.is_empty() {
            return Err(HazardError::EmptySource { name });
        }
        // Per-segment variant weights must close to one.
        for segment in &self.segments {
            let sum: f64 = segment.ruptures.iter().map(|r| r.rate).sum();
            if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(HazardError::InvalidWeights {
                    context: format!("cluster `{name}` segment `{}`", segment.name),
                    sum,
                });
            }
        }
        Ok(ClusterSource {
            name,
            rate,
            segments: self.segments,
        })
    }
}

fn validated_rupture(
    source: &str,
    rate: f64,
    mag: f64,
    rake: f64,
    surface: &Arc<RuptureSurface>,
) -> Result<Rupture> {
    if !(rate.is_finite() && rate >= 0.0) {
        return Err(HazardError::InvalidRupture {
            source_name: source.to_string(),
            detail: format!("rate {rate} must be finite and non-negative"),
        });
    }
    if !mag.is_finite() {
        return Err(HazardError::InvalidRupture {
            source_name: source.to_string(),
            detail: format!("magnitude {mag} must be finite"),
        });
    }
    Ok(Rupture {
        rate,
        mag,
        rake,
        surface: Arc::clone(surface),
    })
}

fn materialize(
    source: &str,
    mfd: &Mfd,
    rake: f64,
    surface: &Arc<RuptureSurface>,
) -> Result<Vec<Rupture>> {
    mfd.rates()
        .into_iter()
        .map(|(mag, rate)| validated_rupture(source, rate, mag, rake, surface))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn gr() -> Mfd {
        Mfd::GutenbergRichter {
            a: 4.0,
            b: 1.0,
            m_min: 5.0,
            m_max: 7.0,
            d_mag: 0.5,
        }
    }

    #[test]
    fn test_fault_builder_materializes_mfd() {
        let fault = FaultSource::builder()
            .name("test fault")
            .trace((142.0, 50.0), (142.0, 50.5))
            .dip(60.0)
            .width(12.0)
            .mfd(gr())
            .build()
            .unwrap();
        assert_eq!(fault.ruptures().len(), 5);
        assert!(fault.ruptures().windows(2).all(|w| w[0].mag < w[1].mag));
        // All ruptures share the one surface.
        assert!(
            fault
                .ruptures()
                .iter()
                .all(|r| Arc::ptr_eq(&r.surface, &fault.surface))
        );
    }

    #[test]
    fn test_fault_builder_rejects_bad_dip() {
        let result = FaultSource::builder()
            .name("bad dip")
            .trace((142.0, 50.0), (142.0, 50.5))
            .dip(100.0)
            .width(12.0)
            .mfd(gr())
            .build();
        assert!(matches!(result, Err(HazardError::InvalidRupture { .. })));
    }

    #[test]
    fn test_grid_builder_node_major_order() {
        let grid = GridSource::builder()
            .name("test grid")
            .node(142.0, 50.0, 10.0, Mfd::Single { mag: 5.5, rate: 0.1 })
            .node(142.2, 50.0, 10.0, Mfd::Single { mag: 6.0, rate: 0.05 })
            .build()
            .unwrap();
        let source = Source::Grid(grid);
        assert_eq!(source.ruptures().len(), 2);
        assert_eq!(source.ruptures()[0].mag, 5.5);
        assert_eq!(source.ruptures()[1].mag, 6.0);
    }

    #[test]
    fn test_area_builder_grids_polygon() {
        let border = polygon![
            (x: 142.0, y: 50.0),
            (x: 143.0, y: 50.0),
            (x: 143.0, y: 51.0),
            (x: 142.0, y: 51.0),
        ];
        let area = AreaSource::builder()
            .name("test area")
            .border(border)
            .spacing(0.25)
            .mfd(Mfd::Single { mag: 6.0, rate: 0.04 })
            .build()
            .unwrap();
        let n = area.surfaces.len();
        assert!(n > 4);
        // Node shares preserve the total rate.
        let total: f64 = area.ruptures.iter().map(|r| r.rate).sum();
        assert!((total - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_cluster_builder_enforces_variant_weights() {
        let segment = FaultSource::builder()
            .name("segment a")
            .trace((142.0, 50.0), (142.0, 50.3))
            .width(10.0)
            .mfd(Mfd::Single { mag: 6.8, rate: 0.7 })
            .build()
            .unwrap();
        let result = ClusterSource::builder()
            .name("cluster")
            .rate(0.002)
            .segment(segment)
            .build();
        assert!(matches!(result, Err(HazardError::InvalidWeights { .. })));
    }
}
