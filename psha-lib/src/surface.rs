//! Rupture surface geometry and site distances.
//!
//! Two surface shapes cover the source taxonomy: a [`PointSurface`] for
//! gridded seismicity and an inclined rectangular [`PlanarSurface`] for
//! faults. A surface answers the distance metrics GMPEs consume — rJB, rRup
//! and rX — for a site, plus its dip, width and depth extent.
//!
//! Planar distances are computed in a site-centered local frame: great-circle
//! offsets east and north of the site (via [`Haversine`]) give Cartesian
//! kilometers, and the rectangle reduces to independent along-strike and
//! cross-section interval distances, which makes rRup exact for the plane.

use geo::{Distance, Haversine, Point};

/// Site-to-rupture distance bundle, km.
#[derive(Debug, Clone, Copy)]
pub struct Distances {
    /// Joyner-Boore distance: shortest horizontal distance to the surface
    /// projection of the rupture.
    pub rjb: f64,
    /// Shortest distance to the rupture plane.
    pub rrup: f64,
    /// Horizontal distance from the trace, positive toward the hanging wall.
    pub rx: f64,
}

impl Distances {
    pub fn is_finite(&self) -> bool {
        self.rjb.is_finite() && self.rrup.is_finite() && self.rx.is_finite()
    }
}

/// Geometry of one potential rupture.
#[derive(Debug, Clone)]
pub enum RuptureSurface {
    Point(PointSurface),
    Plane(PlanarSurface),
}

/// A point rupture at depth, used by grid and area sources.
#[derive(Debug, Clone)]
pub struct PointSurface {
    /// Epicentral location.
    pub location: Point<f64>,
    /// Depth to the rupture, km.
    pub depth: f64,
}

/// An inclined rectangular fault plane.
#[derive(Debug, Clone)]
pub struct PlanarSurface {
    /// Surface trace endpoints, in strike order.
    pub trace: (Point<f64>, Point<f64>),
    /// Dip in degrees, measured down from horizontal; (0, 90].
    pub dip: f64,
    /// Depth to the top of the rupture, km.
    pub z_top: f64,
    /// Down-dip width, km.
    pub width: f64,
}

impl RuptureSurface {
    /// Dip in degrees. Point surfaces are treated as vertical.
    pub fn dip(&self) -> f64 {
        match self {
            RuptureSurface::Point(_) => 90.0,
            RuptureSurface::Plane(p) => p.dip,
        }
    }

    /// Down-dip width, km. Zero for point surfaces.
    pub fn width(&self) -> f64 {
        match self {
            RuptureSurface::Point(_) => 0.0,
            RuptureSurface::Plane(p) => p.width,
        }
    }

    /// Depth to the top of the rupture, km.
    pub fn z_top(&self) -> f64 {
        match self {
            RuptureSurface::Point(p) => p.depth,
            RuptureSurface::Plane(p) => p.z_top,
        }
    }

    /// Depth to the bottom edge, km.
    pub fn z_bottom(&self) -> f64 {
        match self {
            RuptureSurface::Point(p) => p.depth,
            RuptureSurface::Plane(p) => p.z_top + p.width * p.dip.to_radians().sin(),
        }
    }

    /// Distance metrics from `site` to this surface.
    pub fn distance_to(&self, site: Point<f64>) -> Distances {
        match self {
            RuptureSurface::Point(p) => p.distance_to(site),
            RuptureSurface::Plane(p) => p.distance_to(site),
        }
    }
}

impl PointSurface {
    fn distance_to(&self, site: Point<f64>) -> Distances {
        let repi = Haversine.distance(site, self.location) / 1000.0;
        Distances {
            rjb: repi,
            rrup: repi.hypot(self.depth),
            rx: repi,
        }
    }
}

impl PlanarSurface {
    /// Great-circle offsets of `p` east and north of `site`, km.
    fn local_coords(site: Point<f64>, p: Point<f64>) -> (f64, f64) {
        let east = Haversine.distance(site, Point::new(p.x(), site.y())) / 1000.0;
        let north = Haversine.distance(site, Point::new(site.x(), p.y())) / 1000.0;
        let x = if p.x() >= site.x() { east } else { -east };
        let y = if p.y() >= site.y() { north } else { -north };
        (x, y)
    }

    fn distance_to(&self, site: Point<f64>) -> Distances {
        let (x1, y1) = Self::local_coords(site, self.trace.0);
        let (x2, y2) = Self::local_coords(site, self.trace.1);

        // Strike frame: u along strike from the first trace endpoint,
        // t perpendicular, positive toward the hanging wall.
        let (vx, vy) = (x2 - x1, y2 - y1);
        let length = vx.hypot(vy);
        let (ux, uy) = if length > 0.0 {
            (vx / length, vy / length)
        } else {
            (1.0, 0.0)
        };

        // Site relative to the first endpoint.
        let (sx, sy) = (-x1, -y1);
        let u = sx * ux + sy * uy;
        // Cross product sign flips so that the right-hand side of the
        // strike direction (the hanging wall) is positive.
        let t = -(ux * sy - uy * sx);

        let dip_rad = self.dip.to_radians();
        let (cos_d, sin_d) = (dip_rad.cos(), dip_rad.sin());

        // Along-strike clearance outside [0, length].
        let du = if u < 0.0 {
            -u
        } else if u > length {
            u - length
        } else {
            0.0
        };

        // Surface projection spans t in [0, width * cos(dip)].
        let hw = self.width * cos_d;
        let dt = if t < 0.0 {
            -t
        } else if t > hw {
            t - hw
        } else {
            0.0
        };
        let rjb = du.hypot(dt);

        // Closest point on the down-dip cross-section, clamped to the plane.
        let w = (t * cos_d - self.z_top * sin_d).clamp(0.0, self.width);
        let dt_plane = t - w * cos_d;
        let dz_plane = self.z_top + w * sin_d;
        let rrup = (du * du + dt_plane * dt_plane + dz_plane * dz_plane).sqrt();

        Distances { rjb, rrup, rx: t }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::approx_eq;

    // One degree of latitude is close to 111.2 km on the haversine sphere.
    const KM_PER_DEG: f64 = 111.195;

    fn vertical_surface() -> PlanarSurface {
        PlanarSurface {
            trace: (Point::new(142.0, 50.0), Point::new(142.0, 50.5)),
            dip: 90.0,
            z_top: 1.0,
            width: 10.0,
        }
    }

    #[test]
    fn test_point_surface_distances() {
        let surface = RuptureSurface::Point(PointSurface {
            location: Point::new(142.0, 50.0),
            depth: 10.0,
        });
        let d = surface.distance_to(Point::new(142.0, 50.0));
        assert!(approx_eq(d.rjb, 0.0, 1e-9));
        assert!(approx_eq(d.rrup, 10.0, 1e-9));
        assert_eq!(surface.dip(), 90.0);
        assert_eq!(surface.width(), 0.0);
        assert_eq!(surface.z_bottom(), 10.0);
    }

    #[test]
    fn test_vertical_plane_broadside() {
        // Site due east of the trace midpoint; strike runs south to north,
        // so east is the hanging-wall side.
        let surface = vertical_surface();
        let site = Point::new(142.2, 50.25);
        let d = surface.distance_to(site);
        let expected = 0.2 * KM_PER_DEG * (50.25f64.to_radians().cos());
        assert!(approx_eq(d.rjb, expected, 0.1));
        assert!(approx_eq(d.rrup, d.rjb.hypot(1.0), 1e-9));
        assert!(d.rx > 0.0);
    }

    #[test]
    fn test_vertical_plane_footwall_sign() {
        let surface = vertical_surface();
        let d = surface.distance_to(Point::new(141.8, 50.25));
        assert!(d.rx < 0.0);
        assert!(approx_eq(d.rjb, -d.rx, 1e-9));
    }

    #[test]
    fn test_dipping_plane_over_projection() {
        // 45-degree dip, 10 km width: the projection extends ~7.07 km from
        // the trace on the hanging wall. A site above it has rjb = 0.
        let surface = PlanarSurface {
            trace: (Point::new(142.0, 50.0), Point::new(142.0, 50.5)),
            dip: 45.0,
            z_top: 0.0,
            width: 10.0,
        };
        let site = Point::new(142.05, 50.25);
        let d = surface.distance_to(site);
        assert!(approx_eq(d.rjb, 0.0, 1e-9));
        assert!(d.rrup > 0.0 && d.rrup < 5.0);
    }

    #[test]
    fn test_z_bottom() {
        let surface = RuptureSurface::Plane(PlanarSurface {
            trace: (Point::new(142.0, 50.0), Point::new(142.0, 50.5)),
            dip: 30.0,
            z_top: 2.0,
            width: 10.0,
        });
        assert!(approx_eq(surface.z_bottom(), 7.0, 1e-12));
    }
}
