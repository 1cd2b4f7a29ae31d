//! Coordinates and the pure geometric primitives the network engine consumes.
//!
//! Geographic coordinates use `x` = longitude and `y` = latitude in degrees.

use serde::{Deserialize, Serialize};

/// Earth radius used by the great-circle distance, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A 2D or 3D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Easting or longitude
    pub x: f64,
    /// Northing or latitude
    pub y: f64,
    /// Optional elevation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Coordinate {
    /// Create a 2D coordinate.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Create a 3D coordinate.
    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Whether this coordinate carries an elevation.
    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }

    /// The `[x, y]` pair used by the spatial index.
    pub fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// How coordinates are interpreted when measuring distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// Projected plane, Euclidean distance
    #[default]
    Planar,
    /// Longitude/latitude degrees, great-circle distance in meters
    Geographic,
}

impl std::fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateSystem::Planar => write!(f, "Planar"),
            CoordinateSystem::Geographic => write!(f, "Geographic"),
        }
    }
}

/// Planar Euclidean distance ignoring elevation.
pub fn planar_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Elevation difference, zero unless both coordinates are 3D.
fn vertical_offset(a: &Coordinate, b: &Coordinate) -> f64 {
    match (a.z, b.z) {
        (Some(za), Some(zb)) => za - zb,
        _ => 0.0,
    }
}

/// Great-circle distance in meters (spherical law of cosines), floored to 4 decimals.
///
/// Near-coincident points switch to the haversine form, where `acos` close to 1
/// would turn rounding noise into centimeters.
pub fn great_circle_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    if a.x == b.x && a.y == b.y {
        return 0.0;
    }
    let (lat1, lat2) = (a.y.to_radians(), b.y.to_radians());
    let dlon = (a.x - b.x).to_radians();
    let cos_angle = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos();
    let angle = if 1.0 - cos_angle < 1e-10 {
        let h = ((lat2 - lat1) / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * h.sqrt().min(1.0).asin()
    } else {
        cos_angle.clamp(-1.0, 1.0).acos()
    };
    (EARTH_RADIUS_M * angle * 10_000.0).floor() / 10_000.0
}

/// Distance under the given coordinate system, Z-aware when both ends are 3D.
pub fn distance(system: CoordinateSystem, a: &Coordinate, b: &Coordinate) -> f64 {
    let ground = match system {
        CoordinateSystem::Planar => planar_distance(a, b),
        CoordinateSystem::Geographic => great_circle_distance(a, b),
    };
    let dz = vertical_offset(a, b);
    if dz == 0.0 {
        ground
    } else {
        ground.hypot(dz)
    }
}

/// Perpendicular foot of `p` on segment `a`-`b`, clamped to the segment.
///
/// Returns the foot and its parameter `t` in `[0, 1]` along the segment.
/// Elevation is interpolated when both segment ends are 3D.
pub fn project_onto_segment(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> (Coordinate, f64) {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let z = match (a.z, b.z) {
        (Some(za), Some(zb)) => Some(za + (zb - za) * t),
        _ => None,
    };
    let foot = Coordinate {
        x: a.x + dx * t,
        y: a.y + dy * t,
        z,
    };
    (foot, t)
}

/// Distance from `p` to the closest point of segment `a`-`b`.
pub fn point_segment_distance(
    system: CoordinateSystem,
    p: &Coordinate,
    a: &Coordinate,
    b: &Coordinate,
) -> f64 {
    let (foot, _) = project_onto_segment(p, a, b);
    let ground = Coordinate { z: None, ..foot };
    let query = Coordinate { z: None, ..*p };
    distance(system, &query, &ground)
}

/// Z component of `(a - o) x (b - o)`; positive when `b` lies left of `o -> a`.
pub fn cross(o: &Coordinate, a: &Coordinate, b: &Coordinate) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Angle at `c` in triangle `a`-`b`-`c` (law of cosines), in radians.
///
/// Degenerate triangles where `c` coincides with `a` or `b` yield 0.
pub fn angle_at(c: &Coordinate, a: &Coordinate, b: &Coordinate) -> f64 {
    let ca = planar_distance(c, a);
    let cb = planar_distance(c, b);
    let ab = planar_distance(a, b);
    if ca == 0.0 || cb == 0.0 {
        return 0.0;
    }
    let cos = (ca * ca + cb * cb - ab * ab) / (2.0 * ca * cb);
    cos.clamp(-1.0, 1.0).acos()
}

/// Whether segments `p1`-`p2` and `q1`-`q2` intersect (touching counts).
pub fn segments_intersect(p1: &Coordinate, p2: &Coordinate, q1: &Coordinate, q2: &Coordinate) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |a: &Coordinate, b: &Coordinate, p: &Coordinate| {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    };

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(3.0, 4.0);
        assert_eq!(planar_distance(&a, &b), 5.0);
    }

    #[test]
    fn test_distance_is_z_aware() {
        let a = Coordinate::with_z(0.0, 0.0, 0.0);
        let b = Coordinate::with_z(3.0, 0.0, 4.0);
        assert_eq!(distance(CoordinateSystem::Planar, &a, &b), 5.0);

        // Mixed 2D/3D ignores elevation
        let c = Coordinate::new(3.0, 0.0);
        assert_eq!(distance(CoordinateSystem::Planar, &a, &c), 3.0);
    }

    #[test]
    fn test_great_circle_one_degree_of_longitude_on_equator() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let d = great_circle_distance(&a, &b);
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((d - expected).abs() < 1e-3);
        // Floored to 4 decimals
        assert_eq!(d, (d * 10_000.0).floor() / 10_000.0);
    }

    #[test]
    fn test_great_circle_same_point_is_zero() {
        let a = Coordinate::new(12.5, 41.9);
        assert_eq!(great_circle_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_great_circle_short_distances_are_stable() {
        // 1e-7 degrees of latitude is about 1.1 cm
        let a = Coordinate::new(12.5, 41.9);
        let b = Coordinate::new(12.5, 41.900_000_1);
        let d = great_circle_distance(&a, &b);
        let expected = EARTH_RADIUS_M * 1e-7_f64.to_radians();
        assert!((d - expected).abs() < 1e-3, "d={d}");
        assert_eq!(great_circle_distance(&b, &a), d);
    }

    #[test]
    fn test_projection_is_clamped() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(10.0, 0.0);

        let (foot, t) = project_onto_segment(&Coordinate::new(4.0, 3.0), &a, &b);
        assert_eq!(foot, Coordinate::new(4.0, 0.0));
        assert_eq!(t, 0.4);

        let (foot, t) = project_onto_segment(&Coordinate::new(-5.0, 1.0), &a, &b);
        assert_eq!(foot, a);
        assert_eq!(t, 0.0);

        let (foot, t) = project_onto_segment(&Coordinate::new(15.0, 1.0), &a, &b);
        assert_eq!(foot, b);
        assert_eq!(t, 1.0);
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(10.0, 0.0);
        let p = Coordinate::new(5.0, 2.0);
        assert_eq!(point_segment_distance(CoordinateSystem::Planar, &p, &a, &b), 2.0);
    }

    #[test]
    fn test_cross_sign() {
        let o = Coordinate::new(0.0, 0.0);
        let a = Coordinate::new(1.0, 0.0);
        assert!(cross(&o, &a, &Coordinate::new(0.5, 1.0)) > 0.0);
        assert!(cross(&o, &a, &Coordinate::new(0.5, -1.0)) < 0.0);
        assert_eq!(cross(&o, &a, &Coordinate::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_angle_at_right_angle() {
        let a = Coordinate::new(1.0, 0.0);
        let b = Coordinate::new(0.0, 1.0);
        let c = Coordinate::new(0.0, 0.0);
        assert!((angle_at(&c, &a, &b) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_segments_intersect() {
        let p1 = Coordinate::new(0.0, 0.0);
        let p2 = Coordinate::new(10.0, 10.0);
        let q1 = Coordinate::new(0.0, 10.0);
        let q2 = Coordinate::new(10.0, 0.0);
        assert!(segments_intersect(&p1, &p2, &q1, &q2));

        let r1 = Coordinate::new(20.0, 20.0);
        let r2 = Coordinate::new(30.0, 20.0);
        assert!(!segments_intersect(&p1, &p2, &r1, &r2));

        // Touching at an endpoint
        assert!(segments_intersect(&p1, &p2, &p2, &r1));
    }
}
