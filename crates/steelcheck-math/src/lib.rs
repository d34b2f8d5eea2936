#![warn(missing_docs)]

//! Geometry primitives for the steelcheck connection engine.
//!
//! Thin wrappers around nalgebra providing the vector math the pipeline
//! needs: point and segment-pair distances, local coordinate-frame
//! construction from a member axis, and degeneracy predicates. All
//! lengths are in the model's pre-normalized length units.

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Default proximity tolerance for member-endpoint matching (length units).
pub const ENDPOINT_TOLERANCE: f64 = 100.0;

/// Below this length a member is considered degenerate.
pub const MIN_MEMBER_LENGTH: f64 = 1e-6;

/// Distance between two points.
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    (a - b).norm()
}

/// Midpoint of two points.
pub fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::new(
        (a.x + b.x) * 0.5,
        (a.y + b.y) * 0.5,
        (a.z + b.z) * 0.5,
    )
}

/// True if every coordinate of the point is finite.
pub fn is_finite_point(p: &Point3) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// Closest point on segment `[a, b]` to `p`, and the distance to it.
pub fn point_segment_distance(p: &Point3, a: &Point3, b: &Point3) -> (f64, Point3) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < MIN_MEMBER_LENGTH * MIN_MEMBER_LENGTH {
        return (distance(p, a), *a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (distance(p, &closest), closest)
}

/// Closest distance between segments `[p1, q1]` and `[p2, q2]`.
///
/// Clamped closest-point computation on the two parametric lines; handles
/// parallel and degenerate (point-like) segments.
pub fn segment_segment_distance(p1: &Point3, q1: &Point3, p2: &Point3, q2: &Point3) -> f64 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let eps = MIN_MEMBER_LENGTH * MIN_MEMBER_LENGTH;

    let (s, t) = if a <= eps && e <= eps {
        (0.0, 0.0)
    } else if a <= eps {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= eps {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            // Parallel segments have denom == 0; any s works, pick 0.
            let mut s = if denom > eps {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    let c1 = p1 + d1 * s;
    let c2 = p2 + d2 * t;
    (c1 - c2).norm()
}

/// Angle in radians between two vectors, in `[0, pi]`.
///
/// Returns 0 for near-zero inputs rather than NaN.
pub fn angle_between(a: &Vec3, b: &Vec3) -> f64 {
    let na = a.norm();
    let nb = b.norm();
    if na < MIN_MEMBER_LENGTH || nb < MIN_MEMBER_LENGTH {
        return 0.0;
    }
    (a.dot(b) / (na * nb)).clamp(-1.0, 1.0).acos()
}

/// A right-handed orthonormal coordinate frame at a point.
///
/// Used for plate orientation and bolt-grid placement: `z_dir` is the
/// frame normal (the member axis for plates), `x_dir`/`y_dir` span the
/// in-plane axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame origin.
    pub origin: Point3,
    /// In-plane u axis.
    pub x_dir: Dir3,
    /// In-plane v axis.
    pub y_dir: Dir3,
    /// Frame normal.
    pub z_dir: Dir3,
}

impl Frame {
    /// Build a frame whose normal is `axis`. In-plane axes are chosen
    /// deterministically (world X or Y crossed with the normal).
    ///
    /// Returns `None` for a near-zero or non-finite axis.
    pub fn from_axis(origin: Point3, axis: Vec3) -> Option<Self> {
        if !axis.iter().all(|c| c.is_finite()) || axis.norm() < MIN_MEMBER_LENGTH {
            return None;
        }
        let n = Dir3::new_normalize(axis);
        let arbitrary = if n.as_ref().x.abs() < 0.9 {
            Vec3::x()
        } else {
            Vec3::y()
        };
        let x = Dir3::new_normalize(arbitrary.cross(n.as_ref()));
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Some(Self {
            origin,
            x_dir: x,
            y_dir: y,
            z_dir: n,
        })
    }

    /// Project a world point into this frame's `(u, v, w)` coordinates.
    pub fn project(&self, p: &Point3) -> (f64, f64, f64) {
        let d = p - self.origin;
        (
            d.dot(self.x_dir.as_ref()),
            d.dot(self.y_dir.as_ref()),
            d.dot(self.z_dir.as_ref()),
        )
    }

    /// Map local `(u, v, w)` coordinates back to a world point.
    pub fn to_world(&self, u: f64, v: f64, w: f64) -> Point3 {
        self.origin
            + self.x_dir.as_ref() * u
            + self.y_dir.as_ref() * v
            + self.z_dir.as_ref() * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_segment_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let (d, closest) = point_segment_distance(&Point3::new(5.0, 3.0, 0.0), &a, &b);
        assert!((d - 3.0).abs() < 1e-9);
        assert!((closest - Point3::new(5.0, 0.0, 0.0)).norm() < 1e-9);

        // Beyond the segment end: clamps to the endpoint.
        let (d, closest) = point_segment_distance(&Point3::new(14.0, 3.0, 0.0), &a, &b);
        assert!((d - 5.0).abs() < 1e-9);
        assert!((closest - b).norm() < 1e-9);
    }

    #[test]
    fn test_segment_segment_crossing() {
        // Perpendicular segments separated by 2 units in Z.
        let d = segment_segment_distance(
            &Point3::new(-5.0, 0.0, 0.0),
            &Point3::new(5.0, 0.0, 0.0),
            &Point3::new(0.0, -5.0, 2.0),
            &Point3::new(0.0, 5.0, 2.0),
        );
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_segment_parallel() {
        let d = segment_segment_distance(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(10.0, 0.0, 0.0),
            &Point3::new(0.0, 4.0, 0.0),
            &Point3::new(10.0, 4.0, 0.0),
        );
        assert!((d - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_segment_disjoint() {
        let d = segment_segment_distance(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(5.0, 0.0, 0.0),
            &Point3::new(6.0, 0.0, 0.0),
        );
        assert!((d - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_round_trip() {
        let frame = Frame::from_axis(Point3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, 1.0))
            .expect("valid axis");
        let p = frame.to_world(2.0, -3.0, 0.5);
        let (u, v, w) = frame.project(&p);
        assert!((u - 2.0).abs() < 1e-9);
        assert!((v + 3.0).abs() < 1e-9);
        assert!((w - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_frame_rejects_degenerate_axis() {
        assert!(Frame::from_axis(Point3::origin(), Vec3::new(0.0, 0.0, 0.0)).is_none());
        assert!(Frame::from_axis(Point3::origin(), Vec3::new(f64::NAN, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_angle_between() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        assert!((angle_between(&a, &b) - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!(angle_between(&a, &a).abs() < 1e-9);
    }
}
