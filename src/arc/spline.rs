//! Centripetal Catmull-Rom spline used as the tube's sweep path
//!
//! The spline interpolates its control points exactly. Sampling by arc
//! length (`point_at`) keeps tube rings evenly spaced even where the
//! control points bunch up near the ends of the arc.

use glam::{Quat, Vec3};

/// Number of chord segments used to approximate arc length
const LENGTH_DIVISIONS: usize = 200;

/// Offset used for finite-difference tangents
const TANGENT_DELTA: f32 = 1e-4;

/// Interpolating spline through an ordered list of points
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    points: Vec<Vec3>,
    /// Cumulative chord lengths at `LENGTH_DIVISIONS + 1` evenly spaced parameters
    arc_lengths: Vec<f32>,
}

/// Rotation-minimizing frames along a curve
#[derive(Debug, Clone)]
pub struct FrenetFrames {
    pub tangents: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub binormals: Vec<Vec3>,
}

impl CatmullRomCurve {
    /// Build a spline through `points`
    ///
    /// Callers guarantee at least two points; the arc builder validates
    /// its sample count before getting here.
    pub fn new(points: Vec<Vec3>) -> Self {
        debug_assert!(points.len() >= 2, "spline needs at least two points");
        let mut curve = Self {
            points,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_lengths();
        curve
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Total approximate arc length
    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at curve parameter `t` in [0, 1]
    ///
    /// `t = i / (n - 1)` lands exactly on control point `i`.
    pub fn point(&self, t: f32) -> Vec3 {
        let count = self.points.len();
        let p = (count - 1) as f32 * t.clamp(0.0, 1.0);
        let mut index = p.floor() as usize;
        let mut weight = p - index as f32;

        if index >= count - 1 {
            index = count - 2;
            weight = 1.0;
        }

        let p1 = self.points[index];
        let p2 = self.points[index + 1];
        // Endpoints are extrapolated so the first and last segments keep their shape
        let p0 = if index > 0 {
            self.points[index - 1]
        } else {
            2.0 * p1 - p2
        };
        let p3 = if index + 2 < count {
            self.points[index + 2]
        } else {
            2.0 * p2 - p1
        };

        centripetal_segment(p0, p1, p2, p3).evaluate(weight)
    }

    /// Point at normalized arc length `u` in [0, 1]
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.arc_length_to_t(u))
    }

    /// Unit tangent at normalized arc length `u`
    pub fn tangent_at(&self, u: f32) -> Vec3 {
        let t = self.arc_length_to_t(u);
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        (self.point(t2) - self.point(t1)).normalize_or_zero()
    }

    /// Map normalized arc length to curve parameter
    pub fn arc_length_to_t(&self, u: f32) -> f32 {
        let lengths = &self.arc_lengths;
        let total = self.length();
        if total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }
        let target = u.clamp(0.0, 1.0) * total;

        // First index whose cumulative length is >= target
        let upper = lengths.partition_point(|&l| l < target);
        if upper == 0 {
            return 0.0;
        }
        let i = upper - 1;
        if i + 1 >= lengths.len() {
            return 1.0;
        }

        let before = lengths[i];
        let segment = lengths[i + 1] - before;
        let fraction = if segment > 0.0 { (target - before) / segment } else { 0.0 };
        (i as f32 + fraction) / (lengths.len() - 1) as f32
    }

    /// Parallel-transport frames at `segments + 1` evenly spaced arc lengths
    pub fn frenet_frames(&self, segments: u32) -> FrenetFrames {
        let count = segments as usize + 1;
        let tangents: Vec<Vec3> = (0..count)
            .map(|i| self.tangent_at(i as f32 / segments as f32))
            .collect();

        let mut normals = Vec::with_capacity(count);
        let mut binormals = Vec::with_capacity(count);

        // Seed the first normal from the axis the tangent points along least
        let t0 = tangents[0];
        let abs = t0.abs();
        let axis = if abs.x <= abs.y && abs.x <= abs.z {
            Vec3::X
        } else if abs.y <= abs.z {
            Vec3::Y
        } else {
            Vec3::Z
        };
        let side = t0.cross(axis).normalize_or_zero();
        normals.push(t0.cross(side));
        binormals.push(t0.cross(normals[0]));

        for i in 1..count {
            let mut normal = normals[i - 1];
            let axis = tangents[i - 1].cross(tangents[i]);
            if axis.length() > f32::EPSILON {
                let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
                normal = Quat::from_axis_angle(axis.normalize(), theta) * normal;
            }
            binormals.push(tangents[i].cross(normal));
            normals.push(normal);
        }

        FrenetFrames {
            tangents,
            normals,
            binormals,
        }
    }

    fn compute_lengths(&self) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(LENGTH_DIVISIONS + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for d in 1..=LENGTH_DIVISIONS {
            let current = self.point(d as f32 / LENGTH_DIVISIONS as f32);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }
}

/// Cubic coefficients for one spline segment
struct CubicPoly {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl CubicPoly {
    fn hermite(x0: Vec3, x1: Vec3, t0: Vec3, t1: Vec3) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    fn evaluate(&self, t: f32) -> Vec3 {
        let t2 = t * t;
        let t3 = t2 * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t3
    }
}

/// Non-uniform Catmull-Rom with centripetal knot spacing (alpha = 0.5)
fn centripetal_segment(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> CubicPoly {
    let mut dt0 = p0.distance_squared(p1).powf(0.25);
    let mut dt1 = p1.distance_squared(p2).powf(0.25);
    let mut dt2 = p2.distance_squared(p3).powf(0.25);

    // Guard against repeated points
    if dt1 < 1e-4 {
        dt1 = 1.0;
    }
    if dt0 < 1e-4 {
        dt0 = dt1;
    }
    if dt2 < 1e-4 {
        dt2 = dt1;
    }

    let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
    let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

    CubicPoly::hermite(p1, p2, t1, t2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave() -> CatmullRomCurve {
        let points = (0..=10)
            .map(|i| {
                let x = i as f32 * 0.3;
                Vec3::new(x, (x * 2.0).sin(), 0.2 * x)
            })
            .collect();
        CatmullRomCurve::new(points)
    }

    #[test]
    fn test_passes_through_control_points() {
        let curve = wave();
        let n = curve.points().len();
        for (i, p) in curve.points().iter().enumerate() {
            let on_curve = curve.point(i as f32 / (n - 1) as f32);
            assert!(on_curve.distance(*p) < 1e-5, "point {i}: {on_curve} vs {p}");
        }
    }

    #[test]
    fn test_arc_length_mapping_is_monotonic() {
        let curve = wave();
        let mut last = -1.0;
        for i in 0..=50 {
            let t = curve.arc_length_to_t(i as f32 / 50.0);
            assert!(t >= last);
            last = t;
        }
        assert_eq!(curve.arc_length_to_t(0.0), 0.0);
        assert!((curve.arc_length_to_t(1.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_straight_line_length() {
        let curve = CatmullRomCurve::new(vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)]);
        assert!((curve.length() - 2.0).abs() < 1e-4);
        assert!(curve.point_at(0.5).distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-3);
    }

    #[test]
    fn test_frames_are_orthonormal() {
        let frames = wave().frenet_frames(20);
        assert_eq!(frames.tangents.len(), 21);
        for i in 0..21 {
            let (t, n, b) = (frames.tangents[i], frames.normals[i], frames.binormals[i]);
            assert!((t.length() - 1.0).abs() < 1e-3);
            assert!((n.length() - 1.0).abs() < 1e-3);
            assert!(t.dot(n).abs() < 1e-3);
            assert!(t.dot(b).abs() < 1e-3);
            assert!(n.dot(b).abs() < 1e-3);
        }
    }
}
