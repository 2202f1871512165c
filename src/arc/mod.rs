//! Arc mesh builder
//!
//! Turns two anchors on a sphere into the glowing route drawn between them:
//! - `ArcCurve` - chord samples pushed out to the sphere and lifted by a sine bulge
//! - `CatmullRomCurve` - interpolating spline through those samples
//! - `TubeMesh` - small circular cross-section swept along the spline
//! - `GradientTexture` - color ramp used as the tube's surface map
//!
//! Everything here runs once at startup and the results are immutable.

pub mod curve;
pub mod gradient;
pub mod spline;
pub mod tube;

pub use curve::ArcCurve;
pub use gradient::GradientTexture;
pub use spline::{CatmullRomCurve, FrenetFrames};
pub use tube::TubeMesh;

use thiserror::Error;

use crate::color::Rgb;
use crate::geo::SpherePoint;

/// Invalid arc construction parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArcError {
    #[error("arc needs at least 2 samples, got {requested}")]
    TooFewSamples { requested: usize },

    #[error("arc anchors coincide, the curve would be degenerate")]
    CoincidentAnchors,

    #[error("chord between anchors passes through the sphere center at t={t}")]
    ChordThroughCenter { t: f32 },

    #[error("invalid {name}: {value}")]
    InvalidRadius { name: &'static str, value: f32 },

    #[error("tube needs at least 1 longitudinal and 3 circumferential segments, got {tubular}x{radial}")]
    InvalidSegments { tubular: u32, radial: u32 },
}

/// Tuning constants for the arc
#[derive(Debug, Clone, PartialEq)]
pub struct ArcConfig {
    /// Radius of the sphere the anchors sit on
    pub base_radius: f32,
    /// Extra height at the arc's midpoint
    pub bulge: f32,
    /// Number of segments between curve samples (samples = count + 1)
    pub sample_count: usize,
    /// Cross-section radius of the tube
    pub tube_radius: f32,
    /// Rings along the sweep path, minus one
    pub tubular_segments: u32,
    /// Vertices around each ring
    pub radial_segments: u32,
    /// Gradient color at the first anchor
    pub gradient_start: Rgb,
    /// Gradient color at the second anchor
    pub gradient_end: Rgb,
    /// Gradient texture width in texels
    pub gradient_width: u32,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            base_radius: 1.3,
            bulge: 0.4,
            sample_count: 100,
            tube_radius: 0.003,
            tubular_segments: 20,
            radial_segments: 20,
            gradient_start: Rgb::from_u32(0x757f94),
            gradient_end: Rgb::from_u32(0x263d74),
            gradient_width: 256,
        }
    }
}

/// Everything the scene needs to draw one arc
#[derive(Debug, Clone)]
pub struct ArcMesh {
    pub curve: ArcCurve,
    pub path: CatmullRomCurve,
    pub tube: TubeMesh,
    pub gradient: GradientTexture,
}

/// Build the arc curve, its sweep path, tube and gradient
pub fn build_arc(
    anchor_a: SpherePoint,
    anchor_b: SpherePoint,
    config: &ArcConfig,
) -> Result<ArcMesh, ArcError> {
    if config.tubular_segments < 1 || config.radial_segments < 3 {
        return Err(ArcError::InvalidSegments {
            tubular: config.tubular_segments,
            radial: config.radial_segments,
        });
    }
    if !config.tube_radius.is_finite() || config.tube_radius <= 0.0 {
        return Err(ArcError::InvalidRadius {
            name: "tube radius",
            value: config.tube_radius,
        });
    }

    let curve = ArcCurve::sample(
        anchor_a,
        anchor_b,
        config.base_radius,
        config.bulge,
        config.sample_count,
    )?;
    let path = CatmullRomCurve::new(curve.samples().to_vec());
    let tube = TubeMesh::sweep(
        &path,
        config.tube_radius,
        config.tubular_segments,
        config.radial_segments,
    );
    let gradient = GradientTexture::new(
        config.gradient_start,
        config.gradient_end,
        config.gradient_width,
    );

    tracing::debug!(
        samples = curve.samples().len(),
        vertices = tube.vertex_count(),
        length = path.length(),
        "Built arc mesh"
    );

    Ok(ArcMesh {
        curve,
        path,
        tube,
        gradient,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{project, GeoPoint};

    const EPS: f32 = 1e-4;

    fn seoul() -> SpherePoint {
        project(GeoPoint::from_degrees(37.56668, 126.97841), 1.3)
    }

    fn accra() -> SpherePoint {
        project(GeoPoint::from_degrees(5.55363, -0.196481), 1.3)
    }

    #[test]
    fn test_endpoints_match_anchors() {
        let arc = build_arc(seoul(), accra(), &ArcConfig::default()).unwrap();
        assert!(arc.curve.start().distance(seoul().as_vec3()) < EPS);
        assert!(arc.curve.end().distance(accra().as_vec3()) < EPS);
        assert_eq!(arc.curve.samples().len(), 101);
    }

    #[test]
    fn test_bulge_peaks_at_midpoint() {
        let arc = build_arc(seoul(), accra(), &ArcConfig::default()).unwrap();
        let samples = arc.curve.samples();
        let mid = samples[50].length();
        assert!(mid > samples[0].length());
        assert!(mid > samples[100].length());

        let (index, peak) = arc.curve.peak();
        assert!((peak - 1.7).abs() < EPS, "peak radius {peak}");
        assert!((49..=51).contains(&index), "peak at {index}");
    }

    #[test]
    fn test_zero_bulge_stays_on_sphere() {
        let config = ArcConfig {
            bulge: 0.0,
            ..ArcConfig::default()
        };
        let arc = build_arc(seoul(), accra(), &config).unwrap();
        for p in arc.curve.samples() {
            assert!((p.length() - 1.3).abs() < EPS);
        }
    }

    #[test]
    fn test_too_few_samples_is_an_error() {
        for sample_count in [0, 1] {
            let config = ArcConfig {
                sample_count,
                ..ArcConfig::default()
            };
            assert_eq!(
                build_arc(seoul(), accra(), &config).unwrap_err(),
                ArcError::TooFewSamples {
                    requested: sample_count
                }
            );
        }
        let config = ArcConfig {
            sample_count: 2,
            ..ArcConfig::default()
        };
        assert_eq!(build_arc(seoul(), accra(), &config).unwrap().curve.samples().len(), 3);
    }

    #[test]
    fn test_coincident_anchors_are_rejected() {
        let err = build_arc(seoul(), seoul(), &ArcConfig::default()).unwrap_err();
        assert_eq!(err, ArcError::CoincidentAnchors);
    }

    #[test]
    fn test_antipodal_anchors_are_rejected() {
        let a = project(GeoPoint::new(0.0, 0.0), 1.3);
        let b = project(GeoPoint::new(0.0, std::f32::consts::PI), 1.3);
        let config = ArcConfig {
            sample_count: 2,
            ..ArcConfig::default()
        };
        assert!(matches!(
            build_arc(a, b, &config),
            Err(ArcError::ChordThroughCenter { .. })
        ));
    }

    #[test]
    fn test_invalid_segments() {
        let config = ArcConfig {
            radial_segments: 2,
            ..ArcConfig::default()
        };
        assert!(matches!(
            build_arc(seoul(), accra(), &config),
            Err(ArcError::InvalidSegments { .. })
        ));
    }

    #[test]
    fn test_tube_vertex_count() {
        for (tubular, radial) in [(20, 20), (8, 3), (64, 12)] {
            let config = ArcConfig {
                tubular_segments: tubular,
                radial_segments: radial,
                ..ArcConfig::default()
            };
            let arc = build_arc(seoul(), accra(), &config).unwrap();
            assert_eq!(arc.tube.vertex_count(), (radial * (tubular + 1)) as usize);
            assert_eq!(arc.tube.mesh().index_count(), (radial * tubular * 6) as usize);
        }
    }

    #[test]
    fn test_tube_vertex_count_ignores_anchors() {
        let config = ArcConfig::default();
        let other = project(GeoPoint::from_degrees(-33.9, 151.2), 1.3);
        let a = build_arc(seoul(), accra(), &config).unwrap();
        let b = build_arc(other, accra(), &config).unwrap();
        assert_eq!(a.tube.vertex_count(), b.tube.vertex_count());
    }

    #[test]
    fn test_tube_hugs_the_path() {
        let arc = build_arc(seoul(), accra(), &ArcConfig::default()).unwrap();
        let radial = arc.tube.radial_segments() as usize;
        for (i, ring) in arc.tube.mesh().vertices.chunks(radial).enumerate() {
            let center = arc.path.point_at(i as f32 / arc.tube.tubular_segments() as f32);
            for v in ring {
                let d = glam::Vec3::from(v.position).distance(center);
                assert!((d - 0.003).abs() < 1e-4, "ring {i} distance {d}");
            }
        }
    }

    #[test]
    fn test_spline_passes_through_samples() {
        let arc = build_arc(seoul(), accra(), &ArcConfig::default()).unwrap();
        let n = arc.curve.sample_count() as f32;
        for (i, p) in arc.curve.samples().iter().enumerate() {
            assert!(arc.path.point(i as f32 / n).distance(*p) < EPS);
        }
    }

    #[test]
    fn test_gradient_ramp() {
        let arc = build_arc(seoul(), accra(), &ArcConfig::default()).unwrap();
        let gradient = &arc.gradient;
        assert_eq!(gradient.width(), 256);
        assert_eq!(gradient.image().height(), 2);
        assert_eq!(gradient.color_at(0), Rgb::from_u32(0x757f94));
        assert_eq!(gradient.color_at(255), Rgb::from_u32(0x263d74));
        // Every channel of this ramp falls or stays flat from left to right
        for x in 1..256 {
            let (prev, cur) = (gradient.color_at(x - 1), gradient.color_at(x));
            assert!(cur.r <= prev.r && cur.g <= prev.g && cur.b <= prev.b);
        }
    }
}
