//! Sampled arc between two anchors on a sphere

use std::f32::consts::PI;

use glam::Vec3;

use super::ArcError;
use crate::geo::SpherePoint;

/// Interpolated vectors shorter than this are treated as passing through the center
const MIN_CHORD_LENGTH: f32 = 1e-6;

/// Raised arc sampled at `sample_count + 1` evenly spaced parameters
///
/// Each sample is the chord between the anchors, pushed back out to the
/// sphere and lifted by `bulge * sin(pi * t)`.
#[derive(Debug, Clone)]
pub struct ArcCurve {
    samples: Vec<Vec3>,
    base_radius: f32,
    bulge: f32,
}

impl ArcCurve {
    /// Sample the arc
    pub fn sample(
        anchor_a: SpherePoint,
        anchor_b: SpherePoint,
        base_radius: f32,
        bulge: f32,
        sample_count: usize,
    ) -> Result<Self, ArcError> {
        if sample_count < 2 {
            return Err(ArcError::TooFewSamples {
                requested: sample_count,
            });
        }
        if !base_radius.is_finite() || base_radius <= 0.0 {
            return Err(ArcError::InvalidRadius {
                name: "base radius",
                value: base_radius,
            });
        }
        if !bulge.is_finite() || base_radius + bulge <= 0.0 {
            return Err(ArcError::InvalidRadius {
                name: "bulge",
                value: bulge,
            });
        }

        let a = anchor_a.as_vec3();
        let b = anchor_b.as_vec3();
        if a.distance(b) <= f32::EPSILON {
            return Err(ArcError::CoincidentAnchors);
        }

        let samples = (0..=sample_count)
            .map(|i| {
                let t = i as f32 / sample_count as f32;
                let chord = a.lerp(b, t);
                if chord.length() < MIN_CHORD_LENGTH {
                    return Err(ArcError::ChordThroughCenter { t });
                }
                let height = base_radius + bulge * (PI * t).sin();
                Ok(chord.normalize() * height)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            samples,
            base_radius,
            bulge,
        })
    }

    pub fn samples(&self) -> &[Vec3] {
        &self.samples
    }

    /// Number of segments between samples
    pub fn sample_count(&self) -> usize {
        self.samples.len() - 1
    }

    pub fn base_radius(&self) -> f32 {
        self.base_radius
    }

    pub fn bulge(&self) -> f32 {
        self.bulge
    }

    /// First sample (t = 0)
    pub fn start(&self) -> Vec3 {
        self.samples[0]
    }

    /// Last sample (t = 1)
    pub fn end(&self) -> Vec3 {
        self.samples[self.samples.len() - 1]
    }

    /// Index and radial distance of the sample farthest from the origin
    pub fn peak(&self) -> (usize, f32) {
        self.samples
            .iter()
            .map(|p| p.length())
            .enumerate()
            .fold((0, f32::MIN), |best, (i, r)| if r > best.1 { (i, r) } else { best })
    }
}
