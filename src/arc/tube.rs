//! Tube surface swept along the arc spline

use std::f32::consts::TAU;

use super::spline::CatmullRomCurve;
use crate::scene::mesh::{MeshData, MeshVertex};

/// Triangulated tube around a sweep path
///
/// Rings are not closed with a duplicate seam vertex, so every ring holds
/// exactly `radial_segments` vertices and the path's `tubular_segments + 1`
/// rings give `radial_segments * (tubular_segments + 1)` vertices in total.
#[derive(Debug, Clone)]
pub struct TubeMesh {
    mesh: MeshData,
    tubular_segments: u32,
    radial_segments: u32,
    radius: f32,
}

impl TubeMesh {
    /// Sweep a circle of `radius` along `path`
    ///
    /// `u` runs along the path so a horizontal gradient texture colors the
    /// tube from start to end.
    pub fn sweep(
        path: &CatmullRomCurve,
        radius: f32,
        tubular_segments: u32,
        radial_segments: u32,
    ) -> Self {
        let frames = path.frenet_frames(tubular_segments);
        let ring = radial_segments as usize;
        let mut vertices = Vec::with_capacity(ring * (tubular_segments as usize + 1));
        let mut indices = Vec::with_capacity(ring * tubular_segments as usize * 6);

        for i in 0..=tubular_segments as usize {
            let u = i as f32 / tubular_segments as f32;
            let center = path.point_at(u);
            let normal = frames.normals[i];
            let binormal = frames.binormals[i];

            for j in 0..ring {
                let v = j as f32 / radial_segments as f32 * TAU;
                let (sin, cos) = v.sin_cos();
                let direction = (-cos * normal + sin * binormal).normalize_or_zero();
                let position = center + direction * radius;

                vertices.push(MeshVertex {
                    position: position.to_array(),
                    uv: [u, j as f32 / radial_segments as f32],
                    normal: direction.to_array(),
                });
            }
        }

        for i in 1..=tubular_segments as usize {
            for j in 0..ring {
                let next = (j + 1) % ring;
                let a = (ring * (i - 1) + j) as u32;
                let b = (ring * i + j) as u32;
                let c = (ring * i + next) as u32;
                let d = (ring * (i - 1) + next) as u32;

                indices.extend_from_slice(&[a, b, d]);
                indices.extend_from_slice(&[b, c, d]);
            }
        }

        Self {
            mesh: MeshData { vertices, indices },
            tubular_segments,
            radial_segments,
            radius,
        }
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn into_mesh(self) -> MeshData {
        self.mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn tubular_segments(&self) -> u32 {
        self.tubular_segments
    }

    pub fn radial_segments(&self) -> u32 {
        self.radial_segments
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}
