//! Mesh generation for the globe scene
//!
//! Generates vertex and index data for sphere shells, marker rings and the
//! per-instance data of the star sprites. The arc tube lives in `arc::tube`
//! but produces the same `MeshData`.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::{PI, TAU};

/// Vertex for lit or unlit scene meshes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Normal vector (for lighting)
    pub normal: [f32; 3],
}

impl MeshVertex {
    /// Size of vertex in bytes
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Vertex buffer layout for wgpu
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // uv
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // normal
                wgpu::VertexAttribute {
                    offset: 20,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// One star sprite, expanded to a camera-facing quad in the vertex shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct StarInstance {
    pub position: [f32; 3],
}

impl StarInstance {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Generated mesh data
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Generate a UV sphere
    ///
    /// Longitude runs from -X through -Z, +X, +Z back to -X, so the middle
    /// column of an equirectangular map (u = 0.5) faces +X. Latitude rows go
    /// from the north pole (v = 0, the top texel row) to the south pole.
    /// Triangles wind counter-clockwise seen from outside.
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let row = width_segments + 1;
        let mut vertices = Vec::with_capacity((row * (height_segments + 1)) as usize);
        let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * TAU;

                let x = -radius * phi.cos() * theta.sin();
                let y = radius * theta.cos();
                let z = radius * phi.sin() * theta.sin();
                let normal = glam::Vec3::new(x, y, z).normalize_or_zero();

                vertices.push(MeshVertex {
                    position: [x, y, z],
                    uv: [u, v],
                    normal: normal.to_array(),
                });
            }
        }

        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;

                // The pole rows collapse to a point, skip their empty triangle
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// Generate a torus lying in the XY plane
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial_segments = radial_segments.max(3);
        let tubular_segments = tubular_segments.max(3);
        let row = tubular_segments + 1;
        let mut vertices = Vec::with_capacity((row * (radial_segments + 1)) as usize);
        let mut indices = Vec::with_capacity((radial_segments * tubular_segments * 6) as usize);

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            for i in 0..=tubular_segments {
                let u = i as f32 / tubular_segments as f32 * TAU;

                let ring = radius + tube * v.cos();
                let position = glam::Vec3::new(ring * u.cos(), ring * u.sin(), tube * v.sin());
                let center = glam::Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);

                vertices.push(MeshVertex {
                    position: position.to_array(),
                    uv: [
                        i as f32 / tubular_segments as f32,
                        j as f32 / radial_segments as f32,
                    ],
                    normal: (position - center).normalize_or_zero().to_array(),
                });
            }
        }

        for j in 1..=radial_segments {
            for i in 1..=tubular_segments {
                let a = row * j + i - 1;
                let b = row * (j - 1) + i - 1;
                let c = row * (j - 1) + i;
                let d = row * j + i;

                indices.extend_from_slice(&[a, b, d]);
                indices.extend_from_slice(&[b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get index count
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_mesh() {
        let mesh = MeshData::uv_sphere(1.3, 30, 30);
        // (height + 1) * (width + 1) vertices
        assert_eq!(mesh.vertex_count(), 31 * 31);
        // Two triangles per quad, minus one per quad on each pole row
        assert_eq!(mesh.index_count(), (30 * 30 * 2 - 2 * 30) * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let mesh = MeshData::uv_sphere(1.5, 12, 8);
        for v in &mesh.vertices {
            let len = glam::Vec3::from(v.position).length();
            assert!((len - 1.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sphere_texture_center_faces_x() {
        let mesh = MeshData::uv_sphere(1.0, 4, 2);
        // Equator row, middle column
        let v = mesh.vertices[5 + 2];
        assert_eq!(v.uv, [0.5, 0.5]);
        assert!((v.position[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_winding_faces_outward() {
        let mesh = MeshData::uv_sphere(1.0, 16, 8);
        for tri in mesh.indices.chunks(3) {
            let p = |i: u32| glam::Vec3::from(mesh.vertices[i as usize].position);
            let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_torus_mesh() {
        let mesh = MeshData::torus(0.02, 0.002, 20, 20);
        assert_eq!(mesh.vertex_count(), 21 * 21);
        assert_eq!(mesh.index_count(), 20 * 20 * 6);
        for v in &mesh.vertices {
            let p = glam::Vec3::from(v.position);
            let ring = glam::Vec2::new(p.x, p.y).length();
            assert!(ring >= 0.018 - 1e-6 && ring <= 0.022 + 1e-6);
        }
    }
}
