//! Scene graph nodes
//!
//! The scene is deliberately flat: one rigid group of meshes (the globe) and
//! one star field, each with its own transform. Meshes only ever change
//! their transform after startup.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{EulerRot, Mat4, Quat, Vec3};

use super::mesh::MeshData;
use crate::color::Rgb;

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Unique identifier of a mesh node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Position, Euler rotation (intrinsic XYZ, radians) and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rotation quaternion, `Rx * Ry * Rz`
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.translation)
    }
}

/// Which faces of a mesh are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
    Double,
}

impl Side {
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }
}

/// Lighting model of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shading {
    /// Diffuse lighting from the scene light plus ambient
    Lit,
    /// Flat color, ignores lights
    Unlit,
}

/// Texture slot shared by the scene and the GPU renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureId {
    NightMap,
    ArcGradient,
    StarSprite,
}

/// Surface appearance of a mesh node
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub color: Rgb,
    pub map: Option<TextureId>,
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
    pub depth_write: bool,
}

impl Material {
    /// Opaque flat-colored material
    pub fn unlit(color: Rgb) -> Self {
        Self {
            shading: Shading::Unlit,
            color,
            map: None,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            depth_write: true,
        }
    }

    /// Lit material colored by a texture
    pub fn lit_textured(map: TextureId) -> Self {
        Self {
            shading: Shading::Lit,
            color: Rgb::WHITE,
            map: Some(map),
            ..Self::unlit(Rgb::WHITE)
        }
    }

    pub fn with_map(mut self, map: TextureId) -> Self {
        self.map = Some(map);
        self
    }

    /// Make the material alpha blended at `opacity`
    pub fn translucent(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.transparent = true;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// A mesh with its material and local transform
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub id: NodeId,
    pub name: String,
    pub mesh: MeshData,
    pub material: Material,
    pub transform: Transform,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, mesh: MeshData, material: Material) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            mesh,
            material,
            transform: Transform::IDENTITY,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Rigid group of meshes that rotates as a unit
#[derive(Debug, Clone, Default)]
pub struct SceneGroup {
    pub name: String,
    pub transform: Transform,
    children: Vec<MeshNode>,
}

impl SceneGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            children: Vec::new(),
        }
    }

    pub fn add(&mut self, node: MeshNode) {
        self.children.push(node);
    }

    /// Detach a child, returning it if present
    pub fn remove(&mut self, id: NodeId) -> Option<MeshNode> {
        let index = self.children.iter().position(|c| c.id == id)?;
        Some(self.children.remove(index))
    }

    pub fn children(&self) -> &[MeshNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&MeshNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// World matrix of a child
    pub fn world_matrix(&self, child: &MeshNode) -> Mat4 {
        self.transform.matrix() * child.transform.matrix()
    }
}

/// Point cloud rendered as camera-facing sprites
#[derive(Debug, Clone)]
pub struct StarField {
    pub transform: Transform,
    pub positions: Vec<Vec3>,
    /// Sprite edge length in world units
    pub size: f32,
    pub color: Rgb,
    pub map: Option<TextureId>,
}

/// Single directional light plus an ambient floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Position the light shines from, towards the origin
    pub position: Vec3,
    pub color: Rgb,
    pub intensity: f32,
    pub ambient: f32,
}

impl DirectionalLight {
    /// Unit vector pointing from the surface towards the light
    pub fn direction(&self) -> Vec3 {
        self.position.normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rotation_order() {
        let t = Transform::IDENTITY.with_rotation(Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, std::f32::consts::FRAC_PI_2));
        // Z turns +X into +Y, then X turns +Y into +Z
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(p.distance(Vec3::Z) < 1e-5, "{p}");
    }

    #[test]
    fn test_yaw_brings_x_to_z() {
        let t = Transform::IDENTITY.with_rotation(Vec3::new(0.0, -std::f32::consts::FRAC_PI_2, 0.0));
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(p.distance(Vec3::Z) < 1e-5, "{p}");
    }

    #[test]
    fn test_side_culling() {
        assert_eq!(Side::Front.cull_mode(), Some(wgpu::Face::Back));
        assert_eq!(Side::Back.cull_mode(), Some(wgpu::Face::Front));
        assert_eq!(Side::Double.cull_mode(), None);
    }

    #[test]
    fn test_group_remove() {
        let mut group = SceneGroup::new("g");
        let node = MeshNode::new("a", MeshData::default(), Material::unlit(Rgb::WHITE));
        let id = node.id;
        group.add(node);
        assert!(group.remove(id).is_some());
        assert!(group.children().is_empty());
        assert!(group.remove(id).is_none());
    }
}
