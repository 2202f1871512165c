//! Scene assembly
//!
//! Builds the globe group (two shells, two markers, the arc tube) and the
//! star field from settings, then advances their rotation once per tick.

use glam::Vec3;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::environment::Environment;
use super::mesh::MeshData;
use super::node::{
    DirectionalLight, Material, MeshNode, SceneGroup, Side, StarField, TextureId, Transform,
};
use crate::arc::{build_arc, ArcCurve, ArcError};
use crate::assets::SceneAssets;
use crate::color::Rgb;
use crate::geo::project;
use crate::settings::{EulerSettings, GlobeSettings, SpinSettings};

pub const INNER_SHELL: &str = "inner-shell";
pub const OUTER_SHELL: &str = "outer-shell";
pub const ORIGIN_MARKER: &str = "origin-marker";
pub const DESTINATION_MARKER: &str = "destination-marker";
pub const ARC_TUBE: &str = "arc-tube";

/// Scene construction failure
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid arc: {0}")]
    Arc(#[from] ArcError),
}

/// Meshes that make up the globe group
#[derive(Debug, Clone)]
pub struct SceneParts {
    pub inner_shell: MeshNode,
    pub outer_shell: MeshNode,
    pub origin_marker: MeshNode,
    pub destination_marker: MeshNode,
    pub arc: MeshNode,
}

/// Put the parts under one rigid group
pub fn assemble(parts: SceneParts) -> SceneGroup {
    let mut group = SceneGroup::new("earth-group");
    group.add(parts.inner_shell);
    group.add(parts.outer_shell);
    group.add(parts.origin_marker);
    group.add(parts.destination_marker);
    group.add(parts.arc);
    group
}

/// Images keyed by the slot materials refer to them by
#[derive(Debug, Clone)]
pub struct TextureSet {
    entries: Vec<(TextureId, RgbaImage)>,
}

impl TextureSet {
    pub fn get(&self, id: TextureId) -> Option<&RgbaImage> {
        self.entries.iter().find(|(i, _)| *i == id).map(|(_, image)| image)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &RgbaImage)> {
        self.entries.iter().map(|(id, image)| (*id, image))
    }
}

/// Everything drawn by the scene pass
#[derive(Debug, Clone)]
pub struct EarthScene {
    pub earth_group: SceneGroup,
    pub stars: StarField,
    pub light: DirectionalLight,
    pub textures: TextureSet,
    /// Sky and ambient light; `None` draws the flat background color
    pub environment: Option<Environment>,
    /// Sampled arc, kept for inspection
    pub arc_curve: ArcCurve,
    spin: SpinSettings,
}

impl EarthScene {
    /// Build the stock scene from settings and loaded images
    pub fn build(settings: &GlobeSettings, assets: SceneAssets) -> Result<Self, SceneError> {
        let globe = &settings.globe;
        let route = &settings.route;
        let markers = &settings.markers;

        let origin = project(route.from.to_geo_point(), route.base_radius);
        let destination = project(route.to.to_geo_point(), route.base_radius);
        let arc = build_arc(origin, destination, &route.arc_config())?;

        // Shells share one yaw so the night map's prime meridian faces +Z
        let shell_transform =
            Transform::IDENTITY.with_rotation(Vec3::new(0.0, globe.yaw_degrees.to_radians(), 0.0));

        let inner_shell = MeshNode::new(
            INNER_SHELL,
            MeshData::uv_sphere(globe.inner_radius, globe.width_segments, globe.height_segments),
            Material::lit_textured(TextureId::NightMap)
                .translucent(globe.inner_opacity)
                .with_side(Side::Front),
        )
        .with_transform(shell_transform);

        let outer_shell = MeshNode::new(
            OUTER_SHELL,
            MeshData::uv_sphere(globe.outer_radius, globe.width_segments, globe.height_segments),
            Material::lit_textured(TextureId::NightMap)
                .translucent(globe.outer_opacity)
                .with_side(Side::Back),
        )
        .with_transform(shell_transform);

        let marker = |name: &str, position: Vec3, rotation: EulerSettings| {
            MeshNode::new(
                name,
                MeshData::torus(
                    markers.radius,
                    markers.tube,
                    markers.radial_segments,
                    markers.tubular_segments,
                ),
                Material::unlit(markers.color),
            )
            .with_transform(
                Transform::from_translation(position)
                    .with_rotation(Vec3::new(rotation.x, rotation.y, rotation.z)),
            )
        };

        let parts = SceneParts {
            inner_shell,
            outer_shell,
            origin_marker: marker(ORIGIN_MARKER, origin.as_vec3(), markers.from_rotation),
            destination_marker: marker(
                DESTINATION_MARKER,
                destination.as_vec3(),
                markers.to_rotation,
            ),
            arc: MeshNode::new(
                ARC_TUBE,
                arc.tube.into_mesh(),
                Material::unlit(Rgb::WHITE).with_map(TextureId::ArcGradient),
            ),
        };

        let stars = StarField {
            transform: Transform::IDENTITY,
            positions: scatter_stars(
                settings.stars.count,
                settings.stars.spread,
                settings.stars.seed,
            ),
            size: settings.stars.size,
            color: settings.stars.color,
            map: Some(TextureId::StarSprite),
        };

        let light = DirectionalLight {
            position: Vec3::new(settings.light.x, settings.light.y, settings.light.z),
            color: settings.light.color,
            intensity: settings.light.intensity,
            ambient: settings.light.ambient,
        };

        let textures = TextureSet {
            entries: vec![
                (TextureId::NightMap, assets.night_map),
                (TextureId::ArcGradient, arc.gradient.into_image()),
                (TextureId::StarSprite, assets.star_sprite),
            ],
        };

        let environment = settings
            .environment
            .enabled
            .then(|| Environment::new(assets.environment, settings.environment.intensity));

        let earth_group = assemble(parts);
        tracing::info!(
            children = earth_group.children().len(),
            stars = stars.positions.len(),
            "Assembled earth scene"
        );

        Ok(Self {
            earth_group,
            stars,
            light,
            textures,
            environment,
            arc_curve: arc.curve,
            spin: settings.spin,
        })
    }

    /// Apply one tick of rotation to the globe and the stars
    pub fn advance(&mut self) {
        let globe = self.spin.globe_rate;
        let star = self.spin.star_rate;
        self.earth_group.transform.rotation += Vec3::new(globe, globe, 0.0);
        self.stars.transform.rotation += Vec3::new(star, star, 0.0);
    }

    pub fn spin(&self) -> SpinSettings {
        self.spin
    }
}

/// Uniformly scatter `count` points in a cube of edge `spread` around the origin
pub fn scatter_stars(count: usize, spread: f32, seed: Option<u64>) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(seed.unwrap_or_else(rand::random));
    (0..count)
        .map(|_| {
            Vec3::new(
                (rng.random::<f32>() - 0.5) * spread,
                (rng.random::<f32>() - 0.5) * spread,
                (rng.random::<f32>() - 0.5) * spread,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> EarthScene {
        let mut settings = GlobeSettings::default();
        settings.stars.seed = Some(7);
        EarthScene::build(&settings, SceneAssets::placeholders()).unwrap()
    }

    #[test]
    fn test_group_holds_five_children() {
        let scene = scene();
        let names: Vec<_> = scene.earth_group.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![INNER_SHELL, OUTER_SHELL, ORIGIN_MARKER, DESTINATION_MARKER, ARC_TUBE]
        );
    }

    #[test]
    fn test_shell_materials() {
        let scene = scene();
        let inner = scene.earth_group.child(INNER_SHELL).unwrap();
        let outer = scene.earth_group.child(OUTER_SHELL).unwrap();
        assert_eq!(inner.material.side, Side::Front);
        assert_eq!(outer.material.side, Side::Back);
        assert!(inner.material.transparent && outer.material.transparent);
        assert_eq!(inner.material.opacity, 0.6);
        assert_eq!(outer.material.opacity, 0.9);
        assert_eq!(inner.material.map, Some(TextureId::NightMap));
        assert_eq!(inner.transform, outer.transform);
        assert!((inner.transform.rotation.y + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_markers_sit_on_anchors() {
        let scene = scene();
        let origin = scene.earth_group.child(ORIGIN_MARKER).unwrap();
        let destination = scene.earth_group.child(DESTINATION_MARKER).unwrap();
        assert!(origin.transform.translation.distance(scene.arc_curve.start()) < 1e-4);
        assert!(destination.transform.translation.distance(scene.arc_curve.end()) < 1e-4);
        assert_eq!(origin.transform.rotation, Vec3::new(0.9, 2.46, 1.0));
    }

    #[test]
    fn test_stars_fill_cube() {
        let scene = scene();
        assert_eq!(scene.stars.positions.len(), 500);
        assert!(scene
            .stars
            .positions
            .iter()
            .all(|p| p.abs().max_element() <= 1.5));
    }

    #[test]
    fn test_star_seed_is_reproducible() {
        assert_eq!(scatter_stars(20, 3.0, Some(1)), scatter_stars(20, 3.0, Some(1)));
        assert_ne!(scatter_stars(20, 3.0, Some(1)), scatter_stars(20, 3.0, Some(2)));
    }

    #[test]
    fn test_advance_rotates_at_separate_rates() {
        let mut scene = scene();
        scene.advance();
        scene.advance();
        assert!((scene.earth_group.transform.rotation.x - 0.001).abs() < 1e-7);
        assert!((scene.earth_group.transform.rotation.y - 0.001).abs() < 1e-7);
        assert!((scene.stars.transform.rotation.x - 0.002).abs() < 1e-7);
        // Children keep their local transforms
        let inner = scene.earth_group.child(INNER_SHELL).unwrap();
        assert_eq!(inner.transform.rotation.x, 0.0);
    }

    #[test]
    fn test_gradient_texture_attached() {
        let scene = scene();
        let gradient = scene.textures.get(TextureId::ArcGradient).unwrap();
        assert_eq!(gradient.height(), 2);
        let arc = scene.earth_group.child(ARC_TUBE).unwrap();
        assert_eq!(arc.material.map, Some(TextureId::ArcGradient));
    }

    #[test]
    fn test_environment_follows_settings() {
        let scene = scene();
        let environment = scene.environment.as_ref().unwrap();
        assert_eq!(environment.face_size(), Some(32));

        let mut settings = GlobeSettings::default();
        settings.environment.enabled = false;
        let scene = EarthScene::build(&settings, SceneAssets::placeholders()).unwrap();
        assert!(scene.environment.is_none());
    }

    #[test]
    fn test_invalid_arc_fails_fast() {
        let mut settings = GlobeSettings::default();
        settings.route.sample_count = 1;
        let err = EarthScene::build(&settings, SceneAssets::placeholders()).unwrap_err();
        assert!(matches!(err, SceneError::Arc(ArcError::TooFewSamples { requested: 1 })));
    }
}
