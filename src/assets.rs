//! Image assets for the globe
//!
//! Assets are loaded once at startup: the night map, the star sprite and the
//! six faces of the environment cube. A missing or unreadable image is
//! reported as an `AssetError` and replaced with a generated placeholder so
//! the scene still assembles.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::settings::GlobeSettings;

/// Failure to load an image asset
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load image '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cube face '{}' is {}x{}, expected {}x{}", path.display(), found.0, found.1, expected.0, expected.1)]
    CubeFace {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },
}

impl AssetError {
    pub fn path(&self) -> &Path {
        match self {
            AssetError::Image { path, .. } | AssetError::CubeFace { path, .. } => path,
        }
    }
}

/// Load an image file as 8-bit RGBA
pub fn load_image(path: &Path) -> Result<RgbaImage, AssetError> {
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Dim blue-grey stand-in for the night map
pub fn placeholder_night_map() -> RgbaImage {
    RgbaImage::from_fn(64, 32, |x, y| {
        // Faint lat/long grid so rotation is still visible
        if x % 8 == 0 || y % 8 == 0 {
            Rgba([60, 70, 100, 255])
        } else {
            Rgba([12, 16, 28, 255])
        }
    })
}

/// Soft round sprite used when the star image is missing
pub fn placeholder_star_sprite() -> RgbaImage {
    const SIZE: u32 = 32;
    let center = (SIZE as f32 - 1.0) / 2.0;
    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let dx = (x as f32 - center) / center;
        let dy = (y as f32 - center) / center;
        let falloff = (1.0 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
        let alpha = (falloff * falloff * 255.0) as u8;
        Rgba([255, 255, 255, alpha])
    })
}

/// Cube face file names in +X, -X, +Y, -Y, +Z, -Z order
pub const CUBE_FACES: [&str; 6] = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];

/// Load the six faces of a cube map from `dir`
///
/// Faces must be square and all the same size.
pub fn load_cube(dir: &Path) -> Result<[RgbaImage; 6], AssetError> {
    let [px, nx, py, ny, pz, nz] = CUBE_FACES.map(|name| load_image(&dir.join(name)));
    let faces = [px?, nx?, py?, ny?, pz?, nz?];

    let expected = (faces[0].width(), faces[0].width());
    for (name, face) in CUBE_FACES.iter().zip(&faces) {
        if face.dimensions() != expected {
            return Err(AssetError::CubeFace {
                path: dir.join(name),
                expected,
                found: face.dimensions(),
            });
        }
    }
    Ok(faces)
}

/// Deep blue space with sparse specks, brighter towards +Y
pub fn placeholder_environment() -> [RgbaImage; 6] {
    const SIZE: u32 = 32;
    std::array::from_fn(|face| {
        let glow: u8 = if face == 2 { 10 } else { 0 };
        RgbaImage::from_fn(SIZE, SIZE, |x, y| {
            let hash = x.wrapping_mul(73_856_093)
                ^ y.wrapping_mul(19_349_663)
                ^ (face as u32).wrapping_mul(83_492_791);
            if hash % 97 == 0 {
                Rgba([180, 190, 210, 255])
            } else {
                Rgba([4 + glow, 6 + glow, 16 + glow, 255])
            }
        })
    })
}

/// Images the scene is textured with
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub night_map: RgbaImage,
    pub star_sprite: RgbaImage,
    /// Environment cube faces in `CUBE_FACES` order
    pub environment: [RgbaImage; 6],
}

impl SceneAssets {
    /// Placeholders only, no disk access
    pub fn placeholders() -> Self {
        Self {
            night_map: placeholder_night_map(),
            star_sprite: placeholder_star_sprite(),
            environment: placeholder_environment(),
        }
    }

    /// Load every asset named in the settings
    ///
    /// Returns the assets plus one error per image that fell back to a
    /// placeholder; the caller decides whether that is fatal.
    pub fn load(settings: &GlobeSettings) -> (Self, Vec<AssetError>) {
        let mut errors = Vec::new();
        let mut load_or = |name: &str, fallback: fn() -> RgbaImage| {
            match load_image(&settings.asset_path(name)) {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!("{}, using placeholder", e);
                    errors.push(e);
                    fallback()
                }
            }
        };

        let night_map = load_or(&settings.globe.night_map, placeholder_night_map);
        let star_sprite = load_or(&settings.stars.sprite, placeholder_star_sprite);

        let environment = if settings.environment.enabled {
            load_cube(&settings.asset_path(&settings.environment.dir)).unwrap_or_else(|e| {
                tracing::warn!("{}, using placeholder environment", e);
                errors.push(e);
                placeholder_environment()
            })
        } else {
            placeholder_environment()
        };

        (
            Self {
                night_map,
                star_sprite,
                environment,
            },
            errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_is_an_error() {
        let err = load_image(Path::new("/nonexistent/earth.jpg")).unwrap_err();
        assert_eq!(err.path(), Path::new("/nonexistent/earth.jpg"));
    }

    #[test]
    fn test_missing_assets_fall_back() {
        let mut settings = GlobeSettings::default();
        settings.asset_dir = PathBuf::from("/nonexistent");
        let (assets, errors) = SceneAssets::load(&settings);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[2].path(), Path::new("/nonexistent/environments/px.png"));
        assert_eq!(assets.night_map.dimensions(), placeholder_night_map().dimensions());
        assert_eq!(assets.star_sprite.dimensions(), (32, 32));
    }

    #[test]
    fn test_disabled_environment_is_not_loaded() {
        let mut settings = GlobeSettings::default();
        settings.asset_dir = PathBuf::from("/nonexistent");
        settings.environment.enabled = false;
        let (_, errors) = SceneAssets::load(&settings);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_cube_faces_must_match() {
        let dir = std::env::temp_dir().join(format!("starlight-cube-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (i, name) in CUBE_FACES.iter().enumerate() {
            let size = if i == 4 { 8 } else { 4 };
            RgbaImage::new(size, size).save(dir.join(name)).unwrap();
        }
        let err = load_cube(&dir).unwrap_err();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(err.path(), dir.join("pz.png"));
        assert!(matches!(
            err,
            AssetError::CubeFace {
                expected: (4, 4),
                found: (8, 8),
                ..
            }
        ));
    }

    #[test]
    fn test_placeholder_environment_faces_are_square() {
        let faces = placeholder_environment();
        assert!(faces.iter().all(|f| f.dimensions() == (32, 32)));
        assert_ne!(faces[2], faces[3]);
    }

    #[test]
    fn test_star_placeholder_fades_out() {
        let sprite = placeholder_star_sprite();
        assert_eq!(sprite.get_pixel(0, 0)[3], 0);
        assert!(sprite.get_pixel(16, 16)[3] > 200);
    }
}
