//! Embedded WGSL sources
//!
//! Post-processing fragments are compiled together with the shared
//! fullscreen vertex stage and parameter block, so each fragment file only
//! declares the textures it reads starting at binding 2.

/// Fullscreen triangle, `PassParams` uniform (binding 0) and sampler (binding 1)
pub const FULLSCREEN: &str = include_str!("fullscreen.wgsl");

/// Lit/unlit scene meshes plus the outline selection mask
pub const SCENE: &str = include_str!("scene.wgsl");
/// Camera-facing star sprites
pub const STARS: &str = include_str!("stars.wgsl");
/// Environment cube drawn at the far plane
pub const SKYBOX: &str = include_str!("skybox.wgsl");

pub const COPY: &str = include_str!("copy.wgsl");
pub const COLOR_CORRECTION: &str = include_str!("color_correction.wgsl");
pub const OUTLINE_EDGE: &str = include_str!("outline_edge.wgsl");
pub const OUTLINE_COMPOSITE: &str = include_str!("outline_composite.wgsl");
pub const BLUR: &str = include_str!("blur.wgsl");
pub const FXAA: &str = include_str!("fxaa.wgsl");
pub const FILM: &str = include_str!("film.wgsl");
pub const GLITCH: &str = include_str!("glitch.wgsl");
pub const AFTERIMAGE: &str = include_str!("afterimage.wgsl");
pub const BLOOM_THRESHOLD: &str = include_str!("bloom_threshold.wgsl");
pub const BLOOM_COMPOSITE: &str = include_str!("bloom_composite.wgsl");
pub const HALFTONE: &str = include_str!("halftone.wgsl");

/// Prepend the fullscreen vertex stage to a fragment source
pub fn fullscreen(fragment: &str) -> String {
    format!("{FULLSCREEN}\n{fragment}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_have_entry_points() {
        for source in [
            COPY,
            COLOR_CORRECTION,
            OUTLINE_EDGE,
            OUTLINE_COMPOSITE,
            BLUR,
            FXAA,
            FILM,
            GLITCH,
            AFTERIMAGE,
            BLOOM_THRESHOLD,
            BLOOM_COMPOSITE,
            HALFTONE,
        ] {
            assert!(source.contains("fn fs_main"));
            assert!(!source.contains("fn vs_main"));
        }
        assert!(fullscreen(COPY).contains("fn vs_main"));
    }

    #[test]
    fn test_scene_shader_does_not_sample_depth() {
        // Depth textures cannot be read with textureLoad on the GL backend
        assert!(!SCENE.contains("texture_depth"));
        assert!(!SCENE.contains("textureLoad"));
        assert!(SCENE.contains("fn fs_mask_cover"));
        assert!(SCENE.contains("fn fs_mask_visible"));
        assert!(SCENE.contains("@invariant"));
    }

    #[test]
    fn test_camera_blocks_agree() {
        let block = |source: &str| {
            let start = source.find("struct Camera {").unwrap_or(0);
            let end = source[start..].find('}').map_or(start, |e| start + e);
            source[start..end]
                .lines()
                .filter(|line| !line.trim_start().starts_with("//"))
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n")
        };
        let scene = block(SCENE);
        assert!(scene.contains("sky: mat4x4<f32>"));
        assert!(scene.contains("ambient: array<vec4<f32>, 6>"));
        assert_eq!(block(STARS), scene);
        assert_eq!(block(SKYBOX), scene);
    }
}
