//! Post-processing stage runtimes
//!
//! Each `PostPass` owns the GPU state for one `StageKind`. Passes read one
//! display-encoded input texture and write one output; any intermediate
//! buffers are theirs to allocate and must follow `resize`.

pub mod afterimage;
pub mod antialias;
pub mod bloom;
pub mod color_correction;
pub mod film;
pub mod glitch;
pub mod halftone;
pub mod outline;
pub mod scene;

pub use afterimage::AfterimagePass;
pub use antialias::AntiAliasPass;
pub use bloom::BloomPass;
pub use color_correction::ColorCorrectionPass;
pub use film::FilmPass;
pub use glitch::GlitchPass;
pub use halftone::HalftonePass;
pub use outline::OutlinePass;
pub use scene::ScenePass;

use super::scene_renderer::SceneRenderer;
use super::stage::{StageKind, StageParams};
use super::{FrameTime, OutlineSelection};
use crate::color::Rgb;

/// Frame-wide state handed to every pass
pub struct PassContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub scene: &'a SceneRenderer,
    /// Depth left by the scene pass
    pub scene_depth: &'a wgpu::TextureView,
    pub selection: &'a OutlineSelection,
    pub time: FrameTime,
    /// Chain output size in pixels
    pub size: (u32, u32),
}

/// GPU runtime of one post-processing stage
pub trait PostPass {
    fn kind(&self) -> StageKind;

    /// Reallocate internal buffers for a new output size
    fn resize(&mut self, _device: &wgpu::Device, _width: u32, _height: u32) {}

    /// Internal buffers and their sizes, for diagnostics and resize checks
    fn framebuffer_sizes(&self) -> Vec<(&'static str, (u32, u32))> {
        Vec::new()
    }

    /// Record this stage, reading `input` and writing `output`
    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &PassContext<'_>,
        params: &StageParams,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    );
}

/// Create the runtime for a post stage; `None` for the scene stage
pub fn create_pass(
    device: &wgpu::Device,
    kind: StageKind,
    width: u32,
    height: u32,
) -> Option<Box<dyn PostPass>> {
    let pass: Box<dyn PostPass> = match kind {
        StageKind::Scene => return None,
        StageKind::ColorCorrection => Box::new(ColorCorrectionPass::new(device)),
        StageKind::Film => Box::new(FilmPass::new(device)),
        StageKind::Glitch => Box::new(GlitchPass::new(device)),
        StageKind::Afterimage => Box::new(AfterimagePass::new(device, width, height)),
        StageKind::Bloom => Box::new(BloomPass::new(device, width, height)),
        StageKind::Halftone => Box::new(HalftonePass::new(device)),
        StageKind::Outline => Box::new(OutlinePass::new(device, width, height)),
        StageKind::AntiAlias => Box::new(AntiAliasPass::new(device)),
    };
    Some(pass)
}

/// Display-encoded channels in 0..=1, for shaders working after color correction
pub(crate) fn encoded_rgb(color: Rgb) -> [f32; 3] {
    let [r, g, b, _] = color.to_rgba8();
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// Half of a dimension, at least one pixel
pub(crate) fn half(size: u32) -> u32 {
    (size / 2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_rgb() {
        assert_eq!(encoded_rgb(Rgb::WHITE), [1.0, 1.0, 1.0]);
        assert_eq!(encoded_rgb(Rgb::BLACK), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_half_never_zero() {
        assert_eq!(half(1), 1);
        assert_eq!(half(801), 400);
    }
}
