//! Linear to display color conversion
//!
//! Always the first post stage, so everything after it (including the
//! outline color) is composited in display space and never re-corrected.

use super::{PassContext, PostPass};
use crate::render::fullscreen::{FullscreenPass, PassParams};
use crate::render::stage::{StageKind, StageParams};
use crate::render::target::LDR_FORMAT;
use crate::shaders;

pub struct ColorCorrectionPass {
    pass: FullscreenPass,
}

impl ColorCorrectionPass {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            pass: FullscreenPass::new(
                device,
                "Color Correction Pass",
                shaders::COLOR_CORRECTION,
                1,
                &[LDR_FORMAT],
            ),
        }
    }
}

impl PostPass for ColorCorrectionPass {
    fn kind(&self) -> StageKind {
        StageKind::ColorCorrection
    }

    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &PassContext<'_>,
        _params: &StageParams,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) {
        let params = PassParams::new(ctx.time, ctx.size);
        self.pass
            .draw(encoder, ctx.device, ctx.queue, &[input], &[output], &params);
    }
}
