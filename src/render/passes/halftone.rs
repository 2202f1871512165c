//! Print-style halftone screen

use super::{PassContext, PostPass};
use crate::render::fullscreen::{FullscreenPass, PassParams};
use crate::render::stage::{HalftoneParams, StageKind, StageParams};
use crate::render::target::LDR_FORMAT;
use crate::shaders;

pub struct HalftonePass {
    pass: FullscreenPass,
}

impl HalftonePass {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            pass: FullscreenPass::new(device, "Halftone Pass", shaders::HALFTONE, 1, &[LDR_FORMAT]),
        }
    }
}

impl PostPass for HalftonePass {
    fn kind(&self) -> StageKind {
        StageKind::Halftone
    }

    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &PassContext<'_>,
        params: &StageParams,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) {
        let halftone = match params {
            StageParams::Halftone(p) => *p,
            _ => HalftoneParams::default(),
        };
        let params = PassParams::new(ctx.time, ctx.size).with_values(&[
            halftone.radius,
            halftone.rotate_r,
            halftone.rotate_g,
            halftone.rotate_b,
            halftone.scatter,
            halftone.shape.shader_index(),
            halftone.blending,
            if halftone.greyscale { 1.0 } else { 0.0 },
        ]);
        self.pass
            .draw(encoder, ctx.device, ctx.queue, &[input], &[output], &params);
    }
}
