//! Periodic digital glitch
//!
//! Bursts are a pure function of frame time and seed, so a given frame
//! time always renders the same glitch.

use super::{PassContext, PostPass};
use crate::render::fullscreen::{FullscreenPass, PassParams};
use crate::render::stage::{GlitchParams, StageKind, StageParams};
use crate::render::target::LDR_FORMAT;
use crate::shaders;

pub struct GlitchPass {
    pass: FullscreenPass,
}

impl GlitchPass {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            pass: FullscreenPass::new(device, "Glitch Pass", shaders::GLITCH, 1, &[LDR_FORMAT]),
        }
    }
}

impl PostPass for GlitchPass {
    fn kind(&self) -> StageKind {
        StageKind::Glitch
    }

    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &PassContext<'_>,
        params: &StageParams,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) {
        let glitch = match params {
            StageParams::Glitch(p) => *p,
            _ => GlitchParams::default(),
        };
        let params = PassParams::new(ctx.time, ctx.size).with_values(&[
            glitch.interval,
            glitch.duration,
            glitch.amount,
            // Keep the seed small enough for f32 hashing
            (glitch.seed % 1024) as f32,
        ]);
        self.pass
            .draw(encoder, ctx.device, ctx.queue, &[input], &[output], &params);
    }
}
