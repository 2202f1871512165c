//! FXAA, the final stage of the chain

use super::{PassContext, PostPass};
use crate::render::fullscreen::{FullscreenPass, PassParams};
use crate::render::stage::{AntiAliasParams, StageKind, StageParams};
use crate::render::target::LDR_FORMAT;
use crate::shaders;

pub struct AntiAliasPass {
    pass: FullscreenPass,
}

impl AntiAliasPass {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            pass: FullscreenPass::new(device, "FXAA Pass", shaders::FXAA, 1, &[LDR_FORMAT]),
        }
    }
}

impl PostPass for AntiAliasPass {
    fn kind(&self) -> StageKind {
        StageKind::AntiAlias
    }

    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &PassContext<'_>,
        params: &StageParams,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) {
        let aa = match params {
            StageParams::AntiAlias(p) => *p,
            _ => AntiAliasParams::default(),
        };
        let params = PassParams::new(ctx.time, ctx.size).with_values(&[
            aa.span_max,
            aa.reduce_mul,
            aa.reduce_min,
        ]);
        self.pass
            .draw(encoder, ctx.device, ctx.queue, &[input], &[output], &params);
    }
}
