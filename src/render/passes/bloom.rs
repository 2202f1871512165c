//! Bright-pass bloom at half resolution

use super::{half, PassContext, PostPass};
use crate::render::fullscreen::{FullscreenPass, PassParams};
use crate::render::stage::{BloomParams, StageKind, StageParams};
use crate::render::target::{RenderTarget, LDR_FORMAT};
use crate::shaders;

/// Gaussian sigma in taps
const BLOOM_SIGMA: f32 = 3.0;

pub struct BloomPass {
    threshold: FullscreenPass,
    blur_h: FullscreenPass,
    blur_v: FullscreenPass,
    composite: FullscreenPass,
    bright: RenderTarget,
    blurred: RenderTarget,
}

impl BloomPass {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (w, h) = (half(width), half(height));
        Self {
            threshold: FullscreenPass::new(
                device,
                "Bloom Threshold Pass",
                shaders::BLOOM_THRESHOLD,
                1,
                &[LDR_FORMAT],
            ),
            blur_h: FullscreenPass::new(device, "Bloom Blur H", shaders::BLUR, 1, &[LDR_FORMAT]),
            blur_v: FullscreenPass::new(device, "Bloom Blur V", shaders::BLUR, 1, &[LDR_FORMAT]),
            composite: FullscreenPass::new(
                device,
                "Bloom Composite Pass",
                shaders::BLOOM_COMPOSITE,
                2,
                &[LDR_FORMAT],
            ),
            bright: RenderTarget::new(device, "Bloom Bright", w, h, LDR_FORMAT),
            blurred: RenderTarget::new(device, "Bloom Blurred", w, h, LDR_FORMAT),
        }
    }
}

impl PostPass for BloomPass {
    fn kind(&self) -> StageKind {
        StageKind::Bloom
    }

    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.bright.resize(device, half(width), half(height));
        self.blurred.resize(device, half(width), half(height));
    }

    fn framebuffer_sizes(&self) -> Vec<(&'static str, (u32, u32))> {
        vec![
            (self.bright.label(), self.bright.size()),
            (self.blurred.label(), self.blurred.size()),
        ]
    }

    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &PassContext<'_>,
        params: &StageParams,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) {
        let bloom = match params {
            StageParams::Bloom(p) => *p,
            _ => BloomParams::default(),
        };
        let small = self.bright.size();
        let (device, queue) = (ctx.device, ctx.queue);

        let threshold = PassParams::new(ctx.time, small).with_values(&[bloom.threshold]);
        self.threshold
            .draw(encoder, device, queue, &[input], &[self.bright.view()], &threshold);

        // Blur ping-pongs bright -> blurred -> bright
        let spread = bloom.radius.max(0.0);
        let blur_h = PassParams::new(ctx.time, small).with_values(&[1.0, 0.0, BLOOM_SIGMA, spread]);
        self.blur_h.draw(
            encoder,
            device,
            queue,
            &[self.bright.view()],
            &[self.blurred.view()],
            &blur_h,
        );
        let blur_v = PassParams::new(ctx.time, small).with_values(&[0.0, 1.0, BLOOM_SIGMA, spread]);
        self.blur_v.draw(
            encoder,
            device,
            queue,
            &[self.blurred.view()],
            &[self.bright.view()],
            &blur_v,
        );

        let composite = PassParams::new(ctx.time, ctx.size).with_values(&[bloom.strength]);
        self.composite.draw(
            encoder,
            device,
            queue,
            &[input, self.bright.view()],
            &[output],
            &composite,
        );
    }
}
