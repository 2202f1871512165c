//! Trailing afterimage
//!
//! Keeps the previous output in one of two history targets and blends the
//! new frame over a damped copy of it. Resizing drops the history.

use super::{PassContext, PostPass};
use crate::render::fullscreen::{FullscreenPass, PassParams};
use crate::render::stage::{AfterimageParams, StageKind, StageParams};
use crate::render::target::{RenderTarget, LDR_FORMAT};
use crate::shaders;

pub struct AfterimagePass {
    pass: FullscreenPass,
    history: [RenderTarget; 2],
    /// History target read this frame
    read: usize,
}

impl AfterimagePass {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            pass: FullscreenPass::new(
                device,
                "Afterimage Pass",
                shaders::AFTERIMAGE,
                2,
                &[LDR_FORMAT, LDR_FORMAT],
            ),
            history: [
                RenderTarget::new(device, "Afterimage History A", width, height, LDR_FORMAT),
                RenderTarget::new(device, "Afterimage History B", width, height, LDR_FORMAT),
            ],
            read: 0,
        }
    }
}

impl PostPass for AfterimagePass {
    fn kind(&self) -> StageKind {
        StageKind::Afterimage
    }

    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        for target in &mut self.history {
            target.resize(device, width, height);
        }
    }

    fn framebuffer_sizes(&self) -> Vec<(&'static str, (u32, u32))> {
        self.history
            .iter()
            .map(|target| (target.label(), target.size()))
            .collect()
    }

    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &PassContext<'_>,
        params: &StageParams,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) {
        let afterimage = match params {
            StageParams::Afterimage(p) => *p,
            _ => AfterimageParams::default(),
        };
        let params = PassParams::new(ctx.time, ctx.size).with_values(&[afterimage.damp]);

        let write = 1 - self.read;
        self.pass.draw(
            encoder,
            ctx.device,
            ctx.queue,
            &[input, self.history[self.read].view()],
            &[output, self.history[write].view()],
            &params,
        );
        self.read = write;
    }
}
