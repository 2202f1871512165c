//! Film grain and scanlines

use super::{PassContext, PostPass};
use crate::render::fullscreen::{FullscreenPass, PassParams};
use crate::render::stage::{FilmParams, StageKind, StageParams};
use crate::render::target::LDR_FORMAT;
use crate::shaders;

pub struct FilmPass {
    pass: FullscreenPass,
}

impl FilmPass {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            pass: FullscreenPass::new(device, "Film Pass", shaders::FILM, 1, &[LDR_FORMAT]),
        }
    }
}

impl PostPass for FilmPass {
    fn kind(&self) -> StageKind {
        StageKind::Film
    }

    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &PassContext<'_>,
        params: &StageParams,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) {
        let film = match params {
            StageParams::Film(p) => *p,
            _ => FilmParams::default(),
        };
        let params = PassParams::new(ctx.time, ctx.size).with_values(&[
            film.noise_intensity,
            film.scanline_intensity,
            film.scanline_count,
            if film.grayscale { 1.0 } else { 0.0 },
        ]);
        self.pass
            .draw(encoder, ctx.device, ctx.queue, &[input], &[output], &params);
    }
}
