//! Selective outline
//!
//! 1. Redraw the selected meshes into a full-size mask (coverage, visibility)
//! 2. Extract silhouette edges at half resolution
//! 3. Blur the edges into a glow
//! 4. Add edge and glow outside the silhouette, scaled by strength and pulse
//!
//! Runs after color correction, so the edge colors land on screen as given.

use super::{encoded_rgb, half, PassContext, PostPass};
use crate::render::fullscreen::{FullscreenPass, PassParams};
use crate::render::stage::{OutlineParams, StageKind, StageParams};
use crate::render::target::{RenderTarget, LDR_FORMAT, MASK_FORMAT};
use crate::shaders;

/// Gaussian sigma in taps for the glow
const GLOW_SIGMA: f32 = 3.0;

pub struct OutlinePass {
    edge: FullscreenPass,
    blur_h: FullscreenPass,
    blur_v: FullscreenPass,
    composite: FullscreenPass,
    mask: RenderTarget,
    edges: RenderTarget,
    blur_scratch: RenderTarget,
    glow: RenderTarget,
}

impl OutlinePass {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (w, h) = (half(width), half(height));
        Self {
            edge: FullscreenPass::new(
                device,
                "Outline Edge Pass",
                shaders::OUTLINE_EDGE,
                1,
                &[LDR_FORMAT],
            ),
            blur_h: FullscreenPass::new(device, "Outline Blur H", shaders::BLUR, 1, &[LDR_FORMAT]),
            blur_v: FullscreenPass::new(device, "Outline Blur V", shaders::BLUR, 1, &[LDR_FORMAT]),
            composite: FullscreenPass::new(
                device,
                "Outline Composite Pass",
                shaders::OUTLINE_COMPOSITE,
                4,
                &[LDR_FORMAT],
            ),
            mask: RenderTarget::new(device, "Outline Mask", width, height, MASK_FORMAT),
            edges: RenderTarget::new(device, "Outline Edges", w, h, LDR_FORMAT),
            blur_scratch: RenderTarget::new(device, "Outline Blur Scratch", w, h, LDR_FORMAT),
            glow: RenderTarget::new(device, "Outline Glow", w, h, LDR_FORMAT),
        }
    }
}

impl PostPass for OutlinePass {
    fn kind(&self) -> StageKind {
        StageKind::Outline
    }

    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (w, h) = (half(width), half(height));
        self.mask.resize(device, width, height);
        self.edges.resize(device, w, h);
        self.blur_scratch.resize(device, w, h);
        self.glow.resize(device, w, h);
    }

    fn framebuffer_sizes(&self) -> Vec<(&'static str, (u32, u32))> {
        [&self.mask, &self.edges, &self.blur_scratch, &self.glow]
            .into_iter()
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
        let outline = match params {
            StageParams::Outline(p) => *p,
            _ => OutlineParams::default(),
        };
        let (device, queue) = (ctx.device, ctx.queue);
        let small = self.edges.size();

        ctx.scene.draw_selection_mask(
            encoder,
            self.mask.view(),
            ctx.scene_depth,
            ctx.selection.ids(),
        );

        // Thickness is given in output pixels; edges are at half size
        let edge = PassParams::new(ctx.time, small).with_values(&[outline.edge_thickness * 0.5]);
        self.edge
            .draw(encoder, device, queue, &[self.mask.view()], &[self.edges.view()], &edge);

        let spread = outline.edge_glow.max(0.0);
        let blur_h = PassParams::new(ctx.time, small).with_values(&[1.0, 0.0, GLOW_SIGMA, spread]);
        self.blur_h.draw(
            encoder,
            device,
            queue,
            &[self.edges.view()],
            &[self.blur_scratch.view()],
            &blur_h,
        );
        let blur_v = PassParams::new(ctx.time, small).with_values(&[0.0, 1.0, GLOW_SIGMA, spread]);
        self.blur_v.draw(
            encoder,
            device,
            queue,
            &[self.blur_scratch.view()],
            &[self.glow.view()],
            &blur_v,
        );

        let [vr, vg, vb] = encoded_rgb(outline.visible_edge_color);
        let [hr, hg, hb] = encoded_rgb(outline.hidden_edge_color);
        let composite = PassParams::new(ctx.time, ctx.size).with_values(&[
            vr,
            vg,
            vb,
            outline.edge_strength,
            hr,
            hg,
            hb,
            outline.edge_glow,
            outline.pulse(ctx.time.elapsed),
        ]);
        self.composite.draw(
            encoder,
            device,
            queue,
            &[
                input,
                self.edges.view(),
                self.glow.view(),
                self.mask.view(),
            ],
            &[output],
            &composite,
        );
    }
}
