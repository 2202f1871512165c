//! Scene stage: draws the globe and stars into a linear HDR target

use crate::render::scene_renderer::SceneRenderer;
use crate::render::target::{RenderTarget, DEPTH_FORMAT, HDR_FORMAT};
use crate::scene::{CameraState, EarthScene};

pub struct ScenePass {
    renderer: SceneRenderer,
    color: RenderTarget,
    depth: RenderTarget,
}

impl ScenePass {
    pub fn new(renderer: SceneRenderer, device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            renderer,
            color: RenderTarget::new(device, "Scene Color", width, height, HDR_FORMAT),
            depth: RenderTarget::new(device, "Scene Depth", width, height, DEPTH_FORMAT),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.color.resize(device, width, height);
        self.depth.resize(device, width, height);
    }

    pub fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        scene: &EarthScene,
        camera: &CameraState,
    ) {
        self.renderer.prepare(queue, scene, camera);
        self.renderer.draw(encoder, self.color.view(), self.depth.view());
    }

    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    pub fn color(&self) -> &RenderTarget {
        &self.color
    }

    pub fn depth(&self) -> &RenderTarget {
        &self.depth
    }

    pub fn framebuffer_sizes(&self) -> Vec<(&'static str, (u32, u32))> {
        vec![
            (self.color.label(), self.color.size()),
            (self.depth.label(), self.depth.size()),
        ]
    }
}
