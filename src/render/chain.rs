//! Pass chain runtime
//!
//! `PassChain` pairs a `PassChainLayout` with one GPU runtime per stage.
//! Runtimes exist for every stage kind from build time on, so toggling or
//! inserting a stage never allocates mid-session.
//!
//! Per frame: scene -> enabled post stages through a ping-pong pool ->
//! copy into the caller's output view.

use super::fullscreen::{FullscreenPass, PassParams};
use super::passes::{create_pass, PassContext, PostPass, ScenePass};
use super::scene_renderer::SceneRenderer;
use super::stage::{PassChainLayout, PipelineError, StageKind};
use super::target::{PingPong, LDR_FORMAT};
use super::{FrameTime, OutlineSelection};
use crate::color::Rgb;
use crate::gpu_context::GpuContext;
use crate::scene::{CameraState, EarthScene};
use crate::shaders;

/// Size and format of the view the chain finally writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputTarget {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

pub struct PassChain {
    layout: PassChainLayout,
    scene: ScenePass,
    passes: Vec<Box<dyn PostPass>>,
    pool: PingPong,
    blit: FullscreenPass,
    selection: OutlineSelection,
    output: OutputTarget,
}

impl PassChain {
    /// Upload the scene and create every stage runtime
    pub fn build(
        gpu: &GpuContext,
        scene: &EarthScene,
        background: Rgb,
        selection: OutlineSelection,
        layout: PassChainLayout,
        output: OutputTarget,
    ) -> Result<Self, PipelineError> {
        layout.validate()?;

        let device = &gpu.device;
        let (width, height) = (output.width.max(1), output.height.max(1));
        let renderer = SceneRenderer::new(device, &gpu.queue, scene, background);

        let passes: Vec<Box<dyn PostPass>> = [StageKind::ColorCorrection]
            .into_iter()
            .chain(StageKind::EFFECTS)
            .chain([StageKind::Outline, StageKind::AntiAlias])
            .filter_map(|kind| create_pass(device, kind, width, height))
            .collect();

        let chain = Self {
            scene: ScenePass::new(renderer, device, width, height),
            passes,
            pool: PingPong::new(device, width, height, LDR_FORMAT),
            blit: FullscreenPass::new(device, "Output Copy Pass", shaders::COPY, 1, &[output.format]),
            layout,
            selection,
            output: OutputTarget {
                width,
                height,
                format: output.format,
            },
        };

        tracing::info!(
            "Built pass chain {}x{}: {}",
            width,
            height,
            chain.describe()
        );
        Ok(chain)
    }

    /// Record and submit one frame into `output`
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        scene: &EarthScene,
        camera: &CameraState,
        time: FrameTime,
        output: &wgpu::TextureView,
    ) {
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pass Chain Encoder"),
            });
        self.encode(&mut encoder, gpu, scene, camera, time, output);
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Record one frame into an existing encoder
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        gpu: &GpuContext,
        scene: &EarthScene,
        camera: &CameraState,
        time: FrameTime,
        output: &wgpu::TextureView,
    ) {
        self.scene.render(encoder, &gpu.queue, scene, camera);

        let size = (self.output.width, self.output.height);
        let ctx = PassContext {
            device: &gpu.device,
            queue: &gpu.queue,
            scene: self.scene.renderer(),
            scene_depth: self.scene.depth().view(),
            selection: &self.selection,
            time,
            size,
        };

        let mut input = self.scene.color().view();
        let mut index = 0;
        for stage in self.layout.enabled_stages() {
            let kind = stage.kind();
            let Some(pass) = self.passes.iter_mut().find(|p| p.kind() == kind) else {
                continue;
            };
            let target = self.pool.write_target(index);
            pass.render(encoder, &ctx, &stage.params, input, target.view());
            input = target.view();
            index += 1;
        }

        let params = PassParams::new(time, size);
        self.blit
            .draw(encoder, &gpu.device, &gpu.queue, &[input], &[output], &params);
    }

    /// Resize the scene targets, the pool and every stage, enabled or not
    ///
    /// Must be called between frames, never while a frame is being encoded.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.output.width && height == self.output.height {
            return;
        }

        self.scene.resize(device, width, height);
        self.pool.resize(device, width, height);
        for pass in &mut self.passes {
            pass.resize(device, width, height);
        }
        self.output.width = width;
        self.output.height = height;
        tracing::info!("Pass chain resized to {}x{}", width, height);
    }

    /// Every internal framebuffer with its current size
    pub fn framebuffer_sizes(&self) -> Vec<(&'static str, (u32, u32))> {
        let mut sizes = self.scene.framebuffer_sizes();
        sizes.extend(
            self.pool
                .targets()
                .iter()
                .map(|target| (target.label(), target.size())),
        );
        for pass in &self.passes {
            sizes.extend(pass.framebuffer_sizes());
        }
        sizes
    }

    /// Flip a stage on or off, returning its new state
    pub fn toggle(&mut self, kind: StageKind) -> Result<bool, PipelineError> {
        let enabled = self.layout.toggle(kind)?;
        tracing::info!(
            "{} {}",
            kind.display_name(),
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(enabled)
    }

    /// Replace the outline selection snapshot
    pub fn set_selection(&mut self, selection: OutlineSelection) {
        tracing::debug!("Outline selection set to {} nodes", selection.len());
        self.selection = selection;
    }

    pub fn selection(&self) -> &OutlineSelection {
        &self.selection
    }

    pub fn layout(&self) -> &PassChainLayout {
        &self.layout
    }

    /// Edit stage order and parameters; edits are validated by the layout
    pub fn layout_mut(&mut self) -> &mut PassChainLayout {
        &mut self.layout
    }

    pub fn size(&self) -> (u32, u32) {
        (self.output.width, self.output.height)
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output.format
    }

    /// Names of the meshes drawn last frame, in draw order
    pub fn scene_draw_order(&self) -> Vec<&str> {
        self.scene.renderer().draw_order()
    }

    /// Enabled stages joined with arrows
    pub fn describe(&self) -> String {
        self.layout
            .enabled_stages()
            .map(|s| s.kind().display_name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
