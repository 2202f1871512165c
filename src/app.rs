//! Application state
//!
//! `GlobeApp` owns the window surface, the scene, the orbit camera and the
//! pass chain. The event loop calls `resize` when the window changes and
//! `tick` once per frame; a tick rotates the scene, updates the camera and
//! renders, in that order.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton};
use winit::window::Window;

use crate::assets::SceneAssets;
use crate::gpu_context::GpuContext;
use crate::render::{FrameTime, OutlineSelection, OutputTarget, PassChain, PipelineError, StageKind};
use crate::scene::{EarthScene, OrbitCamera};
use crate::settings::GlobeSettings;
use crate::telemetry::{TickPhase, TickProfiler};

/// Monotonic frame clock
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Option<Instant>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last: None,
        }
    }

    /// Time for the frame starting now
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let delta = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        FrameTime::new(now.duration_since(self.start).as_secs_f32(), delta)
    }
}

/// Scale from window pixels to render pixels, capping the device pixel ratio
pub fn render_scale(scale_factor: f64, max_pixel_ratio: f64) -> f64 {
    if scale_factor <= 0.0 || max_pixel_ratio <= 0.0 {
        return 1.0;
    }
    scale_factor.min(max_pixel_ratio) / scale_factor
}

fn scaled(size: PhysicalSize<u32>, scale: f64) -> (u32, u32) {
    (
        ((size.width as f64 * scale).round() as u32).max(1),
        ((size.height as f64 * scale).round() as u32).max(1),
    )
}

/// Pass chain resolution for a window of `size` physical pixels at `scale_factor`
pub fn chain_size(size: PhysicalSize<u32>, scale_factor: f64, max_pixel_ratio: f64) -> (u32, u32) {
    scaled(size, render_scale(scale_factor, max_pixel_ratio))
}

pub struct GlobeApp {
    window: Arc<Window>,
    gpu: GpuContext,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    view_format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
    settings: GlobeSettings,
    scene: EarthScene,
    camera: OrbitCamera,
    chain: PassChain,
    clock: FrameClock,
    profiler: TickProfiler,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
}

impl GlobeApp {
    pub async fn new(window: Arc<Window>, settings: GlobeSettings) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let (gpu, surface) = GpuContext::new(window.clone())
            .await
            .context("failed to initialize GPU")?;

        let (format, view_format) = gpu.surface_formats(&surface)?;
        let caps = surface.get_capabilities(&gpu.adapter);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if settings.vsync_enabled {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: if view_format != format {
                vec![view_format]
            } else {
                vec![]
            },
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);

        let (assets, asset_errors) = SceneAssets::load(&settings);
        if !asset_errors.is_empty() {
            tracing::warn!("{} asset(s) replaced by placeholders", asset_errors.len());
        }
        let scene = EarthScene::build(&settings, assets).context("failed to build scene")?;

        let mut camera = OrbitCamera::new(
            settings.camera.fov_degrees,
            settings.camera.near,
            settings.camera.far,
            settings.camera.distance,
        )
        .with_damping(settings.camera.damping)
        .with_distance_limits(settings.camera.min_distance, settings.camera.max_distance);
        camera.set_aspect(size.width.max(1) as f32 / size.height.max(1) as f32);

        let (width, height) = chain_size(size, window.scale_factor(), settings.max_pixel_ratio);
        let layout = settings
            .post
            .to_layout()
            .context("invalid post-processing settings")?;
        let chain = PassChain::build(
            &gpu,
            &scene,
            settings.background,
            OutlineSelection::from_group(&scene.earth_group),
            layout,
            OutputTarget {
                width,
                height,
                format: view_format,
            },
        )?;

        Ok(Self {
            window,
            gpu,
            surface,
            config,
            view_format,
            size,
            settings,
            scene,
            camera,
            chain,
            clock: FrameClock::new(),
            profiler: TickProfiler::new(),
            dragging: false,
            last_cursor: None,
        })
    }

    /// Apply a new window size to the surface, camera and pass chain
    ///
    /// A zero-sized window (minimized) is ignored.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.gpu.device, &self.config);

        self.camera
            .set_aspect(new_size.width as f32 / new_size.height as f32);
        let (width, height) = chain_size(
            new_size,
            self.window.scale_factor(),
            self.settings.max_pixel_ratio,
        );
        self.chain.resize(&self.gpu.device, width, height);
    }

    /// Recompute the render resolution after the window moved to a display
    /// with another scale factor
    ///
    /// The physical size may stay the same, in which case no `Resized`
    /// event follows.
    pub fn rescale(&mut self, scale_factor: f64) {
        let (width, height) = chain_size(self.size, scale_factor, self.settings.max_pixel_ratio);
        tracing::info!(scale_factor, "Scale factor changed");
        self.chain.resize(&self.gpu.device, width, height);
    }

    /// Reconfigure the surface at the current size after it was lost
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.gpu.device, &self.config);
    }

    /// Rotate, update the camera, render
    pub fn tick(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.profiler.begin_tick();
        let time = self.clock.tick();
        let (scene, camera) = (&mut self.scene, &mut self.camera);
        self.profiler.measure(TickPhase::Update, || {
            scene.advance();
            camera.update();
        });

        let started = Instant::now();
        let result = self.render(time);
        self.profiler.record(TickPhase::Render, started.elapsed());
        self.profiler.end_tick();
        result
    }

    /// Render the current state through the pass chain and present it
    pub fn render(&mut self, time: FrameTime) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.view_format),
            ..Default::default()
        });

        self.chain
            .render(&self.gpu, &self.scene, &self.camera.state(), time, &view);

        self.window.pre_present_notify();
        output.present();
        Ok(())
    }

    pub fn toggle_stage(&mut self, kind: StageKind) -> Result<bool, PipelineError> {
        self.chain.toggle(kind)
    }

    pub fn on_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.last_cursor {
            if self.dragging {
                self.camera.on_mouse_drag(
                    ((x - last_x) as f32, (y - last_y) as f32),
                    self.size.height as f32,
                );
            }
        }
        self.last_cursor = Some((x, y));
    }

    pub fn on_scroll(&mut self, lines: f32) {
        self.camera.on_scroll(lines);
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn chain(&self) -> &PassChain {
        &self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_frame_clock_deltas() {
        let mut clock = FrameClock::new();
        let start = clock.start;
        let first = clock.tick_at(start + Duration::from_millis(100));
        assert_eq!(first.delta, 0.0);
        assert!((first.elapsed - 0.1).abs() < 1e-6);

        let second = clock.tick_at(start + Duration::from_millis(150));
        assert!((second.delta - 0.05).abs() < 1e-6);
        assert!((second.elapsed - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_render_scale_caps_pixel_ratio() {
        assert_eq!(render_scale(1.0, 2.0), 1.0);
        assert_eq!(render_scale(2.0, 2.0), 1.0);
        assert!((render_scale(3.0, 2.0) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(render_scale(0.0, 2.0), 1.0);
    }

    #[test]
    fn test_chain_size_follows_scale_factor() {
        let size = PhysicalSize::new(1200, 900);
        assert_eq!(chain_size(size, 1.0, 2.0), (1200, 900));
        assert_eq!(chain_size(size, 2.0, 2.0), (1200, 900));
        // Same physical size on a denser display renders at a lower resolution
        assert_eq!(chain_size(size, 3.0, 2.0), (800, 600));
    }

    #[test]
    fn test_scaled_size_never_zero() {
        assert_eq!(scaled(PhysicalSize::new(1, 1), 0.1), (1, 1));
        assert_eq!(scaled(PhysicalSize::new(1500, 900), 2.0 / 3.0), (1000, 600));
    }
}
