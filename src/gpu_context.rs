//! GPU context
//!
//! Provides `GpuContext` for the device/queue pair the renderer uses, created
//! either against a window surface or headless for offscreen rendering.

use std::sync::Arc;

use thiserror::Error;
use winit::window::Window;

/// Failure to acquire GPU resources
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface is not supported by the adapter")]
    UnsupportedSurface,
}

/// Device resources shared by every render stage
pub struct GpuContext {
    /// The wgpu instance
    pub instance: wgpu::Instance,
    /// The selected GPU adapter
    pub adapter: wgpu::Adapter,
    /// The GPU device for creating resources
    pub device: wgpu::Device,
    /// The command queue for submitting GPU work
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a context compatible with `window`, returning the window's surface too
    pub async fn new(window: Arc<Window>) -> Result<(Self, wgpu::Surface<'static>), GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;
        let context = Self::with_instance(instance, Some(&surface), false).await?;
        Ok((context, surface))
    }

    /// Create a context without a surface, for offscreen rendering and tests
    ///
    /// Falls back to a software adapter when no hardware adapter is found.
    pub async fn headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        match Self::with_instance(instance, None, false).await {
            Err(GpuError::NoAdapter) => {
                let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                    backends: wgpu::Backends::all(),
                    ..Default::default()
                });
                Self::with_instance(instance, None, true).await
            }
            other => other,
        }
    }

    async fn with_instance(
        instance: wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
        force_fallback_adapter: bool,
    ) -> Result<Self, GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!("Using GPU: {}", info.name);
        tracing::info!("Backend: {:?}", info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Starlight Earth Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Pick a surface format and the view format passes should render into
    ///
    /// Post-processing writes display-encoded values itself, so the surface
    /// is viewed through its non-sRGB variant to avoid encoding twice.
    pub fn surface_formats(
        &self,
        surface: &wgpu::Surface<'_>,
    ) -> Result<(wgpu::TextureFormat, wgpu::TextureFormat), GpuError> {
        let caps = surface.get_capabilities(&self.adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;

        tracing::info!("Surface format: {:?}", format);
        Ok((format, format.remove_srgb_suffix()))
    }
}
