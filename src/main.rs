//! Starlight Earth - Main Entry Point
//!
//! Runs the winit event loop and drives one `GlobeApp::tick` per redraw.

use std::sync::Arc;

use starlight_earth::render::StageKind;
use starlight_earth::settings::GlobeSettings;
use starlight_earth::telemetry::{init_logging, LogConfig};
use starlight_earth::GlobeApp;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Starlight Earth";

/// Pixels per wheel line for touchpads reporting pixel deltas
const PIXELS_PER_LINE: f64 = 40.0;

enum AppState {
    Uninitialized { settings: GlobeSettings },
    Running { app: GlobeApp },
    Failed,
}

struct FrameDriver {
    state: AppState,
}

impl FrameDriver {
    fn new(settings: GlobeSettings) -> Self {
        Self {
            state: AppState::Uninitialized { settings },
        }
    }
}

/// Stage toggled by a key, if any
fn stage_for_key(code: KeyCode) -> Option<StageKind> {
    match code {
        KeyCode::Digit1 => Some(StageKind::Film),
        KeyCode::Digit2 => Some(StageKind::Glitch),
        KeyCode::Digit3 => Some(StageKind::Afterimage),
        KeyCode::Digit4 => Some(StageKind::Bloom),
        KeyCode::Digit5 => Some(StageKind::Halftone),
        KeyCode::KeyO => Some(StageKind::Outline),
        KeyCode::KeyA => Some(StageKind::AntiAlias),
        _ => None,
    }
}

impl ApplicationHandler for FrameDriver {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Uninitialized { settings } = &self.state else {
            return;
        };
        let settings = settings.clone();

        tracing::info!("Creating window...");
        let window_attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(settings.window_width, settings.window_height));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                self.state = AppState::Failed;
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GlobeApp::new(window.clone(), settings)) {
            Ok(app) => {
                tracing::info!("Starlight Earth ready");
                tracing::info!("Keys: 1-5 effects, O outline, A anti-aliasing, Esc quit");
                window.request_redraw();
                self.state = AppState::Running { app };
            }
            Err(e) => {
                tracing::error!("Failed to start: {:#}", e);
                self.state = AppState::Failed;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let AppState::Running { app } = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                app.resize(new_size);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                app.rescale(scale_factor);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if code == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(kind) = stage_for_key(code) {
                    if let Err(e) = app.toggle_stage(kind) {
                        tracing::warn!("{}", e);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                app.on_mouse_input(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                app.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                app.on_scroll(lines);
            }
            WindowEvent::RedrawRequested => match app.tick() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    tracing::warn!("Surface lost, reconfiguring...");
                    app.reconfigure();
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    tracing::debug!("Surface timeout, skipping frame");
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    tracing::error!("Out of GPU memory!");
                    event_loop.exit();
                }
                Err(e) => {
                    tracing::warn!("Surface error: {:?}", e);
                }
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Continuous animation: one tick per redraw
        if let AppState::Running { app } = &self.state {
            app.window().request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let log_config = LogConfig::from_env().unwrap_or_else(|e| {
        eprintln!("{}, using default logging", e);
        LogConfig::default()
    });
    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("Starlight Earth v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = GlobeSettings::load();
    settings.clamp_values();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut driver = FrameDriver::new(settings);
    event_loop.run_app(&mut driver)?;

    if matches!(driver.state, AppState::Failed) {
        anyhow::bail!("Starlight Earth failed to start");
    }
    Ok(())
}
