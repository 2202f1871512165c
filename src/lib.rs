//! Starlight Earth
//!
//! A stylized globe renderer: two translucent night-map shells, a star
//! field, markers at two geographic coordinates and a glowing arc between
//! them, composited through an ordered chain of post-processing passes with
//! a selective outline.

pub mod app;
pub mod arc;
pub mod assets;
pub mod color;
pub mod geo;
pub mod gpu_context;
pub mod render;
pub mod scene;
pub mod settings;
pub mod shaders;
pub mod telemetry;

pub use app::{FrameClock, GlobeApp};
pub use arc::{build_arc, ArcConfig, ArcError, ArcMesh};
pub use color::Rgb;
pub use geo::{project, GeoPoint, SpherePoint};
pub use gpu_context::{GpuContext, GpuError};
pub use render::{FrameTime, OutlineSelection, PassChain, PassChainLayout, PipelineError, StageKind};
pub use scene::{assemble, EarthScene, OrbitCamera, SceneGroup};
pub use settings::GlobeSettings;
