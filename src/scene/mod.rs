//! Globe scene
//!
//! CPU-side description of what the scene pass draws: meshes, materials,
//! the rigid earth group, the star field, the environment cube and the
//! orbit camera. The GPU
//! mirror of this lives in `render::scene_renderer`.

pub mod assembler;
pub mod camera;
pub mod environment;
pub mod mesh;
pub mod node;

pub use assembler::{assemble, EarthScene, SceneError, SceneParts, TextureSet};
pub use camera::{CameraState, OrbitCamera};
pub use environment::Environment;
pub use mesh::{MeshData, MeshVertex, StarInstance};
pub use node::{
    DirectionalLight, Material, MeshNode, NodeId, SceneGroup, Shading, Side, StarField, TextureId,
    Transform,
};
