//! Rendering
//!
//! - `stage`: `PassChainLayout`, the ordered and togglable stage list
//! - `chain`: `PassChain`, the GPU runtime that executes a layout
//! - `passes`: one runtime per stage
//! - `scene_renderer`: uploads and draws the globe scene
//! - `fullscreen`, `target`: shared building blocks

pub mod chain;
pub mod fullscreen;
pub mod passes;
pub mod scene_renderer;
pub mod stage;
pub mod target;

pub use chain::{OutputTarget, PassChain};
pub use fullscreen::{FullscreenPass, PassParams};
pub use scene_renderer::SceneRenderer;
pub use stage::{
    AfterimageParams, AntiAliasParams, BloomParams, FilmParams, GlitchParams, HalftoneParams,
    HalftoneShape, OutlineParams, PassChainLayout, PipelineError, StageDescriptor, StageKind,
    StageParams, StageSlot,
};
pub use target::RenderTarget;

use crate::scene::{NodeId, SceneGroup};

/// Clock values passed to `PassChain::render`
///
/// Time-driven effects (outline pulse, film grain, glitch) only read this,
/// so rendering the same scene at the same `FrameTime` is reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the app started
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

impl FrameTime {
    pub fn new(elapsed: f32, delta: f32) -> Self {
        Self { elapsed, delta }
    }
}

/// Nodes the outline stage highlights
///
/// A frozen snapshot: taken from a group once, it does not follow later
/// changes to that group. Use `PassChain::set_selection` to refresh it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineSelection {
    ids: Vec<NodeId>,
}

impl OutlineSelection {
    pub fn new(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut ids: Vec<NodeId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self { ids }
    }

    /// Every current child of `group`
    pub fn from_group(group: &SceneGroup) -> Self {
        Self::new(group.children().iter().map(|child| child.id))
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::scene::{Material, MeshData, MeshNode};

    fn node(name: &str) -> MeshNode {
        MeshNode::new(name, MeshData::default(), Material::unlit(Rgb::WHITE))
    }

    #[test]
    fn test_selection_from_group() {
        let mut group = SceneGroup::new("group");
        group.add(node("a"));
        group.add(node("b"));
        let selection = OutlineSelection::from_group(&group);
        assert_eq!(selection.len(), 2);
        assert!(group.children().iter().all(|c| selection.contains(c.id)));
    }

    #[test]
    fn test_selection_is_a_snapshot() {
        let mut group = SceneGroup::new("group");
        group.add(node("a"));
        let selection = OutlineSelection::from_group(&group);

        let late = node("late");
        let late_id = late.id;
        group.add(late);
        assert!(!selection.contains(late_id));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_selection_dedups() {
        let id = NodeId::next();
        let selection = OutlineSelection::new([id, id]);
        assert_eq!(selection.ids(), &[id]);
        assert!(!OutlineSelection::default().contains(id));
    }
}
