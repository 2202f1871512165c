//! Pass chain layout - the data side of post-processing
//!
//! `PassChainLayout` is an ordered list of stage descriptors. It owns no GPU
//! resources; `PassChain` reads it every frame to decide which runtimes run
//! and with which parameters.
//!
//! Stages belong to slots that must appear in this order:
//!
//! | Slot            | Kinds                                          |
//! |-----------------|------------------------------------------------|
//! | Scene           | `Scene`                                        |
//! | ColorCorrection | `ColorCorrection`                              |
//! | Effect          | `Film`, `Glitch`, `Afterimage`, `Bloom`, `Halftone` |
//! | Outline         | `Outline`                                      |
//! | AntiAlias       | `AntiAlias`                                    |
//!
//! Optional effects work on display-encoded color and sit underneath the
//! outline glow, so they may only be inserted, moved or removed within the
//! Effect slot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgb;

/// Invalid pass chain layout or edit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("{0:?} stage cannot be disabled or removed")]
    RequiredStage(StageKind),

    #[error("{0:?} stage appears more than once")]
    DuplicateStage(StageKind),

    #[error("{0:?} stage is missing from the layout")]
    MissingStage(StageKind),

    #[error("{0:?} is not an optional effect and can only live in its own slot")]
    NotAnEffect(StageKind),

    #[error("{kind:?} stage is out of order")]
    OutOfOrder { kind: StageKind },

    #[error("effect position {position} is out of range (0..={len})")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("unknown stage '{0}'")]
    UnknownStage(String),
}

/// Identifies a stage type; each appears at most once in a layout
///
/// Serialized as its bare name so a list of kinds reads as
/// `<effect>Bloom</effect><effect>Film</effect>` in XML settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StageKind {
    Scene,
    ColorCorrection,
    Film,
    Glitch,
    Afterimage,
    Bloom,
    Halftone,
    Outline,
    AntiAlias,
}

/// Ordered position class of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StageSlot {
    Scene,
    ColorCorrection,
    Effect,
    Outline,
    AntiAlias,
}

impl StageKind {
    /// Optional effects in their default order
    pub const EFFECTS: [StageKind; 5] = [
        StageKind::Film,
        StageKind::Glitch,
        StageKind::Afterimage,
        StageKind::Bloom,
        StageKind::Halftone,
    ];

    pub fn slot(self) -> StageSlot {
        match self {
            StageKind::Scene => StageSlot::Scene,
            StageKind::ColorCorrection => StageSlot::ColorCorrection,
            StageKind::Film
            | StageKind::Glitch
            | StageKind::Afterimage
            | StageKind::Bloom
            | StageKind::Halftone => StageSlot::Effect,
            StageKind::Outline => StageSlot::Outline,
            StageKind::AntiAlias => StageSlot::AntiAlias,
        }
    }

    pub fn is_effect(self) -> bool {
        self.slot() == StageSlot::Effect
    }

    /// Stages that always run
    pub fn is_required(self) -> bool {
        matches!(self, StageKind::Scene | StageKind::ColorCorrection)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StageKind::Scene => "Scene",
            StageKind::ColorCorrection => "Color Correction",
            StageKind::Film => "Film Grain",
            StageKind::Glitch => "Glitch",
            StageKind::Afterimage => "Afterimage",
            StageKind::Bloom => "Bloom",
            StageKind::Halftone => "Halftone",
            StageKind::Outline => "Outline",
            StageKind::AntiAlias => "Anti-aliasing",
        }
    }

    /// Name used in settings files
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Scene => "Scene",
            StageKind::ColorCorrection => "ColorCorrection",
            StageKind::Film => "Film",
            StageKind::Glitch => "Glitch",
            StageKind::Afterimage => "Afterimage",
            StageKind::Bloom => "Bloom",
            StageKind::Halftone => "Halftone",
            StageKind::Outline => "Outline",
            StageKind::AntiAlias => "AntiAlias",
        }
    }
}

impl FromStr for StageKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        [StageKind::Scene, StageKind::ColorCorrection]
            .into_iter()
            .chain(StageKind::EFFECTS)
            .chain([StageKind::Outline, StageKind::AntiAlias])
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| PipelineError::UnknownStage(s.to_string()))
    }
}

impl TryFrom<String> for StageKind {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StageKind> for String {
    fn from(kind: StageKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selective outline parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineParams {
    /// Brightness of the edge line
    #[serde(rename = "edgeStrength")]
    pub edge_strength: f32,
    /// Spread of the soft glow around the edge
    #[serde(rename = "edgeGlow")]
    pub edge_glow: f32,
    /// Width of the sharp edge in pixels
    #[serde(rename = "edgeThickness")]
    pub edge_thickness: f32,
    /// Seconds per pulse cycle, 0 disables pulsing
    #[serde(rename = "pulsePeriod")]
    pub pulse_period: f32,
    /// Edge color where the selection is visible
    #[serde(rename = "visibleEdgeColor")]
    pub visible_edge_color: Rgb,
    /// Edge color where the selection is hidden behind other geometry
    #[serde(rename = "hiddenEdgeColor")]
    pub hidden_edge_color: Rgb,
}

impl Default for OutlineParams {
    fn default() -> Self {
        Self {
            edge_strength: 5.0,
            edge_glow: 2.0,
            edge_thickness: 1.0,
            pulse_period: 5.0,
            visible_edge_color: Rgb::WHITE,
            hidden_edge_color: Rgb::from_u32(0x190a05),
        }
    }
}

impl OutlineParams {
    /// Multiplier applied to edge strength at `time` seconds
    pub fn pulse(&self, time: f32) -> f32 {
        if self.pulse_period > 0.0 {
            0.625 + 0.375 * (time * 10.0 / self.pulse_period).cos()
        } else {
            1.0
        }
    }
}

/// FXAA tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntiAliasParams {
    /// Longest edge search span in pixels
    #[serde(rename = "spanMax")]
    pub span_max: f32,
    /// Scale of the luma-based direction reduction
    #[serde(rename = "reduceMul")]
    pub reduce_mul: f32,
    /// Lower bound of the direction reduction
    #[serde(rename = "reduceMin")]
    pub reduce_min: f32,
}

impl Default for AntiAliasParams {
    fn default() -> Self {
        Self {
            span_max: 8.0,
            reduce_mul: 1.0 / 8.0,
            reduce_min: 1.0 / 128.0,
        }
    }
}

/// Film grain and scanlines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmParams {
    #[serde(rename = "noiseIntensity")]
    pub noise_intensity: f32,
    #[serde(rename = "scanlineIntensity")]
    pub scanline_intensity: f32,
    #[serde(rename = "scanlineCount")]
    pub scanline_count: f32,
    #[serde(rename = "grayscale")]
    pub grayscale: bool,
}

impl Default for FilmParams {
    fn default() -> Self {
        Self {
            noise_intensity: 1.0,
            scanline_intensity: 1.0,
            scanline_count: 4096.0,
            grayscale: false,
        }
    }
}

/// Periodic digital glitch bursts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlitchParams {
    /// Seconds between bursts
    #[serde(rename = "interval")]
    pub interval: f32,
    /// Seconds each burst lasts
    #[serde(rename = "duration")]
    pub duration: f32,
    /// Maximum RGB split and band shift as a fraction of the width
    #[serde(rename = "amount")]
    pub amount: f32,
    /// Varies the burst pattern between runs
    #[serde(rename = "seed")]
    pub seed: u32,
}

impl Default for GlitchParams {
    fn default() -> Self {
        Self {
            interval: 3.0,
            duration: 0.3,
            amount: 0.03,
            seed: 0,
        }
    }
}

/// Trailing afterimage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AfterimageParams {
    /// Fraction of the previous frame kept each frame
    #[serde(rename = "damp")]
    pub damp: f32,
}

impl Default for AfterimageParams {
    fn default() -> Self {
        Self { damp: 0.96 }
    }
}

/// Bright-pass bloom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomParams {
    #[serde(rename = "strength")]
    pub strength: f32,
    /// Blur spread multiplier
    #[serde(rename = "radius")]
    pub radius: f32,
    /// Luminance above which pixels bloom
    #[serde(rename = "threshold")]
    pub threshold: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            strength: 1.0,
            radius: 1.0,
            threshold: 0.2,
        }
    }
}

/// Halftone dot shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HalftoneShape {
    #[default]
    Dot,
    Ellipse,
    Line,
    Square,
}

impl HalftoneShape {
    pub fn shader_index(self) -> f32 {
        match self {
            HalftoneShape::Dot => 1.0,
            HalftoneShape::Ellipse => 2.0,
            HalftoneShape::Line => 3.0,
            HalftoneShape::Square => 4.0,
        }
    }
}

/// Print-style halftone screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalftoneParams {
    /// Grid cell size in pixels
    #[serde(rename = "radius")]
    pub radius: f32,
    #[serde(rename = "shape")]
    pub shape: HalftoneShape,
    /// Random jitter of dot size
    #[serde(rename = "scatter")]
    pub scatter: f32,
    /// Mix between the original image (0) and the halftone (1)
    #[serde(rename = "blending")]
    pub blending: f32,
    #[serde(rename = "greyscale")]
    pub greyscale: bool,
    /// Screen angles per channel in radians
    #[serde(rename = "rotateR")]
    pub rotate_r: f32,
    #[serde(rename = "rotateG")]
    pub rotate_g: f32,
    #[serde(rename = "rotateB")]
    pub rotate_b: f32,
}

impl Default for HalftoneParams {
    fn default() -> Self {
        let step = std::f32::consts::PI / 12.0;
        Self {
            radius: 10.0,
            shape: HalftoneShape::Dot,
            scatter: 0.0,
            blending: 1.0,
            greyscale: false,
            rotate_r: step,
            rotate_g: step * 2.0,
            rotate_b: step * 3.0,
        }
    }
}

/// Stage type together with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageParams {
    Scene,
    ColorCorrection,
    Film(FilmParams),
    Glitch(GlitchParams),
    Afterimage(AfterimageParams),
    Bloom(BloomParams),
    Halftone(HalftoneParams),
    Outline(OutlineParams),
    AntiAlias(AntiAliasParams),
}

impl StageParams {
    /// Default parameters for a stage kind
    pub fn default_for(kind: StageKind) -> Self {
        match kind {
            StageKind::Scene => StageParams::Scene,
            StageKind::ColorCorrection => StageParams::ColorCorrection,
            StageKind::Film => StageParams::Film(FilmParams::default()),
            StageKind::Glitch => StageParams::Glitch(GlitchParams::default()),
            StageKind::Afterimage => StageParams::Afterimage(AfterimageParams::default()),
            StageKind::Bloom => StageParams::Bloom(BloomParams::default()),
            StageKind::Halftone => StageParams::Halftone(HalftoneParams::default()),
            StageKind::Outline => StageParams::Outline(OutlineParams::default()),
            StageKind::AntiAlias => StageParams::AntiAlias(AntiAliasParams::default()),
        }
    }

    pub fn kind(&self) -> StageKind {
        match self {
            StageParams::Scene => StageKind::Scene,
            StageParams::ColorCorrection => StageKind::ColorCorrection,
            StageParams::Film(_) => StageKind::Film,
            StageParams::Glitch(_) => StageKind::Glitch,
            StageParams::Afterimage(_) => StageKind::Afterimage,
            StageParams::Bloom(_) => StageKind::Bloom,
            StageParams::Halftone(_) => StageKind::Halftone,
            StageParams::Outline(_) => StageKind::Outline,
            StageParams::AntiAlias(_) => StageKind::AntiAlias,
        }
    }
}

/// One entry in the pass chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub enabled: bool,
    pub params: StageParams,
}

impl StageDescriptor {
    pub fn new(params: StageParams, enabled: bool) -> Self {
        Self { enabled, params }
    }

    pub fn kind(&self) -> StageKind {
        self.params.kind()
    }
}

/// Ordered, togglable list of post-processing stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassChainLayout {
    stages: Vec<StageDescriptor>,
}

impl Default for PassChainLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl PassChainLayout {
    /// Scene, color correction, outline and anti-aliasing enabled;
    /// every optional effect present but disabled
    pub fn new() -> Self {
        let mut stages = vec![
            StageDescriptor::new(StageParams::Scene, true),
            StageDescriptor::new(StageParams::ColorCorrection, true),
        ];
        stages.extend(
            StageKind::EFFECTS
                .iter()
                .map(|&kind| StageDescriptor::new(StageParams::default_for(kind), false)),
        );
        stages.push(StageDescriptor::new(StageParams::default_for(StageKind::Outline), true));
        stages.push(StageDescriptor::new(StageParams::default_for(StageKind::AntiAlias), true));
        Self { stages }
    }

    /// Build from an explicit stage list, checking slot order and uniqueness
    pub fn from_stages(stages: Vec<StageDescriptor>) -> Result<Self, PipelineError> {
        let layout = Self { stages };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut seen = Vec::with_capacity(self.stages.len());
        let mut last_slot = StageSlot::Scene;
        for stage in &self.stages {
            let kind = stage.kind();
            if seen.contains(&kind) {
                return Err(PipelineError::DuplicateStage(kind));
            }
            if kind.slot() < last_slot {
                return Err(PipelineError::OutOfOrder { kind });
            }
            if kind.is_required() && !stage.enabled {
                return Err(PipelineError::RequiredStage(kind));
            }
            last_slot = kind.slot();
            seen.push(kind);
        }

        for kind in [
            StageKind::Scene,
            StageKind::ColorCorrection,
            StageKind::Outline,
            StageKind::AntiAlias,
        ] {
            if !seen.contains(&kind) {
                return Err(PipelineError::MissingStage(kind));
            }
        }
        Ok(())
    }

    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    /// Stages that will run, in order
    pub fn enabled_stages(&self) -> impl Iterator<Item = &StageDescriptor> {
        self.stages.iter().filter(|s| s.enabled)
    }

    pub fn get(&self, kind: StageKind) -> Option<&StageDescriptor> {
        self.stages.iter().find(|s| s.kind() == kind)
    }

    /// Mutable access to a stage's parameters; the kind cannot change
    pub fn params_mut(&mut self, kind: StageKind) -> Option<&mut StageParams> {
        self.stages
            .iter_mut()
            .find(|s| s.kind() == kind)
            .map(|s| &mut s.params)
    }

    /// Replace a stage's parameters
    pub fn set_params(&mut self, params: StageParams) -> Result<(), PipelineError> {
        let kind = params.kind();
        let slot = self
            .params_mut(kind)
            .ok_or(PipelineError::MissingStage(kind))?;
        *slot = params;
        Ok(())
    }

    pub fn is_enabled(&self, kind: StageKind) -> bool {
        self.get(kind).is_some_and(|s| s.enabled)
    }

    pub fn set_enabled(&mut self, kind: StageKind, enabled: bool) -> Result<(), PipelineError> {
        if kind.is_required() && !enabled {
            return Err(PipelineError::RequiredStage(kind));
        }
        let stage = self
            .stages
            .iter_mut()
            .find(|s| s.kind() == kind)
            .ok_or(PipelineError::MissingStage(kind))?;
        stage.enabled = enabled;
        Ok(())
    }

    /// Flip a stage, returning its new state
    pub fn toggle(&mut self, kind: StageKind) -> Result<bool, PipelineError> {
        let enabled = !self.is_enabled(kind);
        self.set_enabled(kind, enabled)?;
        Ok(enabled)
    }

    /// Optional effects in chain order
    pub fn effect_order(&self) -> Vec<StageKind> {
        self.stages
            .iter()
            .map(StageDescriptor::kind)
            .filter(|k| k.is_effect())
            .collect()
    }

    /// Insert an optional effect at `position` within the effect slot
    pub fn insert_effect(
        &mut self,
        position: usize,
        stage: StageDescriptor,
    ) -> Result<(), PipelineError> {
        let kind = stage.kind();
        if !kind.is_effect() {
            return Err(PipelineError::NotAnEffect(kind));
        }
        if self.get(kind).is_some() {
            return Err(PipelineError::DuplicateStage(kind));
        }
        let (start, len) = self.effect_range();
        if position > len {
            return Err(PipelineError::PositionOutOfRange { position, len });
        }
        self.stages.insert(start + position, stage);
        Ok(())
    }

    /// Remove an optional effect entirely
    pub fn remove_effect(&mut self, kind: StageKind) -> Result<StageDescriptor, PipelineError> {
        if !kind.is_effect() {
            return Err(PipelineError::RequiredStage(kind));
        }
        let index = self
            .stages
            .iter()
            .position(|s| s.kind() == kind)
            .ok_or(PipelineError::MissingStage(kind))?;
        Ok(self.stages.remove(index))
    }

    /// Move an optional effect to `position` within the effect slot
    ///
    /// `position` indexes the slot after the effect is taken out. A failed
    /// move leaves the layout untouched.
    pub fn move_effect(&mut self, kind: StageKind, position: usize) -> Result<(), PipelineError> {
        if !kind.is_effect() {
            return Err(PipelineError::RequiredStage(kind));
        }
        if self.get(kind).is_none() {
            return Err(PipelineError::MissingStage(kind));
        }
        let (_, len) = self.effect_range();
        let last = len.saturating_sub(1);
        if position > last {
            return Err(PipelineError::PositionOutOfRange { position, len: last });
        }
        let stage = self.remove_effect(kind)?;
        self.insert_effect(position, stage)
    }

    /// Start index and length of the effect slot
    fn effect_range(&self) -> (usize, usize) {
        let start = self
            .stages
            .iter()
            .position(|s| s.kind().slot() >= StageSlot::Effect)
            .unwrap_or(self.stages.len());
        let len = self.stages[start..]
            .iter()
            .take_while(|s| s.kind().is_effect())
            .count();
        (start, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(layout: &PassChainLayout) -> Vec<StageKind> {
        layout.stages().iter().map(StageDescriptor::kind).collect()
    }

    #[test]
    fn test_default_order() {
        let layout = PassChainLayout::new();
        assert!(layout.validate().is_ok());
        let enabled: Vec<_> = layout.enabled_stages().map(StageDescriptor::kind).collect();
        assert_eq!(
            enabled,
            vec![
                StageKind::Scene,
                StageKind::ColorCorrection,
                StageKind::Outline,
                StageKind::AntiAlias
            ]
        );
        assert_eq!(layout.effect_order(), StageKind::EFFECTS.to_vec());
        assert!(StageKind::EFFECTS.iter().all(|&k| !layout.is_enabled(k)));
    }

    #[test]
    fn test_toggle_keeps_order() {
        let mut layout = PassChainLayout::new();
        let before = kinds(&layout);
        assert!(!layout.toggle(StageKind::Outline).unwrap());
        assert!(layout.toggle(StageKind::Bloom).unwrap());
        assert_eq!(kinds(&layout), before);
        assert!(!layout.is_enabled(StageKind::Outline));
        assert!(layout.is_enabled(StageKind::Bloom));
    }

    #[test]
    fn test_required_stages_cannot_be_disabled() {
        let mut layout = PassChainLayout::new();
        assert_eq!(
            layout.set_enabled(StageKind::Scene, false),
            Err(PipelineError::RequiredStage(StageKind::Scene))
        );
        assert_eq!(
            layout.toggle(StageKind::ColorCorrection),
            Err(PipelineError::RequiredStage(StageKind::ColorCorrection))
        );
        assert!(layout.is_enabled(StageKind::ColorCorrection));
    }

    #[test]
    fn test_effects_stay_between_correction_and_outline() {
        let mut layout = PassChainLayout::new();
        layout.remove_effect(StageKind::Glitch).unwrap();
        layout
            .insert_effect(0, StageDescriptor::new(StageParams::default_for(StageKind::Glitch), true))
            .unwrap();
        let order = kinds(&layout);
        assert_eq!(order[1], StageKind::ColorCorrection);
        assert_eq!(order[2], StageKind::Glitch);
        assert_eq!(order[order.len() - 2], StageKind::Outline);
        assert_eq!(order[order.len() - 1], StageKind::AntiAlias);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_non_effects_cannot_be_inserted() {
        let mut layout = PassChainLayout::new();
        let outline = StageDescriptor::new(StageParams::default_for(StageKind::Outline), true);
        assert_eq!(
            layout.insert_effect(0, outline),
            Err(PipelineError::NotAnEffect(StageKind::Outline))
        );
        assert_eq!(
            layout.remove_effect(StageKind::AntiAlias),
            Err(PipelineError::RequiredStage(StageKind::AntiAlias))
        );
    }

    #[test]
    fn test_duplicate_and_range_checks() {
        let mut layout = PassChainLayout::new();
        let film = StageDescriptor::new(StageParams::default_for(StageKind::Film), true);
        assert_eq!(
            layout.insert_effect(0, film.clone()),
            Err(PipelineError::DuplicateStage(StageKind::Film))
        );
        layout.remove_effect(StageKind::Film).unwrap();
        assert_eq!(
            layout.insert_effect(9, film),
            Err(PipelineError::PositionOutOfRange { position: 9, len: 4 })
        );
    }

    #[test]
    fn test_move_effect() {
        let mut layout = PassChainLayout::new();
        layout.move_effect(StageKind::Halftone, 0).unwrap();
        assert_eq!(layout.effect_order()[0], StageKind::Halftone);
        layout.move_effect(StageKind::Film, 4).unwrap();
        assert_eq!(
            layout.effect_order(),
            vec![
                StageKind::Halftone,
                StageKind::Glitch,
                StageKind::Afterimage,
                StageKind::Bloom,
                StageKind::Film
            ]
        );
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_failed_move_keeps_order() {
        let mut layout = PassChainLayout::new();
        assert_eq!(
            layout.move_effect(StageKind::Film, 10),
            Err(PipelineError::PositionOutOfRange { position: 10, len: 4 })
        );
        assert_eq!(
            layout.move_effect(StageKind::Bloom, 5),
            Err(PipelineError::PositionOutOfRange { position: 5, len: 4 })
        );
        assert_eq!(layout.effect_order(), StageKind::EFFECTS.to_vec());

        layout.remove_effect(StageKind::Glitch).unwrap();
        assert_eq!(
            layout.move_effect(StageKind::Glitch, 0),
            Err(PipelineError::MissingStage(StageKind::Glitch))
        );
        assert_eq!(layout.effect_order().len(), 4);
    }

    #[test]
    fn test_stage_kind_names_parse_back() {
        for kind in StageKind::EFFECTS {
            assert_eq!(kind.to_string().parse::<StageKind>().unwrap(), kind);
        }
        assert_eq!("antialias".parse::<StageKind>().unwrap(), StageKind::AntiAlias);
        assert_eq!(
            "Sepia".parse::<StageKind>(),
            Err(PipelineError::UnknownStage("Sepia".to_string()))
        );
    }

    #[test]
    fn test_from_stages_rejects_bad_order() {
        let stages = vec![
            StageDescriptor::new(StageParams::Scene, true),
            StageDescriptor::new(StageParams::ColorCorrection, true),
            StageDescriptor::new(StageParams::default_for(StageKind::Outline), true),
            StageDescriptor::new(StageParams::default_for(StageKind::Bloom), true),
            StageDescriptor::new(StageParams::default_for(StageKind::AntiAlias), true),
        ];
        assert_eq!(
            PassChainLayout::from_stages(stages),
            Err(PipelineError::OutOfOrder { kind: StageKind::Bloom })
        );

        let missing = vec![
            StageDescriptor::new(StageParams::Scene, true),
            StageDescriptor::new(StageParams::ColorCorrection, true),
            StageDescriptor::new(StageParams::default_for(StageKind::AntiAlias), true),
        ];
        assert_eq!(
            PassChainLayout::from_stages(missing),
            Err(PipelineError::MissingStage(StageKind::Outline))
        );
    }

    #[test]
    fn test_set_params() {
        let mut layout = PassChainLayout::new();
        let params = OutlineParams {
            edge_strength: 2.0,
            ..OutlineParams::default()
        };
        layout.set_params(StageParams::Outline(params)).unwrap();
        assert_eq!(
            layout.get(StageKind::Outline).map(|s| &s.params),
            Some(&StageParams::Outline(params))
        );
    }

    #[test]
    fn test_outline_pulse() {
        let mut params = OutlineParams::default();
        assert!((params.pulse(0.0) - 1.0).abs() < 1e-6);
        let period_half = std::f32::consts::PI * params.pulse_period / 10.0;
        assert!((params.pulse(period_half) - 0.25).abs() < 1e-5);
        params.pulse_period = 0.0;
        assert_eq!(params.pulse(123.0), 1.0);
    }
}
