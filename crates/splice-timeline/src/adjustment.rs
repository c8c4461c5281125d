//! Adjustment layers carried by adjustment clips.

use serde::{Deserialize, Serialize};

use crate::error::{TimelineError, TimelineResult};
use crate::id::entity_id;
use crate::stack::{LayerStack, StackEntry};

entity_id!(
    /// Identifier of an adjustment layer within its clip.
    AdjustmentId
);

/// What an adjustment layer does to the pixels beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Exposure,
    Contrast,
    Saturation,
    Temperature,
    Tint,
    Vignette,
    Blur,
    Sharpen,
}

impl AdjustmentKind {
    /// Allowed `[min, max]` amount.
    pub fn amount_range(self) -> (f32, f32) {
        match self {
            Self::Exposure => (-5.0, 5.0),
            Self::Contrast | Self::Saturation | Self::Temperature | Self::Tint => (-1.0, 1.0),
            Self::Vignette | Self::Sharpen => (0.0, 1.0),
            Self::Blur => (0.0, 100.0),
        }
    }

    /// Amount that leaves the image unchanged.
    pub fn neutral_amount(self) -> f32 {
        0.0
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Exposure => "Exposure",
            Self::Contrast => "Contrast",
            Self::Saturation => "Saturation",
            Self::Temperature => "Temperature",
            Self::Tint => "Tint",
            Self::Vignette => "Vignette",
            Self::Blur => "Blur",
            Self::Sharpen => "Sharpen",
        }
    }
}

/// How an adjustment layer composites onto the layers below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    Add,
    Difference,
    Luminosity,
}

impl BlendMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Multiply => "Multiply",
            Self::Screen => "Screen",
            Self::Overlay => "Overlay",
            Self::SoftLight => "Soft Light",
            Self::Add => "Add",
            Self::Difference => "Difference",
            Self::Luminosity => "Luminosity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentLayer {
    pub id: AdjustmentId,
    pub kind: AdjustmentKind,
    pub amount: f32,
    pub opacity: f32,
    pub blend: BlendMode,
    pub enabled: bool,
}

impl AdjustmentLayer {
    pub fn new(kind: AdjustmentKind) -> Self {
        Self {
            id: AdjustmentId::new(),
            kind,
            amount: kind.neutral_amount(),
            opacity: 1.0,
            blend: BlendMode::Normal,
            enabled: true,
        }
    }
}

impl StackEntry for AdjustmentLayer {
    type Id = AdjustmentId;

    fn id(&self) -> AdjustmentId {
        self.id
    }
}

/// Adjustment layers in paint order.
pub type AdjustmentStack = LayerStack<AdjustmentLayer>;

impl LayerStack<AdjustmentLayer> {
    pub fn add_layer(&mut self, kind: AdjustmentKind) -> AdjustmentId {
        self.push(AdjustmentLayer::new(kind))
    }

    pub fn remove_layer(&mut self, id: AdjustmentId) -> TimelineResult<AdjustmentLayer> {
        self.remove(id).ok_or(TimelineError::AdjustmentNotFound(id))
    }

    /// Set the amount, clamped to the kind's range. Returns the stored value.
    pub fn set_amount(&mut self, id: AdjustmentId, amount: f32) -> TimelineResult<f32> {
        finite("amount", amount)?;
        let layer = self.layer_mut(id)?;
        let (min, max) = layer.kind.amount_range();
        layer.amount = amount.clamp(min, max);
        Ok(layer.amount)
    }

    /// Set opacity, clamped to `[0, 1]`. Returns the stored value.
    pub fn set_opacity(&mut self, id: AdjustmentId, opacity: f32) -> TimelineResult<f32> {
        finite("opacity", opacity)?;
        let layer = self.layer_mut(id)?;
        layer.opacity = opacity.clamp(0.0, 1.0);
        Ok(layer.opacity)
    }

    pub fn set_blend(&mut self, id: AdjustmentId, blend: BlendMode) -> TimelineResult<()> {
        self.layer_mut(id)?.blend = blend;
        Ok(())
    }

    /// Flip the enabled flag. Returns the new state.
    pub fn toggle_enabled(&mut self, id: AdjustmentId) -> TimelineResult<bool> {
        let layer = self.layer_mut(id)?;
        layer.enabled = !layer.enabled;
        Ok(layer.enabled)
    }

    /// Enabled layers, bottom to top.
    pub fn active(&self) -> impl Iterator<Item = &AdjustmentLayer> {
        self.iter().filter(|l| l.enabled)
    }

    fn layer_mut(&mut self, id: AdjustmentId) -> TimelineResult<&mut AdjustmentLayer> {
        self.get_mut(id).ok_or(TimelineError::AdjustmentNotFound(id))
    }
}

fn finite(what: &str, value: f32) -> TimelineResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TimelineError::InvalidValue(format!(
            "{what} must be finite, got {value}"
        )))
    }
}
