//! Clip masks: shape geometry plus shared feather/opacity/expansion controls.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{TimelineError, TimelineResult};
use crate::id::entity_id;
use crate::stack::{LayerStack, StackEntry};

entity_id!(
    /// Identifier of a mask within its clip.
    MaskId
);

/// A vertex in a mask path with tangent handles for cubic Bézier curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskVertex {
    /// Position in normalized frame coordinates.
    pub position: Vec2,
    /// Per-vertex feather amount (pixels).
    pub feather: f32,
    /// Incoming tangent handle (relative to position).
    pub tangent_in: Vec2,
    /// Outgoing tangent handle (relative to position).
    pub tangent_out: Vec2,
}

impl MaskVertex {
    /// Create a simple vertex with no tangents.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            feather: 0.0,
            tangent_in: Vec2::ZERO,
            tangent_out: Vec2::ZERO,
        }
    }
}

/// Discriminant of [`MaskShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKind {
    Rectangle,
    Ellipse,
    Bezier,
    Luminosity,
}

/// Variant geometry of a mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaskShape {
    Rectangle {
        center: Vec2,
        size: Vec2,
        corner_radius: f32,
        /// Degrees, clockwise.
        rotation: f32,
    },
    Ellipse {
        center: Vec2,
        radii: Vec2,
        rotation: f32,
    },
    Bezier {
        vertices: Vec<MaskVertex>,
        closed: bool,
    },
    /// Keys on pixel luminance between two normalized thresholds.
    Luminosity { low: f32, high: f32 },
}

impl MaskShape {
    /// Default geometry for a newly added mask of `kind`.
    pub fn default_for(kind: MaskKind) -> Self {
        let center = Vec2::splat(0.5);
        match kind {
            MaskKind::Rectangle => Self::Rectangle {
                center,
                size: Vec2::splat(0.5),
                corner_radius: 0.0,
                rotation: 0.0,
            },
            MaskKind::Ellipse => Self::Ellipse {
                center,
                radii: Vec2::splat(0.25),
                rotation: 0.0,
            },
            MaskKind::Bezier => Self::Bezier {
                vertices: vec![
                    MaskVertex::new(0.25, 0.25),
                    MaskVertex::new(0.75, 0.25),
                    MaskVertex::new(0.75, 0.75),
                    MaskVertex::new(0.25, 0.75),
                ],
                closed: true,
            },
            MaskKind::Luminosity => Self::Luminosity {
                low: 0.0,
                high: 1.0,
            },
        }
    }

    pub fn kind(&self) -> MaskKind {
        match self {
            Self::Rectangle { .. } => MaskKind::Rectangle,
            Self::Ellipse { .. } => MaskKind::Ellipse,
            Self::Bezier { .. } => MaskKind::Bezier,
            Self::Luminosity { .. } => MaskKind::Luminosity,
        }
    }

    /// Check the geometry is drawable.
    pub fn validate(&self) -> TimelineResult<()> {
        let invalid = |msg: String| -> TimelineResult<()> { Err(TimelineError::InvalidValue(msg)) };
        match self {
            Self::Rectangle {
                center,
                size,
                corner_radius,
                rotation,
            } => {
                if !center.is_finite() || !size.is_finite() || !rotation.is_finite() {
                    return invalid("rectangle geometry must be finite".into());
                }
                if size.x <= 0.0 || size.y <= 0.0 {
                    return invalid(format!("rectangle size must be positive, got {size}"));
                }
                if !(0.0..=size.min_element() / 2.0).contains(corner_radius) {
                    return invalid(format!(
                        "corner radius {corner_radius} outside [0, {}]",
                        size.min_element() / 2.0
                    ));
                }
            }
            Self::Ellipse {
                center,
                radii,
                rotation,
            } => {
                if !center.is_finite() || !radii.is_finite() || !rotation.is_finite() {
                    return invalid("ellipse geometry must be finite".into());
                }
                if radii.x <= 0.0 || radii.y <= 0.0 {
                    return invalid(format!("ellipse radii must be positive, got {radii}"));
                }
            }
            Self::Bezier { vertices, closed } => {
                let needed = if *closed { 3 } else { 2 };
                if vertices.len() < needed {
                    return invalid(format!(
                        "bezier path needs at least {needed} vertices, got {}",
                        vertices.len()
                    ));
                }
                let finite = vertices.iter().all(|v| {
                    v.position.is_finite()
                        && v.tangent_in.is_finite()
                        && v.tangent_out.is_finite()
                        && v.feather.is_finite()
                        && v.feather >= 0.0
                });
                if !finite {
                    return invalid("bezier vertices must be finite with non-negative feather".into());
                }
            }
            Self::Luminosity { low, high } => {
                if !(0.0..=1.0).contains(low) || !(0.0..=1.0).contains(high) || low > high {
                    return invalid(format!("luminosity range [{low}, {high}] is not within [0, 1]"));
                }
            }
        }
        Ok(())
    }
}

/// Scalar mask controls addressable by [`MaskStack::set_property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskProperty {
    Feather,
    Opacity,
    Expansion,
}

impl MaskProperty {
    /// Allowed `[min, max]` range.
    pub fn range(self) -> (f32, f32) {
        match self {
            Self::Feather => (0.0, 100.0),
            Self::Opacity => (0.0, 1.0),
            Self::Expansion => (-100.0, 100.0),
        }
    }

    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

/// A mask applied to a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub id: MaskId,
    pub shape: MaskShape,
    /// Edge softness in pixels.
    pub feather: f32,
    pub opacity: f32,
    /// Grow (positive) or shrink (negative) in pixels.
    pub expansion: f32,
    pub enabled: bool,
    pub inverted: bool,
}

impl Mask {
    pub fn new(kind: MaskKind) -> Self {
        Self {
            id: MaskId::new(),
            shape: MaskShape::default_for(kind),
            feather: 0.0,
            opacity: 1.0,
            expansion: 0.0,
            enabled: true,
            inverted: false,
        }
    }

    pub fn kind(&self) -> MaskKind {
        self.shape.kind()
    }

    pub fn property(&self, property: MaskProperty) -> f32 {
        match property {
            MaskProperty::Feather => self.feather,
            MaskProperty::Opacity => self.opacity,
            MaskProperty::Expansion => self.expansion,
        }
    }
}

impl StackEntry for Mask {
    type Id = MaskId;

    fn id(&self) -> MaskId {
        self.id
    }
}

/// Masks of a clip in paint order.
pub type MaskStack = LayerStack<Mask>;

impl LayerStack<Mask> {
    /// Add a mask of `kind` with default geometry on top of the stack.
    pub fn add_mask(&mut self, kind: MaskKind) -> MaskId {
        self.push(Mask::new(kind))
    }

    pub fn remove_mask(&mut self, id: MaskId) -> TimelineResult<Mask> {
        self.remove(id).ok_or(TimelineError::MaskNotFound(id))
    }

    /// Set a scalar property, clamped to its range. Returns the stored value.
    pub fn set_property(
        &mut self,
        id: MaskId,
        property: MaskProperty,
        value: f32,
    ) -> TimelineResult<f32> {
        if !value.is_finite() {
            return Err(TimelineError::InvalidValue(format!(
                "{property:?} must be finite, got {value}"
            )));
        }
        let mask = self.mask_mut(id)?;
        let value = property.clamp(value);
        match property {
            MaskProperty::Feather => mask.feather = value,
            MaskProperty::Opacity => mask.opacity = value,
            MaskProperty::Expansion => mask.expansion = value,
        }
        Ok(value)
    }

    /// Flip the enabled flag. Returns the new state.
    pub fn toggle_enabled(&mut self, id: MaskId) -> TimelineResult<bool> {
        let mask = self.mask_mut(id)?;
        mask.enabled = !mask.enabled;
        Ok(mask.enabled)
    }

    /// Flip the inverted flag. Returns the new state.
    pub fn toggle_inverted(&mut self, id: MaskId) -> TimelineResult<bool> {
        let mask = self.mask_mut(id)?;
        mask.inverted = !mask.inverted;
        Ok(mask.inverted)
    }

    /// Replace the geometry of a mask with validated geometry of the same kind.
    pub fn set_shape(&mut self, id: MaskId, shape: MaskShape) -> TimelineResult<()> {
        shape.validate()?;
        let mask = self.mask_mut(id)?;
        if mask.kind() != shape.kind() {
            return Err(TimelineError::ShapeMismatch {
                expected: mask.kind(),
                actual: shape.kind(),
            });
        }
        mask.shape = shape;
        Ok(())
    }

    /// Enabled masks, bottom to top.
    pub fn active(&self) -> impl Iterator<Item = &Mask> {
        self.iter().filter(|m| m.enabled)
    }

    fn mask_mut(&mut self, id: MaskId) -> TimelineResult<&mut Mask> {
        self.get_mut(id).ok_or(TimelineError::MaskNotFound(id))
    }
}
