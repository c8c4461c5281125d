//! Project-wide timeline markers.

use serde::{Deserialize, Serialize};
use splice_core::{EditorTime, TimeRange};

use crate::error::{TimelineError, TimelineResult};
use crate::id::entity_id;

entity_id!(
    /// Marker ID
    MarkerId
);

/// Marker type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Standard marker
    #[default]
    Standard,
    /// In point (edit range start)
    In,
    /// Out point (edit range end)
    Out,
    /// Chapter marker (for export)
    Chapter,
    /// Comment/note marker
    Comment,
    Todo,
}

impl MarkerKind {
    /// Color used when a marker is added without one.
    pub fn default_color(self) -> &'static str {
        match self {
            Self::Standard => "#4A9EFF",
            Self::In => "#00FF00",
            Self::Out => "#FF0000",
            Self::Chapter => "#FF00FF",
            Self::Comment => "#FFFF00",
            Self::Todo => "#FFA500",
        }
    }
}

/// Timeline marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub timestamp: EditorTime,
    pub label: String,
    pub kind: MarkerKind,
    /// Color in hex format (e.g., "#FF0000")
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Which way [`MarkerCollection::find_nearest`] searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Field changes for [`MarkerCollection::update`]; `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerUpdate {
    pub timestamp: Option<EditorTime>,
    pub label: Option<String>,
    pub kind: Option<MarkerKind>,
    pub color: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

/// Markers sorted by timestamp; equal timestamps keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerCollection {
    markers: Vec<Marker>,
}

impl MarkerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker
    pub fn add(
        &mut self,
        timestamp: EditorTime,
        label: impl Into<String>,
        kind: MarkerKind,
        color: Option<String>,
        description: Option<String>,
    ) -> TimelineResult<MarkerId> {
        let color = match color {
            Some(color) => validate_color(color)?,
            None => kind.default_color().to_string(),
        };
        let marker = Marker {
            id: MarkerId::new(),
            timestamp,
            label: label.into(),
            kind,
            color,
            description,
        };
        let id = marker.id;
        self.insert_sorted(marker);
        Ok(id)
    }

    /// Remove a marker
    pub fn remove(&mut self, id: MarkerId) -> TimelineResult<Marker> {
        let idx = self.index_of(id)?;
        Ok(self.markers.remove(idx))
    }

    /// Apply field changes. A new timestamp places the marker after any
    /// markers already at that time.
    pub fn update(&mut self, id: MarkerId, update: MarkerUpdate) -> TimelineResult<()> {
        let idx = self.index_of(id)?;
        let color = update.color.map(validate_color).transpose()?;

        let mut marker = self.markers[idx].clone();
        if let Some(label) = update.label {
            marker.label = label;
        }
        if let Some(kind) = update.kind {
            marker.kind = kind;
        }
        if let Some(color) = color {
            marker.color = color;
        }
        if let Some(description) = update.description {
            marker.description = description;
        }

        match update.timestamp {
            Some(timestamp) if timestamp != marker.timestamp => {
                marker.timestamp = timestamp;
                self.markers.remove(idx);
                self.insert_sorted(marker);
            }
            _ => self.markers[idx] = marker,
        }
        Ok(())
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// All markers in timeline order.
    pub fn sorted_markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Nearest marker strictly after (`Forward`) or before (`Backward`) `time`.
    pub fn find_nearest(&self, time: EditorTime, direction: SearchDirection) -> Option<&Marker> {
        match direction {
            SearchDirection::Forward => {
                let idx = self.markers.partition_point(|m| m.timestamp <= time);
                self.markers.get(idx)
            }
            SearchDirection::Backward => {
                let idx = self.markers.partition_point(|m| m.timestamp < time);
                idx.checked_sub(1).and_then(|i| self.markers.get(i))
            }
        }
    }

    /// Markers inside `range` (start inclusive, end exclusive).
    pub fn markers_in(&self, range: TimeRange) -> &[Marker] {
        let lo = self.markers.partition_point(|m| m.timestamp < range.start);
        let hi = self.markers.partition_point(|m| m.timestamp < range.end());
        &self.markers[lo..hi.max(lo)]
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn index_of(&self, id: MarkerId) -> TimelineResult<usize> {
        self.markers
            .iter()
            .position(|m| m.id == id)
            .ok_or(TimelineError::MarkerNotFound(id))
    }

    fn insert_sorted(&mut self, marker: Marker) {
        let pos = self
            .markers
            .partition_point(|m| m.timestamp <= marker.timestamp);
        self.markers.insert(pos, marker);
    }
}

/// Accept `#RRGGBB` or `#RRGGBBAA`, normalized to upper case.
fn validate_color(color: String) -> TimelineResult<String> {
    let hex = color.strip_prefix('#').unwrap_or("");
    let valid = matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(TimelineError::InvalidValue(format!(
            "marker color must be #RRGGBB or #RRGGBBAA, got {color:?}"
        )));
    }
    Ok(color.to_ascii_uppercase())
}
