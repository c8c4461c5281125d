//! Project serialization with versioning and migration.
//!
//! Uses pretty-printed JSON with a schema version field. Every container in
//! the document is ordered, so writing a loaded file reproduces it byte for
//! byte.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::controller::TimelineController;
use crate::error::{TimelineError, TimelineResult};
use crate::project::Project;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned project file wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Schema version for migration.
    pub version: u32,
    /// The project data.
    pub project: Project,
    /// Application version that wrote this file.
    pub app_version: String,
}

impl ProjectFile {
    pub fn new(project: Project) -> Self {
        Self {
            version: CURRENT_VERSION,
            project,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> TimelineResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| {
            TimelineError::Serialization(format!("Failed to serialize project: {}", e))
        })
    }

    /// Deserialize from JSON bytes, migrating older layouts and validating
    /// the timeline structure.
    pub fn from_json(data: &[u8]) -> TimelineResult<Self> {
        let raw: Value = serde_json::from_slice(data)
            .map_err(|e| TimelineError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = match raw.get("version") {
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| TimelineError::Serialization(format!("Invalid version field: {}", v)))?,
            None => 0,
        };
        if version > CURRENT_VERSION {
            return Err(TimelineError::UnsupportedVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }

        let migrated = migrate(raw, version)?;
        let file: Self = serde_json::from_value(migrated).map_err(|e| {
            TimelineError::Serialization(format!("Failed to parse project: {}", e))
        })?;
        file.project.validate()?;
        Ok(file)
    }

    pub fn save_to_file(&self, path: &Path) -> TimelineResult<()> {
        let data = self.to_json()?;
        std::fs::write(path, &data)?;
        info!(
            path = %path.display(),
            project = %self.project.id,
            bytes = data.len(),
            "Project saved"
        );
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> TimelineResult<Self> {
        let data = std::fs::read(path)?;
        let file = Self::from_json(&data)?;
        info!(
            path = %path.display(),
            project = %file.project.id,
            version = file.version,
            tracks = file.project.tracks.len(),
            "Project loaded"
        );
        Ok(file)
    }
}

/// Apply sequential migrations from `from_version` to [`CURRENT_VERSION`].
fn migrate(mut data: Value, from_version: u32) -> TimelineResult<Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 stored the bare project with the frame rate at top level.
                let mut project = data;
                if let Value::Object(fields) = &mut project {
                    if !fields.contains_key("config") {
                        let frame_rate = fields.remove("frame_rate").ok_or_else(|| {
                            TimelineError::Serialization(
                                "v0 project has neither config nor frame_rate".to_string(),
                            )
                        })?;
                        fields.insert(
                            "config".to_string(),
                            serde_json::json!({ "frame_rate": frame_rate }),
                        );
                    }
                }
                data = serde_json::json!({
                    "version": 1,
                    "project": project,
                    "app_version": "0.0.0",
                });
                version = 1;
            }
            _ => {
                return Err(TimelineError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}

// ── Controller convenience ──────────────────────────────────────

impl TimelineController {
    /// Write the current project to `path`.
    pub fn save_to_file(&self, path: &Path) -> TimelineResult<()> {
        ProjectFile::new(self.project().clone()).save_to_file(path)
    }

    /// Open a project file with fresh history.
    pub fn load_from_file(path: &Path) -> TimelineResult<Self> {
        let file = ProjectFile::load_from_file(path)?;
        Ok(Self::new(file.project))
    }
}
