//! Asset descriptors
//!
//! One JSON file per visual asset. The file stem is the asset id, and the
//! generated image lives next to it as `r_<id>.png`.

use crate::io::atomic_write;
use chrono::{DateTime, SecondsFormat, Utc};
use mystery_core::{MysteryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Status written after a successful generation
pub const STATUS_DRAFT: &str = "draft";
/// Status of assets that only have a hand-made placeholder
pub const STATUS_PLACEHOLDER: &str = "placeholder";

/// The declared kind of a visual asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    Location,
    Character,
    Clue,
    Other(String),
}

impl AssetType {
    /// Whether assets of this type default to a transparent background
    pub fn is_cutout(&self) -> bool {
        matches!(self, AssetType::Clue | AssetType::Character)
    }
}

impl From<String> for AssetType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "location" => AssetType::Location,
            "character" => AssetType::Character,
            "clue" => AssetType::Clue,
            _ => AssetType::Other(s),
        }
    }
}

impl From<&str> for AssetType {
    fn from(s: &str) -> Self {
        AssetType::from(s.to_string())
    }
}

impl From<AssetType> for String {
    fn from(t: AssetType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::Location => write!(f, "location"),
            AssetType::Character => write!(f, "character"),
            AssetType::Clue => write!(f, "clue"),
            AssetType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A descriptor for one visual asset.
///
/// Fields this tool does not know about are kept in `extra` and written back
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub name: String,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<AssetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_model: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AssetDescriptor {
    /// Load and validate a descriptor file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let descriptor: AssetDescriptor =
            serde_json::from_str(&content).map_err(|e| MysteryError::InvalidDescriptor {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        descriptor.validate(path)?;
        Ok(descriptor)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: &str| MysteryError::InvalidDescriptor {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };
        if self.width == 0 {
            return Err(invalid("width must be positive"));
        }
        if self.height == 0 {
            return Err(invalid("height must be positive"));
        }
        if self.prompt.trim().is_empty() {
            return Err(invalid("prompt must not be empty"));
        }
        Ok(())
    }

    /// Write the descriptor back as pretty JSON, atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    /// Clues and characters get a transparent background unless the
    /// descriptor opts out with `"transparent": false`.
    pub fn needs_transparency(&self) -> bool {
        self.asset_type.as_ref().is_some_and(AssetType::is_cutout) && self.transparent != Some(false)
    }

    /// Record a successful generation
    pub fn mark_generated(&mut self, model: &str, now: DateTime<Utc>) {
        self.status = Some(STATUS_DRAFT.to_string());
        self.generated_at = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
        self.generation_model = Some(model.to_string());
    }

    /// Status string, empty when absent
    pub fn status_str(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

/// The generated image path for a descriptor: `D/r_<stem>.png`
pub fn output_path_for(descriptor_path: &Path) -> Option<PathBuf> {
    let id = mystery_core::AssetId::from_path(descriptor_path)?;
    let dir = descriptor_path.parent().unwrap_or_else(|| Path::new(""));
    Some(dir.join(id.output_file_name()))
}
