//! Per-pack style guide
//!
//! A pack may carry `assets/style.json` with a style prefix and a quality
//! suffix that wrap every descriptor prompt.

use mystery_core::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reserved filename of the style guide inside an assets directory
pub const STYLE_FILE: &str = "style.json";

/// Prompt fragments shared by every asset of a pack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleGuide {
    /// Prepended to every prompt
    #[serde(default)]
    pub style_prompt: Option<String>,
    /// Appended to every prompt
    #[serde(default)]
    pub quality_prompt: Option<String>,
}

impl StyleGuide {
    /// Load a style guide from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load `style.json` from an assets directory, falling back to the empty
    /// guide when it is missing or malformed.
    pub fn load_or_default(assets_dir: &Path) -> Self {
        let path = assets_dir.join(STYLE_FILE);
        if !path.exists() {
            tracing::info!("No style.json found, using defaults");
            return Self::default();
        }
        match Self::load(&path) {
            Ok(style) => {
                tracing::info!(path = %path.display(), "Loaded style guide");
                style
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable style guide");
                Self::default()
            }
        }
    }

    /// Wrap a descriptor prompt with the style prefix and quality suffix
    pub fn effective_prompt(&self, prompt: &str) -> String {
        let mut full = String::new();
        if let Some(style) = &self.style_prompt {
            full.push_str(style);
            full.push_str(". ");
        }
        full.push_str(prompt);
        if let Some(quality) = &self.quality_prompt {
            full.push_str(", ");
            full.push_str(quality);
        }
        full
    }
}
