//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `GOOGLE_API_KEY`, `GEMINI_MODEL_*`, ...
//! 2. Project-local: `.mystery/config.toml`
//! 3. Global: `~/.mystery/config.toml`

use mystery_core::{MysteryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_VERIFICATION_MODEL: &str = "gemini-3-pro-preview";

/// Gemini API settings shared by the generator and the verifier
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub generation_model: String,
    pub verification_model: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            verification_model: DEFAULT_VERIFICATION_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub mysteries: PathBuf,
    /// Where per-attempt scratch images go (defaults to the OS temp dir)
    pub scratch: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            mysteries: PathBuf::from("mysteries"),
            scratch: None,
        }
    }
}

/// Chroma-key background removal tuning
#[derive(Debug, Clone, Copy)]
pub struct BackgroundConfig {
    pub tolerance: u8,
    pub feather: u8,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            tolerance: 48,
            feather: 16,
        }
    }
}

/// `[gemini]` as written in a config file; absent keys leave lower layers alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiSection {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub generation_model: Option<String>,
    pub verification_model: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsSection {
    pub mysteries: Option<PathBuf>,
    pub scratch: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackgroundSection {
    pub tolerance: Option<u8>,
    pub feather: Option<u8>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtConfigFile {
    #[serde(default)]
    pub gemini: Option<GeminiSection>,
    #[serde(default)]
    pub paths: Option<PathsSection>,
    #[serde(default)]
    pub background: Option<BackgroundSection>,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default)]
pub struct ArtConfig {
    pub gemini: GeminiConfig,
    pub paths: PathsConfig,
    pub background: BackgroundConfig,
}

impl ArtConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = ArtConfig::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".mystery/config.toml");
        if local_path.exists() {
            config.merge(Self::load_file(&local_path)?);
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = ArtConfig::default();
        config.merge(Self::load_file(path)?);
        config.apply_env_overrides();
        Ok(config)
    }

    /// The API key, or an error naming how to provide one
    pub fn require_api_key(&self) -> Result<&str> {
        self.gemini
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                MysteryError::Generation(
                    "GOOGLE_API_KEY environment variable is not set (or add api_key under [gemini] in .mystery/config.toml)"
                        .to_string(),
                )
            })
    }

    /// Directory holding the assets of one mystery pack
    pub fn assets_dir(&self, mystery_id: &str) -> PathBuf {
        self.paths.mysteries.join(mystery_id).join("assets")
    }

    /// Directory for per-attempt scratch images
    pub fn scratch_dir(&self) -> PathBuf {
        self.paths
            .scratch
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".mystery").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ArtConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            MysteryError::ConfigParse(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Apply one file layer. Only keys present in the file override.
    fn merge(&mut self, overlay: ArtConfigFile) {
        if let Some(gemini) = overlay.gemini {
            if let Some(key) = gemini.api_key {
                self.gemini.api_key = Some(key);
            }
            if let Some(url) = gemini.api_url {
                self.gemini.api_url = url;
            }
            if let Some(model) = gemini.generation_model {
                self.gemini.generation_model = model;
            }
            if let Some(model) = gemini.verification_model {
                self.gemini.verification_model = model;
            }
            if let Some(secs) = gemini.timeout_secs {
                self.gemini.timeout_secs = secs;
            }
        }
        if let Some(paths) = overlay.paths {
            if let Some(mysteries) = paths.mysteries {
                self.paths.mysteries = mysteries;
            }
            if paths.scratch.is_some() {
                self.paths.scratch = paths.scratch;
            }
        }
        if let Some(background) = overlay.background {
            if let Some(tolerance) = background.tolerance {
                self.background.tolerance = tolerance;
            }
            if let Some(feather) = background.feather {
                self.background.feather = feather;
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("GEMINI_API_URL") {
            self.gemini.api_url = url;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL_GENERATION") {
            self.gemini.generation_model = model;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL_VERIFICATION") {
            self.gemini.verification_model = model;
        }
        if let Ok(path) = std::env::var("ART_GENERATOR_MYSTERIES_PATH") {
            self.paths.mysteries = PathBuf::from(path);
        }
    }
}
