//! Asset identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identity of a visual asset.
///
/// An asset is identified by the filename stem of its descriptor, so
/// `assets/clues/knife.json` has the id `knife`. The id also determines the
/// generated output name (`r_knife.png`).
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create an id from a raw string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the id from a descriptor path (its file stem)
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(Self::new)
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The deterministic filename of the generated image for this asset
    pub fn output_file_name(&self) -> String {
        format!("r_{}.png", self.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}
