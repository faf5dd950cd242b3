//! Asset catalog scanner
//!
//! Walks an assets directory and yields descriptor files lazily, applying the
//! user's asset/type/status filters on the way.

use crate::descriptor::AssetType;
use crate::style::STYLE_FILE;
use mystery_core::{AssetId, MysteryError, Result};
use serde::Deserialize;
use std::fs::ReadDir;
use std::path::{Path, PathBuf};

/// Reserved filename of a pack manifest
pub const MANIFEST_FILE: &str = "manifest.json";

/// Optional filters applied while scanning
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Exact descriptor stem
    pub asset: Option<String>,
    /// Declared `type`
    pub asset_type: Option<AssetType>,
    /// Declared `status`
    pub status: Option<String>,
}

impl CatalogFilter {
    fn needs_peek(&self) -> bool {
        self.asset_type.is_some() || self.status.is_some()
    }
}

/// A descriptor file found by the scanner
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: AssetId,
    pub path: PathBuf,
    /// Where the generated image for this descriptor lives
    pub output_path: PathBuf,
}

/// Entry point for scanning an assets directory
pub struct Catalog;

impl Catalog {
    /// Start a scan of `root`. Fails with `NotFound` if `root` is not a
    /// directory; nothing is read until the iterator is advanced.
    pub fn open(root: &Path, filter: CatalogFilter) -> Result<CatalogIter> {
        if !root.is_dir() {
            return Err(MysteryError::NotFound(format!(
                "Assets directory not found: {}",
                root.display()
            )));
        }
        let top = std::fs::read_dir(root)?;
        Ok(CatalogIter {
            stack: vec![top],
            filter,
        })
    }
}

/// Lazy depth-first walk over descriptor files.
///
/// Order follows the filesystem and carries no meaning.
pub struct CatalogIter {
    stack: Vec<ReadDir>,
    filter: CatalogFilter,
}

impl Iterator for CatalogIter {
    type Item = CatalogEntry;

    fn next(&mut self) -> Option<CatalogEntry> {
        loop {
            let dir = self.stack.last_mut()?;
            let entry = match dir.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            let path = entry.path();
            // Symlinked directories are not followed, so link cycles cannot loop
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                match std::fs::read_dir(&path) {
                    Ok(sub) => self.stack.push(sub),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable directory")
                    }
                }
                continue;
            }

            if let Some(found) = self.accept(path) {
                return Some(found);
            }
        }
    }
}

impl CatalogIter {
    fn accept(&self, path: PathBuf) -> Option<CatalogEntry> {
        if !is_descriptor_file(&path) {
            return None;
        }
        let id = AssetId::from_path(&path)?;
        if let Some(wanted) = &self.filter.asset {
            if id.as_str() != wanted {
                return None;
            }
        }
        if self.filter.needs_peek() && !self.peek_matches(&path) {
            return None;
        }
        let output_path = path.with_file_name(id.output_file_name());
        Some(CatalogEntry {
            id,
            path,
            output_path,
        })
    }

    /// Files that cannot be read or parsed pass the filter, so the consumer
    /// reports them instead of them silently vanishing.
    fn peek_matches(&self, path: &Path) -> bool {
        let peek = match std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<DescriptorPeek>(&s).ok())
        {
            Some(peek) => peek,
            None => return true,
        };
        if let Some(wanted) = &self.filter.asset_type {
            if peek.asset_type.as_ref() != Some(wanted) {
                return false;
            }
        }
        if let Some(wanted) = &self.filter.status {
            if peek.status.as_ref() != Some(wanted) {
                return false;
            }
        }
        true
    }
}

#[derive(Deserialize)]
struct DescriptorPeek {
    #[serde(default, rename = "type")]
    asset_type: Option<AssetType>,
    #[serde(default)]
    status: Option<String>,
}

fn is_descriptor_file(path: &Path) -> bool {
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    is_json && name != STYLE_FILE && name != MANIFEST_FILE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_assets() -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("mystery_catalog_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("clues")).unwrap();
        std::fs::create_dir_all(dir.join("locations/ground")).unwrap();
        std::fs::write(
            dir.join("clues/knife.json"),
            r#"{"name":"Knife","prompt":"a knife","width":10,"height":10,"type":"clue","status":"placeholder"}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("locations/ground/hall.json"),
            r#"{"name":"Hall","prompt":"a hall","width":10,"height":10,"type":"location","status":"draft"}"#,
        )
        .unwrap();
        std::fs::write(dir.join("clues/broken.json"), "{oops").unwrap();
        std::fs::write(dir.join("style.json"), r#"{"stylePrompt":"noir"}"#).unwrap();
        std::fs::write(dir.join("manifest.json"), "{}").unwrap();
        std::fs::write(dir.join("clues/r_knife.png"), b"png").unwrap();
        dir
    }

    fn ids(iter: CatalogIter) -> Vec<String> {
        let mut ids: Vec<String> = iter.map(|e| e.id.as_str().to_string()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_scan_skips_reserved_and_non_json() {
        let dir = temp_assets();
        let found = ids(Catalog::open(&dir, CatalogFilter::default()).unwrap());
        assert_eq!(found, vec!["broken", "hall", "knife"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_ancestor_does_not_loop() {
        let dir = temp_assets();
        std::os::unix::fs::symlink(&dir, dir.join("clues/back")).unwrap();
        let found = ids(Catalog::open(&dir, CatalogFilter::default()).unwrap());
        assert_eq!(found, vec!["broken", "hall", "knife"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_filter_by_asset_id() {
        let dir = temp_assets();
        let filter = CatalogFilter {
            asset: Some("hall".to_string()),
            ..Default::default()
        };
        let entries: Vec<CatalogEntry> = Catalog::open(&dir, filter).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].output_path,
            dir.join("locations/ground/r_hall.png")
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_filter_by_type_yields_unparseable() {
        let dir = temp_assets();
        let filter = CatalogFilter {
            asset_type: Some(AssetType::Clue),
            ..Default::default()
        };
        let found = ids(Catalog::open(&dir, filter).unwrap());
        assert_eq!(found, vec!["broken", "knife"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_filter_by_status() {
        let dir = temp_assets();
        let filter = CatalogFilter {
            status: Some("draft".to_string()),
            ..Default::default()
        };
        let found = ids(Catalog::open(&dir, filter).unwrap());
        assert_eq!(found, vec!["broken", "hall"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = std::env::temp_dir().join(format!("mystery_missing_{}", uuid::Uuid::new_v4()));
        let result = Catalog::open(&dir, CatalogFilter::default());
        assert!(matches!(result, Err(MysteryError::NotFound(_))));
    }
}
