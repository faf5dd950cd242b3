//! Read-only inspection of an assets tree: listing, validation and
//! re-verification of already generated images.

use crate::catalog::{Catalog, CatalogFilter};
use crate::descriptor::{AssetDescriptor, STATUS_PLACEHOLDER};
use crate::render::image_dimensions;
use crate::verify::{Verdict, Verifier};
use mystery_core::{AssetId, Result};
use std::path::{Path, PathBuf};

/// One line of a `scan` listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRow {
    /// Descriptor path relative to the assets directory
    pub relative_path: PathBuf,
    pub asset_type: String,
    pub status: String,
}

/// List descriptors, optionally only those with the given status
pub fn scan(assets_dir: &Path, status: Option<&str>) -> Result<Vec<ScanRow>> {
    let filter = CatalogFilter {
        status: status.map(str::to_string),
        ..Default::default()
    };

    let mut rows = Vec::new();
    for entry in Catalog::open(assets_dir, filter)? {
        let descriptor = match AssetDescriptor::load(&entry.path) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "Skipping unreadable descriptor");
                continue;
            }
        };
        // Unparseable files pass the status peek, so filter again here
        if let Some(wanted) = status {
            if descriptor.status_str() != wanted {
                continue;
            }
        }
        rows.push(ScanRow {
            relative_path: relative(assets_dir, &entry.path),
            asset_type: descriptor
                .asset_type
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            status: descriptor.status_str().to_string(),
        });
    }
    rows.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(rows)
}

/// Result of checking one descriptor against its output image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Pass,
    Fail,
    Skip,
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Check::Pass => write!(f, "PASS"),
            Check::Fail => write!(f, "FAIL"),
            Check::Skip => write!(f, "SKIP"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationRow {
    pub id: AssetId,
    pub check: Check,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub rows: Vec<ValidationRow>,
}

impl ValidationReport {
    /// False iff any descriptor failed
    pub fn passed(&self) -> bool {
        !self.rows.iter().any(|r| r.check == Check::Fail)
    }

    pub fn count(&self, check: Check) -> usize {
        self.rows.iter().filter(|r| r.check == check).count()
    }
}

/// Check that every descriptor's output exists with the declared size.
///
/// Placeholder descriptors without output are skipped rather than failed.
pub fn validate(assets_dir: &Path) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    for entry in Catalog::open(assets_dir, CatalogFilter::default())? {
        let (check, detail) = match AssetDescriptor::load(&entry.path) {
            Err(e) => (Check::Fail, e.to_string()),
            Ok(descriptor) if !entry.output_path.exists() => {
                if descriptor.status_str() == STATUS_PLACEHOLDER {
                    (Check::Skip, "placeholder without output".to_string())
                } else {
                    (Check::Fail, format!("missing {}", entry.id.output_file_name()))
                }
            }
            Ok(descriptor) => match image_dimensions(&entry.output_path) {
                Err(e) => (Check::Fail, e.to_string()),
                Ok((w, h)) if (w, h) == (descriptor.width, descriptor.height) => {
                    (Check::Pass, format!("{}x{}", w, h))
                }
                Ok((w, h)) => (
                    Check::Fail,
                    format!(
                        "expected {}x{}, found {}x{}",
                        descriptor.width, descriptor.height, w, h
                    ),
                ),
            },
        };
        report.rows.push(ValidationRow {
            id: entry.id,
            check,
            detail,
        });
    }
    report.rows.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    Ok(report)
}

/// Outcome of re-verifying one existing image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyRow {
    Checked(Verdict),
    Error(String),
}

/// Run the verifier against every existing output, optionally for one asset
pub fn verify_existing(
    assets_dir: &Path,
    asset: Option<&str>,
    verifier: &dyn Verifier,
) -> Result<Vec<(AssetId, VerifyRow)>> {
    let filter = CatalogFilter {
        asset: asset.map(str::to_string),
        ..Default::default()
    };

    let mut rows = Vec::new();
    for entry in Catalog::open(assets_dir, filter)? {
        if !entry.output_path.exists() {
            continue;
        }
        let row = match AssetDescriptor::load(&entry.path)
            .and_then(|d| verifier.verify(&entry.output_path, &d.prompt))
        {
            Ok(verdict) => {
                tracing::info!(asset = %entry.id, verified = verdict.verified, "Checked");
                VerifyRow::Checked(verdict)
            }
            Err(e) => {
                tracing::error!(asset = %entry.id, error = %e, "Verification error");
                VerifyRow::Error(e.to_string())
            }
        };
        rows.push((entry.id, row));
    }
    Ok(rows)
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::encode_output;
    use mystery_core::MysteryError;
    use std::sync::Mutex;

    fn temp_assets() -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("mystery_inspect_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("clues")).unwrap();
        std::fs::create_dir_all(dir.join("locations")).unwrap();
        dir
    }

    fn descriptor(dir: &Path, rel: &str, kind: &str, status: &str, w: u32, h: u32) {
        let json = format!(
            r#"{{"name":"n","prompt":"p {}","width":{},"height":{},"type":"{}","status":"{}"}}"#,
            rel, w, h, kind, status
        );
        std::fs::write(dir.join(rel), json).unwrap();
    }

    fn output(dir: &Path, rel: &str, w: u32, h: u32) {
        std::fs::write(dir.join(rel), encode_output(None, w, h, "x").unwrap()).unwrap();
    }

    #[test]
    fn test_scan_lists_and_filters_by_status() {
        let dir = temp_assets();
        descriptor(&dir, "clues/knife.json", "clue", "draft", 64, 64);
        descriptor(&dir, "locations/hall.json", "location", "placeholder", 64, 64);
        std::fs::write(dir.join("clues/bad.json"), "nope").unwrap();
        std::fs::write(dir.join("style.json"), "{}").unwrap();

        let all = scan(&dir, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].relative_path, PathBuf::from("clues/knife.json"));
        assert_eq!(all[0].asset_type, "clue");

        let drafts = scan(&dir, Some("placeholder")).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].relative_path, PathBuf::from("locations/hall.json"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_validate_pass_fail_skip() {
        let dir = temp_assets();
        descriptor(&dir, "clues/good.json", "clue", "draft", 40, 30);
        output(&dir, "clues/r_good.png", 40, 30);
        descriptor(&dir, "clues/wrong.json", "clue", "draft", 40, 30);
        output(&dir, "clues/r_wrong.png", 30, 40);
        descriptor(&dir, "clues/missing.json", "clue", "draft", 40, 30);
        descriptor(&dir, "locations/todo.json", "location", "placeholder", 40, 30);

        let report = validate(&dir).unwrap();
        let check = |id: &str| report.rows.iter().find(|r| r.id.as_str() == id).unwrap().check;
        assert_eq!(check("good"), Check::Pass);
        assert_eq!(check("wrong"), Check::Fail);
        assert_eq!(check("missing"), Check::Fail);
        assert_eq!(check("todo"), Check::Skip);
        assert_eq!(report.count(Check::Fail), 2);
        assert!(!report.passed());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_validate_all_good_passes() {
        let dir = temp_assets();
        descriptor(&dir, "clues/good.json", "clue", "draft", 16, 16);
        output(&dir, "clues/r_good.png", 16, 16);

        assert!(validate(&dir).unwrap().passed());
        assert!(validate(&dir.join("absent")).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    struct RecordingVerifier {
        prompts: Mutex<Vec<String>>,
    }

    impl Verifier for RecordingVerifier {
        fn verify(&self, image_path: &Path, prompt: &str) -> Result<Verdict> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if prompt.contains("hall") {
                return Err(MysteryError::Verification(format!(
                    "timeout on {}",
                    image_path.display()
                )));
            }
            Ok(Verdict::approve("fine"))
        }
    }

    #[test]
    fn test_verify_existing_skips_missing_outputs() {
        let dir = temp_assets();
        descriptor(&dir, "clues/knife.json", "clue", "draft", 16, 16);
        output(&dir, "clues/r_knife.png", 16, 16);
        descriptor(&dir, "clues/rope.json", "clue", "placeholder", 16, 16);
        descriptor(&dir, "locations/hall.json", "location", "draft", 16, 16);
        output(&dir, "locations/r_hall.png", 16, 16);

        let verifier = RecordingVerifier {
            prompts: Mutex::new(Vec::new()),
        };
        let mut rows = verify_existing(&dir, None, &verifier).unwrap();
        rows.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));

        assert_eq!(rows.len(), 2);
        assert!(matches!(rows[0].1, VerifyRow::Error(_)));
        assert_eq!(rows[1].1, VerifyRow::Checked(Verdict::approve("fine")));

        let only = verify_existing(&dir, Some("knife"), &verifier).unwrap();
        assert_eq!(only.len(), 1);
        assert!(verifier
            .prompts
            .lock()
            .unwrap()
            .contains(&"p clues/knife.json".to_string()));

        std::fs::remove_dir_all(&dir).ok();
    }
}
