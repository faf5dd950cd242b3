//! Per-attempt scratch images
//!
//! Each generation attempt is written to a uniquely named temp file so the
//! verifier can read it. The file is removed when the guard drops, whatever
//! the attempt's outcome.

use mystery_core::{AssetId, Result};
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;

/// A temp file that deletes itself on drop
#[derive(Debug)]
pub struct ScratchFile {
    path: Option<TempPath>,
}

impl ScratchFile {
    /// Write `bytes` to a fresh `dir/temp_<id>_<random>.png`
    pub fn create(dir: &Path, id: &AssetId, bytes: &[u8]) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix(&format!("temp_{}_", id))
            .suffix(".png")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let shown = path.to_path_buf();
            if let Err(e) = path.close() {
                tracing::debug!(path = %shown.display(), error = %e, "Failed to remove scratch file");
            }
        }
    }
}
