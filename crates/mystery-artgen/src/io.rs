//! Crash-safe file writes

use mystery_core::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `data` to `path` atomically.
///
/// The bytes go to a uniquely named temp file in the same directory, are
/// synced, then renamed over `path`. Readers see the old or the new content,
/// never a partial file, and a failed rename removes the temp file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
