//! Descriptor listing

use anyhow::Result;
use mystery_artgen::inspect::scan;
use mystery_artgen::ArtConfig;

pub fn run(mystery: &str, status: Option<&str>) -> Result<()> {
    let config = ArtConfig::load()?;
    let rows = scan(&config.assets_dir(mystery), status)?;

    if rows.is_empty() {
        println!("No asset descriptors found.");
        return Ok(());
    }

    println!("{} asset(s):\n", rows.len());
    for row in &rows {
        println!(
            "  {:<40} {:<10} {}",
            row.relative_path.display(),
            row.asset_type,
            if row.status.is_empty() { "-" } else { row.status.as_str() }
        );
    }
    Ok(())
}
