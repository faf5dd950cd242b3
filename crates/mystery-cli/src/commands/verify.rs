//! Re-verification of existing images

use anyhow::Result;
use mystery_artgen::inspect::{verify_existing, VerifyRow};
use mystery_artgen::providers::create_verifier;
use mystery_artgen::ArtConfig;

pub fn run(mystery: &str, asset: Option<&str>) -> Result<()> {
    let config = ArtConfig::load()?;
    let verifier = create_verifier("gemini", &config)?;
    let rows = verify_existing(&config.assets_dir(mystery), asset, verifier.as_ref())?;

    if rows.is_empty() {
        println!("No generated images to verify.");
        return Ok(());
    }

    for (id, row) in &rows {
        match row {
            VerifyRow::Checked(verdict) => {
                let icon = if verdict.verified { "PASS" } else { "FAIL" };
                println!("  {} {:<30} {}", icon, id, verdict.reason);
            }
            VerifyRow::Error(e) => println!("  ERR  {:<30} {}", id, e),
        }
    }
    Ok(())
}
