//! Output validation

use anyhow::Result;
use mystery_artgen::inspect::{validate, Check};
use mystery_artgen::ArtConfig;

pub fn run(mystery: &str) -> Result<()> {
    let config = ArtConfig::load()?;
    let report = validate(&config.assets_dir(mystery))?;

    for row in &report.rows {
        println!("  {} {:<30} {}", row.check, row.id, row.detail);
    }
    println!(
        "\n{} passed, {} failed, {} skipped",
        report.count(Check::Pass),
        report.count(Check::Fail),
        report.count(Check::Skip)
    );

    if !report.passed() {
        anyhow::bail!("{} asset(s) failed validation", report.count(Check::Fail));
    }
    Ok(())
}
