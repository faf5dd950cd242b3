//! Batch generation command

use anyhow::Result;
use mystery_artgen::pipeline::{Outcome, Pipeline, PipelineOptions};
use mystery_artgen::providers::{create_generator, create_verifier};
use mystery_artgen::{ArtConfig, AssetType, CatalogFilter, ChromaKeyRemover};

pub struct GenerateArgs {
    pub mystery: String,
    pub asset_type: Option<String>,
    pub asset: Option<String>,
    pub force: bool,
    pub dry_run: bool,
    pub provider: String,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let config = ArtConfig::load()?;
    let assets_dir = config.assets_dir(&args.mystery);
    tracing::debug!(assets = %assets_dir.display(), provider = %args.provider, "Resolved batch");

    // Credentials are only needed when something is actually sent
    let provider = if args.dry_run { "null" } else { args.provider.as_str() };
    let generator = create_generator(provider, &config)?;
    let verifier = create_verifier(provider, &config)?;
    let remover = ChromaKeyRemover::from_config(&config.background);

    println!(
        "Generating artwork for '{}' via {} ({})",
        args.mystery,
        generator.name(),
        generator.model()
    );

    let pipeline = Pipeline::new(
        generator,
        verifier,
        Box::new(remover),
        PipelineOptions {
            force: args.force,
            dry_run: args.dry_run,
            scratch_dir: config.scratch_dir(),
        },
    );

    let filter = CatalogFilter {
        asset: args.asset,
        asset_type: args.asset_type.map(AssetType::from),
        status: None,
    };
    let report = pipeline.run(&assets_dir, &filter)?;

    for (id, outcome) in &report.outcomes {
        match outcome {
            Outcome::DryRun { prompt } => println!("  [dry-run] {}\n    Prompt: {}", id, prompt),
            Outcome::Skipped => println!("  [skip]    {}", id),
            Outcome::Generated {
                verified,
                attempts,
                output_path,
                content_hash,
            } => {
                let tag = if *verified { "ok" } else { "forced" };
                println!(
                    "  [{}] {} -> {} ({} attempt(s), {})",
                    tag,
                    id,
                    output_path.display(),
                    attempts,
                    content_hash
                );
            }
        }
    }
    for (id, error) in &report.failures {
        println!("  [failed]  {}: {}", id, error);
    }

    println!(
        "\n{} asset(s): {} generated ({} unverified), {} skipped, {} dry-run, {} failed",
        report.total(),
        report.generated(),
        report.force_accepted(),
        report.skipped(),
        report.dry_runs(),
        report.failed()
    );
    Ok(())
}
