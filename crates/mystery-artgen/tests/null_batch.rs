use mystery_artgen::inspect::validate;
use mystery_artgen::pipeline::{Outcome, Pipeline, PipelineOptions};
use mystery_artgen::providers::{create_generator, create_verifier};
use mystery_artgen::{ArtConfig, AssetDescriptor, AssetType, CatalogFilter, ChromaKeyRemover};
use std::path::{Path, PathBuf};

fn temp_pack() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mystery_batch_test_{}", uuid::Uuid::new_v4()));
    let assets = dir.join("assets");
    std::fs::create_dir_all(assets.join("clues")).unwrap();
    std::fs::create_dir_all(assets.join("locations")).unwrap();
    std::fs::create_dir_all(assets.join("characters")).unwrap();
    std::fs::create_dir_all(dir.join("scratch")).unwrap();

    std::fs::write(
        assets.join("style.json"),
        r#"{"stylePrompt":"Oil painting","qualityPrompt":"high detail"}"#,
    )
    .unwrap();
    std::fs::write(
        assets.join("clues/clue-1.json"),
        r#"{"name":"Knife","prompt":"a bloody knife","width":600,"height":400,"type":"clue","status":"placeholder","notes":"kitchen"}"#,
    )
    .unwrap();
    std::fs::write(
        assets.join("locations/hall.json"),
        r#"{"name":"Hall","prompt":"a grand hall","width":320,"height":180,"type":"location"}"#,
    )
    .unwrap();
    std::fs::write(
        assets.join("characters/butler.json"),
        r#"{"name":"Butler","prompt":"a stern butler","width":300,"height":400,"type":"character"}"#,
    )
    .unwrap();
    dir
}

fn null_pipeline(scratch: &Path, force: bool) -> Pipeline {
    let config = ArtConfig::default();
    Pipeline::new(
        create_generator("null", &config).unwrap(),
        create_verifier("null", &config).unwrap(),
        Box::new(ChromaKeyRemover::from_config(&config.background)),
        PipelineOptions {
            force,
            dry_run: false,
            scratch_dir: scratch.to_path_buf(),
        },
    )
}

#[test]
fn test_null_batch_generates_every_descriptor() {
    let dir = temp_pack();
    let assets = dir.join("assets");

    let report = null_pipeline(&dir.join("scratch"), false)
        .run(&assets, &CatalogFilter::default())
        .unwrap();
    assert_eq!(report.total(), 3);
    assert_eq!(report.generated(), 3);
    assert_eq!(report.failed(), 0);

    assert!(assets.join("clues/r_clue-1.png").exists());
    assert!(assets.join("locations/r_hall.png").exists());
    assert!(assets.join("characters/r_butler.png").exists());
    assert!(validate(&assets).unwrap().passed());

    let knife = AssetDescriptor::load(&assets.join("clues/clue-1.json")).unwrap();
    assert_eq!(knife.status.as_deref(), Some("draft"));
    assert_eq!(knife.generation_model.as_deref(), Some("placeholder"));
    assert_eq!(knife.extra.get("notes").and_then(|v| v.as_str()), Some("kitchen"));

    // Scratch files never outlive a run
    assert!(std::fs::read_dir(dir.join("scratch")).unwrap().next().is_none());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = temp_pack();
    let assets = dir.join("assets");
    let pipeline = null_pipeline(&dir.join("scratch"), false);

    pipeline.run(&assets, &CatalogFilter::default()).unwrap();
    let descriptor_before = std::fs::read_to_string(assets.join("clues/clue-1.json")).unwrap();
    let image_before = std::fs::read(assets.join("clues/r_clue-1.png")).unwrap();

    let report = pipeline.run(&assets, &CatalogFilter::default()).unwrap();
    assert_eq!(report.skipped(), 3);
    assert_eq!(report.generated(), 0);
    assert_eq!(
        std::fs::read_to_string(assets.join("clues/clue-1.json")).unwrap(),
        descriptor_before
    );
    assert_eq!(std::fs::read(assets.join("clues/r_clue-1.png")).unwrap(), image_before);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_type_filter_limits_batch() {
    let dir = temp_pack();
    let assets = dir.join("assets");

    let filter = CatalogFilter {
        asset_type: Some(AssetType::Location),
        ..Default::default()
    };
    let report = null_pipeline(&dir.join("scratch"), true).run(&assets, &filter).unwrap();
    assert_eq!(report.total(), 1);
    assert!(matches!(report.outcomes[0].1, Outcome::Generated { verified: true, .. }));
    assert!(!assets.join("clues/r_clue-1.png").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_assets_directory_writes_nothing() {
    let dir = temp_pack();

    let result = null_pipeline(&dir.join("scratch"), false)
        .run(&dir.join("no-such-mystery/assets"), &CatalogFilter::default());
    assert!(result.is_err());
    assert!(!dir.join("no-such-mystery").exists());
    assert!(!dir.join("assets/clues/r_clue-1.png").exists());

    std::fs::remove_dir_all(&dir).ok();
}
