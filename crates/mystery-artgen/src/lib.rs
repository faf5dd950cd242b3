//! Mystery Artgen - Generate-verify-retry art pipeline
//!
//! Turns the JSON asset descriptors of a mystery content pack into finished
//! PNGs: an image model draws each asset, a vision model judges it against the
//! prompt, rejected art is regenerated up to a fixed budget, clues and
//! characters get their backdrop keyed out, and the descriptor is marked as
//! generated.

pub mod background;
mod caption;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod inspect;
mod io;
pub mod pipeline;
pub mod provider;
pub mod providers;
pub mod render;
pub mod scratch;
pub mod style;
pub mod verify;

pub use background::{BackgroundRemover, ChromaKeyRemover};
pub use catalog::{Catalog, CatalogEntry, CatalogFilter};
pub use config::ArtConfig;
pub use descriptor::{AssetDescriptor, AssetType};
pub use pipeline::{BatchReport, Outcome, Pipeline, PipelineOptions, MAX_ATTEMPTS};
pub use provider::{GenerateOptions, ImageGenerator};
pub use style::StyleGuide;
pub use verify::{Verdict, Verifier};
