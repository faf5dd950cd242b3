//! Mystery Core - Foundational types for the mystery asset tooling
//!
//! This crate provides the types that the art pipeline and CLI share:
//! - `AssetId` - Identity of a visual asset (its descriptor filename stem)
//! - `ContentHash` - SHA-256 fingerprint of written images
//! - Error types and Result alias

mod error;
mod hash;
mod id;

pub use error::{MysteryError, Result};
pub use hash::ContentHash;
pub use id::AssetId;
