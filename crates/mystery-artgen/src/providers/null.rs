//! Null provider for offline runs
//!
//! Makes no network calls and returns no image, so the output stage renders
//! a captioned placeholder instead.

use crate::provider::{GenerateOptions, ImageGenerator};
use mystery_core::Result;

/// A provider that never produces image bytes
#[derive(Default)]
pub struct NullGenerator;

impl NullGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ImageGenerator for NullGenerator {
    fn name(&self) -> &str {
        "null"
    }

    fn model(&self) -> &str {
        "placeholder"
    }

    fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<Option<Vec<u8>>> {
        tracing::info!(prompt, "Null generation, placeholder will be rendered");
        Ok(None)
    }
}
