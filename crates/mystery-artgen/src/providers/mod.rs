//! Provider registry
//!
//! Maps provider names to generator/verifier pairs.

pub mod gemini;
pub mod null;

use crate::config::ArtConfig;
use crate::provider::ImageGenerator;
use crate::verify::{GeminiVerifier, NullVerifier, Verifier};
use mystery_core::{MysteryError, Result};

/// Create an image generator by name with configuration
pub fn create_generator(name: &str, config: &ArtConfig) -> Result<Box<dyn ImageGenerator>> {
    match name {
        "null" | "dummy" => Ok(Box::new(null::NullGenerator::new())),
        "gemini" => Ok(Box::new(gemini::GeminiGenerator::from_config(config)?)),
        _ => Err(MysteryError::Generation(format!(
            "Unknown provider '{}'. Available: {}",
            name,
            available_providers().join(", ")
        ))),
    }
}

/// Create the verifier that pairs with a provider.
///
/// Offline providers get a verifier that approves everything so a null run
/// never needs credentials.
pub fn create_verifier(name: &str, config: &ArtConfig) -> Result<Box<dyn Verifier>> {
    match name {
        "null" | "dummy" => Ok(Box::new(NullVerifier)),
        "gemini" => Ok(Box::new(GeminiVerifier::from_config(config)?)),
        _ => Err(MysteryError::Verification(format!(
            "Unknown provider '{}'. Available: {}",
            name,
            available_providers().join(", ")
        ))),
    }
}

/// List all available provider names
pub fn available_providers() -> Vec<&'static str> {
    vec!["gemini", "null"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_null_pair() {
        let config = ArtConfig::default();
        let generator = create_generator("null", &config).unwrap();
        assert_eq!(generator.name(), "null");
        assert!(create_verifier("dummy", &config).is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let config = ArtConfig::default();
        let err = create_generator("midjourney", &config).err().unwrap();
        assert!(err.to_string().contains("gemini, null"));
    }

    #[test]
    fn test_gemini_requires_key() {
        let config = ArtConfig::default();
        assert!(create_generator("gemini", &config).is_err());
        assert!(create_verifier("gemini", &config).is_err());
    }
}
