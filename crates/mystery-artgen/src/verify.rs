//! Vision verification of generated images
//!
//! A judge model looks at an image and the prompt it was meant to depict and
//! answers with `{ "verified": bool, "reason": string }`.

use crate::config::ArtConfig;
use crate::providers::gemini::{extract_text, GeminiClient};
use base64::Engine;
use mystery_core::{MysteryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The judge's answer for one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub verified: bool,
    #[serde(default)]
    pub reason: String,
}

impl Verdict {
    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            verified: true,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            reason: reason.into(),
        }
    }
}

/// Trait implemented by each verification oracle
pub trait Verifier: Send {
    /// Judge whether the image at `image_path` depicts `prompt`.
    ///
    /// Only I/O and transport failures are errors; a judge answer that cannot
    /// be understood is a rejection.
    fn verify(&self, image_path: &Path, prompt: &str) -> Result<Verdict>;
}

/// Interpret a judge's raw text answer.
///
/// Markdown code fences around the JSON are stripped before parsing.
/// Anything unparseable becomes a rejection carrying the raw text.
pub fn parse_verdict(text: &str) -> Verdict {
    let cleaned = text.replace("```json", "").replace("```", "");
    match serde_json::from_str::<Verdict>(cleaned.trim()) {
        Ok(verdict) => verdict,
        Err(_) => {
            tracing::warn!("Failed to parse verification JSON, treating as rejection");
            Verdict::reject(text)
        }
    }
}

/// Instruction sent alongside the image
pub fn verification_instruction(prompt: &str) -> String {
    format!(
        "You are an art director verifying asset generation.\n\
         Does this image match the following description?\n\
         Description: \"{}\"\n\n\
         Respond with JSON: {{ \"verified\": boolean, \"reason\": \"string\" }}",
        prompt
    )
}

/// Gemini vision judge
pub struct GeminiVerifier {
    client: GeminiClient,
    model: String,
}

impl GeminiVerifier {
    pub fn from_config(config: &ArtConfig) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::from_config(config)?,
            model: config.gemini.verification_model.clone(),
        })
    }
}

impl Verifier for GeminiVerifier {
    fn verify(&self, image_path: &Path, prompt: &str) -> Result<Verdict> {
        if !image_path.exists() {
            return Err(MysteryError::NotFound(format!(
                "Image not found at {}",
                image_path.display()
            )));
        }
        let bytes = std::fs::read(image_path)?;
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": "image/png",
                            "data": base64::engine::general_purpose::STANDARD.encode(&bytes)
                        }
                    },
                    { "text": verification_instruction(prompt) }
                ]
            }]
        });

        let response = self
            .client
            .generate_content(&self.model, &body, MysteryError::Verification)?;
        Ok(parse_verdict(&extract_text(&response)))
    }
}

/// Approves every image; used with the null provider
pub struct NullVerifier;

impl Verifier for NullVerifier {
    fn verify(&self, _image_path: &Path, _prompt: &str) -> Result<Verdict> {
        Ok(Verdict::approve("verification skipped"))
    }
}
