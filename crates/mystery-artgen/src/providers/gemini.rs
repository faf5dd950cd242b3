//! Gemini provider (Google Generative Language API)
//!
//! Image generation goes through `models/{model}:generateContent` with image
//! output enabled. The same client also serves the vision verifier.

use crate::config::ArtConfig;
use crate::provider::{decorate_prompt, retry_transient, GenerateOptions, ImageGenerator, RetryPolicy};
use base64::Engine;
use mystery_core::{MysteryError, Result};
use std::time::Duration;

/// Inline base64 images easily exceed ureq's default body limit
const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

/// Thin blocking client for `generateContent`
pub struct GeminiClient {
    api_key: String,
    api_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn from_config(config: &ArtConfig) -> Result<Self> {
        Ok(Self {
            api_key: config.require_api_key()?.to_string(),
            api_url: config.gemini.api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.gemini.timeout_secs),
        })
    }

    /// POST a request body to a model and return the JSON response.
    ///
    /// HTTP failures are reported through `err` with the status code and
    /// response body in the message, so rate-limit markers stay visible.
    pub fn generate_content(
        &self,
        model: &str,
        body: &serde_json::Value,
        err: fn(String) -> MysteryError,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/models/{}:generateContent", self.api_url, model);
        let agent = self.build_agent();
        let mut response = agent
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e| err(format!("Gemini request failed: {}", e)))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let detail = response.body_mut().read_to_string().unwrap_or_default();
            return Err(err(format!("Gemini API error {}: {}", status, detail.trim())));
        }

        response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_json()
            .map_err(|e| err(format!("Failed to parse Gemini response: {}", e)))
    }

    fn build_agent(&self) -> ureq::Agent {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .http_status_as_error(false)
            .build();
        config.into()
    }
}

/// Gemini image generator with rate-limit backoff
pub struct GeminiGenerator {
    client: GeminiClient,
    model: String,
    retry: RetryPolicy,
}

impl GeminiGenerator {
    /// Create a new GeminiGenerator from config
    pub fn from_config(config: &ArtConfig) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::from_config(config)?,
            model: config.gemini.generation_model.clone(),
            retry: RetryPolicy::default(),
        })
    }
}

impl ImageGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<Option<Vec<u8>>> {
        let prompt = decorate_prompt(prompt, options);
        let body = generation_request(&prompt);
        let bytes = retry_transient(&self.retry, &std::thread::sleep, |attempt| {
            tracing::info!(model = %self.model, attempt = attempt + 1, "Generating with Gemini");
            let response = self
                .client
                .generate_content(&self.model, &body, MysteryError::Generation)?;
            extract_inline_image(&response)
        })?;
        Ok(Some(bytes))
    }
}

/// Request body asking for an image answer to a text prompt
pub fn generation_request(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"]
        }
    })
}

/// Decode the first inline image of the first candidate.
///
/// A response without one is `NoImagePayload`: the call succeeded but broke
/// its contract, so retrying will not help.
pub fn extract_inline_image(response: &serde_json::Value) -> Result<Vec<u8>> {
    let data = first_candidate_parts(response)
        .iter()
        .filter_map(|part| part.get("inlineData").or_else(|| part.get("inline_data")))
        .find_map(|inline| inline.get("data").and_then(|d| d.as_str()))
        .ok_or_else(|| {
            MysteryError::NoImagePayload("No image data found in Gemini response".to_string())
        })?;

    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| MysteryError::NoImagePayload(format!("Invalid base64 image data: {}", e)))
}

/// Concatenate the text parts of the first candidate
pub fn extract_text(response: &serde_json::Value) -> String {
    first_candidate_parts(response)
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("")
}

fn first_candidate_parts(response: &serde_json::Value) -> &[serde_json::Value] {
    response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| parts.as_slice())
        .unwrap_or(&[])
}
