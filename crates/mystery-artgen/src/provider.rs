//! Image generation provider trait, prompt hints and rate-limit retry

use mystery_core::{MysteryError, Result};
use std::fmt;
use std::time::Duration;

/// Appended to prompts whose subject will be cut out afterwards. A dark,
/// flat backdrop keeps near-white subject detail away from the keyer.
pub const TRANSPARENT_HINT: &str =
    ", isolated on a smooth solid dark gray background, high contrast, no shadows.";

/// Size and transparency hints for one generation call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub transparent: bool,
}

/// Coarse aspect-ratio bucket used as a textual prompt hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Wide,
    Standard,
    Square,
    Portrait,
    TallPortrait,
}

impl AspectRatio {
    /// Bucket `width / height`; `None` when no bucket is close enough
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let ratio = width as f64 / height as f64;
        if ratio >= 1.7 {
            Some(AspectRatio::Wide)
        } else if ratio >= 1.3 {
            Some(AspectRatio::Standard)
        } else if (0.9..=1.1).contains(&ratio) {
            Some(AspectRatio::Square)
        } else if ratio <= 0.6 {
            Some(AspectRatio::TallPortrait)
        } else if ratio <= 0.8 {
            Some(AspectRatio::Portrait)
        } else {
            None
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9 aspect ratio",
            AspectRatio::Standard => "4:3 aspect ratio",
            AspectRatio::Square => "1:1 square aspect ratio",
            AspectRatio::TallPortrait => "9:16 portrait aspect ratio",
            AspectRatio::Portrait => "3:4 portrait aspect ratio",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint())
    }
}

/// Append provider hints (transparency backdrop, aspect ratio) to a prompt
pub fn decorate_prompt(prompt: &str, options: &GenerateOptions) -> String {
    let mut out = prompt.to_string();
    if options.transparent {
        out.push_str(TRANSPARENT_HINT);
    }
    if let (Some(w), Some(h)) = (options.width, options.height) {
        if let Some(aspect) = AspectRatio::from_dimensions(w, h) {
            out.push_str(", ");
            out.push_str(aspect.hint());
        }
    }
    out
}

/// Trait implemented by each image provider (Gemini, Null)
pub trait ImageGenerator: Send {
    /// Provider name (e.g. "gemini", "null")
    fn name(&self) -> &str;

    /// Model identifier recorded on descriptors after generation
    fn model(&self) -> &str;

    /// Generate an image for an effective prompt.
    ///
    /// `Ok(None)` means the provider deliberately produced nothing and the
    /// caller should render a placeholder instead.
    fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<Option<Vec<u8>>>;
}

/// Exponential backoff for rate-limited provider calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^attempt + base * jitter`, with `attempt` counted from 0 and
    /// `jitter` in `[0, 1)`
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor) + self.base_delay.mul_f64(jitter.clamp(0.0, 1.0))
    }
}

const TRANSIENT_MARKERS: &[&str] = &[
    "429",
    "resource has been exhausted",
    "resource exhausted",
    "resource_exhausted",
    "503",
    "overloaded",
];

/// Whether an error message signals a rate limit or transient overload
pub fn is_transient(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

fn is_transient_error(err: &MysteryError) -> bool {
    match err {
        MysteryError::NoImagePayload(_) => false,
        other => is_transient(&other.to_string()),
    }
}

/// Run `op` until it succeeds, retrying only transient failures.
///
/// `op` receives the zero-based attempt number. Non-transient errors and
/// the last transient error are returned as-is.
pub fn retry_transient<T, F>(policy: &RetryPolicy, sleep: &dyn Fn(Duration), mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < policy.max_attempts && is_transient_error(&e) => {
                let delay = policy.delay_for(attempt, rand::random::<f64>());
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_secs = delay.as_secs_f64(),
                    error = %e,
                    "Rate limit hit, backing off"
                );
                sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_aspect_hint_table() {
        let cases = [
            (1920, 1080, Some("16:9 aspect ratio")),
            (1024, 1024, Some("1:1 square aspect ratio")),
            (600, 800, Some("3:4 portrait aspect ratio")),
            (800, 600, Some("4:3 aspect ratio")),
            (540, 960, Some("9:16 portrait aspect ratio")),
            (600, 400, Some("4:3 aspect ratio")),
            (1200, 1000, None),
            (850, 1000, None),
        ];
        for (w, h, expected) in cases {
            assert_eq!(
                AspectRatio::from_dimensions(w, h).map(|a| a.hint()),
                expected,
                "{}x{}",
                w,
                h
            );
        }
    }

    #[test]
    fn test_decorate_prompt_aspect_only() {
        let opts = GenerateOptions {
            width: Some(1920),
            height: Some(1080),
            transparent: false,
        };
        assert_eq!(decorate_prompt("a hall", &opts), "a hall, 16:9 aspect ratio");
    }

    #[test]
    fn test_decorate_prompt_transparent() {
        let opts = GenerateOptions {
            width: Some(1024),
            height: Some(1024),
            transparent: true,
        };
        let out = decorate_prompt("a knife", &opts);
        assert!(out.starts_with("a knife, isolated on a smooth solid dark gray background"));
        assert!(out.ends_with(", 1:1 square aspect ratio"));
    }

    #[test]
    fn test_decorate_prompt_no_hints() {
        assert_eq!(decorate_prompt("a hall", &GenerateOptions::default()), "a hall");
    }

    #[test]
    fn test_delay_for_is_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0, 0.0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3, 0.0), Duration::from_secs(8));
        assert_eq!(policy.delay_for(1, 0.5), Duration::from_millis(2500));
    }

    #[test]
    fn test_is_transient() {
        assert!(is_transient("http status: 429"));
        assert!(is_transient("Resource has been exhausted (e.g. check quota)"));
        assert!(is_transient("503 Service Unavailable"));
        assert!(is_transient("The model is overloaded"));
        assert!(!is_transient("400 Bad Request: invalid argument"));
    }

    #[test]
    fn test_retry_recovers_from_rate_limit() {
        let sleeps = RefCell::new(Vec::new());
        let sleeper = |d: Duration| sleeps.borrow_mut().push(d);
        let policy = RetryPolicy::default();

        let result = retry_transient(&policy, &sleeper, |attempt| {
            if attempt < 2 {
                Err(MysteryError::Generation("http status: 429".to_string()))
            } else {
                Ok(attempt)
            }
        });

        assert_eq!(result.unwrap(), 2);
        let sleeps = sleeps.borrow();
        assert_eq!(sleeps.len(), 2);
        assert!(sleeps[0] >= Duration::from_secs(1) && sleeps[0] < Duration::from_secs(2));
        assert!(sleeps[1] >= Duration::from_secs(2) && sleeps[1] < Duration::from_secs(3));
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let calls = RefCell::new(0);
        let policy = RetryPolicy::default();
        let result: Result<()> = retry_transient(&policy, &|_: Duration| {}, |_| {
            *calls.borrow_mut() += 1;
            Err(MysteryError::Generation("503 overloaded".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(*calls.borrow(), 5);
    }

    #[test]
    fn test_retry_does_not_retry_fatal_errors() {
        let calls = RefCell::new(0);
        let policy = RetryPolicy::default();
        let result: Result<()> = retry_transient(&policy, &|_: Duration| {}, |_| {
            *calls.borrow_mut() += 1;
            Err(MysteryError::Generation("400 invalid api key".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_missing_payload_is_never_retried() {
        let calls = RefCell::new(0);
        let policy = RetryPolicy::default();
        let result: Result<()> = retry_transient(&policy, &|_: Duration| {}, |_| {
            *calls.borrow_mut() += 1;
            Err(MysteryError::NoImagePayload("429 in text".to_string()))
        });
        assert!(matches!(result, Err(MysteryError::NoImagePayload(_))));
        assert_eq!(*calls.borrow(), 1);
    }
}
