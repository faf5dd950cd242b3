//! Generate → verify → retry → postprocess → persist
//!
//! Each descriptor runs through a small state machine. `transition` is the
//! pure core; `Pipeline::process` executes the actions it asks for and feeds
//! the results back as events.

use crate::background::BackgroundRemover;
use crate::catalog::{Catalog, CatalogEntry, CatalogFilter};
use crate::descriptor::AssetDescriptor;
use crate::io::atomic_write;
use crate::provider::{GenerateOptions, ImageGenerator};
use crate::render::encode_output;
use crate::scratch::ScratchFile;
use crate::style::StyleGuide;
use crate::verify::Verifier;
use chrono::{DateTime, Utc};
use mystery_core::{AssetId, ContentHash, MysteryError, Result};
use std::path::{Path, PathBuf};

/// Generation attempts per descriptor before the last image is force-accepted
pub const MAX_ATTEMPTS: u32 = 3;

/// Where a descriptor is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Pending,
    Generating { attempt: u32 },
    Verifying { attempt: u32 },
    Accepted { attempt: u32 },
    ForceAccepted { attempt: u32 },
    Postprocessing,
    Persisting,
    Persisted,
    Aborted,
}

/// What happened while executing the last action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    Generated,
    /// Generation or verification threw; the attempt produced nothing usable
    AttemptFailed,
    Verdict(bool),
    Retained,
    Postprocessed,
    Written,
}

/// What the driver must do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate { attempt: u32 },
    Verify,
    /// Keep the current attempt's image as the output, dropping earlier ones
    RetainAttempt,
    Postprocess,
    Persist,
    Finish,
    Abort,
}

/// The descriptor state machine. Returns `None` for pairs that cannot occur.
///
/// Retries are blind: a rejected or failed attempt simply generates again
/// with the same prompt. A rejection on the last attempt force-accepts that
/// attempt; a failure on the last attempt aborts, because there is no image
/// to keep.
pub fn transition(max_attempts: u32, state: State, event: Event) -> Option<(State, Action)> {
    let retry_or = |attempt: u32, exhausted: (State, Action)| {
        if attempt < max_attempts {
            let next = attempt + 1;
            (State::Generating { attempt: next }, Action::Generate { attempt: next })
        } else {
            exhausted
        }
    };

    let step = match (state, event) {
        (State::Pending, Event::Start) => (State::Generating { attempt: 1 }, Action::Generate { attempt: 1 }),
        (State::Generating { attempt }, Event::Generated) => (State::Verifying { attempt }, Action::Verify),
        (State::Generating { attempt } | State::Verifying { attempt }, Event::AttemptFailed) => {
            retry_or(attempt, (State::Aborted, Action::Abort))
        }
        (State::Verifying { attempt }, Event::Verdict(true)) => {
            (State::Accepted { attempt }, Action::RetainAttempt)
        }
        (State::Verifying { attempt }, Event::Verdict(false)) => retry_or(
            attempt,
            (State::ForceAccepted { attempt }, Action::RetainAttempt),
        ),
        (State::Accepted { .. } | State::ForceAccepted { .. }, Event::Retained) => {
            (State::Postprocessing, Action::Postprocess)
        }
        (State::Postprocessing, Event::Postprocessed) => (State::Persisting, Action::Persist),
        (State::Persisting, Event::Written) => (State::Persisted, Action::Finish),
        _ => return None,
    };
    Some(step)
}

/// Image produced by one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artwork {
    Generated(Vec<u8>),
    /// The provider returned nothing; a captioned placeholder is rendered
    Placeholder,
}

impl Artwork {
    fn from_provider(bytes: Option<Vec<u8>>) -> Self {
        bytes.map(Artwork::Generated).unwrap_or(Artwork::Placeholder)
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Artwork::Generated(bytes) => Some(bytes),
            Artwork::Placeholder => None,
        }
    }
}

/// Result of processing one descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Output already existed and `force` was off
    Skipped,
    /// Dry run: the effective prompt that would have been sent
    DryRun { prompt: String },
    Generated {
        /// False when the image was force-accepted after exhausting attempts
        verified: bool,
        attempts: u32,
        output_path: PathBuf,
        content_hash: ContentHash,
    },
}

/// Batch-wide switches
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub force: bool,
    pub dry_run: bool,
    pub scratch_dir: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            force: false,
            dry_run: false,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Per-descriptor results of a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(AssetId, Outcome)>,
    pub failures: Vec<(AssetId, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }

    pub fn generated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Generated { .. }))
    }

    pub fn force_accepted(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Generated { verified: false, .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn dry_runs(&self) -> usize {
        self.count(|o| matches!(o, Outcome::DryRun { .. }))
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// The orchestrator: owns the collaborators and runs descriptors one by one
pub struct Pipeline {
    generator: Box<dyn ImageGenerator>,
    verifier: Box<dyn Verifier>,
    remover: Box<dyn BackgroundRemover>,
    options: PipelineOptions,
    clock: fn() -> DateTime<Utc>,
}

impl Pipeline {
    pub fn new(
        generator: Box<dyn ImageGenerator>,
        verifier: Box<dyn Verifier>,
        remover: Box<dyn BackgroundRemover>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generator,
            verifier,
            remover,
            options,
            clock: Utc::now,
        }
    }

    /// Process every matching descriptor under `assets_dir`.
    ///
    /// Only a missing assets directory fails the batch; per-descriptor errors
    /// are logged, recorded in the report, and the batch moves on.
    pub fn run(&self, assets_dir: &Path, filter: &CatalogFilter) -> Result<BatchReport> {
        let entries = Catalog::open(assets_dir, filter.clone())?;
        let style = StyleGuide::load_or_default(assets_dir);

        let mut report = BatchReport::default();
        for entry in entries {
            match self.process(&entry, &style) {
                Ok(outcome) => report.outcomes.push((entry.id, outcome)),
                Err(e) => {
                    tracing::error!(asset = %entry.id, path = %entry.path.display(), error = %e, "Failed to generate asset");
                    report.failures.push((entry.id, e.to_string()));
                }
            }
        }

        if report.total() == 0 {
            tracing::warn!("No matching assets found to generate");
        }
        Ok(report)
    }

    /// Run one descriptor to completion
    pub fn process(&self, entry: &CatalogEntry, style: &StyleGuide) -> Result<Outcome> {
        if entry.output_path.exists() && !self.options.force {
            tracing::info!(asset = %entry.id, "Skipping (already exists), use --force to regenerate");
            return Ok(Outcome::Skipped);
        }

        let mut descriptor = AssetDescriptor::load(&entry.path)?;
        tracing::info!(asset = %entry.id, name = %descriptor.name, "Processing");

        let prompt = style.effective_prompt(&descriptor.prompt);
        if self.options.dry_run {
            return Ok(Outcome::DryRun { prompt });
        }

        let transparent = descriptor.needs_transparency();
        let gen_options = GenerateOptions {
            width: Some(descriptor.width),
            height: Some(descriptor.height),
            transparent,
        };

        let mut state = State::Pending;
        let mut event = Event::Start;
        let mut current: Option<Artwork> = None;
        let mut scratch: Option<ScratchFile> = None;
        let mut retained: Option<Artwork> = None;
        let mut written: Option<(PathBuf, ContentHash)> = None;
        let mut acceptance: Option<(bool, u32)> = None;

        loop {
            let (next, action) = transition(MAX_ATTEMPTS, state, event).ok_or_else(|| {
                MysteryError::Internal(format!("No transition from {:?} on {:?}", state, event))
            })?;
            state = next;

            event = match action {
                Action::Generate { attempt } => {
                    // Releases the previous attempt's scratch file
                    scratch = None;
                    current = None;
                    tracing::info!(asset = %entry.id, attempt, max = MAX_ATTEMPTS, "Generating");
                    match self.generate_attempt(&entry.id, &descriptor, &prompt, &gen_options) {
                        Ok((art, file)) => {
                            current = Some(art);
                            scratch = Some(file);
                            Event::Generated
                        }
                        Err(e) => {
                            tracing::error!(asset = %entry.id, attempt, error = %e, "Generation error");
                            Event::AttemptFailed
                        }
                    }
                }
                Action::Verify => {
                    let path = scratch
                        .as_ref()
                        .map(|s| s.path().to_path_buf())
                        .ok_or_else(|| MysteryError::Internal("Verify without scratch image".to_string()))?;
                    match self.verifier.verify(&path, &descriptor.prompt) {
                        Ok(verdict) if verdict.verified => {
                            tracing::info!(asset = %entry.id, "Verified");
                            Event::Verdict(true)
                        }
                        Ok(verdict) => {
                            tracing::warn!(asset = %entry.id, reason = %verdict.reason, "Verification failed");
                            Event::Verdict(false)
                        }
                        Err(e) => {
                            tracing::error!(asset = %entry.id, error = %e, "Verification error");
                            Event::AttemptFailed
                        }
                    }
                }
                Action::RetainAttempt => {
                    scratch = None;
                    retained = current.take();
                    acceptance = match state {
                        State::Accepted { attempt } => Some((true, attempt)),
                        State::ForceAccepted { attempt } => {
                            tracing::warn!(asset = %entry.id, "Max retries reached, proceeding with unverified asset");
                            Some((false, attempt))
                        }
                        _ => None,
                    };
                    Event::Retained
                }
                Action::Postprocess => {
                    let art = retained
                        .take()
                        .ok_or_else(|| MysteryError::Internal("Postprocess without image".to_string()))?;
                    retained = Some(if transparent { self.cut_out(&entry.id, art) } else { art });
                    Event::Postprocessed
                }
                Action::Persist => {
                    let art = retained
                        .as_ref()
                        .ok_or_else(|| MysteryError::Internal("Persist without image".to_string()))?;
                    written = Some(self.persist(entry, &mut descriptor, art)?);
                    Event::Written
                }
                Action::Finish => {
                    let (output_path, content_hash) = written
                        .take()
                        .ok_or_else(|| MysteryError::Internal("Finish without output".to_string()))?;
                    let (verified, attempts) = acceptance
                        .ok_or_else(|| MysteryError::Internal("Finish without acceptance".to_string()))?;
                    return Ok(Outcome::Generated {
                        verified,
                        attempts,
                        output_path,
                        content_hash,
                    });
                }
                Action::Abort => {
                    return Err(MysteryError::Generation(format!(
                        "Failed to generate valid asset for {} after {} attempts",
                        entry.id, MAX_ATTEMPTS
                    )));
                }
            };
        }
    }

    fn generate_attempt(
        &self,
        id: &AssetId,
        descriptor: &AssetDescriptor,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<(Artwork, ScratchFile)> {
        let art = Artwork::from_provider(self.generator.generate(prompt, options)?);
        let png = encode_output(art.bytes(), descriptor.width, descriptor.height, id.as_str())?;
        let file = ScratchFile::create(&self.options.scratch_dir, id, &png)?;
        Ok((art, file))
    }

    /// Background removal never discards the art: on failure the original
    /// image is kept.
    fn cut_out(&self, id: &AssetId, art: Artwork) -> Artwork {
        match art {
            Artwork::Generated(bytes) => {
                tracing::info!(asset = %id, "Applying background removal");
                match self.remover.remove(&bytes) {
                    Ok(cut) => Artwork::Generated(cut),
                    Err(e) => {
                        tracing::warn!(asset = %id, error = %e, "Background removal failed, saving original");
                        Artwork::Generated(bytes)
                    }
                }
            }
            Artwork::Placeholder => Artwork::Placeholder,
        }
    }

    /// Write the final PNG, then mark and rewrite the descriptor
    fn persist(
        &self,
        entry: &CatalogEntry,
        descriptor: &mut AssetDescriptor,
        art: &Artwork,
    ) -> Result<(PathBuf, ContentHash)> {
        let png = encode_output(art.bytes(), descriptor.width, descriptor.height, entry.id.as_str())?;
        atomic_write(&entry.output_path, &png)?;

        descriptor.mark_generated(self.generator.model(), (self.clock)());
        descriptor.save(&entry.path)?;

        tracing::info!(asset = %entry.id, path = %entry.output_path.display(), "Saved");
        Ok((entry.output_path.clone(), ContentHash::from_bytes(&png)))
    }
}
