//! Trigger-to-speech loop
//!
//! Alternates between listening for a button and processing it:
//!
//! ```text
//! Listening ──trigger──▶ variant ──▶ capture ──▶ analyze ──▶ speak ──┐
//!     ▲                     │           │           │                │
//!     │                  ignored    apology     apology              │
//!     └──────────────────────┴──────────┴───────────┴────────────────┘
//! ```
//!
//! Every recognized press ends in exactly one utterance: the analysis text or
//! one of two fixed apologies.

use crate::analysis::{AnalysisResult, Analyzer, PromptVariant};
use crate::camera::Capturer;
use crate::trigger::{TriggerEvent, TriggerSource};
use crate::voice::Speaker;

/// Spoken when the camera yields no image
pub const CAPTURE_APOLOGY: &str = "I couldn't capture an image from the camera.";

/// Spoken when analysis fails
pub const ANALYSIS_APOLOGY: &str = "Sorry, I had a problem analyzing the image.";

/// Button code to prompt variant
const VARIANT_TABLE: [(&str, PromptVariant); 4] = [
    ("BTN_SOUTH", PromptVariant::Describe),
    ("BTN_NORTH", PromptVariant::Emotion),
    ("BTN_EAST", PromptVariant::ReadText),
    ("BTN_WEST", PromptVariant::IdentifyObject),
];

/// Prompt variant for a button code, `None` for anything unrecognized
#[must_use]
pub fn variant_for(event_id: &str) -> Option<PromptVariant> {
    VARIANT_TABLE
        .iter()
        .find(|(code, _)| *code == event_id)
        .map(|(_, variant)| *variant)
}

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Event was not a recognized button; nothing ran
    Ignored,
    /// Camera failed; capture apology spoken
    CaptureFailed,
    /// Analysis failed; analysis apology spoken
    AnalysisFailed,
    /// Analysis text spoken
    Spoken,
}

/// Owns the listen/process loop over its four collaborators
pub struct Orchestrator<T, C, A, S> {
    trigger: T,
    capturer: C,
    analyzer: A,
    speaker: S,
}

impl<T, C, A, S> Orchestrator<T, C, A, S>
where
    T: TriggerSource,
    C: Capturer,
    A: Analyzer,
    S: Speaker,
{
    /// Assemble an orchestrator
    pub const fn new(trigger: T, capturer: C, analyzer: A, speaker: S) -> Self {
        Self {
            trigger,
            capturer,
            analyzer,
            speaker,
        }
    }

    /// Run cycles forever
    pub async fn run(&mut self) {
        loop {
            let outcome = self.run_cycle().await;
            tracing::debug!(?outcome, "cycle complete");
        }
    }

    /// Listen for one trigger and process it
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let event = self.trigger.wait_for_trigger().await;
        self.process(&event).await
    }

    /// Process a single trigger event
    pub async fn process(&mut self, event: &TriggerEvent) -> CycleOutcome {
        let Some(variant) = event
            .is_recognized
            .then(|| variant_for(&event.event_id))
            .flatten()
        else {
            tracing::debug!(event = %event.event_id, "ignoring unrecognized event");
            return CycleOutcome::Ignored;
        };

        tracing::info!(button = %event.event_id, %variant, "processing trigger");

        let image = match self.capturer.capture().await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "capture failed");
                self.speaker.speak(CAPTURE_APOLOGY).await;
                return CycleOutcome::CaptureFailed;
            }
        };

        match self.analyzer.analyze(&image, variant).await {
            AnalysisResult::Success(text) if !text.trim().is_empty() => {
                tracing::info!(caption = %text, "caption received");
                self.speaker.speak(&text).await;
                CycleOutcome::Spoken
            }
            AnalysisResult::Success(_) => {
                tracing::warn!(reason = "empty response", "captioning failed");
                self.speaker.speak(ANALYSIS_APOLOGY).await;
                CycleOutcome::AnalysisFailed
            }
            AnalysisResult::Failure(reason) => {
                tracing::warn!(reason = %reason, "captioning failed");
                self.speaker.speak(ANALYSIS_APOLOGY).await;
                CycleOutcome::AnalysisFailed
            }
        }
    }
}
