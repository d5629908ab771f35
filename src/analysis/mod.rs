//! Image analysis
//!
//! An analyzer turns a captured image and a prompt variant into text. Every
//! failure is normalized into [`AnalysisResult::Failure`] so nothing escapes
//! the analysis stage as an error.

mod gemini;

use std::fmt;

use async_trait::async_trait;

use crate::camera::CapturedImage;

pub use gemini::GeminiAnalyzer;

/// Which instruction accompanies the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum PromptVariant {
    /// One-sentence scene description
    Describe,
    /// Facial emotion in about three words
    Emotion,
    /// Verbatim transcription of visible text
    ReadText,
    /// Main object in three words or fewer
    IdentifyObject,
}

impl PromptVariant {
    /// Every variant
    pub const ALL: [Self; 4] = [
        Self::Describe,
        Self::Emotion,
        Self::ReadText,
        Self::IdentifyObject,
    ];

    /// Prompt text sent with the image
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Describe => {
                "Describe what you see in this image in one clear and descriptive sentence."
            }
            Self::Emotion => {
                "You will be provided an image of a person, your job is to assess what kind of \
                 emotion are they feeling by looking at their faces.\n\
                 EXAMPLE OUTPUT RESPONSE:\n\
                 1. person looks depressed\n\
                 2. person looks tired.\n\
                 3. person is crying.\n\
                 4. person is happy.\n\n\
                 Try to answer in 3 words, this is important!"
            }
            Self::ReadText => {
                "Read aloud the text shown in this image. Just output the exact text clearly."
            }
            Self::IdentifyObject => {
                "Identify the main object in this image. Answer briefly in 3 words or less."
            }
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Describe => "describe",
            Self::Emotion => "emotion",
            Self::ReadText => "read-text",
            Self::IdentifyObject => "identify-object",
        }
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one analysis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    /// Non-empty description
    Success(String),
    /// Human-readable reason
    Failure(String),
}

impl AnalysisResult {
    /// Normalize response text: trimmed, and blank or absent becomes a failure
    #[must_use]
    pub fn from_text(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(text) if !text.is_empty() => Self::Success(text.to_string()),
            _ => Self::Failure("empty response".to_string()),
        }
    }

    /// Build a failure
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }

    /// Whether this is a success
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Describes images
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze `image` with the prompt selected by `variant`
    async fn analyze(&self, image: &CapturedImage, variant: PromptVariant) -> AnalysisResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_distinct_prompt() {
        let prompts: std::collections::HashSet<_> =
            PromptVariant::ALL.iter().map(|v| v.prompt()).collect();
        assert_eq!(prompts.len(), PromptVariant::ALL.len());
    }

    #[test]
    fn short_answer_prompts_ask_for_three_words() {
        assert!(PromptVariant::Emotion.prompt().contains("3 words"));
        assert!(PromptVariant::IdentifyObject.prompt().contains("3 words or less"));
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(
            AnalysisResult::from_text(Some("  a red mug\n")),
            AnalysisResult::Success("a red mug".to_string())
        );
    }

    #[test]
    fn blank_or_missing_text_is_empty_response() {
        let empty = AnalysisResult::Failure("empty response".to_string());
        assert_eq!(AnalysisResult::from_text(None), empty);
        assert_eq!(AnalysisResult::from_text(Some("")), empty);
        assert_eq!(AnalysisResult::from_text(Some(" \n\t")), empty);
    }
}
