//! Cloud speech: `OpenAI` synthesis played on the default output device

use async_trait::async_trait;

use super::tts::OPENAI_SPEECH_URL;
use super::{AudioPlayback, Speaker, TextToSpeech};
use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Words per minute that correspond to a synthesis speed of 1.0
const BASE_RATE: f64 = 180.0;

/// Synthesis speed for a speaking rate in words per minute
fn speed_for(rate: u32) -> f64 {
    (f64::from(rate) / BASE_RATE).clamp(0.25, 4.0)
}

/// Speaks through `OpenAI` TTS, opening the output device per utterance
pub struct CloudSpeaker {
    config: SpeechConfig,
    endpoint: String,
}

impl CloudSpeaker {
    /// Create a speaker
    ///
    /// # Errors
    ///
    /// Returns error if no `OpenAI` key is configured
    pub fn new(config: SpeechConfig) -> Result<Self> {
        // Fail at startup rather than on the first utterance
        TextToSpeech::new(config.openai_api_key.as_ref(), config.cloud_voice.clone(), 1.0)?;
        Ok(Self {
            config,
            endpoint: OPENAI_SPEECH_URL.to_string(),
        })
    }

    /// Send synthesis requests to another endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn speak_once(&self, text: &str) -> Result<()> {
        let tts = TextToSpeech::new(
            self.config.openai_api_key.as_ref(),
            self.config.cloud_voice.clone(),
            speed_for(self.config.rate),
        )?
        .with_endpoint(self.endpoint.as_str());

        tracing::info!(text, voice = %self.config.cloud_voice, "speaking");
        let audio = tts.synthesize(text).await?;

        let volume = self.config.volume;
        tokio::task::spawn_blocking(move || AudioPlayback::open()?.play_mp3(&audio, volume))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }
}

#[async_trait]
impl Speaker for CloudSpeaker {
    async fn speak(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if let Err(e) = self.speak_once(text).await {
            tracing::error!(error = %e, "speech failed");
        }
    }
}
