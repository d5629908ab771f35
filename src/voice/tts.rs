//! Cloud text-to-speech synthesis

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// `OpenAI` speech endpoint
pub const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const DEFAULT_MODEL: &str = "tts-1";

/// Synthesizes speech from text using `OpenAI`
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    voice: String,
    speed: f64,
    model: String,
}

impl TextToSpeech {
    /// Create a synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: Option<&SecretString>, voice: String, speed: f64) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.expose_secret().trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("OpenAI API key required for cloud speech".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from(api_key),
            endpoint: OPENAI_SPEECH_URL.to_string(),
            voice,
            speed: speed.clamp(0.25, 4.0),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Send requests to another speech endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Synthesis speed in use
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
