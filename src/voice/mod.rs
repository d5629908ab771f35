//! Speech output
//!
//! Speakers acquire their engine fresh for every utterance and release it on
//! every exit path. Failures are logged and never reach the caller.

#[cfg(feature = "cloud-voice")]
mod cloud;
mod espeak;
#[cfg(feature = "cloud-voice")]
mod playback;
#[cfg(feature = "cloud-voice")]
mod tts;

use async_trait::async_trait;

#[cfg(feature = "cloud-voice")]
pub use cloud::CloudSpeaker;
pub use espeak::{EspeakSpeaker, Voice, parse_voice_list, select_voice};
#[cfg(feature = "cloud-voice")]
pub use playback::AudioPlayback;
#[cfg(feature = "cloud-voice")]
pub use tts::TextToSpeech;

/// Renders text as audible speech
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak `text`, blocking until playback completes
    ///
    /// Empty text is a no-op.
    async fn speak(&self, text: &str);
}

#[async_trait]
impl<S: Speaker + ?Sized> Speaker for Box<S> {
    async fn speak(&self, text: &str) {
        (**self).speak(text).await;
    }
}
