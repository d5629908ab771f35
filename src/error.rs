//! Error types for the vision aid

use thiserror::Error;

/// Result type alias for vision aid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Input or camera device not present or not openable
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Controller read error other than a missing device
    #[error("trigger error: {0}")]
    Trigger(String),

    /// Frame grab, decode or encode failure
    #[error("capture error: {0}")]
    Capture(String),

    /// Remote analysis service error
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Speech engine error
    #[error("speech error: {0}")]
    Speech(String),

    /// Audio output error
    #[error("audio error: {0}")]
    Audio(String),

    /// Text-to-speech synthesis error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Image codec error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
