//! TOML configuration file loading
//!
//! Supports `~/.config/vision-aid/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Remote analysis service
    #[serde(default)]
    pub analyzer: AnalyzerFileConfig,

    /// Camera capture
    #[serde(default)]
    pub camera: CameraFileConfig,

    /// Controller input
    #[serde(default)]
    pub trigger: TriggerFileConfig,

    /// Speech output
    #[serde(default)]
    pub speech: SpeechFileConfig,
}

/// Analysis service configuration
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzerFileConfig {
    /// Gemini API key
    pub api_key: Option<String>,

    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,

    /// REST base URL
    pub endpoint: Option<String>,

    /// Request timeout in seconds; absent means no timeout
    pub timeout_secs: Option<u64>,
}

/// Camera configuration
#[derive(Debug, Default, Deserialize)]
pub struct CameraFileConfig {
    /// Capture device (e.g. "/dev/video0")
    pub device: Option<String>,

    /// ffmpeg input format (e.g. "v4l2")
    pub input_format: Option<String>,

    /// Path to the ffmpeg binary
    pub ffmpeg_bin: Option<String>,

    /// Target width after downscaling
    pub width: Option<u32>,

    /// Target height after downscaling
    pub height: Option<u32>,

    /// Settle delay before the frame is read
    pub settle_ms: Option<u64>,

    /// Where the per-cycle image is written
    pub image_path: Option<String>,
}

/// Controller configuration
#[derive(Debug, Default, Deserialize)]
pub struct TriggerFileConfig {
    /// Wait between reconnect attempts
    pub backoff_secs: Option<u64>,
}

/// Speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// "espeak" or "cloud"
    pub backend: Option<String>,

    /// Words per minute
    pub rate: Option<u32>,

    /// Volume multiplier (0.0 to 2.0)
    pub volume: Option<f32>,

    /// Substrings matched against installed voice names, in order
    pub voice_preferences: Option<Vec<String>>,

    /// Language code used when no preferred voice is installed
    pub language: Option<String>,

    /// Path to espeak-ng
    pub espeak_bin: Option<String>,

    /// `OpenAI` key for the cloud backend
    pub openai_api_key: Option<String>,

    /// `OpenAI` voice for the cloud backend (e.g. "nova")
    pub cloud_voice: Option<String>,
}

/// Load the TOML config file
///
/// An explicit path must exist and parse. The standard path is optional:
/// returns `ConfigFile::default()` if it doesn't exist or can't be parsed.
///
/// # Errors
///
/// Returns error if an explicitly given file cannot be read or parsed
pub fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        return Ok(config);
    }

    let Some(path) = config_file_path() else {
        return Ok(ConfigFile::default());
    };

    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let config = match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    };

    Ok(config)
}

/// Return the config file path: `~/.config/vision-aid/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("vision-aid").join("config.toml"))
}
