//! Configuration management for the vision aid

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::camera::Resolution;
use crate::trigger::DEFAULT_BACKOFF;
use crate::{Error, Result};

pub use file::ConfigFile;

/// Default Gemini model for image analysis
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default Gemini REST base URL
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Vision aid configuration
#[derive(Debug)]
pub struct Config {
    /// Remote analysis service
    pub analyzer: AnalyzerConfig,

    /// Camera capture
    pub camera: CameraConfig,

    /// Controller input
    pub trigger: TriggerConfig,

    /// Speech output
    pub speech: SpeechConfig,
}

/// Remote analysis service configuration
#[derive(Debug)]
pub struct AnalyzerConfig {
    /// Gemini API key (`GEMINI_API_KEY` or `GOOGLE_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Model identifier
    pub model: String,

    /// REST base URL
    pub endpoint: String,

    /// Request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

/// Camera capture configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Capture device passed to ffmpeg as input
    pub device: String,

    /// ffmpeg input format (`v4l2`, `avfoundation`, `dshow`)
    pub input_format: String,

    /// Explicit ffmpeg binary; searched on PATH when unset
    pub ffmpeg_bin: Option<PathBuf>,

    /// Resolution the frame is downscaled to
    pub resolution: Resolution,

    /// Frames are discarded for this long before the one that is kept
    pub settle: Duration,

    /// Transient image file, overwritten each cycle
    pub image_path: PathBuf,
}

/// Controller input configuration
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Wait between reconnect attempts after a controller error
    pub backoff: Duration,
}

/// Which engine renders speech
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechBackend {
    /// Local espeak-ng process per utterance
    Espeak,
    /// `OpenAI` speech synthesis played through the default output device
    Cloud,
}

/// Speech output configuration
#[derive(Debug)]
pub struct SpeechConfig {
    /// Engine selection
    pub backend: SpeechBackend,

    /// Words per minute
    pub rate: u32,

    /// Volume multiplier (0.0 to 2.0, 1.0 is the engine default)
    pub volume: f32,

    /// Substrings matched against installed voice names, in order
    pub voice_preferences: Vec<String>,

    /// Language code used as the voice when no preference matches
    pub language: String,

    /// Explicit espeak binary; searched on PATH when unset
    pub espeak_bin: Option<PathBuf>,

    /// `OpenAI` key for the cloud backend
    pub openai_api_key: Option<SecretString>,

    /// `OpenAI` voice for the cloud backend
    pub cloud_voice: String,
}

impl Config {
    /// Load configuration from the TOML file and environment
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file cannot be loaded or a value is out of range
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(path)?;
        let config = Self::from_sources(fc, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// Precedence is env > file > default. Empty environment values are ignored.
    #[must_use]
    pub fn from_sources(fc: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let analyzer = AnalyzerConfig {
            api_key: env("GEMINI_API_KEY")
                .or_else(|| env("GOOGLE_API_KEY"))
                .or(fc.analyzer.api_key)
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            model: env("VISION_AID_MODEL")
                .or(fc.analyzer.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: env("VISION_AID_ENDPOINT")
                .or(fc.analyzer.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: env("VISION_AID_TIMEOUT_SECS")
                .and_then(|s| match s.trim().parse::<u64>() {
                    Ok(secs) => Some(secs),
                    Err(_) => {
                        tracing::warn!(value = %s, "invalid VISION_AID_TIMEOUT_SECS, ignoring");
                        None
                    }
                })
                .or(fc.analyzer.timeout_secs)
                .map(Duration::from_secs),
        };

        let camera = CameraConfig {
            device: env("VISION_AID_CAMERA")
                .or(fc.camera.device)
                .unwrap_or_else(|| default_camera_device().to_string()),
            input_format: fc
                .camera
                .input_format
                .unwrap_or_else(|| default_input_format().to_string()),
            ffmpeg_bin: env("FFMPEG_BIN")
                .or(fc.camera.ffmpeg_bin)
                .map(PathBuf::from),
            resolution: Resolution::new(
                fc.camera.width.unwrap_or(Resolution::DEFAULT.width),
                fc.camera.height.unwrap_or(Resolution::DEFAULT.height),
            ),
            settle: Duration::from_millis(fc.camera.settle_ms.unwrap_or(500)),
            image_path: fc
                .camera
                .image_path
                .map_or_else(default_image_path, PathBuf::from),
        };

        let trigger = TriggerConfig {
            backoff: fc
                .trigger
                .backoff_secs
                .map_or(DEFAULT_BACKOFF, Duration::from_secs),
        };

        let backend = match env("VISION_AID_SPEECH")
            .or(fc.speech.backend)
            .as_deref()
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("cloud" | "openai") => SpeechBackend::Cloud,
            Some("espeak" | "espeak-ng") | None => SpeechBackend::Espeak,
            Some(other) => {
                tracing::warn!(backend = other, "unknown speech backend, using espeak");
                SpeechBackend::Espeak
            }
        };

        let speech = SpeechConfig {
            backend,
            rate: fc.speech.rate.unwrap_or(180),
            volume: fc.speech.volume.unwrap_or(1.0),
            voice_preferences: fc
                .speech
                .voice_preferences
                .unwrap_or_else(|| vec!["female".to_string(), "zira".to_string()]),
            language: env("VISION_AID_LANGUAGE")
                .or(fc.speech.language)
                .unwrap_or_else(|| "en".to_string()),
            espeak_bin: env("ESPEAK_BIN")
                .or(fc.speech.espeak_bin)
                .map(PathBuf::from),
            openai_api_key: env("OPENAI_API_KEY")
                .or(fc.speech.openai_api_key)
                .map(SecretString::from),
            cloud_voice: fc.speech.cloud_voice.unwrap_or_else(|| "nova".to_string()),
        };

        Self {
            analyzer,
            camera,
            trigger,
            speech,
        }
    }

    /// Check values that would otherwise fail deep inside a cycle
    ///
    /// The analysis credential is checked when the analyzer is built, so
    /// diagnostic commands that never reach the service still work without one.
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range
    pub fn validate(&self) -> Result<()> {
        if self.camera.resolution.width == 0 || self.camera.resolution.height == 0 {
            return Err(Error::Config(format!(
                "camera resolution must be non-zero, got {}",
                self.camera.resolution
            )));
        }

        if !(0.0..=2.0).contains(&self.speech.volume) {
            return Err(Error::Config(format!(
                "speech volume must be between 0.0 and 2.0, got {}",
                self.speech.volume
            )));
        }

        if self.speech.rate == 0 {
            return Err(Error::Config("speech rate must be positive".to_string()));
        }

        if self.trigger.backoff.is_zero() {
            return Err(Error::Config(
                "trigger backoff must be at least one second".to_string(),
            ));
        }

        if self.analyzer.timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config(
                "analyzer timeout must be positive (omit it to wait indefinitely)".to_string(),
            ));
        }

        if self.analyzer.model.trim().is_empty() {
            return Err(Error::Config("analyzer model must not be empty".to_string()));
        }

        Ok(())
    }
}

/// ffmpeg input format for the host platform
#[must_use]
pub const fn default_input_format() -> &'static str {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
}

/// First camera on the host platform
#[must_use]
pub const fn default_camera_device() -> &'static str {
    if cfg!(target_os = "linux") {
        "/dev/video0"
    } else if cfg!(target_os = "windows") {
        "video=0"
    } else {
        "0"
    }
}

/// Image path under the data directory (`~/.local/share/vision-aid` on Linux)
fn default_image_path() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("vision-aid"))
        .join("captured_image.jpg")
}
