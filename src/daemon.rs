//! The vision aid daemon
//!
//! Builds the concrete trigger, camera, analyzer and speaker from
//! configuration and runs the orchestrator until interrupted.

use crate::analysis::GeminiAnalyzer;
use crate::camera::CameraCapturer;
use crate::config::{SpeechBackend, SpeechConfig, TriggerConfig};
use crate::orchestrator::Orchestrator;
use crate::trigger::TriggerSource;
use crate::voice::{EspeakSpeaker, Speaker};
use crate::{Config, Result};

type DaemonOrchestrator =
    Orchestrator<Box<dyn TriggerSource>, CameraCapturer, GeminiAnalyzer, Box<dyn Speaker>>;

/// The vision aid daemon
pub struct Daemon {
    orchestrator: DaemonOrchestrator,
}

impl Daemon {
    /// Create a daemon
    ///
    /// The analyzer is built first so a missing credential aborts before any
    /// device is touched.
    ///
    /// # Errors
    ///
    /// Returns error if the analyzer credential is missing or an adapter cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let Config {
            analyzer,
            camera,
            trigger,
            speech,
        } = config;

        let analyzer = GeminiAnalyzer::new(analyzer)?;
        tracing::info!(model = analyzer.model(), "analysis service configured");

        let speaker = build_speaker(speech)?;
        let trigger = build_trigger(&trigger)?;
        let capturer = CameraCapturer::new(camera);

        Ok(Self {
            orchestrator: Orchestrator::new(trigger, capturer, analyzer, speaker),
        })
    }

    /// Run until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the shutdown signal cannot be installed
    pub async fn run(mut self) -> Result<()> {
        tokio::select! {
            () = self.orchestrator.run() => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("shutdown requested");
            }
        }

        tracing::info!("daemon stopped");
        Ok(())
    }
}

/// Build the configured speaker
///
/// # Errors
///
/// Returns error if the backend is unavailable in this build or lacks credentials
pub fn build_speaker(config: SpeechConfig) -> Result<Box<dyn Speaker>> {
    match config.backend {
        SpeechBackend::Espeak => Ok(Box::new(EspeakSpeaker::new(config))),
        #[cfg(feature = "cloud-voice")]
        SpeechBackend::Cloud => Ok(Box::new(crate::voice::CloudSpeaker::new(config)?)),
        #[cfg(not(feature = "cloud-voice"))]
        SpeechBackend::Cloud => Err(crate::Error::Config(
            "cloud speech requires building with the cloud-voice feature".to_string(),
        )),
    }
}

/// Build the controller trigger source
///
/// # Errors
///
/// Returns error on platforms without controller support
#[cfg(target_os = "linux")]
pub fn build_trigger(config: &TriggerConfig) -> Result<Box<dyn TriggerSource>> {
    use crate::trigger::GamepadTrigger;
    use crate::trigger::evdev::EvdevConnector;

    Ok(Box::new(
        GamepadTrigger::new(EvdevConnector).with_backoff(config.backoff),
    ))
}

/// Build the controller trigger source
///
/// # Errors
///
/// Returns error on platforms without controller support
#[cfg(not(target_os = "linux"))]
pub fn build_trigger(_config: &TriggerConfig) -> Result<Box<dyn TriggerSource>> {
    Err(crate::Error::Config(
        "game controller input is only supported on Linux".to_string(),
    ))
}
