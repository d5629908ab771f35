//! Vision Aid - a button-triggered camera that describes what it sees
//!
//! Press a controller button, and the device captures a photo, asks a remote
//! vision model about it and reads the answer aloud.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌──────────┐   ┌─────────┐
//! │ TriggerSource│──▶│ Capturer │──▶│ Analyzer │──▶│ Speaker │
//! │  (gamepad)   │   │ (camera) │   │ (Gemini) │   │ (TTS)   │
//! └──────────────┘   └──────────┘   └──────────┘   └─────────┘
//!        ▲                                              │
//!        └──────────────── Orchestrator ◀───────────────┘
//! ```
//!
//! - Button → prompt variant:
//!   - South: describe the scene
//!   - North: read the emotion on a face
//!   - East: read text aloud
//!   - West: name the main object

pub mod analysis;
pub mod camera;
pub mod config;
pub mod daemon;
pub mod error;
pub mod orchestrator;
pub mod trigger;
pub mod voice;

pub use analysis::{AnalysisResult, Analyzer, GeminiAnalyzer, PromptVariant};
pub use camera::{CameraCapturer, CapturedImage, Capturer, Resolution};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use orchestrator::{
    ANALYSIS_APOLOGY, CAPTURE_APOLOGY, CycleOutcome, Orchestrator, variant_for,
};
pub use trigger::{GamepadTrigger, TriggerEvent, TriggerSource};
pub use voice::{EspeakSpeaker, Speaker};
