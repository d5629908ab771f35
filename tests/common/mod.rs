//! Shared test utilities
//!
//! Scripted stand-ins for the four orchestrator collaborators. Each keeps its
//! record behind an `Arc<Mutex<_>>` so a test can inspect it after the
//! orchestrator has taken ownership.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vision_aid::{
    AnalysisResult, Analyzer, CapturedImage, Capturer, Error, PromptVariant, Result, Speaker,
    TriggerEvent, TriggerSource,
};

/// Yields queued events, then waits forever
pub struct ScriptedTrigger {
    events: VecDeque<TriggerEvent>,
}

impl ScriptedTrigger {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            events: codes.iter().map(|c| TriggerEvent::new(*c)).collect(),
        }
    }
}

#[async_trait]
impl TriggerSource for ScriptedTrigger {
    async fn wait_for_trigger(&mut self) -> TriggerEvent {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}

/// Returns a new numbered image per call or fails, counting calls
#[derive(Clone)]
pub struct StubCapturer {
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl StubCapturer {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Capturer for StubCapturer {
    async fn capture(&mut self) -> Result<CapturedImage> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if self.fail {
            return Err(Error::DeviceUnavailable("camera not found".to_string()));
        }
        Ok(CapturedImage {
            path: image_path(call),
            width: 800,
            height: 600,
        })
    }
}

/// Path of the image produced by the `call`-th capture, counting from 1
pub fn image_path(call: usize) -> PathBuf {
    PathBuf::from(format!("/tmp/captured_image_{call}.jpg"))
}

/// Returns canned results in order, repeating the last, and records each request
#[derive(Clone)]
pub struct StubAnalyzer {
    results: Arc<Mutex<VecDeque<AnalysisResult>>>,
    requests: Arc<Mutex<Vec<(PathBuf, PromptVariant)>>>,
}

impl StubAnalyzer {
    pub fn sequence(results: Vec<AnalysisResult>) -> Self {
        assert!(!results.is_empty(), "at least one canned result");
        Self {
            results: Arc::new(Mutex::new(results.into())),
            requests: Arc::default(),
        }
    }

    pub fn returning(result: AnalysisResult) -> Self {
        Self::sequence(vec![result])
    }

    pub fn success(text: &str) -> Self {
        Self::returning(AnalysisResult::Success(text.to_string()))
    }

    pub fn requests(&self) -> Vec<(PathBuf, PromptVariant)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn variants(&self) -> Vec<PromptVariant> {
        self.requests().into_iter().map(|(_, v)| v).collect()
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(&self, image: &CapturedImage, variant: PromptVariant) -> AnalysisResult {
        self.requests
            .lock()
            .unwrap()
            .push((image.path.clone(), variant));

        let mut results = self.results.lock().unwrap();
        if results.len() > 1 {
            results.pop_front().unwrap()
        } else {
            results[0].clone()
        }
    }
}

/// Records every utterance
#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}
