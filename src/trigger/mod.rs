//! Physical trigger input
//!
//! Waits for one of the four face buttons on a game controller. A missing or
//! failing controller never propagates: the source logs, backs off and retries
//! until a button is pressed.

#[cfg(target_os = "linux")]
pub mod evdev;

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

/// Wait between reconnect attempts after a controller error
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Key codes of the buttons that start a cycle
pub const BUTTON_CODES: [&str; 4] = ["BTN_SOUTH", "BTN_NORTH", "BTN_EAST", "BTN_WEST"];

/// A button press handed to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Key code of the pressed button (e.g. `BTN_SOUTH`)
    pub event_id: String,
    /// Whether the code is one of [`BUTTON_CODES`]
    pub is_recognized: bool,
}

impl TriggerEvent {
    /// Build an event, marking it recognized when the code is a known button
    #[must_use]
    pub fn new(event_id: impl Into<String>) -> Self {
        let event_id = event_id.into();
        let is_recognized = BUTTON_CODES.contains(&event_id.as_str());
        Self {
            event_id,
            is_recognized,
        }
    }
}

/// Kind of a raw controller event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Key or button
    Key,
    /// Axis, sync, misc and everything else
    Other,
}

/// A controller event before filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    /// Event kind
    pub kind: InputKind,
    /// Key code name, empty for non-key events
    pub code: String,
    /// 1 = press, 0 = release, 2 = autorepeat
    pub value: i32,
}

impl RawInput {
    /// Key event
    #[must_use]
    pub fn key(code: impl Into<String>, value: i32) -> Self {
        Self {
            kind: InputKind::Key,
            code: code.into(),
            value,
        }
    }

    /// Non-key event
    #[must_use]
    pub const fn other(value: i32) -> Self {
        Self {
            kind: InputKind::Other,
            code: String::new(),
            value,
        }
    }
}

/// Turn a raw event into a trigger if it is a press of a recognized button
#[must_use]
pub fn recognize(input: &RawInput) -> Option<TriggerEvent> {
    if input.kind != InputKind::Key || input.value != 1 {
        return None;
    }

    let event = TriggerEvent::new(input.code.as_str());
    event.is_recognized.then_some(event)
}

/// How a controller error is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerFault {
    /// No controller connected, or it was unplugged
    Unplugged,
    /// Any other read or open failure
    Transient,
}

/// Classify a controller error
///
/// Both classes are recoverable; the distinction only changes what is logged.
#[must_use]
pub fn classify(error: &Error) -> TriggerFault {
    match error {
        Error::DeviceUnavailable(_) => TriggerFault::Unplugged,
        Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => TriggerFault::Unplugged,
        _ => TriggerFault::Transient,
    }
}

/// Wait before the next attempt
#[must_use]
pub const fn backoff_for(fault: TriggerFault, base: Duration) -> Duration {
    match fault {
        TriggerFault::Unplugged | TriggerFault::Transient => base,
    }
}

/// Blocks until a recognized trigger arrives
#[async_trait]
pub trait TriggerSource: Send {
    /// Wait for the next recognized button press
    async fn wait_for_trigger(&mut self) -> TriggerEvent;
}

#[async_trait]
impl<T: TriggerSource + ?Sized> TriggerSource for Box<T> {
    async fn wait_for_trigger(&mut self) -> TriggerEvent {
        (**self).wait_for_trigger().await
    }
}

/// Opens a controller
#[async_trait]
pub trait Connector: Send {
    /// Connected device
    type Device: InputDevice;

    /// Find and open a controller
    async fn connect(&mut self) -> Result<Self::Device>;
}

/// An open controller
#[async_trait]
pub trait InputDevice: Send {
    /// Read the next raw event
    async fn next_input(&mut self) -> Result<RawInput>;
}

/// Trigger source over a reconnecting controller
pub struct GamepadTrigger<C: Connector> {
    connector: C,
    device: Option<C::Device>,
    backoff: Duration,
}

impl<C: Connector> GamepadTrigger<C> {
    /// Create a trigger source with the default backoff
    #[must_use]
    pub const fn new(connector: C) -> Self {
        Self {
            connector,
            device: None,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Override the reconnect backoff
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether a controller is currently open
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    /// Connect if needed and read one event
    async fn poll_once(&mut self) -> Result<Option<TriggerEvent>> {
        if self.device.is_none() {
            let device = self.connector.connect().await?;
            tracing::info!("controller connected");
            self.device = Some(device);
        }

        let Some(device) = self.device.as_mut() else {
            return Ok(None);
        };

        let input = device.next_input().await?;
        tracing::trace!(?input, "controller event");
        Ok(recognize(&input))
    }
}

#[async_trait]
impl<C: Connector> TriggerSource for GamepadTrigger<C> {
    async fn wait_for_trigger(&mut self) -> TriggerEvent {
        tracing::info!("system ready, press a button");

        loop {
            match self.poll_once().await {
                Ok(Some(event)) => {
                    tracing::info!(button = %event.event_id, "button pressed");
                    return event;
                }
                Ok(None) => {}
                Err(e) => {
                    self.device = None;
                    let fault = classify(&e);
                    let wait = backoff_for(fault, self.backoff);
                    match fault {
                        TriggerFault::Unplugged => tracing::warn!(
                            error = %e,
                            retry_in = ?wait,
                            "controller not found, please connect a controller"
                        ),
                        TriggerFault::Transient => {
                            tracing::warn!(error = %e, retry_in = ?wait, "controller error");
                        }
                    }
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
