//! Game controller input via Linux evdev

use std::path::PathBuf;

use async_trait::async_trait;
use evdev::{Device, EventStream, InputEventKind, Key};

use super::{Connector, InputDevice, RawInput};
use crate::{Error, Result};

/// errno for a device that disappeared mid-read
const ENODEV: i32 = 19;

/// Face buttons and the codes they are reported as
const FACE_BUTTONS: [(Key, &str); 4] = [
    (Key::BTN_SOUTH, "BTN_SOUTH"),
    (Key::BTN_NORTH, "BTN_NORTH"),
    (Key::BTN_EAST, "BTN_EAST"),
    (Key::BTN_WEST, "BTN_WEST"),
];

/// Opens the first input device exposing face buttons
#[derive(Debug, Default)]
pub struct EvdevConnector;

#[async_trait]
impl Connector for EvdevConnector {
    type Device = EvdevGamepad;

    async fn connect(&mut self) -> Result<EvdevGamepad> {
        let (path, device) = evdev::enumerate()
            .find(|(_, device)| is_gamepad(device))
            .ok_or_else(|| Error::DeviceUnavailable("no game controller found".to_string()))?;

        let name = device.name().unwrap_or("unknown").to_string();
        let stream = device.into_event_stream().map_err(map_io)?;

        tracing::debug!(path = %path.display(), name, "opened controller");
        Ok(EvdevGamepad { path, stream })
    }
}

/// An open controller event stream
pub struct EvdevGamepad {
    path: PathBuf,
    stream: EventStream,
}

#[async_trait]
impl InputDevice for EvdevGamepad {
    async fn next_input(&mut self) -> Result<RawInput> {
        let event = self.stream.next_event().await.map_err(|e| {
            tracing::debug!(path = %self.path.display(), error = %e, "controller read failed");
            map_io(e)
        })?;

        Ok(match event.kind() {
            InputEventKind::Key(key) => RawInput::key(key_code(key), event.value()),
            _ => RawInput::other(event.value()),
        })
    }
}

fn is_gamepad(device: &Device) -> bool {
    device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::BTN_SOUTH))
}

fn key_code(key: Key) -> String {
    FACE_BUTTONS
        .iter()
        .find(|(k, _)| *k == key)
        .map_or_else(|| format!("{key:?}"), |(_, code)| (*code).to_string())
}

fn map_io(e: std::io::Error) -> Error {
    match e.raw_os_error() {
        Some(ENODEV) => Error::DeviceUnavailable("controller unplugged".to_string()),
        _ if e.kind() == std::io::ErrorKind::NotFound => {
            Error::DeviceUnavailable(format!("controller gone: {e}"))
        }
        _ => Error::Trigger(format!("controller read failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_buttons_map_to_codes() {
        assert_eq!(key_code(Key::BTN_SOUTH), "BTN_SOUTH");
        assert_eq!(key_code(Key::BTN_WEST), "BTN_WEST");
    }

    #[test]
    fn enodev_is_unplugged() {
        let err = map_io(std::io::Error::from_raw_os_error(ENODEV));
        assert!(matches!(err, Error::DeviceUnavailable(_)));

        let err = map_io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, Error::DeviceUnavailable(_)));
    }

    #[test]
    fn other_read_errors_are_trigger_errors() {
        let err = map_io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(matches!(err, Error::Trigger(_)));
        assert_eq!(crate::trigger::classify(&err), crate::trigger::TriggerFault::Transient);
    }
}
