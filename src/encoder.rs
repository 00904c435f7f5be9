//! Wire encoding
//!
//! Encodes controller output into the JSON payloads published on the MQTT
//! topic, and decodes whatever arrives on it: typed hub messages
//! (`gesture_command`, `gesture_telemetry`) and the legacy
//! `{button_id, state}` button payload.

use chrono::{DateTime, Local, Utc};

use crate::controller::ControllerEvent;
use crate::error::GestureError;
use crate::types::{
    ButtonPayload, Command, CommandPayload, ControllerPhase, HubMessage, InboundMessage,
    TelemetryEvent, TelemetryPayload,
};

/// Wall-clock `HH:MM:SS` in local time, as shown on the dashboard
pub fn clock_stamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Encoder for hub payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandEncoder;

impl CommandEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Build the `gesture_command` message for a resolved command
    pub fn command_message(
        &self,
        command: &Command,
        finger_count: Option<u8>,
        at: DateTime<Utc>,
    ) -> HubMessage {
        HubMessage::GestureCommand(CommandPayload {
            category: command.category.as_str().to_string(),
            action: command.action.clone(),
            value: command.value.clone(),
            timestamp: clock_stamp(at),
            finger_count,
        })
    }

    pub fn encode_command(
        &self,
        command: &Command,
        finger_count: Option<u8>,
        at: DateTime<Utc>,
    ) -> Result<String, GestureError> {
        to_json(&self.command_message(command, finger_count, at))
    }

    /// Build the `gesture_telemetry` message for a controller transition.
    ///
    /// Returns `None` for events that are not transitions (commands and
    /// rejected actions).
    pub fn telemetry_message(&self, event: &ControllerEvent, at: DateTime<Utc>) -> Option<HubMessage> {
        let (event, state, mode, finger_count, reason) = match event {
            ControllerEvent::ModePreview { mode, finger_count } => (
                TelemetryEvent::ModePreview,
                ControllerPhase::SelectMode,
                *mode,
                Some(*finger_count),
                None,
            ),
            ControllerEvent::ModeLocked { mode, finger_count } => (
                TelemetryEvent::ModeLocked,
                ControllerPhase::LockedMode,
                *mode,
                Some(*finger_count),
                None,
            ),
            ControllerEvent::ModeExited { mode, reason } => (
                TelemetryEvent::ModeExited,
                ControllerPhase::SelectMode,
                *mode,
                None,
                Some(*reason),
            ),
            ControllerEvent::Command { .. } | ControllerEvent::InvalidAction { .. } => return None,
        };

        Some(HubMessage::GestureTelemetry(TelemetryPayload {
            event,
            state,
            mode: Some(mode.as_str().to_string()),
            finger_count,
            reason,
            timestamp: clock_stamp(at),
        }))
    }

    pub fn encode_telemetry(
        &self,
        event: &ControllerEvent,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, GestureError> {
        self.telemetry_message(event, at)
            .map(|message| to_json(&message))
            .transpose()
    }

    /// Legacy button payload
    pub fn encode_button(&self, button_id: &str, state: bool) -> Result<String, GestureError> {
        to_json(&ButtonPayload {
            button_id: button_id.to_string(),
            state,
        })
    }

    /// Decode anything that may arrive on the topic
    pub fn decode_inbound(&self, payload: &[u8]) -> Result<InboundMessage, GestureError> {
        let value: serde_json::Value = serde_json::from_slice(payload)?;

        // Typed messages must parse as their declared type rather than
        // falling through to the button shape
        if let Some(kind) = value.get("type").and_then(|t| t.as_str()) {
            return match kind {
                "gesture_command" | "gesture_telemetry" => {
                    Ok(InboundMessage::Hub(serde_json::from_value(value)?))
                }
                other => Err(GestureError::UnknownMessage(format!("type {other:?}"))),
            };
        }

        if value.get("button_id").is_some() {
            return Ok(InboundMessage::Button(serde_json::from_value(value)?));
        }

        Err(GestureError::UnknownMessage(truncate(&value.to_string(), 120)))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, GestureError> {
    serde_json::to_string(value).map_err(|e| GestureError::EncodingError(e.to_string()))
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::t0;
    use crate::types::{ExitReason, Mode};
    use serde_json::Value;

    fn lights_on() -> Command {
        Command {
            category: Mode::Lights,
            action: "LIGHTS".to_string(),
            value: "ON".to_string(),
        }
    }

    #[test]
    fn test_encode_command() {
        let encoder = CommandEncoder::new();
        let json = encoder.encode_command(&lights_on(), Some(2), t0()).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["type"], "gesture_command");
        assert_eq!(parsed["category"], "LIGHTS");
        assert_eq!(parsed["action"], "LIGHTS");
        assert_eq!(parsed["value"], "ON");
        assert_eq!(parsed["finger_count"], 2);

        let stamp = parsed["timestamp"].as_str().unwrap();
        assert_eq!(stamp.len(), 8);
        assert_eq!(stamp, clock_stamp(t0()));
    }

    #[test]
    fn test_command_without_finger_count() {
        let encoder = CommandEncoder::new();
        let json = encoder.encode_command(&lights_on(), None, t0()).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["finger_count"].is_null());
    }

    #[test]
    fn test_encode_telemetry() {
        let encoder = CommandEncoder::new();

        let locked = ControllerEvent::ModeLocked {
            mode: Mode::Blinds,
            finger_count: 3,
        };
        let json = encoder.encode_telemetry(&locked, t0()).unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "gesture_telemetry");
        assert_eq!(parsed["event"], "mode_locked");
        assert_eq!(parsed["state"], "locked_mode");
        assert_eq!(parsed["mode"], "BLINDS");
        assert_eq!(parsed["finger_count"], 3);
        assert!(parsed.get("reason").is_none());

        let exited = ControllerEvent::ModeExited {
            mode: Mode::Blinds,
            reason: ExitReason::PinchHold,
        };
        let json = encoder.encode_telemetry(&exited, t0()).unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["event"], "mode_exited");
        assert_eq!(parsed["state"], "select_mode");
        assert_eq!(parsed["reason"], "pinch_hold");
    }

    #[test]
    fn test_commands_are_not_telemetry() {
        let encoder = CommandEncoder::new();
        let event = ControllerEvent::Command {
            command: lights_on(),
            finger_count: None,
            at: t0(),
        };
        assert!(encoder.encode_telemetry(&event, t0()).unwrap().is_none());
    }

    #[test]
    fn test_decode_inbound() {
        let encoder = CommandEncoder::new();

        let command = encoder.encode_command(&lights_on(), Some(2), t0()).unwrap();
        match encoder.decode_inbound(command.as_bytes()).unwrap() {
            InboundMessage::Hub(HubMessage::GestureCommand(payload)) => {
                assert_eq!(payload.value, "ON");
            }
            other => panic!("unexpected message {other:?}"),
        }

        let button = encoder.encode_button("A", true).unwrap();
        assert_eq!(
            encoder.decode_inbound(button.as_bytes()).unwrap(),
            InboundMessage::Button(ButtonPayload {
                button_id: "A".to_string(),
                state: true
            })
        );
    }

    #[test]
    fn test_decode_rejects_unknown() {
        let encoder = CommandEncoder::new();

        assert!(matches!(
            encoder.decode_inbound(br#"{"type":"something_else"}"#),
            Err(GestureError::UnknownMessage(_))
        ));
        assert!(matches!(
            encoder.decode_inbound(br#"{"hello":"world"}"#),
            Err(GestureError::UnknownMessage(_))
        ));
        assert!(matches!(
            encoder.decode_inbound(b"not json"),
            Err(GestureError::JsonError(_))
        ));
        // Declared type with a broken body
        assert!(encoder
            .decode_inbound(br#"{"type":"gesture_command","category":"LIGHTS"}"#)
            .is_err());
    }
}
