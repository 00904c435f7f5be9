//! Dashboard relay
//!
//! Keeps the state a dashboard needs (button states, the last value per
//! gesture category, the current mode and a short activity history) and turns
//! each MQTT payload into the named events a dashboard client listens for.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::encoder::CommandEncoder;
use crate::types::{
    ButtonPayload, CommandPayload, HubMessage, InboundMessage, TelemetryEvent, TelemetryPayload,
};

/// Buttons the relay tracks
pub const KNOWN_BUTTONS: [&str; 2] = ["A", "B"];

/// Entries kept in the activity history
pub const MAX_HISTORY: usize = 20;

/// Where an activity entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    Button,
    Gesture,
}

/// One line in the activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub source: ActivitySource,
    /// Button id or gesture category. Dashboards read it as `button_id`.
    #[serde(rename = "button_id")]
    pub id: String,
    /// `PRESSED`/`RELEASED` or the command value
    pub state: String,
    pub timestamp: String,
}

/// Event pushed to dashboard clients, serialized as `{"event": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RelayEvent {
    MqttStatus {
        connected: bool,
    },
    ButtonUpdate {
        button_id: String,
        state: bool,
        state_str: String,
        timestamp: String,
    },
    ButtonStates(BTreeMap<String, bool>),
    GestureCommand(CommandPayload),
    GestureTelemetry(TelemetryPayload),
    GestureStates(BTreeMap<String, String>),
    CurrentMode {
        mode: Option<String>,
    },
    ActivityHistory(Vec<ActivityItem>),
}

/// Relay state
#[derive(Debug, Clone)]
pub struct HubState {
    encoder: CommandEncoder,
    button_states: BTreeMap<String, bool>,
    gesture_states: BTreeMap<String, String>,
    current_mode: Option<String>,
    history: VecDeque<ActivityItem>,
    /// Payloads that could not be decoded or were ignored
    pub ignored: usize,
}

impl Default for HubState {
    fn default() -> Self {
        Self::new()
    }
}

impl HubState {
    pub fn new() -> Self {
        Self {
            encoder: CommandEncoder::new(),
            button_states: KNOWN_BUTTONS
                .iter()
                .map(|id| (id.to_string(), false))
                .collect(),
            gesture_states: BTreeMap::new(),
            current_mode: None,
            history: VecDeque::with_capacity(MAX_HISTORY),
            ignored: 0,
        }
    }

    pub fn button_states(&self) -> &BTreeMap<String, bool> {
        &self.button_states
    }

    pub fn gesture_states(&self) -> &BTreeMap<String, String> {
        &self.gesture_states
    }

    pub fn current_mode(&self) -> Option<&str> {
        self.current_mode.as_deref()
    }

    /// Newest first
    pub fn history(&self) -> Vec<ActivityItem> {
        self.history.iter().cloned().collect()
    }

    /// Process one MQTT payload received now
    pub fn handle_payload(&mut self, payload: &[u8]) -> Vec<RelayEvent> {
        self.handle_payload_at(payload, Local::now())
    }

    /// Process one MQTT payload received at `now`.
    ///
    /// Undecodable payloads are logged and produce no events.
    pub fn handle_payload_at(&mut self, payload: &[u8], now: DateTime<Local>) -> Vec<RelayEvent> {
        match self.encoder.decode_inbound(payload) {
            Ok(InboundMessage::Button(button)) => self.on_button(button, now),
            Ok(InboundMessage::Hub(HubMessage::GestureCommand(command))) => {
                self.on_command(command, now)
            }
            Ok(InboundMessage::Hub(HubMessage::GestureTelemetry(telemetry))) => {
                self.on_telemetry(telemetry)
            }
            Err(e) => {
                warn!(error = %e, "ignoring MQTT payload");
                self.ignored += 1;
                Vec::new()
            }
        }
    }

    /// Events that bring a newly connected client up to date
    pub fn snapshot(&self, connected: bool) -> Vec<RelayEvent> {
        let mut events = vec![
            RelayEvent::ButtonStates(self.button_states.clone()),
            RelayEvent::GestureStates(self.gesture_states.clone()),
            RelayEvent::CurrentMode {
                mode: self.current_mode.clone(),
            },
            RelayEvent::MqttStatus { connected },
        ];
        if !self.history.is_empty() {
            events.push(RelayEvent::ActivityHistory(self.history()));
        }
        events
    }

    fn on_button(&mut self, button: ButtonPayload, now: DateTime<Local>) -> Vec<RelayEvent> {
        let Some(previous) = self.button_states.get_mut(&button.button_id) else {
            warn!(button_id = %button.button_id, "unknown button id");
            self.ignored += 1;
            return Vec::new();
        };

        if *previous == button.state {
            debug!(button_id = %button.button_id, "button state unchanged");
            return Vec::new();
        }
        *previous = button.state;

        let timestamp = now.format("%H:%M:%S").to_string();
        let state_str = if button.state { "PRESSED" } else { "RELEASED" };
        info!(button_id = %button.button_id, state = state_str, "button");

        self.push_history(ActivityItem {
            source: ActivitySource::Button,
            id: button.button_id.clone(),
            state: state_str.to_string(),
            timestamp: timestamp.clone(),
        });

        vec![
            RelayEvent::ButtonUpdate {
                button_id: button.button_id,
                state: button.state,
                state_str: state_str.to_string(),
                timestamp,
            },
            RelayEvent::ButtonStates(self.button_states.clone()),
        ]
    }

    fn on_command(&mut self, mut command: CommandPayload, now: DateTime<Local>) -> Vec<RelayEvent> {
        if command.timestamp.is_empty() {
            command.timestamp = now.format("%H:%M:%S").to_string();
        }
        info!(category = %command.category, value = %command.value, "gesture command");

        self.gesture_states
            .insert(command.category.clone(), command.value.clone());
        self.current_mode = Some(command.category.clone());
        self.push_history(ActivityItem {
            source: ActivitySource::Gesture,
            id: command.category.clone(),
            state: command.value.clone(),
            timestamp: command.timestamp.clone(),
        });

        vec![
            RelayEvent::GestureCommand(command),
            RelayEvent::GestureStates(self.gesture_states.clone()),
            RelayEvent::CurrentMode {
                mode: self.current_mode.clone(),
            },
        ]
    }

    fn on_telemetry(&mut self, telemetry: TelemetryPayload) -> Vec<RelayEvent> {
        let mode_change = match telemetry.event {
            TelemetryEvent::ModeLocked => Some(telemetry.mode.clone()),
            TelemetryEvent::ModeExited => Some(None),
            TelemetryEvent::ModePreview => None,
        };

        let mut events = vec![RelayEvent::GestureTelemetry(telemetry)];
        if let Some(mode) = mode_change {
            if mode != self.current_mode {
                self.current_mode = mode;
                events.push(RelayEvent::CurrentMode {
                    mode: self.current_mode.clone(),
                });
            }
        }
        events
    }

    fn push_history(&mut self, item: ActivityItem) {
        self.history.push_front(item);
        self.history.truncate(MAX_HISTORY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerEvent;
    use crate::fixtures::t0;
    use crate::types::{Command, ExitReason, Mode};
    use chrono::TimeZone;
    use serde_json::Value;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 12, 0, 5).unwrap()
    }

    fn button(id: &str, state: bool) -> Vec<u8> {
        CommandEncoder::new().encode_button(id, state).unwrap().into_bytes()
    }

    fn command(mode: Mode, value: &str) -> Vec<u8> {
        let command = Command {
            category: mode,
            action: mode.as_str().to_string(),
            value: value.to_string(),
        };
        CommandEncoder::new()
            .encode_command(&command, Some(2), t0())
            .unwrap()
            .into_bytes()
    }

    fn telemetry(event: ControllerEvent) -> Vec<u8> {
        CommandEncoder::new()
            .encode_telemetry(&event, t0())
            .unwrap()
            .unwrap()
            .into_bytes()
    }

    #[test]
    fn test_button_press_and_release() {
        let mut hub = HubState::new();

        let events = hub.handle_payload_at(&button("A", true), noon());
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            RelayEvent::ButtonUpdate {
                button_id: "A".to_string(),
                state: true,
                state_str: "PRESSED".to_string(),
                timestamp: "12:00:05".to_string(),
            }
        );
        assert_eq!(hub.button_states()["A"], true);
        assert_eq!(hub.button_states()["B"], false);

        // Same state again is not an update
        assert!(hub.handle_payload_at(&button("A", true), noon()).is_empty());

        let events = hub.handle_payload_at(&button("A", false), noon());
        assert_eq!(events.len(), 2);
        assert_eq!(hub.history().len(), 2);
        assert_eq!(hub.history()[0].state, "RELEASED");
    }

    #[test]
    fn test_unknown_button_ignored() {
        let mut hub = HubState::new();
        assert!(hub.handle_payload_at(&button("C", true), noon()).is_empty());
        assert_eq!(hub.ignored, 1);
        assert!(!hub.button_states().contains_key("C"));
    }

    #[test]
    fn test_gesture_command_updates_state() {
        let mut hub = HubState::new();

        let events = hub.handle_payload_at(&command(Mode::Lights, "ON"), noon());
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], RelayEvent::GestureCommand(c) if c.value == "ON"));
        assert_eq!(hub.gesture_states()["LIGHTS"], "ON");
        assert_eq!(hub.current_mode(), Some("LIGHTS"));

        hub.handle_payload_at(&command(Mode::Lights, "DIM"), noon());
        hub.handle_payload_at(&command(Mode::Door, "LOCK"), noon());
        assert_eq!(hub.gesture_states()["LIGHTS"], "DIM");
        assert_eq!(hub.gesture_states()["DOOR"], "LOCK");
        assert_eq!(hub.current_mode(), Some("DOOR"));
        assert_eq!(hub.history()[0].id, "DOOR");
    }

    #[test]
    fn test_activity_item_wire_shape() {
        let mut hub = HubState::new();
        hub.handle_payload_at(&button("B", true), noon());
        hub.handle_payload_at(&command(Mode::Blinds, "OPEN"), noon());

        let json = serde_json::to_value(RelayEvent::ActivityHistory(hub.history())).unwrap();
        assert_eq!(json["event"], "activity_history");
        let items = json["data"].as_array().unwrap();

        assert_eq!(items[0]["source"], "gesture");
        assert_eq!(items[0]["button_id"], "BLINDS");
        assert_eq!(items[0]["state"], "OPEN");

        assert_eq!(items[1]["source"], "button");
        assert_eq!(items[1]["button_id"], "B");
        assert_eq!(items[1]["state"], "PRESSED");
        assert_eq!(items[1]["timestamp"], "12:00:05");
        assert!(items[1].get("id").is_none());
    }

    #[test]
    fn test_telemetry_tracks_mode() {
        let mut hub = HubState::new();

        let preview = telemetry(ControllerEvent::ModePreview {
            mode: Mode::Blinds,
            finger_count: 3,
        });
        assert_eq!(hub.handle_payload_at(&preview, noon()).len(), 1);
        assert_eq!(hub.current_mode(), None);

        let locked = telemetry(ControllerEvent::ModeLocked {
            mode: Mode::Blinds,
            finger_count: 3,
        });
        let events = hub.handle_payload_at(&locked, noon());
        assert_eq!(events.len(), 2);
        assert_eq!(hub.current_mode(), Some("BLINDS"));

        let exited = telemetry(ControllerEvent::ModeExited {
            mode: Mode::Blinds,
            reason: ExitReason::Timeout,
        });
        let events = hub.handle_payload_at(&exited, noon());
        assert_eq!(
            events.last(),
            Some(&RelayEvent::CurrentMode { mode: None })
        );
        assert_eq!(hub.current_mode(), None);
        // Telemetry is not activity
        assert!(hub.history().is_empty());
    }

    #[test]
    fn test_history_is_bounded_newest_first() {
        let mut hub = HubState::new();
        for i in 0..30 {
            hub.handle_payload_at(&button("B", i % 2 == 0), noon());
        }

        let history = hub.history();
        assert_eq!(history.len(), MAX_HISTORY);
        // Last payload (i = 29) released B
        assert_eq!(history[0].state, "RELEASED");
        assert_eq!(history[1].state, "PRESSED");
    }

    #[test]
    fn test_garbage_is_ignored() {
        let mut hub = HubState::new();
        assert!(hub.handle_payload_at(b"\xff\xfe", noon()).is_empty());
        assert!(hub.handle_payload_at(br#"{"type":"ping"}"#, noon()).is_empty());
        assert_eq!(hub.ignored, 2);
    }

    #[test]
    fn test_snapshot() {
        let mut hub = HubState::new();
        let events = hub.snapshot(true);
        assert_eq!(events.len(), 4);
        assert_eq!(events[3], RelayEvent::MqttStatus { connected: true });

        hub.handle_payload_at(&button("A", true), noon());
        let events = hub.snapshot(false);
        assert_eq!(events.len(), 5);
        assert!(matches!(&events[4], RelayEvent::ActivityHistory(items) if items.len() == 1));
    }

    #[test]
    fn test_relay_event_wire_shape() {
        let event = RelayEvent::CurrentMode {
            mode: Some("LIGHTS".to_string()),
        };
        let value: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "current_mode");
        assert_eq!(value["data"]["mode"], "LIGHTS");

        let mut states = BTreeMap::new();
        states.insert("A".to_string(), true);
        let value = serde_json::to_value(RelayEvent::ButtonStates(states)).unwrap();
        assert_eq!(value["event"], "button_states");
        assert_eq!(value["data"]["A"], true);
    }
}
