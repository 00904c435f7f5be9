//! Core types for the Gesture Hub pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: detector frames, hand landmarks, modes and actions, and the JSON
//! payloads that travel over MQTT.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GestureError;
use crate::landmarks::LANDMARK_COUNT;

/// A single hand landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// X coordinate (0.0 to 1.0, normalized to image width)
    pub x: f64,
    /// Y coordinate (0.0 to 1.0, normalized to image height, grows downward)
    pub y: f64,
    /// Depth relative to the wrist
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar distance to another landmark
    pub fn distance(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A detected hand with all 21 landmarks
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    /// Detection confidence (0.0 to 1.0)
    pub score: f64,
    /// "Left" or "Right" as reported by the detector
    pub handedness: String,
}

impl HandLandmarks {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self {
            landmarks,
            score: 1.0,
            handedness: "Right".to_string(),
        }
    }

    pub fn get(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }
}

/// Hand entry as it appears in a detector frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandJson {
    #[serde(default)]
    pub handedness: String,
    #[serde(default = "default_hand_score")]
    pub score: f64,
    pub landmarks: Vec<Landmark>,
}

fn default_hand_score() -> f64 {
    1.0
}

impl TryFrom<&HandJson> for HandLandmarks {
    type Error = GestureError;

    fn try_from(hand: &HandJson) -> Result<Self, Self::Error> {
        let landmarks: [Landmark; LANDMARK_COUNT] =
            hand.landmarks.as_slice().try_into().map_err(|_| {
                GestureError::InvalidFrame(format!(
                    "expected {} landmarks, got {}",
                    LANDMARK_COUNT,
                    hand.landmarks.len()
                ))
            })?;

        Ok(HandLandmarks {
            landmarks,
            score: hand.score,
            handedness: hand.handedness.clone(),
        })
    }
}

/// One line of detector output (gesture.frame.v1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Capture time; frames without one are stamped on arrival
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Detected hands, best first
    #[serde(default)]
    pub hands: Vec<HandJson>,
    /// Detector-side error for this frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Frame {
    /// Frame with no hand in view
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
            hands: Vec::new(),
            error: None,
        }
    }

    /// Frame carrying a single hand
    pub fn with_hand(timestamp: DateTime<Utc>, hand: &HandLandmarks) -> Self {
        Self {
            timestamp: Some(timestamp),
            hands: vec![HandJson {
                handedness: hand.handedness.clone(),
                score: hand.score,
                landmarks: hand.landmarks.to_vec(),
            }],
            error: None,
        }
    }

    /// First hand that clears the confidence threshold and carries a full landmark set.
    ///
    /// Hands with the wrong landmark count are skipped with a warning.
    pub fn primary_hand(&self, min_confidence: f64) -> Option<HandLandmarks> {
        for hand in &self.hands {
            if hand.score < min_confidence {
                continue;
            }
            match HandLandmarks::try_from(hand) {
                Ok(landmarks) => return Some(landmarks),
                Err(e) => warn!(error = %e, "skipping hand"),
            }
        }
        None
    }

    /// Check structural validity of the frame
    pub fn validate(&self) -> Result<(), GestureError> {
        for (i, hand) in self.hands.iter().enumerate() {
            if hand.landmarks.len() != LANDMARK_COUNT {
                return Err(GestureError::InvalidFrame(format!(
                    "hand {}: expected {} landmarks, got {}",
                    i,
                    LANDMARK_COUNT,
                    hand.landmarks.len()
                )));
            }
            if !(0.0..=1.0).contains(&hand.score) {
                return Err(GestureError::InvalidFrame(format!(
                    "hand {}: score {} outside 0-1",
                    i, hand.score
                )));
            }
            if hand
                .landmarks
                .iter()
                .any(|lm| !lm.x.is_finite() || !lm.y.is_finite() || !lm.z.is_finite())
            {
                return Err(GestureError::InvalidFrame(format!(
                    "hand {}: non-finite coordinate",
                    i
                )));
            }
        }
        Ok(())
    }
}

/// Device category selected by holding up fingers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Temperature,
    Lights,
    Blinds,
    Door,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Temperature, Mode::Lights, Mode::Blinds, Mode::Door];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Temperature => "TEMPERATURE",
            Mode::Lights => "LIGHTS",
            Mode::Blinds => "BLINDS",
            Mode::Door => "DOOR",
        }
    }

    /// 1 → Temperature, 2 → Lights, 3 → Blinds, 4 → Door
    pub fn from_finger_count(count: u8) -> Option<Mode> {
        match count {
            1 => Some(Mode::Temperature),
            2 => Some(Mode::Lights),
            3 => Some(Mode::Blinds),
            4 => Some(Mode::Door),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gestures recognized while a mode is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionGesture {
    OpenHand,
    Fist,
    PointLeft,
    PointRight,
    Pinch,
    ModeSwitch,
}

impl ActionGesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionGesture::OpenHand => "OPEN_HAND",
            ActionGesture::Fist => "FIST",
            ActionGesture::PointLeft => "POINT_LEFT",
            ActionGesture::PointRight => "POINT_RIGHT",
            ActionGesture::Pinch => "PINCH",
            ActionGesture::ModeSwitch => "MODE_SWITCH",
        }
    }

    /// Slides may repeat while held
    pub fn is_slide(&self) -> bool {
        matches!(self, ActionGesture::PointLeft | ActionGesture::PointRight)
    }
}

impl std::fmt::Display for ActionGesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command resolved from a locked mode and an action gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub category: Mode,
    pub action: String,
    pub value: String,
}

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPhase {
    SelectMode,
    LockedMode,
}

/// Why a locked mode was released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// No action within the mode timeout
    Timeout,
    /// Thumb-index pinch held long enough
    PinchHold,
    /// Thumb-only gesture
    ModeSwitch,
}

/// `gesture_command` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub category: String,
    pub action: String,
    pub value: String,
    /// Local wall-clock time (HH:MM:SS)
    #[serde(default)]
    pub timestamp: String,
    /// Best-effort stable finger count at the time of the command
    #[serde(default)]
    pub finger_count: Option<u8>,
}

/// Controller transition reported in telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryEvent {
    ModePreview,
    ModeLocked,
    ModeExited,
}

/// `gesture_telemetry` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    pub event: TelemetryEvent,
    pub state: ControllerPhase,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub finger_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ExitReason>,
    #[serde(default)]
    pub timestamp: String,
}

/// Typed messages on the hub topic, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubMessage {
    GestureCommand(CommandPayload),
    GestureTelemetry(TelemetryPayload),
}

/// Legacy `{button_id, state}` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonPayload {
    pub button_id: String,
    #[serde(default)]
    pub state: bool,
}

/// Anything that may arrive on the topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    Hub(HubMessage),
    Button(ButtonPayload),
}
