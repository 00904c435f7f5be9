//! Gesture Hub - hand-gesture control for a small smart home
//!
//! Gesture Hub turns hand-landmark frames into device commands through a
//! deterministic pipeline: frame → finger count / action classification →
//! temporal smoothing → mode-lock state machine → JSON encoding → MQTT.
//!
//! ## Modules
//!
//! - **Controller**: hold up 1-4 fingers to lock Temperature, Lights, Blinds or
//!   Door, then use open hand, fist and pointing to drive it
//! - **Hub**: relay MQTT traffic (gesture commands and button states) to a
//!   dashboard as named events

pub mod classifier;
pub mod config;
pub mod controller;
pub mod encoder;
pub mod error;
pub mod hub;
pub mod landmarks;
pub mod mode;
pub mod pipeline;
pub mod smoother;
pub mod source;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use classifier::{ClassifierThresholds, GestureClassifier};
pub use config::{ControllerConfig, MqttConfig};
pub use controller::{ControllerEvent, GestureController};
pub use encoder::CommandEncoder;
pub use error::GestureError;
pub use hub::{HubState, RelayEvent};
pub use pipeline::{frames_to_commands, GestureProcessor};
pub use transport::{CommandSink, MqttPublisher, MqttSubscriber};

/// Crate version, reported by `doctor`
pub const HUB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name reported in diagnostics
pub const PRODUCER_NAME: &str = "gesture-hub";

/// Detector frame format accepted on input
pub const FRAME_SCHEMA_VERSION: &str = "gesture.frame.v1";
