//! Configuration
//!
//! Broker settings come from the environment (`MQTT_BROKER`, `MQTT_PORT`,
//! `MQTT_TOPIC`, `MQTT_USERNAME`, `MQTT_PASSWORD`); controller tuning is a
//! JSON document where every field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::ClassifierThresholds;
use crate::error::GestureError;

pub const DEFAULT_BROKER: &str = "broker.hivemq.com";
pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TOPIC: &str = "IDD/button/state";
pub const DEFAULT_KEEPALIVE_SECS: u64 = 60;
pub const DEFAULT_CLIENT_ID_PREFIX: &str = "gesture-hub";

/// MQTT broker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    pub topic: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub keepalive_secs: u64,
    pub client_id_prefix: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: DEFAULT_BROKER.to_string(),
            port: DEFAULT_PORT,
            topic: DEFAULT_TOPIC.to_string(),
            username: String::new(),
            password: String::new(),
            keepalive_secs: DEFAULT_KEEPALIVE_SECS,
            client_id_prefix: DEFAULT_CLIENT_ID_PREFIX.to_string(),
        }
    }
}

/// Connection summary without secrets
#[derive(Debug, Clone, Serialize)]
pub struct BrokerInfo {
    pub broker: String,
    pub port: u16,
    pub topic: String,
    pub has_auth: bool,
}

impl MqttConfig {
    /// Build from process environment, falling back to defaults
    pub fn from_env() -> Result<Self, GestureError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GestureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(broker) = lookup("MQTT_BROKER") {
            config.broker = broker;
        }
        if let Some(port) = lookup("MQTT_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| GestureError::Config(format!("MQTT_PORT is not a port: {port}")))?;
        }
        if let Some(topic) = lookup("MQTT_TOPIC") {
            config.topic = topic;
        }
        if let Some(username) = lookup("MQTT_USERNAME") {
            config.username = username;
        }
        if let Some(password) = lookup("MQTT_PASSWORD") {
            config.password = password;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GestureError> {
        if self.broker.trim().is_empty() {
            return Err(GestureError::Config("broker host is empty".to_string()));
        }
        if self.topic.is_empty() || self.topic.contains(['+', '#']) {
            return Err(GestureError::Config(format!(
                "topic must be a concrete topic name: {:?}",
                self.topic
            )));
        }
        if self.keepalive_secs < 5 {
            return Err(GestureError::Config(
                "keepalive must be at least 5 seconds".to_string(),
            ));
        }
        Ok(())
    }

    /// Credentials are only used when both parts are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((&self.username, &self.password))
        }
    }

    /// Unique client id, e.g. `gesture-hub-publisher-<uuid>`
    pub fn client_id(&self, role: &str) -> String {
        format!("{}-{}-{}", self.client_id_prefix, role, Uuid::new_v4())
    }

    pub fn broker_info(&self) -> BrokerInfo {
        BrokerInfo {
            broker: self.broker.clone(),
            port: self.port,
            topic: self.topic.clone(),
            has_auth: self.credentials().is_some(),
        }
    }
}

/// State machine and smoothing tuning.
///
/// Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Consecutive stable readings needed to lock a mode
    pub mode_hold_frames: u32,
    /// Smoothing window for finger counts
    pub mode_buffer_size: usize,
    pub mode_stable_min: usize,
    pub mode_stable_fraction: f64,
    /// Inactivity before returning to mode selection
    pub mode_timeout: f64,
    /// How long a pinch must be held to leave a mode
    pub exit_pinch_hold: f64,

    /// Smoothing window for action gestures
    pub action_buffer_size: usize,
    pub action_stable_min: usize,
    pub action_stable_fraction: f64,
    /// Minimum gap between different actions
    pub action_cooldown: f64,
    /// Repeat interval for a held slide
    pub slide_repeat_interval: f64,

    /// Hands below this detector score are ignored
    pub min_detection_confidence: f64,
    /// Forwarded to the detector
    pub min_tracking_confidence: f64,
    /// Pause between frames when pacing a live loop
    pub frame_sleep: f64,

    pub thresholds: ClassifierThresholds,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode_hold_frames: 5,
            mode_buffer_size: 12,
            mode_stable_min: 3,
            mode_stable_fraction: 0.55,
            mode_timeout: 5.0,
            exit_pinch_hold: 1.0,
            action_buffer_size: 7,
            action_stable_min: 3,
            action_stable_fraction: 0.6,
            action_cooldown: 0.4,
            slide_repeat_interval: 0.55,
            min_detection_confidence: 0.72,
            min_tracking_confidence: 0.65,
            frame_sleep: 0.05,
            thresholds: ClassifierThresholds::default(),
        }
    }
}

impl ControllerConfig {
    /// Parse a tuning document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, GestureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, GestureError> {
        serde_json::to_string_pretty(self).map_err(GestureError::JsonError)
    }

    pub fn load(path: &Path) -> Result<Self, GestureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), GestureError> {
        if self.mode_hold_frames == 0 {
            return Err(GestureError::Config("mode_hold_frames must be at least 1".into()));
        }
        if self.mode_buffer_size == 0 || self.action_buffer_size == 0 {
            return Err(GestureError::Config("buffer sizes must be at least 1".into()));
        }
        for (name, value) in [
            ("mode_stable_fraction", self.mode_stable_fraction),
            ("action_stable_fraction", self.action_stable_fraction),
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GestureError::Config(format!("{name} must be within 0-1")));
            }
        }
        for (name, value) in [
            ("mode_timeout", self.mode_timeout),
            ("exit_pinch_hold", self.exit_pinch_hold),
            ("action_cooldown", self.action_cooldown),
            ("slide_repeat_interval", self.slide_repeat_interval),
            ("frame_sleep", self.frame_sleep),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GestureError::Config(format!("{name} must be a non-negative number")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = MqttConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MqttConfig::default());
        assert_eq!(config.topic, "IDD/button/state");
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = MqttConfig::from_lookup(lookup(&[
            ("MQTT_BROKER", "test.mosquitto.org"),
            ("MQTT_PORT", "8883"),
            ("MQTT_TOPIC", "home/gestures"),
            ("MQTT_USERNAME", "idd"),
            ("MQTT_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.broker, "test.mosquitto.org");
        assert_eq!(config.port, 8883);
        assert_eq!(config.topic, "home/gestures");
        assert_eq!(config.credentials(), Some(("idd", "secret")));
        assert!(config.broker_info().has_auth);
    }

    #[test]
    fn test_username_without_password_is_anonymous() {
        let config = MqttConfig::from_lookup(lookup(&[("MQTT_USERNAME", "idd")])).unwrap();
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_bad_port() {
        let result = MqttConfig::from_lookup(lookup(&[("MQTT_PORT", "not-a-port")]));
        assert!(matches!(result, Err(GestureError::Config(_))));
    }

    #[test]
    fn test_wildcard_topic_rejected() {
        let result = MqttConfig::from_lookup(lookup(&[("MQTT_TOPIC", "home/#")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_client_ids_are_unique() {
        let config = MqttConfig::default();
        let a = config.client_id("publisher");
        let b = config.client_id("publisher");
        assert!(a.starts_with("gesture-hub-publisher-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_password_not_serialized() {
        let config = MqttConfig {
            password: "secret".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_partial_tuning_document() {
        let config = ControllerConfig::from_json(
            r#"{"mode_hold_frames": 8, "thresholds": {"pinch_dist": 0.05}}"#,
        )
        .unwrap();

        assert_eq!(config.mode_hold_frames, 8);
        assert_eq!(config.mode_timeout, 5.0);
        assert_eq!(config.thresholds.pinch_dist, 0.05);
        assert_eq!(config.thresholds.point_x_thresh, 0.025);
    }

    #[test]
    fn test_tuning_round_trip() {
        let config = ControllerConfig::default();
        let loaded = ControllerConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_invalid_tuning() {
        assert!(ControllerConfig::from_json(r#"{"mode_hold_frames": 0}"#).is_err());
        assert!(ControllerConfig::from_json(r#"{"action_stable_fraction": 1.5}"#).is_err());
        assert!(ControllerConfig::from_json(r#"{"mode_timeout": -1.0}"#).is_err());
    }
}
