//! Error types for Gesture Hub

use thiserror::Error;

/// Errors that can occur while turning frames into commands
#[derive(Debug, Error)]
pub enum GestureError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("MQTT error: {0}")]
    Mqtt(String),

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Unrecognized message: {0}")]
    UnknownMessage(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
