//! Pipeline orchestration
//!
//! Ties the stages together: frame → primary hand → controller → encoder →
//! sink. [`GestureProcessor`] is the long-lived form used by the live loop;
//! [`frames_to_commands`] replays a recorded NDJSON session in one call.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ControllerConfig, DEFAULT_TOPIC};
use crate::controller::{ControllerEvent, GestureController};
use crate::encoder::CommandEncoder;
use crate::error::GestureError;
use crate::source::NdjsonFrames;
use crate::transport::{CommandSink, MemorySink};
use crate::types::{ControllerPhase, Frame};

/// Counters for a processing session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    pub frames: u64,
    pub hands_seen: u64,
    pub commands_published: u64,
    pub telemetry_published: u64,
    pub publish_failures: u64,
}

/// Stateful frame processor publishing to a [`CommandSink`]
pub struct GestureProcessor<S: CommandSink> {
    controller: GestureController,
    encoder: CommandEncoder,
    sink: S,
    topic: String,
    telemetry: bool,
    stats: ProcessorStats,
}

impl<S: CommandSink> GestureProcessor<S> {
    pub fn new(config: ControllerConfig, sink: S, topic: impl Into<String>) -> Self {
        Self {
            controller: GestureController::new(config),
            encoder: CommandEncoder::new(),
            sink,
            topic: topic.into(),
            telemetry: false,
            stats: ProcessorStats::default(),
        }
    }

    /// Also publish mode preview/lock/exit transitions
    pub fn with_telemetry(mut self, telemetry: bool) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Process a frame, stamping it with the current time when it has none
    pub fn process_frame(&mut self, frame: &Frame) -> Vec<ControllerEvent> {
        let now = frame.timestamp.unwrap_or_else(Utc::now);
        self.process_frame_at(frame, now)
    }

    /// Process a frame observed at `now`.
    ///
    /// Publish failures are logged and counted; the controller state is not
    /// rolled back.
    pub fn process_frame_at(&mut self, frame: &Frame, now: DateTime<Utc>) -> Vec<ControllerEvent> {
        self.stats.frames += 1;

        let min_confidence = self.controller.config().min_detection_confidence;
        let hand = frame.primary_hand(min_confidence);
        if hand.is_some() {
            self.stats.hands_seen += 1;
        }

        let events = self.controller.step(hand.as_ref(), now);
        for event in &events {
            self.publish_event(event, now);
        }
        events
    }

    fn publish_event(&mut self, event: &ControllerEvent, now: DateTime<Utc>) {
        let (payload, is_command) = match event {
            ControllerEvent::Command {
                command,
                finger_count,
                at,
            } => (self.encoder.encode_command(command, *finger_count, *at), true),
            ControllerEvent::InvalidAction { .. } => return,
            _ if !self.telemetry => return,
            _ => match self.encoder.encode_telemetry(event, now) {
                Ok(Some(json)) => (Ok(json), false),
                Ok(None) => return,
                Err(e) => (Err(e), false),
            },
        };

        let result = payload.and_then(|json| {
            debug!(topic = %self.topic, payload = %json, "publish");
            self.sink.publish(&self.topic, &json)
        });

        match result {
            Ok(()) if is_command => self.stats.commands_published += 1,
            Ok(()) => self.stats.telemetry_published += 1,
            Err(e) => {
                warn!(error = %e, "failed to publish");
                self.stats.publish_failures += 1;
            }
        }
    }

    pub fn stats(&self) -> &ProcessorStats {
        &self.stats
    }

    pub fn phase(&self) -> ControllerPhase {
        self.controller.phase()
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Replay an NDJSON session and return the command payloads it produces.
///
/// Frames without a timestamp are placed `frame_sleep` after the previous
/// one. Malformed lines are logged and skipped.
///
/// # Example
/// ```ignore
/// let commands = frames_to_commands(&recorded, &ControllerConfig::default())?;
/// ```
pub fn frames_to_commands(
    ndjson: &str,
    config: &ControllerConfig,
) -> Result<Vec<String>, GestureError> {
    Ok(replay(ndjson, config, false)?
        .published
        .into_iter()
        .map(|(_, payload)| payload)
        .collect())
}

/// Replay into a [`MemorySink`], optionally with telemetry
pub fn replay(
    ndjson: &str,
    config: &ControllerConfig,
    telemetry: bool,
) -> Result<MemorySink, GestureError> {
    config.validate()?;

    let mut processor = GestureProcessor::new(config.clone(), MemorySink::new(), DEFAULT_TOPIC)
        .with_telemetry(telemetry);

    let step = Duration::milliseconds((config.frame_sleep * 1000.0).round() as i64);
    let mut clock: Option<DateTime<Utc>> = None;

    for frame in NdjsonFrames::new(ndjson.as_bytes()) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "skipping frame");
                continue;
            }
        };

        let now = match (frame.timestamp, clock) {
            (Some(ts), _) => ts,
            (None, Some(prev)) => prev + step,
            (None, None) => Utc::now(),
        };
        clock = Some(now);

        processor.process_frame_at(&frame, now);
    }

    Ok(processor.into_sink())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, frame_line};
    use crate::types::{HandLandmarks, HubMessage, InboundMessage};
    use serde_json::Value;

    /// NDJSON session of 50ms frames, one run per `(hand, frames)` part
    fn session(parts: &[(Option<&HandLandmarks>, usize)]) -> String {
        let mut lines = Vec::new();
        let mut ms = 0;
        for (hand, frames) in parts {
            for _ in 0..*frames {
                lines.push(frame_line(ms, *hand));
                ms += 50;
            }
        }
        lines.join("\n")
    }

    #[test]
    fn test_frames_to_commands() {
        let two = fixtures::fingers(2);
        let open = fixtures::open_hand();
        let fist = fixtures::fist();
        let input = session(&[(Some(&two), 10), (Some(&open), 10), (Some(&fist), 10)]);

        let commands = frames_to_commands(&input, &ControllerConfig::default()).unwrap();
        assert_eq!(commands.len(), 2);

        let first: Value = serde_json::from_str(&commands[0]).unwrap();
        assert_eq!(first["type"], "gesture_command");
        assert_eq!(first["category"], "LIGHTS");
        assert_eq!(first["value"], "ON");
        assert_eq!(first["finger_count"], 2);

        let second: Value = serde_json::from_str(&commands[1]).unwrap();
        assert_eq!(second["value"], "OFF");
    }

    #[test]
    fn test_empty_input() {
        let commands = frames_to_commands("", &ControllerConfig::default()).unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let two = fixtures::fingers(2);
        let open = fixtures::open_hand();
        let mut input = session(&[(Some(&two), 10), (Some(&open), 10)]);
        input.insert_str(0, "{broken\n");

        let commands = frames_to_commands(&input, &ControllerConfig::default()).unwrap();
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ControllerConfig {
            mode_hold_frames: 0,
            ..Default::default()
        };
        assert!(frames_to_commands("", &config).is_err());
    }

    #[test]
    fn test_untimed_frames_use_frame_sleep() {
        let two = fixtures::fingers(2);
        let open = fixtures::open_hand();

        // Strip timestamps; 10 frames at 50ms is well under the 5s timeout
        let input: String = [(&two, 10), (&open, 10)]
            .iter()
            .flat_map(|(hand, n)| {
                (0..*n).map(move |_| {
                    let mut frame: Value = serde_json::from_str(&frame_line(0, Some(*hand))).unwrap();
                    frame.as_object_mut().unwrap().remove("timestamp");
                    frame.to_string() + "\n"
                })
            })
            .collect();

        let commands = frames_to_commands(&input, &ControllerConfig::default()).unwrap();
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_telemetry_replay() {
        let three = fixtures::fingers(3);
        let thumb = fixtures::thumb_only();
        let input = session(&[(Some(&three), 8), (Some(&thumb), 5)]);

        let sink = replay(&input, &ControllerConfig::default(), true).unwrap();
        let encoder = CommandEncoder::new();
        let events: Vec<String> = sink
            .payloads()
            .iter()
            .map(|p| match encoder.decode_inbound(p.as_bytes()).unwrap() {
                InboundMessage::Hub(HubMessage::GestureTelemetry(t)) => {
                    serde_json::to_value(t.event).unwrap().as_str().unwrap().to_string()
                }
                other => panic!("unexpected {other:?}"),
            })
            .collect();

        assert_eq!(events, vec!["mode_preview", "mode_locked", "mode_exited"]);
    }

    #[test]
    fn test_processor_counts_and_survives_publish_failures() {
        let sink = MemorySink {
            fail_next: 1,
            ..Default::default()
        };
        let mut processor = GestureProcessor::new(ControllerConfig::default(), sink, "home/gestures");

        let two = fixtures::fingers(2);
        let open = fixtures::open_hand();
        let fist = fixtures::fist();
        let mut ms = 0;
        for (hand, frames) in [(&two, 10), (&open, 10), (&fist, 10)] {
            for _ in 0..frames {
                processor.process_frame_at(
                    &Frame::with_hand(fixtures::at_ms(ms), hand),
                    fixtures::at_ms(ms),
                );
                ms += 50;
            }
        }
        processor.process_frame(&Frame::empty(fixtures::at_ms(ms)));

        let stats = processor.stats().clone();
        assert_eq!(stats.frames, 31);
        assert_eq!(stats.hands_seen, 30);
        assert_eq!(stats.publish_failures, 1);
        assert_eq!(stats.commands_published, 1);
        assert_eq!(stats.telemetry_published, 0);

        let sink = processor.into_sink();
        assert_eq!(sink.published.len(), 1);
        assert_eq!(sink.published[0].0, "home/gestures");
    }

    #[test]
    fn test_low_confidence_hand_is_ignored() {
        let mut hand = fixtures::fingers(2);
        hand.score = 0.3;
        let mut processor = GestureProcessor::new(ControllerConfig::default(), MemorySink::new(), DEFAULT_TOPIC);

        for ms in (0..1000).step_by(50) {
            processor.process_frame(&Frame::with_hand(fixtures::at_ms(ms), &hand));
        }
        assert_eq!(processor.stats().hands_seen, 0);
        assert_eq!(processor.phase(), ControllerPhase::SelectMode);
    }
}
