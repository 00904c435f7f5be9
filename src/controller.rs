//! Mode-lock state machine
//!
//! Turns a stream of per-frame hand observations into a debounced command
//! stream. Two phases:
//!
//! - **select mode**: hold up 1-4 fingers steadily to lock Temperature,
//!   Lights, Blinds or Door.
//! - **locked mode**: open hand, fist and pointing fire commands; a held
//!   pinch or a thumb-only gesture returns to selection, and so does
//!   inactivity past the mode timeout.
//!
//! All timing is driven by the frame timestamps passed to [`GestureController::step`],
//! so replays behave exactly like live runs.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::classifier::GestureClassifier;
use crate::config::ControllerConfig;
use crate::mode::CommandMapper;
use crate::smoother::RollingVote;
use crate::types::{ActionGesture, Command, ControllerPhase, ExitReason, HandLandmarks, Mode};

/// Share a finger count needs to be reported alongside a command
const REPORTED_COUNT_FRACTION: f64 = 0.6;

/// Something the controller wants the outside world to know about
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A stable finger count now points at a different mode
    ModePreview { mode: Mode, finger_count: u8 },
    /// Mode held long enough and is now locked
    ModeLocked { mode: Mode, finger_count: u8 },
    /// Back to mode selection
    ModeExited { mode: Mode, reason: ExitReason },
    /// Command ready to publish
    Command {
        command: Command,
        finger_count: Option<u8>,
        at: DateTime<Utc>,
    },
    /// Stable gesture with no meaning in the locked mode
    InvalidAction { mode: Mode, action: ActionGesture },
}

/// Debouncing mode/action state machine
#[derive(Debug, Clone)]
pub struct GestureController {
    config: ControllerConfig,
    classifier: GestureClassifier,
    mode_votes: RollingVote<u8>,
    action_votes: RollingVote<ActionGesture>,

    locked_mode: Option<Mode>,
    lock_time: Option<DateTime<Utc>>,
    hold_frames: u32,
    last_count: Option<u8>,
    preview: Option<Mode>,

    last_action: Option<ActionGesture>,
    last_fire: Option<DateTime<Utc>>,
    pinch_start: Option<DateTime<Utc>>,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl GestureController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            classifier: GestureClassifier::new(config.thresholds.clone()),
            mode_votes: RollingVote::new(config.mode_buffer_size),
            action_votes: RollingVote::new(config.action_buffer_size),
            config,
            locked_mode: None,
            lock_time: None,
            hold_frames: 0,
            last_count: None,
            preview: None,
            last_action: None,
            last_fire: None,
            pinch_start: None,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn phase(&self) -> ControllerPhase {
        if self.locked_mode.is_some() {
            ControllerPhase::LockedMode
        } else {
            ControllerPhase::SelectMode
        }
    }

    pub fn locked_mode(&self) -> Option<Mode> {
        self.locked_mode
    }

    /// Best-effort stable finger count from the selection window
    pub fn stable_finger_count(&self) -> Option<u8> {
        self.mode_votes
            .stable_value(self.config.mode_stable_min, REPORTED_COUNT_FRACTION)
    }

    /// Drop all state and return to mode selection
    pub fn reset(&mut self) {
        self.unlock();
        self.action_votes.clear();
        self.last_fire = None;
    }

    /// Feed one frame. `hand` is `None` when no usable hand was detected.
    pub fn step(&mut self, hand: Option<&HandLandmarks>, now: DateTime<Utc>) -> Vec<ControllerEvent> {
        match self.locked_mode {
            None => self.step_select(hand, now),
            Some(mode) => self.step_locked(mode, hand, now),
        }
    }

    fn step_select(&mut self, hand: Option<&HandLandmarks>, now: DateTime<Utc>) -> Vec<ControllerEvent> {
        let mut events = Vec::new();

        let Some(hand) = hand else {
            self.mode_votes.push(None);
            self.reset_hold();
            return events;
        };

        let count = self.classifier.finger_count(hand);
        self.mode_votes.push(Some(count));
        let stable = self
            .mode_votes
            .stable_value(self.config.mode_stable_min, self.config.mode_stable_fraction);

        let Some((count, mode)) = stable.and_then(|c| Mode::from_finger_count(c).map(|m| (c, m)))
        else {
            self.reset_hold();
            return events;
        };

        if self.preview != Some(mode) {
            self.preview = Some(mode);
            debug!(mode = %mode, finger_count = count, "mode preview");
            events.push(ControllerEvent::ModePreview {
                mode,
                finger_count: count,
            });
        }

        if self.last_count == Some(count) {
            self.hold_frames += 1;
        } else {
            self.hold_frames = 1;
            self.last_count = Some(count);
        }

        if self.hold_frames >= self.config.mode_hold_frames {
            self.locked_mode = Some(mode);
            self.lock_time = Some(now);
            self.hold_frames = 0;
            self.action_votes.clear();
            self.last_action = None;
            self.pinch_start = None;
            info!(mode = %mode, "mode locked; waiting for action gesture");
            events.push(ControllerEvent::ModeLocked {
                mode,
                finger_count: count,
            });
        }

        events
    }

    fn step_locked(
        &mut self,
        mode: Mode,
        hand: Option<&HandLandmarks>,
        now: DateTime<Utc>,
    ) -> Vec<ControllerEvent> {
        let lock_time = self.lock_time.unwrap_or(now);
        if seconds_between(lock_time, now) >= self.config.mode_timeout {
            return vec![self.exit(mode, ExitReason::Timeout)];
        }

        let observed = hand.and_then(|h| self.classifier.classify_action(h));
        self.action_votes.push(observed);
        let action = self
            .action_votes
            .stable_value(self.config.action_stable_min, self.config.action_stable_fraction);

        if action == Some(ActionGesture::Pinch) {
            match self.pinch_start {
                None => self.pinch_start = Some(now),
                Some(start) if seconds_between(start, now) >= self.config.exit_pinch_hold => {
                    return vec![self.exit(mode, ExitReason::PinchHold)];
                }
                Some(_) => {}
            }
            return Vec::new();
        }
        self.pinch_start = None;

        let Some(action) = action else {
            return Vec::new();
        };

        if action == ActionGesture::ModeSwitch {
            return vec![self.exit(mode, ExitReason::ModeSwitch)];
        }

        if !self.should_fire(action, now) {
            return Vec::new();
        }
        let repeated = self.last_action == Some(action);
        self.last_action = Some(action);

        match CommandMapper::map_to_command(mode, action) {
            Some(command) => {
                self.last_fire = Some(now);
                // Activity keeps the session alive
                self.lock_time = Some(now);
                info!(
                    category = %command.category,
                    value = %command.value,
                    "command"
                );
                vec![ControllerEvent::Command {
                    command,
                    finger_count: self.stable_finger_count(),
                    at: now,
                }]
            }
            // Report a rejected gesture once per run, not on every repeat
            None if repeated => Vec::new(),
            None => {
                warn!(action = %action, mode = %mode, "action has no command in this mode");
                vec![ControllerEvent::InvalidAction { mode, action }]
            }
        }
    }

    /// A new action needs the cooldown to have passed; the same action only
    /// repeats when it is a slide held past the repeat interval.
    fn should_fire(&self, action: ActionGesture, now: DateTime<Utc>) -> bool {
        let since_last = self
            .last_fire
            .map(|t| seconds_between(t, now))
            .unwrap_or(f64::INFINITY);

        if self.last_action != Some(action) {
            since_last >= self.config.action_cooldown
        } else {
            action.is_slide() && since_last >= self.config.slide_repeat_interval
        }
    }

    fn exit(&mut self, mode: Mode, reason: ExitReason) -> ControllerEvent {
        info!(mode = %mode, reason = ?reason, "returning to mode selection");
        self.unlock();
        ControllerEvent::ModeExited { mode, reason }
    }

    fn unlock(&mut self) {
        self.locked_mode = None;
        self.lock_time = None;
        self.last_action = None;
        self.pinch_start = None;
        self.preview = None;
        self.mode_votes.clear();
        self.reset_hold();
    }

    fn reset_hold(&mut self) {
        self.hold_frames = 0;
        self.last_count = None;
    }
}

fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}
