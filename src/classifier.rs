//! Per-frame gesture classification
//!
//! Maps one hand's landmarks to a finger count (mode selection) or a named
//! action gesture using fixed geometric thresholds. No temporal state lives
//! here; smoothing happens downstream.

use serde::{Deserialize, Serialize};

use crate::landmarks::{
    FINGER_TIP_PIP, INDEX_MCP, INDEX_PIP, INDEX_TIP, THUMB_IP, THUMB_TIP, WRIST,
};
use crate::types::{ActionGesture, HandLandmarks};

/// Geometric thresholds, in normalized image units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// A finger is up when `tip.y - pip.y` is below this (negative = above)
    pub finger_tip_above_delta: f64,
    /// Minimum horizontal spread between thumb tip and thumb IP joint
    pub thumb_extended_x_min: f64,
    /// Minimum distance between thumb tip and index knuckle
    pub thumb_index_base_dist: f64,
    /// Maximum thumb-tip to index-tip distance for a pinch
    pub pinch_dist: f64,
    /// Dead zone for the pointing direction
    pub point_x_thresh: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            finger_tip_above_delta: -0.06,
            thumb_extended_x_min: 0.035,
            thumb_index_base_dist: 0.08,
            pinch_dist: 0.045,
            point_x_thresh: 0.025,
        }
    }
}

/// Which digits are raised in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    /// Raised non-thumb fingers
    pub fn fingers_up(&self) -> u8 {
        [self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|up| **up)
            .count() as u8
    }

    /// Raised digits including the thumb
    pub fn total(&self) -> u8 {
        self.fingers_up() + u8::from(self.thumb)
    }
}

/// Classifier for finger counts and action gestures
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    thresholds: ClassifierThresholds,
}

impl GestureClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn finger_is_up(&self, hand: &HandLandmarks, tip: usize, pip: usize) -> bool {
        hand.get(tip).y - hand.get(pip).y < self.thresholds.finger_tip_above_delta
    }

    /// Thumb counts as extended only when it is both spread sideways and
    /// clear of the index knuckle, which suppresses phantom counts.
    pub fn thumb_is_extended(&self, hand: &HandLandmarks) -> bool {
        let tip = hand.get(THUMB_TIP);
        (tip.x - hand.get(THUMB_IP).x).abs() > self.thresholds.thumb_extended_x_min
            && tip.distance(hand.get(INDEX_MCP)) > self.thresholds.thumb_index_base_dist
    }

    pub fn is_pinch(&self, hand: &HandLandmarks) -> bool {
        hand.get(THUMB_TIP).distance(hand.get(INDEX_TIP)) < self.thresholds.pinch_dist
    }

    pub fn finger_states(&self, hand: &HandLandmarks) -> FingerStates {
        let [index, middle, ring, pinky] =
            FINGER_TIP_PIP.map(|(tip, pip)| self.finger_is_up(hand, tip, pip));
        FingerStates {
            thumb: self.thumb_is_extended(hand),
            index,
            middle,
            ring,
            pinky,
        }
    }

    /// Raised digits, thumb included (0-5)
    pub fn finger_count(&self, hand: &HandLandmarks) -> u8 {
        self.finger_states(hand).total()
    }

    /// Classify an action gesture.
    ///
    /// Priority: pinch, thumb-only mode switch, open hand, pointing, fist.
    pub fn classify_action(&self, hand: &HandLandmarks) -> Option<ActionGesture> {
        if self.is_pinch(hand) {
            return Some(ActionGesture::Pinch);
        }

        let states = self.finger_states(hand);
        let total = states.total();

        if states.thumb && states.fingers_up() == 0 {
            return Some(ActionGesture::ModeSwitch);
        }
        if states.thumb && total >= 4 {
            return Some(ActionGesture::OpenHand);
        }
        if !states.thumb && total == 1 && states.index {
            return Some(self.pointing_direction(hand));
        }
        if !states.thumb && total == 0 {
            return Some(ActionGesture::Fist);
        }
        None
    }

    /// Weighted horizontal lean of the index finger. A finger inside the dead
    /// zone reads as pointing right.
    fn pointing_direction(&self, hand: &HandLandmarks) -> ActionGesture {
        let tip = hand.get(INDEX_TIP);
        let tip_to_mcp = tip.x - hand.get(INDEX_MCP).x;
        let tip_to_pip = tip.x - hand.get(INDEX_PIP).x;
        let wrist_to_tip = tip.x - hand.get(WRIST).x;

        let combined = tip_to_mcp * 0.6 + tip_to_pip * 0.3 + wrist_to_tip * 0.1;
        if combined > self.thresholds.point_x_thresh {
            ActionGesture::PointLeft
        } else {
            ActionGesture::PointRight
        }
    }
}
