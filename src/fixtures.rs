//! Synthetic hand poses for tests

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::landmarks::*;
use crate::types::{Frame, HandLandmarks, Landmark};

/// Which digits are raised, plus optional index tilt and pinch
#[derive(Debug, Clone, Copy, Default)]
pub struct Pose {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
    /// Horizontal offset of the index tip from its knuckle
    pub index_tilt: f64,
    pub pinch: bool,
}

impl Pose {
    pub fn build(self) -> HandLandmarks {
        let mut lms = [Landmark::default(); LANDMARK_COUNT];

        lms[WRIST] = Landmark::new(0.5, 0.8);
        lms[THUMB_CMC] = Landmark::new(0.44, 0.75);
        lms[THUMB_MCP] = Landmark::new(0.42, 0.70);

        if self.thumb {
            lms[THUMB_IP] = Landmark::new(0.38, 0.62);
            lms[THUMB_TIP] = Landmark::new(0.30, 0.60);
        } else {
            lms[THUMB_IP] = Landmark::new(0.42, 0.65);
            lms[THUMB_TIP] = Landmark::new(0.43, 0.63);
        }

        let fingers = [
            (INDEX_MCP, 0.45, 0.60, self.index),
            (MIDDLE_MCP, 0.50, 0.60, self.middle),
            (RING_MCP, 0.55, 0.60, self.ring),
            (PINKY_MCP, 0.60, 0.62, self.pinky),
        ];
        for (mcp, x, y, raised) in fingers {
            lms[mcp] = Landmark::new(x, y);
            lms[mcp + 1] = Landmark::new(x, y - 0.10);
            if raised {
                lms[mcp + 2] = Landmark::new(x, y - 0.16);
                lms[mcp + 3] = Landmark::new(x, y - 0.22);
            } else {
                lms[mcp + 2] = Landmark::new(x, y - 0.08);
                lms[mcp + 3] = Landmark::new(x, y - 0.05);
            }
        }

        if self.index_tilt != 0.0 {
            let tip = lms[INDEX_TIP];
            lms[INDEX_TIP] = Landmark::new(tip.x + self.index_tilt, tip.y);
        }

        if self.pinch {
            let tip = lms[INDEX_TIP];
            lms[THUMB_TIP] = Landmark::new(tip.x + 0.01, tip.y + 0.01);
        }

        HandLandmarks::new(lms)
    }
}

pub fn open_hand() -> HandLandmarks {
    Pose {
        thumb: true,
        index: true,
        middle: true,
        ring: true,
        pinky: true,
        ..Default::default()
    }
    .build()
}

pub fn fist() -> HandLandmarks {
    Pose::default().build()
}

/// `n` raised fingers (index first), thumb folded
pub fn fingers(n: u8) -> HandLandmarks {
    Pose {
        index: n >= 1,
        middle: n >= 2,
        ring: n >= 3,
        pinky: n >= 4,
        ..Default::default()
    }
    .build()
}

pub fn point_left() -> HandLandmarks {
    Pose {
        index: true,
        index_tilt: 0.08,
        ..Default::default()
    }
    .build()
}

pub fn point_right() -> HandLandmarks {
    Pose {
        index: true,
        index_tilt: -0.08,
        ..Default::default()
    }
    .build()
}

pub fn pinch() -> HandLandmarks {
    Pose {
        index: true,
        pinch: true,
        ..Default::default()
    }
    .build()
}

pub fn thumb_only() -> HandLandmarks {
    Pose {
        thumb: true,
        ..Default::default()
    }
    .build()
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
}

/// Timestamp `ms` milliseconds after [`t0`]
pub fn at_ms(ms: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(ms)
}

/// NDJSON line for a frame at `ms` with an optional hand
pub fn frame_line(ms: i64, hand: Option<&HandLandmarks>) -> String {
    let frame = match hand {
        Some(hand) => Frame::with_hand(at_ms(ms), hand),
        None => Frame::empty(at_ms(ms)),
    };
    serde_json::to_string(&frame).unwrap()
}
