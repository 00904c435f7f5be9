//! Frame sources
//!
//! Frames arrive as newline-delimited JSON (`gesture.frame.v1`), either from a
//! file/stdin for replays or from a hand detector subprocess. The detector is
//! any program that prints `READY` once its camera and model are up and then
//! one frame per line on stdout.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::GestureError;
use crate::types::Frame;

/// Handshake line printed by the detector before the first frame
pub const READY_SIGNAL: &str = "READY";

/// Iterator over NDJSON frames. Blank lines are skipped.
pub struct NdjsonFrames<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> NdjsonFrames<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Line number of the most recently read line (1-based)
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for NdjsonFrames<R> {
    type Item = Result<Frame, GestureError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(GestureError::Io(e))),
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            return Some(serde_json::from_str::<Frame>(line).map_err(|e| {
                GestureError::InvalidFrame(format!("line {}: {}", self.line_no, e))
            }));
        }
    }
}

/// How to launch the detector subprocess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub command: String,
    pub args: Vec<String>,
    pub camera_width: u32,
    pub camera_height: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: vec!["hand_detect.py".to_string()],
            camera_width: 640,
            camera_height: 480,
        }
    }
}

impl DetectorConfig {
    /// Environment handed to the detector
    pub fn env(&self, tuning: &ControllerConfig) -> Vec<(&'static str, String)> {
        vec![
            ("GESTURE_CAMERA_WIDTH", self.camera_width.to_string()),
            ("GESTURE_CAMERA_HEIGHT", self.camera_height.to_string()),
            (
                "GESTURE_MIN_DETECTION_CONFIDENCE",
                tuning.min_detection_confidence.to_string(),
            ),
            (
                "GESTURE_MIN_TRACKING_CONFIDENCE",
                tuning.min_tracking_confidence.to_string(),
            ),
        ]
    }
}

/// Running detector subprocess. The child is killed on drop.
pub struct DetectorProcess {
    child: Child,
    frames: NdjsonFrames<BufReader<ChildStdout>>,
}

impl DetectorProcess {
    /// Start the detector and wait for its `READY` line
    pub fn spawn(config: &DetectorConfig, tuning: &ControllerConfig) -> Result<Self, GestureError> {
        info!(command = %config.command, args = ?config.args, "starting hand detector");

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(config.env(tuning))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                GestureError::Detector(format!("failed to start {}: {}", config.command, e))
            })?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                kill(&mut child);
                return Err(GestureError::Detector("detector stdout unavailable".to_string()));
            }
        };
        let mut reader = BufReader::new(stdout);

        let mut ready = String::new();
        let handshake = reader.read_line(&mut ready);
        match handshake {
            Ok(_) if ready.trim() == READY_SIGNAL => {}
            Ok(_) => {
                kill(&mut child);
                return Err(GestureError::Detector(format!(
                    "detector did not signal ready, got: {:?}",
                    ready.trim()
                )));
            }
            Err(e) => {
                kill(&mut child);
                return Err(GestureError::Io(e));
            }
        }

        info!("hand detector ready");
        Ok(Self {
            child,
            frames: NdjsonFrames::new(reader),
        })
    }

    /// Next frame; `None` when the detector exits.
    ///
    /// Frames reporting a detector-side error are logged and passed through
    /// (they carry no hands).
    pub fn next_frame(&mut self) -> Option<Result<Frame, GestureError>> {
        let frame = self.frames.next()?;
        if let Ok(Frame { error: Some(error), .. }) = &frame {
            warn!(error = %error, "detector reported an error");
        }
        Some(frame)
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        kill(&mut self.child);
    }
}

fn kill(child: &mut Child) {
    if let Ok(None) = child.try_wait() {
        if let Err(e) = child.kill() {
            debug!(error = %e, "failed to kill detector");
        }
    }
    let _ = child.wait();
}
