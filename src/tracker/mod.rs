//! Hand tracking
//!
//! A [`LandmarkSource`] wraps the landmark model (and whatever camera feeds
//! it). [`DetectionLoop`] drives a source one tick at a time: bring it up
//! with retries, detect, and turn landmarks into gestures.
//! [`HandTracker`] runs that loop on its own thread and hands gesture
//! batches to the render thread over a channel.

pub mod detection;
pub mod init;
pub mod replay;
pub mod worker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gesture::GestureConfig;
use crate::hand::HandLandmarks;

pub use detection::{DetectionLoop, TickOutcome};
pub use init::{InitState, Initializer, RetryPolicy};
pub use replay::{RecordedFrame, Recording, ReplaySource};
pub use worker::HandTracker;

/// Errors from a landmark source or the tracker around it
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Landmark backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("Landmark model initialization timed out: {0}")]
    Timeout(String),
    #[error("Landmark source is not ready")]
    NotReady,
    #[error("Hand detection failed: {0}")]
    Detection(String),
    #[error("Failed to read recording: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse recording: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to spawn tracker thread: {0}")]
    Spawn(String),
}

/// A producer of hand landmarks, one call per frame
pub trait LandmarkSource: Send {
    /// Bring up the model and its inputs. Called again after a failure,
    /// so implementations must tolerate repeated calls.
    fn initialize(&mut self) -> Result<(), TrackerError>;

    /// Whether a frame can be detected right now (model loaded and the
    /// camera producing frames)
    fn is_ready(&self) -> bool;

    /// Detect hands in the current frame. `timestamp_ms` increases strictly
    /// between calls.
    fn detect(&mut self, timestamp_ms: u64) -> Result<Vec<HandLandmarks>, TrackerError>;

    /// Release the model and any devices. Must be safe to call more than once.
    fn release(&mut self);

    /// Whether the source has run out of frames for good
    fn is_finished(&self) -> bool {
        false
    }
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn initialize(&mut self) -> Result<(), TrackerError> {
        (**self).initialize()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn detect(&mut self, timestamp_ms: u64) -> Result<Vec<HandLandmarks>, TrackerError> {
        (**self).detect(timestamp_ms)
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

/// Hand tracker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Pause between detection ticks in milliseconds
    pub frame_interval_ms: u64,
    /// Gesture batches buffered between the tracker and the render thread
    pub channel_capacity: usize,
    pub retry: RetryPolicy,
    pub gesture: GestureConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            channel_capacity: 8,
            retry: RetryPolicy::default(),
            gesture: GestureConfig::default(),
        }
    }
}
