//! Recorded landmark playback
//!
//! Stands in for a live camera and model: frames come from a JSON recording
//! instead.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{LandmarkSource, TrackerError};
use crate::hand::HandLandmarks;

/// One recorded frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
}

/// A sequence of recorded frames
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        let content = fs::read_to_string(path)?;
        let recording: Recording = serde_json::from_str(&content)?;
        log::info!("Loaded recording with {} frames from {:?}", recording.frames.len(), path);
        Ok(recording)
    }

    pub fn save(&self, path: &Path) -> Result<(), TrackerError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Plays back a [`Recording`] one frame per detect call
#[derive(Debug, Clone)]
pub struct ReplaySource {
    frames: Vec<RecordedFrame>,
    cursor: usize,
    ready: bool,
    looping: bool,
    /// Initialization attempts left to fail, to exercise retry handling
    failing_inits: u32,
}

impl ReplaySource {
    pub fn new(recording: Recording) -> Self {
        Self {
            frames: recording.frames,
            cursor: 0,
            ready: false,
            looping: false,
            failing_inits: 0,
        }
    }

    pub fn from_hands(frames: Vec<Vec<HandLandmarks>>) -> Self {
        Self::new(Recording {
            frames: frames.into_iter().map(|hands| RecordedFrame { hands }).collect(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, TrackerError> {
        Ok(Self::new(Recording::load(path)?))
    }

    /// Restart from the first frame instead of finishing
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Fail the next `count` initializations
    pub fn failing_inits(mut self, count: u32) -> Self {
        self.failing_inits = count;
        self
    }

    pub fn frames_played(&self) -> usize {
        self.cursor
    }
}

impl LandmarkSource for ReplaySource {
    fn initialize(&mut self) -> Result<(), TrackerError> {
        if self.failing_inits > 0 {
            self.failing_inits -= 1;
            return Err(TrackerError::BackendUnavailable(
                "replay backend configured to fail".to_string(),
            ));
        }
        self.ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn detect(&mut self, _timestamp_ms: u64) -> Result<Vec<HandLandmarks>, TrackerError> {
        if !self.ready {
            return Err(TrackerError::NotReady);
        }
        if self.cursor >= self.frames.len() {
            if self.looping && !self.frames.is_empty() {
                self.cursor = 0;
            } else {
                return Ok(Vec::new());
            }
        }
        let hands = self.frames[self.cursor].hands.clone();
        self.cursor += 1;
        Ok(hands)
    }

    fn release(&mut self) {
        self.ready = false;
    }

    fn is_finished(&self) -> bool {
        !self.looping && self.cursor >= self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{Handedness, Landmark};

    fn hand(x: f32) -> HandLandmarks {
        HandLandmarks::with_tips(Landmark::new(x, 0.5, 0.0), Landmark::new(x, 0.5, 0.0))
    }

    #[test]
    fn test_plays_frames_in_order() {
        let mut source =
            ReplaySource::from_hands(vec![vec![hand(0.1)], vec![], vec![hand(0.3), hand(0.4)]]);
        assert!(!source.is_ready());
        assert!(matches!(source.detect(0), Err(TrackerError::NotReady)));

        source.initialize().unwrap();
        assert_eq!(source.detect(1).unwrap(), vec![hand(0.1)]);
        assert!(source.detect(2).unwrap().is_empty());
        assert!(!source.is_finished());
        assert_eq!(source.detect(3).unwrap().len(), 2);
        assert!(source.is_finished());
        assert!(source.detect(4).unwrap().is_empty());
        assert_eq!(source.frames_played(), 3);
    }

    #[test]
    fn test_looping() {
        let mut source =
            ReplaySource::from_hands(vec![vec![hand(0.1)], vec![hand(0.2)]]).looping(true);
        source.initialize().unwrap();
        let xs: Vec<f32> = (0..5)
            .map(|t| source.detect(t).unwrap()[0].landmarks()[4].x)
            .collect();
        assert_eq!(xs, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
        assert!(!source.is_finished());
        assert_eq!(source.frames_played(), 1);
    }

    #[test]
    fn test_failing_inits() {
        let mut source = ReplaySource::from_hands(vec![]).failing_inits(2);
        assert!(source.initialize().is_err());
        assert!(source.initialize().is_err());
        assert!(source.initialize().is_ok());
        source.release();
        assert!(!source.is_ready());
    }

    #[test]
    fn test_recording_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("hand-ar-recording-{}.json", std::process::id()));
        let recording = Recording {
            frames: vec![
                RecordedFrame {
                    hands: vec![hand(0.25).with_handedness(Handedness::Left)],
                },
                RecordedFrame::default(),
            ],
        };
        recording.save(&path).unwrap();
        let source = ReplaySource::from_file(&path);
        let _ = std::fs::remove_file(&path);

        let mut source = source.unwrap();
        source.initialize().unwrap();
        let hands = source.detect(0).unwrap();
        assert_eq!(hands[0].handedness, Handedness::Left);
        assert_eq!(hands, vec![hand(0.25).with_handedness(Handedness::Left)]);
    }

    #[test]
    fn test_bad_recording() {
        let path = std::env::temp_dir().join(format!("hand-ar-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{\"frames\": [{\"hands\": [{\"landmarks\": []}]}]}").unwrap();
        let result = ReplaySource::from_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(TrackerError::Parse(_))));

        let missing = std::env::temp_dir().join("hand-ar-does-not-exist.json");
        assert!(matches!(ReplaySource::from_file(&missing), Err(TrackerError::Io(_))));
    }
}
