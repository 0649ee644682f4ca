//! Detection loop metrics
//!
//! Counts what the detection loop did with each tick and keeps a rolling
//! window of detection times.

use std::collections::VecDeque;
use std::time::Duration;

/// Point-in-time copy of [`DetectionStats`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionStatsSnapshot {
    /// Ticks where detection ran successfully
    pub frames_processed: u64,
    /// Ticks skipped because the source was not ready
    pub frames_skipped: u64,
    /// Ticks where detection returned an error
    pub frames_failed: u64,
    /// Gesture events emitted
    pub gestures_emitted: u64,
    /// Average detection time over the window in milliseconds
    pub avg_detect_ms: f64,
    /// Worst detection time over the window in milliseconds
    pub max_detect_ms: f64,
}

/// Rolling detection statistics
#[derive(Debug)]
pub struct DetectionStats {
    frames_processed: u64,
    frames_skipped: u64,
    frames_failed: u64,
    gestures_emitted: u64,
    /// Recent detection durations
    detect_times: VecDeque<Duration>,
    /// Maximum samples to keep (5 seconds at 60fps)
    max_samples: usize,
}

impl Default for DetectionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionStats {
    pub fn new() -> Self {
        Self {
            frames_processed: 0,
            frames_skipped: 0,
            frames_failed: 0,
            gestures_emitted: 0,
            detect_times: VecDeque::with_capacity(300),
            max_samples: 300,
        }
    }

    /// Record a successful detection and how many gestures it produced
    pub fn record_detection(&mut self, elapsed: Duration, gestures: usize) {
        self.frames_processed += 1;
        self.gestures_emitted += gestures as u64;
        self.detect_times.push_back(elapsed);
        if self.detect_times.len() > self.max_samples {
            self.detect_times.pop_front();
        }
    }

    pub fn record_skip(&mut self) {
        self.frames_skipped += 1;
    }

    pub fn record_failure(&mut self) {
        self.frames_failed += 1;
    }

    pub fn snapshot(&self) -> DetectionStatsSnapshot {
        let (avg_detect_ms, max_detect_ms) = if self.detect_times.is_empty() {
            (0.0, 0.0)
        } else {
            let times_ms: Vec<f64> = self
                .detect_times
                .iter()
                .map(|d| d.as_secs_f64() * 1000.0)
                .collect();
            let sum: f64 = times_ms.iter().sum();
            let max = times_ms.iter().cloned().fold(0.0, f64::max);
            (sum / times_ms.len() as f64, max)
        };

        DetectionStatsSnapshot {
            frames_processed: self.frames_processed,
            frames_skipped: self.frames_skipped,
            frames_failed: self.frames_failed,
            gestures_emitted: self.gestures_emitted,
            avg_detect_ms,
            max_detect_ms,
        }
    }
}
