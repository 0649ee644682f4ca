//! One-tick-at-a-time detection loop
//!
//! Each tick either makes initialization progress, skips because the source
//! is not ready, or detects one frame and runs gesture detection on it.
//! Per-frame errors are logged and skipped; only initialization can end in
//! a terminal state.

use std::time::{Duration, Instant};

use super::{InitState, Initializer, LandmarkSource, RetryPolicy};
use crate::gesture::{GestureDetector, HandGesture};
use crate::telemetry::{DetectionStats, DetectionStatsSnapshot};

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Source is still coming up (or waiting out a retry delay)
    Initializing,
    /// Initialization gave up
    Failed,
    /// Source initialized but cannot produce a frame yet
    NotReady,
    /// Detection ran and nothing changed
    Idle,
    /// Detection ran and produced gestures
    Gestures(Vec<HandGesture>),
    /// Detection raised an error for this frame
    DetectionFailed,
    /// Source has no more frames
    Finished,
}

/// Detection pipeline around a [`LandmarkSource`]
///
/// The source is released when the loop is dropped, whatever the reason.
pub struct DetectionLoop<S: LandmarkSource> {
    source: S,
    init: Initializer,
    detector: GestureDetector,
    stats: DetectionStats,
    epoch: Instant,
    last_timestamp_ms: Option<u64>,
    released: bool,
}

impl<S: LandmarkSource> DetectionLoop<S> {
    pub fn new(source: S, retry: RetryPolicy, detector: GestureDetector) -> Self {
        Self {
            source,
            init: Initializer::new(retry),
            detector,
            stats: DetectionStats::new(),
            epoch: Instant::now(),
            last_timestamp_ms: None,
            released: false,
        }
    }

    pub fn state(&self) -> &InitState {
        self.init.state()
    }

    pub fn stats(&self) -> DetectionStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn detector(&self) -> &GestureDetector {
        &self.detector
    }

    /// Run one tick at time `now`
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if !self.init.state().is_ready() {
            self.released = false;
            match self.init.poll(&mut self.source, now) {
                InitState::Ready => {}
                InitState::Failed { .. } => {
                    self.released = true;
                    return TickOutcome::Failed;
                }
                _ => return TickOutcome::Initializing,
            }
        }

        if self.source.is_finished() {
            return TickOutcome::Finished;
        }

        if !self.source.is_ready() {
            self.stats.record_skip();
            return TickOutcome::NotReady;
        }

        let timestamp_ms = self.next_timestamp(now);
        let started = Instant::now();
        match self.source.detect(timestamp_ms) {
            Ok(hands) => {
                let gestures = self.detector.process_frame(&hands);
                self.stats.record_detection(started.elapsed(), gestures.len());
                if gestures.is_empty() {
                    TickOutcome::Idle
                } else {
                    TickOutcome::Gestures(gestures)
                }
            }
            Err(e) => {
                log::error!("Error in hand detection: {}", e);
                self.stats.record_failure();
                TickOutcome::DetectionFailed
            }
        }
    }

    /// Strictly increasing milliseconds since the loop was created
    fn next_timestamp(&mut self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.epoch).as_millis() as u64;
        let timestamp = match self.last_timestamp_ms {
            Some(last) if elapsed <= last => last + 1,
            _ => elapsed,
        };
        self.last_timestamp_ms = Some(timestamp);
        timestamp
    }

    /// Release the source and start initialization over with a fresh retry
    /// budget and clean gesture state
    pub fn reinitialize(&mut self) {
        log::info!("Re-initializing landmark source");
        self.release();
        self.init.reset();
        self.detector.reset();
    }

    /// Release the source now
    pub fn release(&mut self) {
        if !self.released {
            self.source.release();
            self.released = true;
        }
    }

    /// Time until the next scheduled initialization retry, if one is pending
    pub fn retry_delay(&self, now: Instant) -> Option<Duration> {
        self.init.retry_at().map(|at| at.saturating_duration_since(now))
    }
}

impl<S: LandmarkSource> Drop for DetectionLoop<S> {
    fn drop(&mut self) {
        self.release();
    }
}
