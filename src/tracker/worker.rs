//! Background hand tracking thread
//!
//! Runs a [`DetectionLoop`] at a fixed interval on its own thread so the
//! render thread never waits on the model. Gesture batches cross over a
//! bounded channel; status and stats are shared behind mutexes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, SendTimeoutError, Sender};
use parking_lot::Mutex;

use super::{DetectionLoop, InitState, LandmarkSource, TickOutcome, TrackerConfig, TrackerError};
use crate::gesture::{GestureDetector, HandGesture};
use crate::telemetry::DetectionStatsSnapshot;

/// State shared between the tracker thread and its owner
struct Shared {
    running: AtomicBool,
    finished: AtomicBool,
    retry_requested: AtomicBool,
    /// Set when the thread exits, however it exits
    stopped: AtomicBool,
    status: Mutex<InitState>,
    stats: Mutex<DetectionStatsSnapshot>,
}

/// Marks the tracker stopped when dropped, including during a panic unwind
struct StopGuard<'a>(&'a Shared);

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        self.0.stopped.store(true, Ordering::Release);
    }
}

/// Hand tracker running on a background thread
pub struct HandTracker {
    gesture_rx: Receiver<Vec<HandGesture>>,
    shared: Arc<Shared>,
    thread_handle: Option<JoinHandle<()>>,
}

impl HandTracker {
    /// Start tracking with the given source
    pub fn spawn<S: LandmarkSource + 'static>(
        source: S,
        config: TrackerConfig,
    ) -> Result<Self, TrackerError> {
        let (gesture_tx, gesture_rx) = crossbeam_channel::bounded(config.channel_capacity.max(1));
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            retry_requested: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            status: Mutex::new(InitState::Uninitialized),
            stats: Mutex::new(DetectionStatsSnapshot::default()),
        });

        let shared_clone = shared.clone();
        let thread_handle = std::thread::Builder::new()
            .name("hand-tracker".to_string())
            .spawn(move || {
                let detection = DetectionLoop::new(
                    source,
                    config.retry.clone(),
                    GestureDetector::new(config.gesture.clone()),
                );
                Self::tracker_thread(detection, &config, gesture_tx, &shared_clone);
            })
            .map_err(|e| TrackerError::Spawn(e.to_string()))?;

        Ok(Self {
            gesture_rx,
            shared,
            thread_handle: Some(thread_handle),
        })
    }

    /// Tracker thread main loop.
    ///
    /// The detection loop is dropped on return, which releases the source
    /// whichever way the loop exits.
    fn tracker_thread<S: LandmarkSource>(
        mut detection: DetectionLoop<S>,
        config: &TrackerConfig,
        gesture_tx: Sender<Vec<HandGesture>>,
        shared: &Shared,
    ) {
        let _stop_guard = StopGuard(shared);
        log::info!("Hand tracker thread started");
        let interval = Duration::from_millis(config.frame_interval_ms.max(1));

        'frames: while shared.running.load(Ordering::Acquire) {
            if shared.retry_requested.swap(false, Ordering::AcqRel) {
                detection.reinitialize();
            }

            let outcome = detection.tick(Instant::now());
            *shared.status.lock() = detection.state().clone();
            *shared.stats.lock() = detection.stats();

            match outcome {
                TickOutcome::Gestures(gestures) => {
                    let mut batch = gestures;
                    loop {
                        match gesture_tx.send_timeout(batch, interval) {
                            Ok(()) => break,
                            Err(SendTimeoutError::Timeout(pending)) => {
                                if !shared.running.load(Ordering::Acquire) {
                                    break 'frames;
                                }
                                batch = pending;
                            }
                            Err(SendTimeoutError::Disconnected(_)) => break 'frames,
                        }
                    }
                }
                TickOutcome::Finished => {
                    log::info!("Landmark source finished");
                    shared.finished.store(true, Ordering::Release);
                    break;
                }
                TickOutcome::Failed
                | TickOutcome::Initializing
                | TickOutcome::NotReady
                | TickOutcome::Idle
                | TickOutcome::DetectionFailed => {}
            }

            std::thread::sleep(interval);
        }

        detection.release();
        log::info!("Hand tracker thread stopped");
    }

    /// All gesture batches received since the last call, oldest first
    pub fn drain_gestures(&self) -> Vec<Vec<HandGesture>> {
        self.gesture_rx.try_iter().collect()
    }

    /// Current initialization state of the source
    pub fn status(&self) -> InitState {
        self.shared.status.lock().clone()
    }

    pub fn stats(&self) -> DetectionStatsSnapshot {
        self.shared.stats.lock().clone()
    }

    /// Whether the source ran out of frames
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    /// Whether the tracker thread has exited, either normally or by panicking
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire) && !self.is_stopped()
    }

    /// Ask the tracker to release the source and initialize it again with a
    /// fresh retry budget
    pub fn retry(&self) {
        log::info!("Hand tracking retry requested");
        self.shared.retry_requested.store(true, Ordering::Release);
    }

    /// Stop the tracker thread and wait for it to release the source
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Hand tracker thread panicked");
            }
        }
    }
}

impl Drop for HandTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
