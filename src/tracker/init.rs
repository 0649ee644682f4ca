//! Landmark source initialization with capped exponential backoff

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::LandmarkSource;

/// Retry schedule for source initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt before giving up
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,
    /// Growth factor applied per retry
    pub factor: f64,
    /// Upper bound on any single delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1000,
            factor: 1.5,
            max_delay_ms: 5000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let ms = self.base_delay_ms as f64 * self.factor.powi(retry as i32);
        Duration::from_millis(ms.min(self.max_delay_ms as f64) as u64)
    }
}

/// Initialization lifecycle of a landmark source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InitState {
    #[default]
    Uninitialized,
    /// Attempt `attempt` (1-based) is running or waiting to be retried
    Initializing { attempt: u32 },
    Ready,
    /// Gave up; needs an explicit retry from the user
    Failed { attempts: u32, reason: String },
}

impl InitState {
    pub fn is_ready(&self) -> bool {
        matches!(self, InitState::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, InitState::Failed { .. })
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> Option<String> {
        match self {
            InitState::Uninitialized => None,
            InitState::Initializing { attempt } => {
                Some(format!("Starting hand tracking (attempt {})...", attempt))
            }
            InitState::Ready => None,
            InitState::Failed { .. } => Some(
                "Failed to initialize hand tracking. Retry to try again.".to_string(),
            ),
        }
    }
}

/// Drives a source from `Uninitialized` to `Ready` or `Failed`
#[derive(Debug, Default)]
pub struct Initializer {
    policy: RetryPolicy,
    state: InitState,
    retries: u32,
    retry_at: Option<Instant>,
}

impl Initializer {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &InitState {
        &self.state
    }

    /// When the next retry is due, if one is scheduled
    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Make progress: run an attempt if one is due, otherwise do nothing.
    ///
    /// Never sleeps; a pending retry just leaves the state as is until
    /// `now` reaches the scheduled time.
    pub fn poll<S: LandmarkSource + ?Sized>(&mut self, source: &mut S, now: Instant) -> &InitState {
        if matches!(self.state, InitState::Ready | InitState::Failed { .. }) {
            return &self.state;
        }
        if let Some(at) = self.retry_at {
            if now < at {
                return &self.state;
            }
        }

        let attempt = self.retries + 1;
        self.state = InitState::Initializing { attempt };
        log::info!("Initializing landmark source (attempt {})", attempt);

        match source.initialize() {
            Ok(()) => {
                log::info!("Landmark source initialized");
                self.state = InitState::Ready;
                self.retry_at = None;
            }
            Err(e) => {
                log::error!("Error initializing landmark source: {}", e);
                if self.retries < self.policy.max_retries {
                    let delay = self.policy.delay_for(self.retries);
                    self.retries += 1;
                    self.retry_at = Some(now + delay);
                    log::info!(
                        "Retrying initialization (attempt {}/{}) in {}ms...",
                        self.retries,
                        self.policy.max_retries,
                        delay.as_millis()
                    );
                } else {
                    source.release();
                    self.retry_at = None;
                    self.state = InitState::Failed {
                        attempts: attempt,
                        reason: e.to_string(),
                    };
                }
            }
        }

        &self.state
    }

    /// Back to `Uninitialized` with a fresh retry budget
    pub fn reset(&mut self) {
        self.state = InitState::Uninitialized;
        self.retries = 0;
        self.retry_at = None;
    }
}
