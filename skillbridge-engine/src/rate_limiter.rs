//! Sliding-window rate limiter for outbound completion calls
//!
//! Admission depends only on how many calls were admitted in the trailing
//! window. Bursts at window boundaries are possible; this is a counter, not a
//! token bucket.

use skillbridge_core::{GenerationError, RateLimitConfig};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Shortest sleep between admission checks while throttled.
const MIN_WAIT: Duration = Duration::from_millis(1);

pub struct RateLimiter {
    max_calls: u32,
    time_window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: u32, time_window: Duration) -> Self {
        Self {
            max_calls,
            time_window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_calls, config.time_window)
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    pub fn time_window(&self) -> Duration {
        self.time_window
    }

    fn prune(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = calls.front() {
            if now.duration_since(oldest) >= self.time_window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admit one call if fewer than `max_calls` were admitted in the window.
    /// An admitted call is recorded immediately.
    pub fn allow_call(&self) -> bool {
        let now = Instant::now();
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut calls, now);

        if calls.len() < self.max_calls as usize {
            calls.push_back(now);
            true
        } else {
            false
        }
    }

    /// Time until the oldest recorded call leaves the window.
    /// Zero when a call would be admitted right now.
    pub fn time_until_next_call(&self) -> Duration {
        let now = Instant::now();
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut calls, now);

        if calls.len() < self.max_calls as usize {
            return Duration::ZERO;
        }

        match calls.front() {
            Some(&oldest) => self
                .time_window
                .saturating_sub(now.duration_since(oldest)),
            None => Duration::ZERO,
        }
    }

    /// Calls currently counted against the window.
    pub fn current_calls(&self) -> usize {
        let now = Instant::now();
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut calls, now);
        calls.len()
    }

    /// Wait until a call is admitted, or until `cancel` fires.
    ///
    /// The lock is released while sleeping. Returns how long the caller waited.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Duration, GenerationError> {
        let started = Instant::now();
        loop {
            if self.allow_call() {
                return Ok(started.elapsed());
            }

            let wait = self.time_until_next_call().max(MIN_WAIT);
            tracing::warn!(
                wait_ms = wait.as_millis() as u64,
                max_calls = self.max_calls,
                "Rate limit reached, waiting for the window to slide"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_calls", &self.max_calls)
            .field("time_window", &self.time_window)
            .field("current_calls", &self.current_calls())
            .finish()
    }
}
