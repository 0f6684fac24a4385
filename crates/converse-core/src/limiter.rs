//! Per-user fixed-window rate limiting.
//!
//! Counters live in process memory (a `DashMap` keyed by user id) and are
//! not persisted across restarts; a window is recreated lazily on the first
//! request after it elapses. The map's entry API serializes updates per
//! key, so concurrent admissions for the same user never observe a stale
//! pre-increment count.
//!
//! Anonymous users (`user_id == "anonymous"`) are exempt from limiting,
//! matching the source system's behavior.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

/// User id exempt from rate limiting.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Per-user window state.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

/// Fixed-window request limiter keyed by user id.
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    /// Create a limiter admitting `max_requests` per `window` per user.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            max_requests,
        }
    }

    /// Defaults from the source system: 10 requests per 60 seconds.
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(60), 10)
    }

    /// Admit or reject a request from `user_id`.
    ///
    /// On rejection the error carries the remaining wait until the window
    /// resets. Rejected calls do not increment the counter, so a burst of
    /// rejections cannot extend starvation into later windows.
    pub fn admit(&self, user_id: &str) -> Result<(), Duration> {
        self.admit_at(user_id, Instant::now())
    }

    /// Admission decision at an explicit point in time (exposed for tests).
    pub fn admit_at(&self, user_id: &str, now: Instant) -> Result<(), Duration> {
        if user_id == ANONYMOUS_USER {
            return Ok(());
        }

        let mut entry = self
            .windows
            .entry(user_id.to_string())
            .or_insert(RateWindow {
                window_start: now,
                count: 0,
            });

        // Elapsed window: start a fresh one with this request counted.
        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 1;
            return Ok(());
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            debug!(
                user_id,
                count = entry.count,
                max = self.max_requests,
                "rate limit check passed"
            );
            Ok(())
        } else {
            let retry_after = self.window - now.duration_since(entry.window_start);
            warn!(
                user_id,
                count = entry.count,
                max = self.max_requests,
                retry_after_secs = retry_after.as_secs(),
                "rate limit exceeded"
            );
            Err(retry_after)
        }
    }
}
