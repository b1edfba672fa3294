//! Dual-window API rate limiter
//!
//! Enforces a daily quota (reset at UTC midnight) and a per-minute quota over
//! a trailing 60-second window. Both the on-demand read path and the polling
//! scheduler call through the same limiter, so the combined call volume stays
//! jointly bounded. A rejected call is never retried internally; the caller
//! decides whether to retry after backoff.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use crate::error::SdkError;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Rate limiter for upstream API calls
#[derive(Debug)]
pub struct ApiRateLimiter {
    max_calls_per_day: u32,
    max_calls_per_minute: u32,
    state: Mutex<LimiterState>,
}

#[derive(Debug)]
struct LimiterState {
    calls_today: u32,
    /// When the daily counter next resets (UTC midnight, epoch millis)
    day_reset_ms: i64,
    /// Timestamps of calls within the trailing minute, oldest first
    window: VecDeque<i64>,
}

impl ApiRateLimiter {
    /// Creates a limiter with the given daily and per-minute quotas
    pub fn new(max_calls_per_day: u32, max_calls_per_minute: u32) -> Result<Self, SdkError> {
        if max_calls_per_day == 0 || max_calls_per_minute == 0 {
            return Err(SdkError::InvalidInput(
                "rate limits must be positive".to_string(),
            ));
        }

        Ok(Self {
            max_calls_per_day,
            max_calls_per_minute,
            state: Mutex::new(LimiterState {
                calls_today: 0,
                // Recomputed on first acquire, then at each midnight crossing
                day_reset_ms: 0,
                window: VecDeque::new(),
            }),
        })
    }

    /// Reserves one API call, or rejects with `RateLimited`
    ///
    /// Check and reservation happen in a single atomic region: a call that
    /// would violate either bound is rejected before being counted.
    pub fn acquire(&self) -> Result<(), SdkError> {
        self.acquire_at(Utc::now().timestamp_millis())
    }

    pub(crate) fn acquire_at(&self, now_ms: i64) -> Result<(), SdkError> {
        let mut state = self.state.lock().expect("rate limiter lock poisoned");

        if now_ms >= state.day_reset_ms {
            debug!(
                calls_today = state.calls_today,
                "Daily rate-limit counter reset"
            );
            state.calls_today = 0;
            state.day_reset_ms = next_utc_midnight(now_ms);
        }

        if state.calls_today >= self.max_calls_per_day {
            return Err(SdkError::RateLimited(format!(
                "daily API limit exceeded: {} calls per day",
                self.max_calls_per_day
            )));
        }

        purge_stale(&mut state.window, now_ms);

        if state.window.len() >= self.max_calls_per_minute as usize {
            return Err(SdkError::RateLimited(format!(
                "per-minute API limit exceeded: {} calls per minute",
                self.max_calls_per_minute
            )));
        }

        state.window.push_back(now_ms);
        state.calls_today += 1;
        Ok(())
    }

    /// Number of calls counted against today's quota
    pub fn calls_today(&self) -> u32 {
        self.state
            .lock()
            .expect("rate limiter lock poisoned")
            .calls_today
    }

    /// Number of calls within the trailing 60 seconds
    pub fn calls_last_minute(&self) -> usize {
        self.calls_last_minute_at(Utc::now().timestamp_millis())
    }

    pub(crate) fn calls_last_minute_at(&self, now_ms: i64) -> usize {
        let mut state = self.state.lock().expect("rate limiter lock poisoned");
        purge_stale(&mut state.window, now_ms);
        state.window.len()
    }
}

/// Drops window timestamps older than one minute
fn purge_stale(window: &mut VecDeque<i64>, now_ms: i64) {
    let cutoff = now_ms - MILLIS_PER_MINUTE;
    while let Some(&oldest) = window.front() {
        if oldest < cutoff {
            window.pop_front();
        } else {
            break;
        }
    }
}

/// Epoch millis of the next UTC midnight after `now_ms`
fn next_utc_midnight(now_ms: i64) -> i64 {
    (now_ms.div_euclid(MILLIS_PER_DAY) + 1) * MILLIS_PER_DAY
}
