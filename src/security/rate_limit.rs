//! Fixed-window request quota.
//!
//! # Responsibilities
//! - Admit at most `quota` calls per window
//! - Roll the window over lazily on the first call past its end
//!
//! # Design Decisions
//! - Check-and-increment is one critical section; no lost updates
//! - The call that rolls the window over is admitted and counts as the
//!   first request of the new window
//! - Uses `tokio::time::Instant` so tests can drive the clock

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Decides whether an incoming call must be rejected.
pub trait Limiter: Send + Sync {
    /// Returns `true` when the call must be rejected.
    fn did_limit_exceed(&self) -> bool;
}

struct Window {
    end: Instant,
    requests: u32,
}

/// Process-wide fixed-window limiter.
pub struct FixedWindowLimiter {
    quota: u32,
    duration: Duration,
    window: Mutex<Window>,
}

impl FixedWindowLimiter {
    pub fn new(quota: u32, duration: Duration) -> Self {
        Self {
            quota,
            duration,
            window: Mutex::new(Window {
                end: Instant::now() + duration,
                requests: 0,
            }),
        }
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn window(&self) -> Duration {
        self.duration
    }

    /// Requests counted in the current window.
    pub fn requests(&self) -> u32 {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
    }
}

impl Limiter for FixedWindowLimiter {
    fn did_limit_exceed(&self) -> bool {
        let now = Instant::now();
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);

        if now <= window.end {
            if window.requests >= self.quota {
                return true;
            }
            window.requests += 1;
        } else {
            window.end = now + self.duration;
            window.requests = 1;
            tracing::trace!(quota = self.quota, "Rate limit window rolled over");
        }

        false
    }
}

impl std::fmt::Debug for FixedWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedWindowLimiter")
            .field("quota", &self.quota)
            .field("duration", &self.duration)
            .field("requests", &self.requests())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn rejects_call_past_quota() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(!limiter.did_limit_exceed());
        }
        assert!(limiter.did_limit_exceed());
        assert!(limiter.did_limit_exceed());
        assert_eq!(limiter.requests(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn window_rollover_admits_and_resets_to_one() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(60));
        assert!(!limiter.did_limit_exceed());
        assert!(!limiter.did_limit_exceed());
        assert!(limiter.did_limit_exceed());

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(!limiter.did_limit_exceed());
        assert_eq!(limiter.requests(), 1);
        assert!(!limiter.did_limit_exceed());
        assert!(limiter.did_limit_exceed());
    }

    #[tokio::test(start_paused = true)]
    async fn window_end_is_inclusive() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(10));
        assert!(!limiter.did_limit_exceed());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(limiter.did_limit_exceed());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!limiter.did_limit_exceed());
    }

    #[test]
    fn concurrent_callers_never_exceed_quota() {
        let limiter = Arc::new(FixedWindowLimiter::new(50, Duration::from_secs(3600)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..20).filter(|_| !limiter.did_limit_exceed()).count())
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, 50);
    }
}
