//! Sliding-window rate limiting
//!
//! Each key gets an independent budget of `max_calls` within any rolling
//! `window_seconds` interval.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::error::{Result, ServerError};

/// Sliding-window call counter keyed by operation identity
pub struct RateLimiter {
    calls: Mutex<HashMap<String, VecDeque<f64>>>,
    max_calls: u32,
    window_seconds: u64,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::ConfigInvalid`] if either value is zero.
    pub fn new(max_calls: u32, window_seconds: u64) -> Result<Self> {
        if max_calls == 0 {
            return Err(ServerError::ConfigInvalid {
                field: "max_calls".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if window_seconds == 0 {
            return Err(ServerError::ConfigInvalid {
                field: "window_seconds".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            calls: Mutex::new(HashMap::new()),
            max_calls,
            window_seconds,
        })
    }

    /// Record a call for `key` if it fits in the budget
    ///
    /// Rejected calls do not consume budget.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, now_seconds())
    }

    /// Same as [`check`](Self::check) with an explicit clock
    pub fn check_at(&self, key: &str, now: f64) -> bool {
        #[allow(clippy::cast_precision_loss)]
        let window = self.window_seconds as f64;

        let mut calls = self
            .calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let timestamps = calls.entry(key.to_string()).or_default();

        while timestamps.front().is_some_and(|&t| now - t >= window) {
            timestamps.pop_front();
        }

        if timestamps.len() >= self.max_calls as usize {
            warn!(key = %key, calls = timestamps.len(), "Rate limit exceeded");
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Discard the history for one key, or for every key when `None`
    pub fn reset(&self, key: Option<&str>) {
        let mut calls = self
            .calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match key {
            Some(k) => {
                calls.remove(k);
            }
            None => calls.clear(),
        }
    }

    /// Number of calls currently retained for `key`
    #[must_use]
    pub fn usage(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .map_or(0, VecDeque::len)
    }

    #[must_use]
    pub const fn max_calls(&self) -> u32 {
        self.max_calls
    }

    #[must_use]
    pub const fn window_seconds(&self) -> u64 {
        self.window_seconds
    }
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_limits_rejected() {
        assert!(matches!(
            RateLimiter::new(0, 60),
            Err(ServerError::ConfigInvalid { .. })
        ));
        assert!(matches!(
            RateLimiter::new(10, 0),
            Err(ServerError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_rate_limit_exceeded() {
        let limiter = RateLimiter::new(2, 60).unwrap();

        assert!(limiter.check_at("x", 1000.0));
        assert!(limiter.check_at("x", 1000.0));
        assert!(!limiter.check_at("x", 1000.0));
    }

    #[test]
    fn test_rejected_calls_do_not_consume_budget() {
        let limiter = RateLimiter::new(1, 10).unwrap();

        assert!(limiter.check_at("x", 0.0));
        for _ in 0..5 {
            assert!(!limiter.check_at("x", 1.0));
        }
        assert_eq!(limiter.usage("x"), 1);

        // Only the admitted call at t=0 matters
        assert!(limiter.check_at("x", 10.0));
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(2, 60).unwrap();

        assert!(limiter.check_at("x", 0.0));
        assert!(limiter.check_at("x", 30.0));
        assert!(!limiter.check_at("x", 59.9));

        // t=0 falls out of the window, t=30 does not
        assert!(limiter.check_at("x", 60.0));
        assert!(!limiter.check_at("x", 89.0));
        assert!(limiter.check_at("x", 90.0));
    }

    #[test]
    fn test_at_most_max_calls_in_any_window() {
        let limiter = RateLimiter::new(3, 10).unwrap();
        let mut admitted = Vec::new();

        for i in 0..100 {
            let t = f64::from(i) * 0.7;
            if limiter.check_at("k", t) {
                admitted.push(t);
            }
        }

        for (i, &start) in admitted.iter().enumerate() {
            let in_window = admitted[i..].iter().filter(|&&t| t - start < 10.0).count();
            assert!(in_window <= 3, "window starting at {start} admitted {in_window}");
        }
        assert!(admitted.len() > 3);
    }

    #[test]
    fn test_old_entries_are_pruned() {
        let limiter = RateLimiter::new(5, 10).unwrap();

        for i in 0..5 {
            assert!(limiter.check_at("x", f64::from(i)));
        }
        assert_eq!(limiter.usage("x"), 5);

        assert!(limiter.check_at("x", 100.0));
        assert_eq!(limiter.usage("x"), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, 60).unwrap();

        assert!(limiter.check_at("write:sync_application", 0.0));
        assert!(!limiter.check_at("write:sync_application", 0.0));

        assert!(limiter.check_at("write:sync_with_prune", 0.0));
        assert!(limiter.check_at("read:list_applications", 0.0));
    }

    #[test]
    fn test_reset_single_key() {
        let limiter = RateLimiter::new(2, 60).unwrap();

        assert!(limiter.check("x"));
        assert!(limiter.check("x"));
        assert!(!limiter.check("x"));

        limiter.reset(Some("x"));
        assert!(limiter.check("x"));
        assert!(limiter.check("x"));
    }

    #[test]
    fn test_reset_only_touches_given_key() {
        let limiter = RateLimiter::new(1, 60).unwrap();

        assert!(limiter.check("a"));
        assert!(limiter.check("b"));

        limiter.reset(Some("a"));
        assert!(limiter.check("a"));
        assert!(!limiter.check("b"));
    }

    #[test]
    fn test_reset_all_keys() {
        let limiter = RateLimiter::new(1, 60).unwrap();

        assert!(limiter.check("a"));
        assert!(limiter.check("b"));

        limiter.reset(None);
        assert_eq!(limiter.usage("a"), 0);
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
    }

    #[test]
    fn test_reset_missing_key_is_noop() {
        let limiter = RateLimiter::new(1, 60).unwrap();
        limiter.reset(Some("never-seen"));
        limiter.reset(Some("never-seen"));
        assert_eq!(limiter.usage("never-seen"), 0);
    }

    #[test]
    fn test_accessors() {
        let limiter = RateLimiter::new(7, 42).unwrap();
        assert_eq!(limiter.max_calls(), 7);
        assert_eq!(limiter.window_seconds(), 42);
    }

    #[test]
    fn test_concurrent_checks_respect_ceiling() {
        let limiter = Arc::new(RateLimiter::new(50, 3600).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || (0..20).filter(|_| limiter.check("shared")).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
        assert_eq!(limiter.usage("shared"), 50);
    }

    #[test]
    fn test_concurrent_different_keys() {
        let limiter = Arc::new(RateLimiter::new(5, 3600).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    let key = format!("key{i}");
                    (0..10).filter(|_| limiter.check(&key)).count()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 5);
        }
    }
}
