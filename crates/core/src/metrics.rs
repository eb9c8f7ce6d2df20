use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Sliding-window rate limit applied per caller key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub enabled: bool,
    /// Calls accepted per key inside one window
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 1,
            window: Duration::from_secs(1),
        }
    }
}

/// Request counters owned by one capability handler.
///
/// Updates never await, so each invocation's bookkeeping is applied
/// atomically under the mutex even on a multi-threaded runtime.
#[derive(Debug)]
pub struct RequestMetrics {
    policy: RateLimitPolicy,
    state: Mutex<MetricsState>,
}

#[derive(Debug, Default)]
struct MetricsState {
    total_requests: u64,
    success_count: u64,
    error_count: u64,
    rejected_count: u64,
    total_duration_ms: f64,
    request_timestamps: HashMap<String, VecDeque<Instant>>,
}

/// Point-in-time copy of a handler's counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub rejected_count: u64,
    pub total_duration_ms: f64,
    pub average_duration_ms: f64,
    pub error_rate: f64,
}

impl RequestMetrics {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(MetricsState::default()),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Record the outcome of one executed invocation
    pub fn track_request(&self, started: Instant, success: bool) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let mut state = self.lock_state();

        state.total_requests += 1;
        if success {
            state.success_count += 1;
        } else {
            state.error_count += 1;
        }
        state.total_duration_ms += elapsed_ms;
    }

    /// Admit or reject a call from `key`.
    ///
    /// Rejected calls only bump the rejected counter, so success and error
    /// rates keep describing executed work.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        self.check_rate_limit_at(key, Instant::now())
    }

    fn check_rate_limit_at(&self, key: &str, now: Instant) -> bool {
        if !self.policy.enabled {
            return true;
        }

        let window = self.policy.window;
        let mut state = self.lock_state();

        // Drop idle keys so the map does not grow with every caller ever seen
        state.request_timestamps.retain(|_, stamps| {
            while stamps
                .front()
                .is_some_and(|stamp| now.saturating_duration_since(*stamp) >= window)
            {
                stamps.pop_front();
            }
            !stamps.is_empty()
        });

        let recent = state
            .request_timestamps
            .get(key)
            .map_or(0, VecDeque::len);

        if recent >= self.policy.max_requests as usize {
            state.rejected_count += 1;
            tracing::warn!(key, recent, "Rate limit exceeded");
            return false;
        }

        state
            .request_timestamps
            .entry(key.to_string())
            .or_default()
            .push_back(now);
        true
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock_state();
        let executed = state.total_requests as f64;

        MetricsSnapshot {
            total_requests: state.total_requests,
            success_count: state.success_count,
            error_count: state.error_count,
            rejected_count: state.rejected_count,
            total_duration_ms: state.total_duration_ms,
            average_duration_ms: if state.total_requests == 0 {
                0.0
            } else {
                state.total_duration_ms / executed
            },
            error_rate: if state.total_requests == 0 {
                0.0
            } else {
                state.error_count as f64 / executed
            },
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_request_counts() {
        let metrics = RequestMetrics::default();

        for i in 0..10 {
            metrics.track_request(Instant::now(), i % 3 != 0);
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 10);
        assert_eq!(snapshot.success_count, 6);
        assert_eq!(snapshot.error_count, 4);
        assert_eq!(snapshot.success_count + snapshot.error_count, 10);
        assert!((snapshot.error_rate - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = RequestMetrics::default().snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.average_duration_ms, 0.0);
        assert_eq!(snapshot.error_rate, 0.0);
    }

    #[test]
    fn test_duration_accumulates() {
        let metrics = RequestMetrics::default();
        let started = Instant::now() - Duration::from_millis(50);

        metrics.track_request(started, true);

        let snapshot = metrics.snapshot();
        assert!(snapshot.total_duration_ms >= 50.0);
        assert_eq!(snapshot.average_duration_ms, snapshot.total_duration_ms);
    }

    #[test]
    fn test_rate_limit_one_per_window() {
        let metrics = RequestMetrics::default();
        let start = Instant::now();

        assert!(metrics.check_rate_limit_at("client-a", start));
        assert!(!metrics.check_rate_limit_at("client-a", start + Duration::from_millis(500)));
        // Other keys have their own window
        assert!(metrics.check_rate_limit_at("client-b", start + Duration::from_millis(500)));
        // Window has slid past the first call
        assert!(metrics.check_rate_limit_at("client-a", start + Duration::from_millis(1000)));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rejected_count, 1);
        // Rejections never count as executed requests
        assert_eq!(snapshot.total_requests, 0);
    }

    #[test]
    fn test_rate_limit_larger_budget() {
        let metrics = RequestMetrics::new(RateLimitPolicy {
            enabled: true,
            max_requests: 3,
            window: Duration::from_secs(1),
        });
        let start = Instant::now();

        for i in 0..3 {
            assert!(metrics.check_rate_limit_at("k", start + Duration::from_millis(i * 10)));
        }
        assert!(!metrics.check_rate_limit_at("k", start + Duration::from_millis(100)));
        assert!(metrics.check_rate_limit_at("k", start + Duration::from_millis(1001)));
    }

    #[test]
    fn test_rate_limit_disabled() {
        let metrics = RequestMetrics::new(RateLimitPolicy::disabled());
        let now = Instant::now();

        for _ in 0..100 {
            assert!(metrics.check_rate_limit_at("k", now));
        }
        assert_eq!(metrics.snapshot().rejected_count, 0);
    }
}
