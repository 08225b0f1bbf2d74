//! Per-connection signaling rate limiter.
//!
//! Fixed one-second windows keyed on `(connection, category)`. Overflow is a
//! silent drop: no ack, no error push, and the connection stays open. All of
//! a connection's counters are freed on disconnect.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::config::LimitsConfig;
use crate::models::ConnId;

/// Signaling event categories with independent budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateCategory {
    /// Transport create/connect, produce, consume, layer/pause/resume ops
    Media,
    /// Chat and Q&A traffic
    Chat,
    /// Host actions: admission, kick, transfer, invites, breakout ops
    Admin,
    /// Anything unclassified
    Default,
}

impl RateCategory {
    pub fn limit(&self, config: &LimitsConfig) -> u32 {
        match self {
            Self::Media => config.media_per_second,
            Self::Chat => config.chat_per_second,
            Self::Admin => config.admin_per_second,
            Self::Default => config.default_per_second,
        }
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

const WINDOW: Duration = Duration::from_secs(1);

/// In-process rate limiter. Cheap to clone; state is shared.
#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: std::sync::Arc<DashMap<(ConnId, RateCategory), Window>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event and report whether it is within budget.
    ///
    /// The window resets on the first event at or after its reset time.
    pub fn check(&self, conn_id: &ConnId, category: RateCategory, limit: u32) -> bool {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry((conn_id.clone(), category))
            .or_insert_with(|| Window {
                count: 0,
                reset_at: now + WINDOW,
            });

        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + WINDOW;
        }

        if entry.count >= limit {
            return false;
        }
        entry.count += 1;
        true
    }

    /// Free every counter belonging to a connection.
    pub fn release(&self, conn_id: &ConnId) {
        self.windows.retain(|(id, _), _| id != conn_id);
    }

    #[must_use]
    pub fn tracked_connections(&self) -> usize {
        let mut ids: Vec<ConnId> = self.windows.iter().map(|e| e.key().0.clone()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new();
        let conn = ConnId::new();

        for _ in 0..30 {
            assert!(limiter.check(&conn, RateCategory::Media, 30));
        }
        assert!(!limiter.check(&conn, RateCategory::Media, 30));
        assert!(!limiter.check(&conn, RateCategory::Media, 30));
    }

    #[test]
    fn test_categories_are_independent() {
        let limiter = RateLimiter::new();
        let conn = ConnId::new();

        for _ in 0..3 {
            assert!(limiter.check(&conn, RateCategory::Admin, 3));
        }
        assert!(!limiter.check(&conn, RateCategory::Admin, 3));

        // Exhausting admin must not touch the chat budget
        assert!(limiter.check(&conn, RateCategory::Chat, 5));
    }

    #[test]
    fn test_connections_are_independent() {
        let limiter = RateLimiter::new();
        let a = ConnId::new();
        let b = ConnId::new();

        for _ in 0..5 {
            assert!(limiter.check(&a, RateCategory::Chat, 5));
        }
        assert!(!limiter.check(&a, RateCategory::Chat, 5));
        assert!(limiter.check(&b, RateCategory::Chat, 5));
    }

    #[test]
    fn test_release_frees_counters() {
        let limiter = RateLimiter::new();
        let conn = ConnId::new();

        for _ in 0..3 {
            limiter.check(&conn, RateCategory::Admin, 3);
        }
        limiter.check(&conn, RateCategory::Chat, 5);
        assert_eq!(limiter.tracked_connections(), 1);

        limiter.release(&conn);
        assert_eq!(limiter.tracked_connections(), 0);

        // A fresh window after release
        assert!(limiter.check(&conn, RateCategory::Admin, 3));
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new();
        let conn = ConnId::new();

        for _ in 0..3 {
            assert!(limiter.check(&conn, RateCategory::Admin, 3));
        }
        assert!(!limiter.check(&conn, RateCategory::Admin, 3));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        // First event past the reset time starts a new bucket
        assert!(limiter.check(&conn, RateCategory::Admin, 3));
    }
}
