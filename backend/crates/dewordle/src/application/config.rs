//! Application Configuration
//!
//! Configuration for the Dewordle application layer.

use std::time::Duration;

/// Leaderboard application configuration
#[derive(Debug, Clone)]
pub struct LeaderboardConfig {
    /// Total tries of one `record_result`, the first included
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each further retry
    pub base_backoff: Duration,
    /// Backoff ceiling
    pub max_backoff: Duration,
    /// Page size when the caller gives none
    pub default_page_size: u32,
    /// Largest page a caller may request
    pub max_page_size: u32,
    /// Largest result history a caller may request
    pub max_history: u32,
    /// Win counts that trigger a milestone notification
    pub win_milestones: Vec<u64>,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff: Duration::from_millis(25),
            max_backoff: Duration::from_millis(400),
            default_page_size: 20,
            max_page_size: 100,
            max_history: 100,
            win_milestones: vec![1, 10, 50, 100, 500, 1000],
        }
    }
}

impl LeaderboardConfig {
    /// Config for tests: no waiting between retries
    pub fn without_backoff() -> Self {
        Self {
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Backoff before retry number `retry` (1-based), without jitter
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}
