//! Running totals over every completed game

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct GlobalStats {
    total_games: u64,
    total_attempts: u64,
    best_attempts: Option<u32>,
    average_attempts: f64,
}

/// Point-in-time copy of the aggregate statistics
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub uptime: Duration,
    pub total_games: u64,
    pub total_attempts: u64,
    /// Fewest attempts of any finished game, `None` before the first win
    pub best_attempts: Option<u32>,
    pub average_attempts: f64,
}

pub struct StatsAggregator {
    started_at: Instant,
    inner: Mutex<GlobalStats>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            inner: Mutex::new(GlobalStats::default()),
        }
    }

    pub async fn record_game(&self, attempts: u32) {
        let mut stats = self.inner.lock().await;

        stats.total_games += 1;
        stats.total_attempts += u64::from(attempts);
        stats.average_attempts = stats.total_attempts as f64 / stats.total_games as f64;
        stats.best_attempts = Some(match stats.best_attempts {
            Some(best) => best.min(attempts),
            None => attempts,
        });
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        let stats = self.inner.lock().await;

        StatsSnapshot {
            uptime: self.started_at.elapsed(),
            total_games: stats.total_games,
            total_attempts: stats.total_attempts,
            best_attempts: stats.best_attempts,
            average_attempts: stats.average_attempts,
        }
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
