//! Bounded top-N score table shared by every session
//!
//! Entries are kept sorted by score, highest first. A new score goes in front
//! of the first entry it strictly beats, so on equal scores whoever got there
//! first keeps the better rank. When the table is full the last entry falls
//! off; a score that beats nobody on a full table is dropped.

use log::debug;
use shared::ScoreEntry;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// A finished game as recorded on the leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub name: String,
    pub attempts: u32,
    pub duration: u64,
    pub score: u32,
    pub recorded_at: SystemTime,
}

impl ScoreRecord {
    pub fn new(name: impl Into<String>, attempts: u32, duration: u64, score: u32) -> Self {
        Self {
            name: name.into(),
            attempts,
            duration,
            score,
            recorded_at: SystemTime::now(),
        }
    }

    /// Wire representation at the given 1-based rank
    pub fn to_entry(&self, rank: u32) -> ScoreEntry {
        ScoreEntry {
            rank,
            name: self.name.clone(),
            score: self.score,
            attempts: self.attempts,
            duration: self.duration,
        }
    }
}

pub struct Leaderboard {
    capacity: usize,
    scores: RwLock<Vec<ScoreRecord>>,
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            scores: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a finished game.
    ///
    /// Returns the 0-based position the record landed at, or `None` when the
    /// table is full and the score beats none of its entries.
    pub async fn insert(&self, record: ScoreRecord) -> Option<usize> {
        let mut scores = self.scores.write().await;

        let position = match scores.iter().position(|held| record.score > held.score) {
            Some(index) => index,
            None if scores.len() < self.capacity => scores.len(),
            None => {
                debug!(
                    "Score {} from {} did not make the leaderboard",
                    record.score, record.name
                );
                return None;
            }
        };

        scores.insert(position, record);
        scores.truncate(self.capacity);
        Some(position)
    }

    /// Copy of the current table, best score first
    pub async fn snapshot(&self) -> Vec<ScoreRecord> {
        self.scores.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.scores.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.scores.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(name: &str, score: u32) -> ScoreRecord {
        ScoreRecord::new(name, 1, 0, score)
    }

    fn names(scores: &[ScoreRecord]) -> Vec<&str> {
        scores.iter().map(|s| s.name.as_str()).collect()
    }

    fn assert_sorted(scores: &[ScoreRecord]) {
        for pair in scores.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let board = Leaderboard::new(10);
        assert!(board.is_empty().await);
        assert_eq!(board.capacity(), 10);
        assert!(board.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_inserts_in_descending_order() {
        let board = Leaderboard::new(10);

        assert_eq!(board.insert(record("Mid", 5000)).await, Some(0));
        assert_eq!(board.insert(record("Top", 9000)).await, Some(0));
        assert_eq!(board.insert(record("Low", 100)).await, Some(2));
        assert_eq!(board.insert(record("Upper", 7000)).await, Some(1));

        let scores = board.snapshot().await;
        assert_eq!(names(&scores), vec!["Top", "Upper", "Mid", "Low"]);
        assert_sorted(&scores);
    }

    #[tokio::test]
    async fn test_ties_keep_first_inserted_ahead() {
        let board = Leaderboard::new(10);

        board.insert(record("First", 9000)).await;
        board.insert(record("Other", 8000)).await;
        assert_eq!(board.insert(record("Second", 9000)).await, Some(1));

        let scores = board.snapshot().await;
        assert_eq!(names(&scores), vec!["First", "Second", "Other"]);
    }

    #[tokio::test]
    async fn test_full_board_evicts_lowest() {
        let board = Leaderboard::new(3);

        board.insert(record("A", 300)).await;
        board.insert(record("B", 200)).await;
        board.insert(record("C", 100)).await;

        assert_eq!(board.insert(record("D", 150)).await, Some(2));

        let scores = board.snapshot().await;
        assert_eq!(scores.len(), 3);
        assert_eq!(names(&scores), vec!["A", "B", "D"]);
    }

    #[tokio::test]
    async fn test_full_board_discards_non_improving_scores() {
        let board = Leaderboard::new(2);

        board.insert(record("A", 300)).await;
        board.insert(record("B", 200)).await;

        assert_eq!(board.insert(record("Tie", 200)).await, None);
        assert_eq!(board.insert(record("Worse", 10)).await, None);

        let scores = board.snapshot().await;
        assert_eq!(names(&scores), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_zero_scores_fill_free_slots() {
        let board = Leaderboard::new(2);

        assert_eq!(board.insert(record("A", 0)).await, Some(0));
        assert_eq!(board.insert(record("B", 0)).await, Some(1));
        assert_eq!(board.insert(record("C", 0)).await, None);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_copy() {
        let board = Leaderboard::new(5);
        board.insert(record("A", 10)).await;

        let before = board.snapshot().await;
        board.insert(record("B", 20)).await;

        assert_eq!(before.len(), 1);
        assert_eq!(board.len().await, 2);
    }

    #[tokio::test]
    async fn test_to_entry_carries_rank() {
        let entry = ScoreRecord::new("Alice", 3, 12, 9688).to_entry(1);
        assert_eq!(entry.rank, 1);
        assert_eq!(entry.name, "Alice");
        assert_eq!(entry.attempts, 3);
        assert_eq!(entry.duration, 12);
        assert_eq!(entry.score, 9688);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_keep_invariants() {
        let board = Arc::new(Leaderboard::new(10));
        let mut handles = Vec::new();

        for i in 0..64u32 {
            let board = Arc::clone(&board);
            handles.push(tokio::spawn(async move {
                let score = (i * 7919) % 1000;
                board.insert(record(&format!("P{}", i), score)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let scores = board.snapshot().await;
        assert_eq!(scores.len(), 10);
        assert_sorted(&scores);

        let mut all: Vec<u32> = (0..64u32).map(|i| (i * 7919) % 1000).collect();
        all.sort_unstable_by(|a, b| b.cmp(a));
        let kept: Vec<u32> = scores.iter().map(|s| s.score).collect();
        assert_eq!(kept, all[..10].to_vec());
    }
}
