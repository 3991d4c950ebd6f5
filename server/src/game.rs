//! Rules of a single guessing game: name checks, target draw and scoring

use crate::config::GameConfig;
use rand::Rng;
use std::time::Instant;

/// Returns true when `name` has an allowed length and only ASCII letters.
pub fn validate_name(name: &str, config: &GameConfig) -> bool {
    let len = name.len();
    len >= config.min_name_length
        && len <= config.max_name_length
        && name.chars().all(|c| c.is_ascii_alphabetic())
}

/// `initial - attempts * penalty - duration`, never below zero.
pub fn calculate_score(attempts: u32, duration_secs: u64, config: &GameConfig) -> u32 {
    let raw = i128::from(config.initial_score)
        - i128::from(attempts) * i128::from(config.attempt_penalty)
        - i128::from(duration_secs);
    raw.clamp(0, i128::from(u32::MAX)) as u32
}

pub fn in_range(value: i64, config: &GameConfig) -> bool {
    (config.min_number..=config.max_number).contains(&value)
}

/// Draws a target uniformly from the configured inclusive range
pub fn draw_target<R: Rng + ?Sized>(rng: &mut R, config: &GameConfig) -> i64 {
    rng.gen_range(config.min_number..=config.max_number)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    TooHigh { attempts: u32 },
    TooLow { attempts: u32 },
    Correct { attempts: u32, duration: u64 },
}

/// Per-session game state, created when the player's name is accepted
#[derive(Debug, Clone)]
pub struct Game {
    target: i64,
    attempts: u32,
    started_at: Instant,
}

impl Game {
    pub fn new(target: i64) -> Self {
        Self {
            target,
            attempts: 0,
            started_at: Instant::now(),
        }
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whole seconds since the game started, rounded down
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Counts one attempt and compares `value` to the target.
    ///
    /// Callers must have range-checked `value`; out-of-range input is not a
    /// guess and must not reach this method.
    pub fn guess(&mut self, value: i64) -> GuessOutcome {
        self.attempts = self.attempts.saturating_add(1);

        if value > self.target {
            GuessOutcome::TooHigh {
                attempts: self.attempts,
            }
        } else if value < self.target {
            GuessOutcome::TooLow {
                attempts: self.attempts,
            }
        } else {
            GuessOutcome::Correct {
                attempts: self.attempts,
                duration: self.elapsed_secs(),
            }
        }
    }
}
