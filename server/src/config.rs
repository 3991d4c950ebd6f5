//! Tunable game and capacity settings
//!
//! Every constant of the competition lives here so the binary can expose
//! them as command line flags and tests can shrink them (a two-slot server,
//! a three-entry leaderboard) without touching the engine.

use shared::{MAX_NUMBER, MIN_NUMBER};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_clients must be at least 1")]
    NoClientSlots,
    #[error("number range is empty: min {min} > max {max}")]
    EmptyNumberRange { min: i64, max: i64 },
    #[error("leaderboard capacity must be at least 1")]
    EmptyLeaderboard,
    #[error("name length bounds are invalid: min {min}, max {max}")]
    InvalidNameBounds { min: usize, max: usize },
    #[error("max_name_attempts must be at least 1")]
    NoNameAttempts,
}

/// Settings consumed by the session engine and the acceptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Maximum number of sessions running at the same time
    pub max_clients: usize,
    /// Lowest number that can be drawn or guessed
    pub min_number: i64,
    /// Highest number that can be drawn or guessed
    pub max_number: i64,
    /// Number of scores kept on the leaderboard
    pub leaderboard_capacity: usize,
    pub min_name_length: usize,
    pub max_name_length: usize,
    /// Name submissions allowed before the session is dropped
    pub max_name_attempts: u32,
    /// Score before any penalty is applied
    pub initial_score: u32,
    /// Points removed per counted guess
    pub attempt_penalty: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_clients: 30,
            min_number: MIN_NUMBER,
            max_number: MAX_NUMBER,
            leaderboard_capacity: 10,
            min_name_length: 3,
            max_name_length: 10,
            max_name_attempts: 5,
            initial_score: 10_000,
            attempt_penalty: 100,
        }
    }
}

impl GameConfig {
    /// Checks that the settings describe a playable server
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_clients == 0 {
            return Err(ConfigError::NoClientSlots);
        }
        if self.min_number > self.max_number {
            return Err(ConfigError::EmptyNumberRange {
                min: self.min_number,
                max: self.max_number,
            });
        }
        if self.leaderboard_capacity == 0 {
            return Err(ConfigError::EmptyLeaderboard);
        }
        if self.min_name_length == 0 || self.min_name_length > self.max_name_length {
            return Err(ConfigError::InvalidNameBounds {
                min: self.min_name_length,
                max: self.max_name_length,
            });
        }
        if self.max_name_attempts == 0 {
            return Err(ConfigError::NoNameAttempts);
        }
        Ok(())
    }
}
