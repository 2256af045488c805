//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{LeaderboardId, ResultId, UserId};

use crate::domain::services::mean_score;
use crate::domain::value_objects::{GameId, Guesses, Outcome, Score, UserName};

/// Registered player
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub user_name: UserName,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(user_name: UserName) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            user_name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Catalog entry for a playable game
#[derive(Debug, Clone)]
pub struct Game {
    pub game_id: GameId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One completed game. Append-only: never mutated after creation.
#[derive(Debug, Clone)]
pub struct GameResult {
    pub result_id: ResultId,
    pub user_id: UserId,
    pub game_id: GameId,
    pub outcome: Outcome,
    pub score: Score,
    pub guesses: Option<Guesses>,
    pub created_at: DateTime<Utc>,
}

impl GameResult {
    pub fn new(
        user_id: UserId,
        game_id: GameId,
        outcome: Outcome,
        score: Score,
        guesses: Option<Guesses>,
    ) -> Self {
        Self {
            result_id: ResultId::new(),
            user_id,
            game_id,
            outcome,
            score,
            guesses,
            created_at: Utc::now(),
        }
    }
}

/// Running aggregate of every result for one (user, game) pair
///
/// Invariants: `total_wins <= total_attempts` and
/// `average_score == total_score / total_attempts` (0 before the first result).
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub leaderboard_id: LeaderboardId,
    pub user_id: UserId,
    pub game_id: GameId,
    pub total_wins: i64,
    pub total_attempts: i64,
    pub total_score: i64,
    pub average_score: f64,
    /// Bumped on every applied result
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Leaderboard {
    /// Aggregate with all counters at their defaults
    pub fn empty(user_id: UserId, game_id: GameId, now: DateTime<Utc>) -> Self {
        Self {
            leaderboard_id: LeaderboardId::new(),
            user_id,
            game_id,
            total_wins: 0,
            total_attempts: 0,
            total_score: 0,
            average_score: 0.0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold one result into the aggregate.
    ///
    /// Mirrors the upsert issued by the PostgreSQL repository; the two must
    /// stay in step.
    pub fn apply(&mut self, result: &GameResult) {
        debug_assert_eq!(self.user_id, result.user_id);
        debug_assert_eq!(self.game_id, result.game_id);

        self.total_attempts += 1;
        if result.outcome.is_win() {
            self.total_wins += 1;
        }
        self.total_score += i64::from(result.score.value());
        self.average_score = mean_score(self.total_score, self.total_attempts);
        self.version += 1;
        self.updated_at = result.created_at.max(self.updated_at);
    }

    /// Win ratio in `0.0..=1.0`
    pub fn win_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.total_wins as f64 / self.total_attempts as f64
        }
    }
}

/// A result as committed, next to the aggregate it produced.
///
/// `result.created_at` is stamped by the store while the aggregate is locked,
/// so results of one pair order the same way their updates were applied.
#[derive(Debug, Clone)]
pub struct RecordedResult {
    pub result: GameResult,
    pub leaderboard: Leaderboard,
}

/// Aggregate placed in its game's ranking
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u64,
    pub user_name: String,
    pub leaderboard: Leaderboard,
}

/// A user's win count just reached a configured milestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub user_id: UserId,
    pub game_id: GameId,
    pub total_wins: i64,
    pub reached_at: DateTime<Utc>,
}
