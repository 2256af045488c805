//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{GameResult, Leaderboard, LeaderboardEntry, User};

// ============================================================================
// Users
// ============================================================================

/// Request for POST /users
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: Uuid,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.into_uuid(),
            user_name: user.user_name.original().to_string(),
            created_at: user.created_at,
        }
    }
}

/// Query for GET /users/{userId}/results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

// ============================================================================
// Results
// ============================================================================

/// Request for POST /games/{gameId}/results
///
/// `outcome` and `score` are kept loose here so that out-of-range values get
/// the domain's validation message instead of a deserializer rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResultRequest {
    pub user_id: Uuid,
    pub outcome: String,
    pub score: i64,
    #[serde(default)]
    pub guesses: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResultResponse {
    pub result_id: Uuid,
    pub user_id: Uuid,
    pub game_id: i32,
    pub outcome: &'static str,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guesses: Option<i16>,
    pub created_at: DateTime<Utc>,
}

impl From<&GameResult> for GameResultResponse {
    fn from(result: &GameResult) -> Self {
        Self {
            result_id: result.result_id.into_uuid(),
            user_id: result.user_id.into_uuid(),
            game_id: result.game_id.value(),
            outcome: result.outcome.as_str(),
            score: result.score.value(),
            guesses: result.guesses.map(|g| g.value()),
            created_at: result.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub user_id: Uuid,
    pub game_id: i32,
    pub total_wins: i64,
    pub total_attempts: i64,
    pub average_score: f64,
    pub win_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Leaderboard> for LeaderboardResponse {
    fn from(lb: &Leaderboard) -> Self {
        Self {
            user_id: lb.user_id.into_uuid(),
            game_id: lb.game_id.value(),
            total_wins: lb.total_wins,
            total_attempts: lb.total_attempts,
            average_score: lb.average_score,
            win_rate: lb.win_rate(),
            created_at: lb.created_at,
            updated_at: lb.updated_at,
        }
    }
}

/// Response for POST /games/{gameId}/results
#[derive(Debug, Clone, Serialize)]
pub struct RecordResultResponse {
    pub result: GameResultResponse,
    pub leaderboard: LeaderboardResponse,
}

// ============================================================================
// Rankings
// ============================================================================

/// Query for GET /games/{gameId}/leaderboard
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryResponse {
    pub rank: u64,
    pub user_name: String,
    #[serde(flatten)]
    pub leaderboard: LeaderboardResponse,
}

impl From<&LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            user_name: entry.user_name.clone(),
            leaderboard: LeaderboardResponse::from(&entry.leaderboard),
        }
    }
}

/// Response for GET /games/{gameId}/leaderboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPageResponse {
    pub game_id: i32,
    pub game_name: String,
    pub limit: u32,
    pub offset: u64,
    pub entries: Vec<LeaderboardEntryResponse>,
}
