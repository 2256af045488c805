//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the infra layer.

use kernel::id::UserId;

use crate::domain::entities::{
    Game, GameResult, LeaderboardEntry, Milestone, RecordedResult, User,
};
use crate::domain::value_objects::{GameId, PageRequest, UserName};
use crate::error::DewordleResult;

/// User store
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user. Fails with `UserNameTaken` on a duplicate name.
    async fn create(&self, user: &User) -> DewordleResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> DewordleResult<Option<User>>;

    async fn exists(&self, user_id: &UserId) -> DewordleResult<bool>;

    async fn exists_by_user_name(&self, user_name: &UserName) -> DewordleResult<bool>;
}

/// Game catalog
#[trait_variant::make(GameRepository: Send)]
pub trait LocalGameRepository {
    async fn find_by_id(&self, game_id: GameId) -> DewordleResult<Option<Game>>;

    async fn exists(&self, game_id: GameId) -> DewordleResult<bool>;
}

/// Append-only result log and the aggregate it feeds
#[trait_variant::make(ResultRepository: Send)]
pub trait LocalResultRepository {
    /// Append `result` and fold it into its (user, game) aggregate as one
    /// atomic unit, creating the aggregate on first use.
    ///
    /// Returns both as committed, with `created_at` replaced by the time the
    /// aggregate was updated. A store-level serialization failure is reported
    /// as `SerializationFailure` with nothing applied.
    async fn record(&self, result: &GameResult) -> DewordleResult<RecordedResult>;

    /// Most recent results of a user, newest first
    async fn list_by_user(&self, user_id: &UserId, limit: u32)
    -> DewordleResult<Vec<GameResult>>;
}

/// Read side of the aggregates
#[trait_variant::make(LeaderboardRepository: Send)]
pub trait LocalLeaderboardRepository {
    /// One page of a game's ranking
    async fn page(
        &self,
        game_id: GameId,
        page: PageRequest,
    ) -> DewordleResult<Vec<LeaderboardEntry>>;

    /// A single user's ranked aggregate
    async fn standing(
        &self,
        game_id: GameId,
        user_id: &UserId,
    ) -> DewordleResult<Option<LeaderboardEntry>>;
}

/// Fire-and-forget milestone delivery. Implementations handle their own
/// failures; nothing is reported back to the caller.
#[trait_variant::make(MilestoneNotifier: Send)]
pub trait LocalMilestoneNotifier {
    async fn notify(&self, milestone: Milestone);
}
