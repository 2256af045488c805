//! Get Leaderboard Use Case

use kernel::id::UserId;
use std::sync::Arc;

use crate::application::config::LeaderboardConfig;
use crate::domain::entities::{Game, LeaderboardEntry};
use crate::domain::repository::{GameRepository, LeaderboardRepository};
use crate::domain::value_objects::{GameId, PageRequest};
use crate::error::{DewordleError, DewordleResult};

#[derive(Debug, Clone)]
pub struct LeaderboardPage {
    pub game: Game,
    pub page: PageRequest,
    pub entries: Vec<LeaderboardEntry>,
}

/// Read-only ranking queries. Never takes locks beyond the store's normal
/// read consistency.
pub struct GetLeaderboardUseCase<G, L>
where
    G: GameRepository,
    L: LeaderboardRepository,
{
    game_repo: Arc<G>,
    leaderboard_repo: Arc<L>,
    config: Arc<LeaderboardConfig>,
}

impl<G, L> GetLeaderboardUseCase<G, L>
where
    G: GameRepository,
    L: LeaderboardRepository,
{
    pub fn new(game_repo: Arc<G>, leaderboard_repo: Arc<L>, config: Arc<LeaderboardConfig>) -> Self {
        Self {
            game_repo,
            leaderboard_repo,
            config,
        }
    }

    /// Ranked aggregates of `game_id`, `limit` entries starting after `offset`
    pub async fn page(
        &self,
        game_id: i32,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> DewordleResult<LeaderboardPage> {
        let game_id = GameId::new(game_id).ok_or(DewordleError::GameNotFound)?;
        let game = self
            .game_repo
            .find_by_id(game_id)
            .await?
            .ok_or(DewordleError::GameNotFound)?;
        let page = self.page_request(limit, offset)?;

        let entries = self.leaderboard_repo.page(game.game_id, page).await?;

        tracing::debug!(
            game_id = %game.game_id,
            limit = page.limit,
            offset = page.offset,
            returned = entries.len(),
            "Fetched leaderboard page"
        );

        Ok(LeaderboardPage {
            game,
            page,
            entries,
        })
    }

    /// Ranked aggregate of one user
    pub async fn standing(&self, game_id: i32, user_id: &UserId) -> DewordleResult<LeaderboardEntry>
    {
        let game_id = self.known_game(game_id).await?;
        self.leaderboard_repo
            .standing(game_id, user_id)
            .await?
            .ok_or(DewordleError::StandingNotFound)
    }

    async fn known_game(&self, raw: i32) -> DewordleResult<GameId> {
        let game_id = GameId::new(raw).ok_or(DewordleError::GameNotFound)?;
        if !self.game_repo.exists(game_id).await? {
            return Err(DewordleError::GameNotFound);
        }
        Ok(game_id)
    }

    fn page_request(&self, limit: Option<i64>, offset: Option<i64>) -> DewordleResult<PageRequest> {
        let max = self.config.max_page_size;
        let limit = match limit {
            None => self.config.default_page_size.min(max),
            Some(l) if l >= 1 && l <= i64::from(max) => l as u32,
            Some(l) => {
                return Err(DewordleError::InvalidInput(format!(
                    "limit must be between 1 and {}, got {}",
                    max, l
                )));
            }
        };
        let offset = match offset {
            None => 0,
            Some(o) if o >= 0 => o as u64,
            Some(o) => {
                return Err(DewordleError::InvalidInput(format!(
                    "offset must not be negative, got {}",
                    o
                )));
            }
        };
        Ok(PageRequest { limit, offset })
    }
}
