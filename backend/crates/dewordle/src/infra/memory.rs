//! In-Memory Repository Implementation
//!
//! Backs tests and database-less local runs. One async mutex guards the whole
//! state, so every `record` is trivially atomic and linearized.

use chrono::Utc;
use kernel::id::UserId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entities::{
    Game, GameResult, Leaderboard, LeaderboardEntry, RecordedResult, User,
};
use crate::domain::repository::{
    GameRepository, LeaderboardRepository, ResultRepository, UserRepository,
};
use crate::domain::services::rank;
use crate::domain::value_objects::{GameId, PageRequest, UserName};
use crate::error::{DewordleError, DewordleResult};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    /// canonical user name -> id
    user_names: HashMap<String, UserId>,
    games: BTreeMap<GameId, Game>,
    results: Vec<GameResult>,
    leaderboards: HashMap<(UserId, GameId), Leaderboard>,
}

impl MemoryState {
    fn ranked(&self, game_id: GameId) -> Vec<LeaderboardEntry> {
        rank(
            self.leaderboards.values().filter(|lb| lb.game_id == game_id),
            |lb| {
                self.users
                    .get(&lb.user_id)
                    .map(|u| u.user_name.original().to_string())
                    .unwrap_or_default()
            },
        )
    }
}

#[derive(Clone)]
pub struct MemoryDewordleRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDewordleRepository {
    /// Empty store with the Dewordle game in its catalog
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        state.games.insert(
            GameId::DEWORDLE,
            Game {
                game_id: GameId::DEWORDLE,
                name: "Dewordle".to_string(),
                created_at: Utc::now(),
            },
        );
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn add_game(&self, game_id: GameId, name: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.games.insert(
            game_id,
            Game {
                game_id,
                name: name.into(),
                created_at: Utc::now(),
            },
        );
    }

    /// Number of results in the log
    pub async fn result_count(&self) -> usize {
        self.state.lock().await.results.len()
    }

    /// Current aggregate of a pair, if any
    pub async fn aggregate(&self, user_id: &UserId, game_id: GameId) -> Option<Leaderboard> {
        self.state
            .lock()
            .await
            .leaderboards
            .get(&(*user_id, game_id))
            .cloned()
    }
}

impl Default for MemoryDewordleRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for MemoryDewordleRepository {
    async fn create(&self, user: &User) -> DewordleResult<()> {
        let mut state = self.state.lock().await;
        let canonical = user.user_name.canonical().to_string();
        if state.user_names.contains_key(&canonical) {
            return Err(DewordleError::UserNameTaken);
        }
        state.user_names.insert(canonical, user.user_id);
        state.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> DewordleResult<Option<User>> {
        Ok(self.state.lock().await.users.get(user_id).cloned())
    }

    async fn exists(&self, user_id: &UserId) -> DewordleResult<bool> {
        Ok(self.state.lock().await.users.contains_key(user_id))
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> DewordleResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .user_names
            .contains_key(user_name.canonical()))
    }
}

impl GameRepository for MemoryDewordleRepository {
    async fn find_by_id(&self, game_id: GameId) -> DewordleResult<Option<Game>> {
        Ok(self.state.lock().await.games.get(&game_id).cloned())
    }

    async fn exists(&self, game_id: GameId) -> DewordleResult<bool> {
        Ok(self.state.lock().await.games.contains_key(&game_id))
    }
}

impl ResultRepository for MemoryDewordleRepository {
    async fn record(&self, result: &GameResult) -> DewordleResult<RecordedResult> {
        let mut state = self.state.lock().await;

        // Same guarantees as the foreign keys in PostgreSQL
        if !state.users.contains_key(&result.user_id) {
            return Err(DewordleError::UserNotFound);
        }
        if !state.games.contains_key(&result.game_id) {
            return Err(DewordleError::GameNotFound);
        }

        // Stamped under the lock and never behind the aggregate's last update
        let now = Utc::now();
        let created_at = state
            .leaderboards
            .get(&(result.user_id, result.game_id))
            .map_or(now, |lb| now.max(lb.updated_at));
        let recorded = GameResult {
            created_at,
            ..result.clone()
        };
        let leaderboard = state
            .leaderboards
            .entry((recorded.user_id, recorded.game_id))
            .or_insert_with(|| {
                Leaderboard::empty(recorded.user_id, recorded.game_id, recorded.created_at)
            });
        leaderboard.apply(&recorded);
        let leaderboard = leaderboard.clone();

        state.results.push(recorded.clone());
        Ok(RecordedResult {
            result: recorded,
            leaderboard,
        })
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> DewordleResult<Vec<GameResult>> {
        let state = self.state.lock().await;
        Ok(state
            .results
            .iter()
            .rev()
            .filter(|r| &r.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

impl LeaderboardRepository for MemoryDewordleRepository {
    async fn page(
        &self,
        game_id: GameId,
        page: PageRequest,
    ) -> DewordleResult<Vec<LeaderboardEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .ranked(game_id)
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .collect())
    }

    async fn standing(
        &self,
        game_id: GameId,
        user_id: &UserId,
    ) -> DewordleResult<Option<LeaderboardEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .ranked(game_id)
            .into_iter()
            .find(|e| &e.leaderboard.user_id == user_id))
    }
}
