//! User Lookup Use Cases

use kernel::id::UserId;
use std::sync::Arc;

use crate::application::config::LeaderboardConfig;
use crate::domain::entities::{GameResult, User};
use crate::domain::repository::{ResultRepository, UserRepository};
use crate::error::{DewordleError, DewordleResult};

pub struct GetUserUseCase<U, R>
where
    U: UserRepository,
    R: ResultRepository,
{
    user_repo: Arc<U>,
    result_repo: Arc<R>,
    config: Arc<LeaderboardConfig>,
}

impl<U, R> GetUserUseCase<U, R>
where
    U: UserRepository,
    R: ResultRepository,
{
    pub fn new(user_repo: Arc<U>, result_repo: Arc<R>, config: Arc<LeaderboardConfig>) -> Self {
        Self {
            user_repo,
            result_repo,
            config,
        }
    }

    pub async fn profile(&self, user_id: &UserId) -> DewordleResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(DewordleError::UserNotFound)
    }

    /// Most recent results, newest first. `limit` defaults to the page size.
    pub async fn history(
        &self,
        user_id: &UserId,
        limit: Option<i64>,
    ) -> DewordleResult<Vec<GameResult>> {
        let max = self.config.max_history;
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

        if !self.user_repo.exists(user_id).await? {
            return Err(DewordleError::UserNotFound);
        }

        self.result_repo.list_by_user(user_id, limit).await
    }
}
