//! Record Result Use Case
//!
//! Appends a finished game to the result log and folds it into the player's
//! aggregate. Both happen in one store transaction; this use case validates
//! the input, retries serialization aborts and dispatches milestones.

use kernel::id::UserId;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::application::config::LeaderboardConfig;
use crate::domain::entities::{GameResult, Leaderboard, Milestone, RecordedResult};
use crate::domain::repository::{
    GameRepository, MilestoneNotifier, ResultRepository, UserRepository,
};
use crate::domain::services::reached_milestone;
use crate::domain::value_objects::{GameId, Guesses, Outcome, Score};
use crate::error::{DewordleError, DewordleResult};

/// Raw input, validated by the use case
#[derive(Debug, Clone)]
pub struct RecordResultInput {
    pub user_id: UserId,
    pub game_id: i32,
    pub outcome: String,
    pub score: i64,
    pub guesses: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct RecordResultOutput {
    pub result: GameResult,
    pub leaderboard: Leaderboard,
    /// Tries it took to commit, 1 when there was no contention
    pub attempts: u32,
}

pub struct RecordResultUseCase<U, G, R, N>
where
    U: UserRepository,
    G: GameRepository,
    R: ResultRepository,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    game_repo: Arc<G>,
    result_repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<LeaderboardConfig>,
}

impl<U, G, R, N> RecordResultUseCase<U, G, R, N>
where
    U: UserRepository,
    G: GameRepository,
    R: ResultRepository,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        game_repo: Arc<G>,
        result_repo: Arc<R>,
        notifier: Arc<N>,
        config: Arc<LeaderboardConfig>,
    ) -> Self {
        Self {
            user_repo,
            game_repo,
            result_repo,
            notifier,
            config,
        }
    }

    pub async fn execute(&self, input: RecordResultInput) -> DewordleResult<RecordResultOutput> {
        let result = validate(&input)?;

        if !self.user_repo.exists(&result.user_id).await? {
            return Err(DewordleError::UserNotFound);
        }
        if !self.game_repo.exists(result.game_id).await? {
            return Err(DewordleError::GameNotFound);
        }

        let (recorded, attempts) = self.record_with_retry(&result).await?;
        let RecordedResult {
            result,
            leaderboard,
        } = recorded;

        tracing::info!(
            result_id = %result.result_id,
            user_id = %result.user_id,
            game_id = %result.game_id,
            outcome = %result.outcome,
            score = result.score.value(),
            total_attempts = leaderboard.total_attempts,
            total_wins = leaderboard.total_wins,
            attempts = attempts,
            "Recorded game result"
        );

        if let Some(total_wins) = reached_milestone(
            leaderboard.total_wins,
            result.outcome.is_win(),
            &self.config.win_milestones,
        ) {
            self.dispatch_milestone(Milestone {
                user_id: result.user_id,
                game_id: result.game_id,
                total_wins,
                reached_at: leaderboard.updated_at,
            });
        }

        Ok(RecordResultOutput {
            result,
            leaderboard,
            attempts,
        })
    }

    /// Bounded retry of serialization aborts. Any other error, including an
    /// unavailable store, surfaces on the first occurrence.
    async fn record_with_retry(
        &self,
        result: &GameResult,
    ) -> DewordleResult<(RecordedResult, u32)> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.result_repo.record(result).await {
                Ok(recorded) => return Ok((recorded, attempt)),
                Err(DewordleError::SerializationFailure) if attempt < max_attempts => {
                    let delay = with_jitter(self.config.backoff_for(attempt));
                    tracing::warn!(
                        result_id = %result.result_id,
                        user_id = %result.user_id,
                        game_id = %result.game_id,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Leaderboard update serialization failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(DewordleError::SerializationFailure) => {
                    return Err(DewordleError::Conflict { attempts: attempt });
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn dispatch_milestone(&self, milestone: Milestone) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            notifier.notify(milestone).await;
        });
    }
}

fn validate(input: &RecordResultInput) -> DewordleResult<GameResult> {
    let game_id = GameId::new(input.game_id).ok_or_else(|| {
        DewordleError::InvalidInput(format!("game id must be positive, got {}", input.game_id))
    })?;
    let outcome = input
        .outcome
        .parse::<Outcome>()
        .map_err(|e| DewordleError::InvalidInput(e.to_string()))?;
    let score = Score::new(input.score).ok_or_else(|| {
        DewordleError::InvalidInput(format!(
            "score must be between 0 and {}, got {}",
            i32::MAX,
            input.score
        ))
    })?;
    let guesses = input
        .guesses
        .map(|g| {
            Guesses::new(g).ok_or_else(|| {
                DewordleError::InvalidInput(format!("guesses must be at least 1, got {}", g))
            })
        })
        .transpose()?;

    Ok(GameResult::new(
        input.user_id,
        game_id,
        outcome,
        score,
        guesses,
    ))
}

/// Adds up to 50% random jitter so contending writers drift apart
fn with_jitter(delay: Duration) -> Duration {
    let half = delay.as_millis() as u64 / 2;
    if half == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=half))
}
