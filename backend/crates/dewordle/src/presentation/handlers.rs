//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::UserId;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::config::LeaderboardConfig;
use crate::application::{
    GetLeaderboardUseCase, GetUserUseCase, RecordResultInput, RecordResultUseCase,
    RegisterUserInput, RegisterUserUseCase,
};
use crate::domain::repository::{
    GameRepository, LeaderboardRepository, MilestoneNotifier, ResultRepository, UserRepository,
};
use crate::error::DewordleResult;
use crate::presentation::dto::{
    GameResultResponse, HistoryQuery, LeaderboardEntryResponse, LeaderboardPageResponse,
    LeaderboardQuery, LeaderboardResponse, RecordResultRequest, RecordResultResponse,
    RegisterUserRequest, UserResponse,
};

/// Every store concern a handler may need, implemented by one repository
pub trait DewordleStore:
    UserRepository
    + GameRepository
    + ResultRepository
    + LeaderboardRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> DewordleStore for T where
    T: UserRepository
        + GameRepository
        + ResultRepository
        + LeaderboardRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Shared state for Dewordle handlers
pub struct DewordleAppState<R, N>
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub config: Arc<LeaderboardConfig>,
}

// Manual impl: only the `Arc`s are cloned, `N` need not be `Clone`.
impl<R, N> Clone for DewordleAppState<R, N>
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// POST /users
pub async fn register_user<R, N>(
    State(state): State<DewordleAppState<R, N>>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> DewordleResult<(StatusCode, Json<UserResponse>)>
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case = RegisterUserUseCase::new(state.repo.clone());

    let user = use_case
        .execute(RegisterUserInput {
            user_name: req.user_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /users/{user_id}
pub async fn get_user<R, N>(
    State(state): State<DewordleAppState<R, N>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> DewordleResult<Json<UserResponse>>
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    let Path(user_id) = path?;
    let use_case = GetUserUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let user = use_case.profile(&UserId::from_uuid(user_id)).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /users/{user_id}/results
pub async fn list_results<R, N>(
    State(state): State<DewordleAppState<R, N>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> DewordleResult<Json<Vec<GameResultResponse>>>
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    let Path(user_id) = path?;
    let Query(query) = query?;
    let use_case = GetUserUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let results = use_case
        .history(&UserId::from_uuid(user_id), query.limit)
        .await?;

    Ok(Json(results.iter().map(GameResultResponse::from).collect()))
}

// ============================================================================
// Results
// ============================================================================

/// POST /games/{game_id}/results
pub async fn record_result<R, N>(
    State(state): State<DewordleAppState<R, N>>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<RecordResultRequest>, JsonRejection>,
) -> DewordleResult<(StatusCode, Json<RecordResultResponse>)>
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    let Path(game_id) = path?;
    let Json(req) = payload?;
    let use_case = RecordResultUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let input = RecordResultInput {
        user_id: UserId::from_uuid(req.user_id),
        game_id,
        outcome: req.outcome,
        score: req.score,
        guesses: req.guesses,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordResultResponse {
            result: GameResultResponse::from(&output.result),
            leaderboard: LeaderboardResponse::from(&output.leaderboard),
        }),
    ))
}

// ============================================================================
// Rankings
// ============================================================================

/// GET /games/{game_id}/leaderboard
pub async fn get_leaderboard<R, N>(
    State(state): State<DewordleAppState<R, N>>,
    path: Result<Path<i32>, PathRejection>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> DewordleResult<Json<LeaderboardPageResponse>>
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    let Path(game_id) = path?;
    let Query(query) = query?;
    let use_case =
        GetLeaderboardUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let page = use_case.page(game_id, query.limit, query.offset).await?;

    Ok(Json(LeaderboardPageResponse {
        game_id: page.game.game_id.value(),
        game_name: page.game.name,
        limit: page.page.limit,
        offset: page.page.offset,
        entries: page.entries.iter().map(LeaderboardEntryResponse::from).collect(),
    }))
}

/// GET /games/{game_id}/leaderboard/{user_id}
pub async fn get_standing<R, N>(
    State(state): State<DewordleAppState<R, N>>,
    path: Result<Path<(i32, Uuid)>, PathRejection>,
) -> DewordleResult<Json<LeaderboardEntryResponse>>
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    let Path((game_id, user_id)) = path?;
    let use_case =
        GetLeaderboardUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let entry = use_case
        .standing(game_id, &UserId::from_uuid(user_id))
        .await?;

    Ok(Json(LeaderboardEntryResponse::from(&entry)))
}
