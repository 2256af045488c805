//! Dewordle Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::LeaderboardConfig;
use crate::domain::repository::MilestoneNotifier;
use crate::infra::notifier::TracingNotifier;
use crate::infra::postgres::PgDewordleRepository;
use crate::presentation::handlers::{self, DewordleAppState, DewordleStore};

/// Create the Dewordle router with the PostgreSQL repository
pub fn dewordle_router(repo: PgDewordleRepository, config: LeaderboardConfig) -> Router {
    dewordle_router_generic(repo, TracingNotifier, config)
}

/// Create a Dewordle router for any repository and notifier implementation
pub fn dewordle_router_generic<R, N>(repo: R, notifier: N, config: LeaderboardConfig) -> Router
where
    R: DewordleStore,
    N: MilestoneNotifier + Send + Sync + 'static,
{
    let state = DewordleAppState {
        repo: Arc::new(repo),
        notifier: Arc::new(notifier),
        config: Arc::new(config),
    };

    Router::new()
        .route("/users", post(handlers::register_user::<R, N>))
        .route("/users/{user_id}", get(handlers::get_user::<R, N>))
        .route("/users/{user_id}/results", get(handlers::list_results::<R, N>))
        .route("/games/{game_id}/results", post(handlers::record_result::<R, N>))
        .route("/games/{game_id}/leaderboard", get(handlers::get_leaderboard::<R, N>))
        .route(
            "/games/{game_id}/leaderboard/{user_id}",
            get(handlers::get_standing::<R, N>),
        )
        .with_state(state)
}
