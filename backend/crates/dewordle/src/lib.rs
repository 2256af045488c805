//! Dewordle Game Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, ranking rules, repository traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL and in-memory implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Consistency Model
//! - Results are append-only; each one is folded into exactly one
//!   (user, game) aggregate in the same transaction that appends it
//! - Aggregate updates are a single atomic upsert, linearized per pair by the
//!   row lock it takes
//! - Serialization aborts are retried a bounded number of times; an
//!   unreachable store is reported immediately

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::LeaderboardConfig;
pub use error::{DewordleError, DewordleResult};
pub use infra::memory::MemoryDewordleRepository;
pub use infra::notifier::TracingNotifier;
pub use infra::postgres::PgDewordleRepository;
pub use presentation::router::{dewordle_router, dewordle_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}

#[cfg(test)]
mod tests;
