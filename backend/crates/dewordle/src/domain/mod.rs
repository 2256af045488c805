//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (User, Game, GameResult, Leaderboard)
//! - Domain value objects (GameId, Outcome, Score, UserName)
//! - Domain services (ranking and scoring rules)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
