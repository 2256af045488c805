//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.

pub mod config;
pub mod get_leaderboard;
pub mod get_user;
pub mod record_result;
pub mod register_user;

pub use get_leaderboard::{GetLeaderboardUseCase, LeaderboardPage};
pub use get_user::GetUserUseCase;
pub use record_result::{RecordResultInput, RecordResultOutput, RecordResultUseCase};
pub use register_user::{RegisterUserInput, RegisterUserUseCase};
