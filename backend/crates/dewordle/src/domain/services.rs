//! Domain Services
//!
//! Pure ranking and scoring rules.

use std::cmp::Ordering;

use crate::domain::entities::{Leaderboard, LeaderboardEntry};

/// Arithmetic mean of `total_score` over `attempts`; 0 when nothing is recorded
pub fn mean_score(total_score: i64, attempts: i64) -> f64 {
    if attempts <= 0 {
        0.0
    } else {
        total_score as f64 / attempts as f64
    }
}

/// Ranking order: most wins first, then highest average score, then the
/// aggregate that was created earliest. The id makes the order total.
pub fn ranking_order(a: &Leaderboard, b: &Leaderboard) -> Ordering {
    b.total_wins
        .cmp(&a.total_wins)
        .then_with(|| b.average_score.total_cmp(&a.average_score))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.leaderboard_id.cmp(&b.leaderboard_id))
}

/// Sort aggregates into ranking order and number them from 1.
///
/// `names` resolves the display name of each aggregate's user.
pub fn rank<'a, I, F>(aggregates: I, mut names: F) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = &'a Leaderboard>,
    F: FnMut(&Leaderboard) -> String,
{
    let mut sorted: Vec<&Leaderboard> = aggregates.into_iter().collect();
    sorted.sort_by(|a, b| ranking_order(a, b));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, lb)| LeaderboardEntry {
            rank: i as u64 + 1,
            user_name: names(lb),
            leaderboard: lb.clone(),
        })
        .collect()
}

/// Milestone reached by the latest result, if any.
///
/// Only a win can move the win count, so a loss never reaches a milestone.
pub fn reached_milestone(total_wins: i64, was_win: bool, milestones: &[u64]) -> Option<i64> {
    if !was_win || total_wins <= 0 {
        return None;
    }
    milestones
        .iter()
        .any(|&m| i64::try_from(m).is_ok_and(|m| m == total_wins))
        .then_some(total_wins)
}
