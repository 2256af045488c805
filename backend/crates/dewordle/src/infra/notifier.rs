//! Milestone Notifier Implementations

use crate::domain::entities::Milestone;
use crate::domain::repository::MilestoneNotifier;

/// Emits milestones as structured log events. Mail delivery hooks in by
/// providing another `MilestoneNotifier`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl MilestoneNotifier for TracingNotifier {
    async fn notify(&self, milestone: Milestone) {
        tracing::info!(
            user_id = %milestone.user_id,
            game_id = %milestone.game_id,
            total_wins = milestone.total_wins,
            reached_at = %milestone.reached_at,
            "Win milestone reached"
        );
    }
}
