//! Unit tests for the Dewordle crate
//!
//! Use cases run against the in-memory repository; HTTP tests drive the
//! generic router with `tower::ServiceExt::oneshot`.

#[cfg(test)]
mod support {
    use kernel::id::UserId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc;

    use crate::application::config::LeaderboardConfig;
    use crate::application::{
        RecordResultInput, RecordResultUseCase, RegisterUserInput, RegisterUserUseCase,
    };
    use crate::domain::entities::{GameResult, Milestone, RecordedResult};
    use crate::domain::repository::{MilestoneNotifier, ResultRepository};
    use crate::error::{DewordleError, DewordleResult};
    use crate::infra::memory::MemoryDewordleRepository;
    use crate::infra::notifier::TracingNotifier;

    pub type MemoryRecordUseCase<R = MemoryDewordleRepository, N = TracingNotifier> =
        RecordResultUseCase<MemoryDewordleRepository, MemoryDewordleRepository, R, N>;

    pub async fn register(repo: &MemoryDewordleRepository, name: &str) -> UserId {
        RegisterUserUseCase::new(Arc::new(repo.clone()))
            .execute(RegisterUserInput {
                user_name: name.to_string(),
            })
            .await
            .expect("registration should succeed")
            .user_id
    }

    pub fn record_use_case(repo: &MemoryDewordleRepository) -> MemoryRecordUseCase {
        RecordResultUseCase::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(TracingNotifier),
            Arc::new(LeaderboardConfig::without_backoff()),
        )
    }

    pub fn input(user_id: UserId, outcome: &str, score: i64) -> RecordResultInput {
        RecordResultInput {
            user_id,
            game_id: 1,
            outcome: outcome.to_string(),
            score,
            guesses: None,
        }
    }

    /// Result log that fails its first `failures` records with `error`
    #[derive(Clone)]
    pub struct FlakyResults {
        pub inner: MemoryDewordleRepository,
        pub failures_left: Arc<AtomicU32>,
        pub calls: Arc<AtomicU32>,
        pub error: fn() -> DewordleError,
    }

    impl FlakyResults {
        pub fn new(
            inner: MemoryDewordleRepository,
            failures: u32,
            error: fn() -> DewordleError,
        ) -> Self {
            Self {
                inner,
                failures_left: Arc::new(AtomicU32::new(failures)),
                calls: Arc::new(AtomicU32::new(0)),
                error,
            }
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ResultRepository for FlakyResults {
        async fn record(&self, result: &GameResult) -> DewordleResult<RecordedResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err((self.error)());
            }
            self.inner.record(result).await
        }

        async fn list_by_user(
            &self,
            user_id: &UserId,
            limit: u32,
        ) -> DewordleResult<Vec<GameResult>> {
            self.inner.list_by_user(user_id, limit).await
        }
    }

    /// Forwards milestones into a channel the test can read
    pub struct ChannelNotifier(pub mpsc::UnboundedSender<Milestone>);

    impl MilestoneNotifier for ChannelNotifier {
        async fn notify(&self, milestone: Milestone) {
            let _ = self.0.send(milestone);
        }
    }
}

#[cfg(test)]
mod aggregate_tests {
    use super::support::*;
    use crate::domain::value_objects::GameId;
    use crate::error::DewordleError;
    use crate::infra::memory::MemoryDewordleRepository;
    use kernel::id::UserId;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_end_to_end_example() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "player_one").await;
        let use_case = record_use_case(&repo);

        assert_ok!(use_case.execute(input(user, "win", 100)).await);
        assert_ok!(use_case.execute(input(user, "loss", 50)).await);
        let output = assert_ok!(use_case.execute(input(user, "win", 90)).await);

        let lb = output.leaderboard;
        assert_eq!(lb.total_attempts, 3);
        assert_eq!(lb.total_wins, 2);
        assert_eq!(lb.average_score, 80.0);
        assert_eq!(lb.version, 3);
        assert_eq!(output.attempts, 1);
        assert_eq!(repo.result_count().await, 3);
    }

    #[tokio::test]
    async fn test_aggregate_matches_result_log() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "counter").await;
        let use_case = record_use_case(&repo);

        let submissions = [
            ("win", 12),
            ("loss", 0),
            ("loss", 7),
            ("win", 1000),
            ("win", 3),
            ("loss", 41),
            ("win", 999),
        ];
        for (outcome, score) in submissions {
            assert_ok!(use_case.execute(input(user, outcome, score)).await);
        }

        let lb = repo.aggregate(&user, GameId::DEWORDLE).await.unwrap();
        let n = submissions.len() as i64;
        let wins = submissions.iter().filter(|(o, _)| *o == "win").count() as i64;
        let sum: i64 = submissions.iter().map(|(_, s)| s).sum();

        assert_eq!(lb.total_attempts, n);
        assert_eq!(lb.total_wins, wins);
        assert!(lb.total_wins <= lb.total_attempts);
        assert!((lb.average_score - sum as f64 / n as f64).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_negative_score_changes_nothing() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "negative").await;
        let use_case = record_use_case(&repo);

        let err = assert_err!(use_case.execute(input(user, "win", -1)).await);
        assert!(matches!(err, DewordleError::InvalidInput(_)));
        assert_eq!(repo.result_count().await, 0);
        assert!(repo.aggregate(&user, GameId::DEWORDLE).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_outcome_is_invalid_input() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "drawer").await;

        let err = assert_err!(record_use_case(&repo).execute(input(user, "draw", 5)).await);
        assert!(matches!(err, DewordleError::InvalidInput(_)));
        assert_eq!(repo.result_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_changes_nothing() {
        let repo = MemoryDewordleRepository::new();
        let ghost = UserId::new();

        let err = assert_err!(record_use_case(&repo).execute(input(ghost, "win", 10)).await);
        assert!(matches!(err, DewordleError::UserNotFound));
        assert_eq!(repo.result_count().await, 0);
        assert!(repo.aggregate(&ghost, GameId::DEWORDLE).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "wanderer").await;
        let mut request = input(user, "win", 10);
        request.game_id = 42;

        let err = assert_err!(record_use_case(&repo).execute(request).await);
        assert!(matches!(err, DewordleError::GameNotFound));
    }

    #[tokio::test]
    async fn test_aggregates_are_per_game() {
        let repo = MemoryDewordleRepository::new();
        let second = GameId::new(2).unwrap();
        repo.add_game(second, "Speed Dewordle").await;
        let user = register(&repo, "multi").await;
        let use_case = record_use_case(&repo);

        assert_ok!(use_case.execute(input(user, "win", 10)).await);
        let mut other = input(user, "loss", 30);
        other.game_id = 2;
        assert_ok!(use_case.execute(other).await);

        let first = repo.aggregate(&user, GameId::DEWORDLE).await.unwrap();
        let speed = repo.aggregate(&user, second).await.unwrap();
        assert_eq!((first.total_wins, first.total_attempts), (1, 1));
        assert_eq!((speed.total_wins, speed.total_attempts), (0, 1));
        assert_eq!(speed.average_score, 30.0);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::support::*;
    use crate::domain::value_objects::GameId;
    use crate::infra::memory::MemoryDewordleRepository;
    use std::sync::Arc;

    fn submissions() -> Vec<(&'static str, i64)> {
        (0..64)
            .map(|i| (if i % 3 == 0 { "win" } else { "loss" }, (i * 37 % 101) as i64))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_match_sequential() {
        let sequential_repo = MemoryDewordleRepository::new();
        let seq_user = register(&sequential_repo, "sequential").await;
        let seq_use_case = record_use_case(&sequential_repo);
        for (outcome, score) in submissions() {
            seq_use_case
                .execute(input(seq_user, outcome, score))
                .await
                .unwrap();
        }

        let concurrent_repo = MemoryDewordleRepository::new();
        let user = register(&concurrent_repo, "concurrent").await;
        let use_case = Arc::new(record_use_case(&concurrent_repo));

        let handles: Vec<_> = submissions()
            .into_iter()
            .map(|(outcome, score)| {
                let use_case = use_case.clone();
                tokio::spawn(async move { use_case.execute(input(user, outcome, score)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let expected = sequential_repo
            .aggregate(&seq_user, GameId::DEWORDLE)
            .await
            .unwrap();
        let actual = concurrent_repo
            .aggregate(&user, GameId::DEWORDLE)
            .await
            .unwrap();

        assert_eq!(actual.total_attempts, 64);
        assert_eq!(actual.total_attempts, expected.total_attempts);
        assert_eq!(actual.total_wins, expected.total_wins);
        assert_eq!(actual.total_score, expected.total_score);
        assert_eq!(actual.average_score, expected.average_score);
        assert_eq!(actual.version, 64);
        assert_eq!(concurrent_repo.result_count().await, 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_different_pairs_do_not_interfere() {
        let repo = MemoryDewordleRepository::new();
        let a = register(&repo, "alpha").await;
        let b = register(&repo, "bravo").await;
        let use_case = Arc::new(record_use_case(&repo));

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let use_case = use_case.clone();
                let user = if i % 2 == 0 { a } else { b };
                tokio::spawn(async move { use_case.execute(input(user, "win", 10)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for user in [a, b] {
            let lb = repo.aggregate(&user, GameId::DEWORDLE).await.unwrap();
            assert_eq!(lb.total_attempts, 20);
            assert_eq!(lb.total_wins, 20);
        }
    }
}

#[cfg(test)]
mod retry_tests {
    use super::support::*;
    use crate::application::RecordResultUseCase;
    use crate::application::config::LeaderboardConfig;
    use crate::error::DewordleError;
    use crate::infra::memory::MemoryDewordleRepository;
    use crate::infra::notifier::TracingNotifier;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn flaky_use_case(
        repo: &MemoryDewordleRepository,
        flaky: &FlakyResults,
        max_attempts: u32,
    ) -> MemoryRecordUseCase<FlakyResults> {
        RecordResultUseCase::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(flaky.clone()),
            Arc::new(TracingNotifier),
            Arc::new(LeaderboardConfig {
                max_attempts,
                ..LeaderboardConfig::without_backoff()
            }),
        )
    }

    #[tokio::test]
    async fn test_serialization_failures_are_retried() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "retrier").await;
        let flaky = FlakyResults::new(repo.clone(), 3, || DewordleError::SerializationFailure);

        let output = assert_ok!(
            flaky_use_case(&repo, &flaky, 4)
                .execute(input(user, "win", 70))
                .await
        );
        assert_eq!(output.attempts, 4);
        assert_eq!(flaky.calls(), 4);
        assert_eq!(output.leaderboard.total_attempts, 1);
        assert_eq!(repo.result_count().await, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_conflict() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "unlucky").await;
        let flaky = FlakyResults::new(repo.clone(), 10, || DewordleError::SerializationFailure);

        let err = assert_err!(
            flaky_use_case(&repo, &flaky, 3)
                .execute(input(user, "win", 70))
                .await
        );
        assert!(matches!(err, DewordleError::Conflict { attempts: 3 }));
        assert_eq!(flaky.calls(), 3);
        assert_eq!(repo.result_count().await, 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_is_not_retried() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "offline").await;
        let flaky = FlakyResults::new(repo.clone(), 1, || {
            DewordleError::StoreUnavailable(sqlx::Error::PoolTimedOut)
        });

        let err = assert_err!(
            flaky_use_case(&repo, &flaky, 4)
                .execute(input(user, "loss", 1))
                .await
        );
        assert!(matches!(err, DewordleError::StoreUnavailable(_)));
        assert_eq!(flaky.calls(), 1);
        assert_eq!(repo.result_count().await, 0);
    }
}

#[cfg(test)]
mod ranking_tests {
    use super::support::*;
    use crate::application::GetLeaderboardUseCase;
    use crate::application::config::LeaderboardConfig;
    use crate::error::DewordleError;
    use crate::infra::memory::MemoryDewordleRepository;
    use kernel::id::UserId;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn leaderboard_use_case(
        repo: &MemoryDewordleRepository,
    ) -> GetLeaderboardUseCase<MemoryDewordleRepository, MemoryDewordleRepository> {
        GetLeaderboardUseCase::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(LeaderboardConfig::default()),
        )
    }

    /// Three players: (5 wins, avg 80), (5 wins, avg 90), (3 wins, avg 99)
    async fn seeded() -> (MemoryDewordleRepository, [UserId; 3]) {
        let repo = MemoryDewordleRepository::new();
        let eighty = register(&repo, "eighty").await;
        let ninety = register(&repo, "ninety").await;
        let ninety_nine = register(&repo, "ninety_nine").await;
        let use_case = record_use_case(&repo);

        for (user, wins, score) in [(eighty, 5, 80), (ninety, 5, 90), (ninety_nine, 3, 99)] {
            for _ in 0..wins {
                use_case.execute(input(user, "win", score)).await.unwrap();
            }
        }
        (repo, [eighty, ninety, ninety_nine])
    }

    #[tokio::test]
    async fn test_ranking_order() {
        let (repo, [eighty, ninety, ninety_nine]) = seeded().await;

        let page = assert_ok!(leaderboard_use_case(&repo).page(1, None, None).await);
        let users: Vec<UserId> = page.entries.iter().map(|e| e.leaderboard.user_id).collect();
        assert_eq!(users, vec![ninety, eighty, ninety_nine]);
        assert_eq!(page.entries[0].user_name, "ninety");
        assert_eq!(page.entries[2].rank, 3);
        assert_eq!(page.page.limit, 20);
    }

    #[tokio::test]
    async fn test_paging() {
        let (repo, [eighty, _, _]) = seeded().await;

        let page = assert_ok!(leaderboard_use_case(&repo).page(1, Some(1), Some(1)).await);
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].rank, 2);
        assert_eq!(page.entries[0].leaderboard.user_id, eighty);

        let past_end = assert_ok!(leaderboard_use_case(&repo).page(1, Some(10), Some(10)).await);
        assert!(past_end.entries.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_paging_is_rejected() {
        let (repo, _) = seeded().await;
        let use_case = leaderboard_use_case(&repo);

        for (limit, offset) in [(Some(0), None), (Some(101), None), (None, Some(-1))] {
            let err = assert_err!(use_case.page(1, limit, offset).await);
            assert!(matches!(err, DewordleError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_unknown_game_leaderboard() {
        let (repo, _) = seeded().await;
        let err = assert_err!(leaderboard_use_case(&repo).page(7, None, None).await);
        assert!(matches!(err, DewordleError::GameNotFound));
    }

    #[tokio::test]
    async fn test_standing() {
        let (repo, [_, _, ninety_nine]) = seeded().await;
        let use_case = leaderboard_use_case(&repo);

        let entry = assert_ok!(use_case.standing(1, &ninety_nine).await);
        assert_eq!(entry.rank, 3);
        assert_eq!(entry.leaderboard.average_score, 99.0);

        let newcomer = register(&repo, "newcomer").await;
        let err = assert_err!(use_case.standing(1, &newcomer).await);
        assert!(matches!(err, DewordleError::StandingNotFound));
    }
}

#[cfg(test)]
mod milestone_tests {
    use super::support::*;
    use crate::application::RecordResultUseCase;
    use crate::application::config::LeaderboardConfig;
    use crate::infra::memory::MemoryDewordleRepository;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_first_win_dispatches_milestone() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "achiever").await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let use_case = RecordResultUseCase::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(ChannelNotifier(tx)),
            Arc::new(LeaderboardConfig {
                win_milestones: vec![1, 3],
                ..LeaderboardConfig::without_backoff()
            }),
        );

        use_case.execute(input(user, "loss", 5)).await.unwrap();
        use_case.execute(input(user, "win", 5)).await.unwrap();
        use_case.execute(input(user, "win", 5)).await.unwrap();
        use_case.execute(input(user, "win", 5)).await.unwrap();

        let mut reached = Vec::new();
        for _ in 0..2 {
            let milestone = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(milestone.user_id, user);
            reached.push(milestone.total_wins);
        }
        reached.sort_unstable();
        assert_eq!(reached, vec![1, 3]);

        drop(use_case);
        assert!(rx.recv().await.is_none());
    }
}

#[cfg(test)]
mod user_tests {
    use super::support::*;
    use crate::application::config::LeaderboardConfig;
    use crate::application::{GetUserUseCase, RegisterUserInput, RegisterUserUseCase};
    use crate::domain::entities::GameResult;
    use crate::error::DewordleError;
    use crate::infra::memory::MemoryDewordleRepository;
    use kernel::id::UserId;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn user_use_case(
        repo: &MemoryDewordleRepository,
    ) -> GetUserUseCase<MemoryDewordleRepository, MemoryDewordleRepository> {
        GetUserUseCase::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(LeaderboardConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_duplicate_user_name_is_rejected() {
        let repo = MemoryDewordleRepository::new();
        register(&repo, "Wordy").await;

        let err = assert_err!(
            RegisterUserUseCase::new(Arc::new(repo.clone()))
                .execute(RegisterUserInput {
                    user_name: "wordy".to_string(),
                })
                .await
        );
        assert!(matches!(err, DewordleError::UserNameTaken));
    }

    #[tokio::test]
    async fn test_invalid_user_name_is_rejected() {
        let repo = MemoryDewordleRepository::new();
        let err = assert_err!(
            RegisterUserUseCase::new(Arc::new(repo))
                .execute(RegisterUserInput {
                    user_name: "x".to_string(),
                })
                .await
        );
        assert!(matches!(err, DewordleError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "lookup").await;

        let found = assert_ok!(user_use_case(&repo).profile(&user).await);
        assert_eq!(found.user_name.original(), "lookup");

        let err = assert_err!(user_use_case(&repo).profile(&UserId::new()).await);
        assert!(matches!(err, DewordleError::UserNotFound));
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_limited() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "historian").await;
        let use_case = record_use_case(&repo);
        for score in [1, 2, 3, 4] {
            use_case.execute(input(user, "loss", score)).await.unwrap();
        }

        let history: Vec<GameResult> =
            assert_ok!(user_use_case(&repo).history(&user, Some(3)).await);
        let scores: Vec<i32> = history.iter().map(|r| r.score.value()).collect();
        assert_eq!(scores, vec![4, 3, 2]);

        let err = assert_err!(user_use_case(&repo).history(&UserId::new(), None).await);
        assert!(matches!(err, DewordleError::UserNotFound));

        let err = assert_err!(user_use_case(&repo).history(&user, Some(0)).await);
        assert!(matches!(err, DewordleError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_results_are_stamped_when_applied() {
        let repo = MemoryDewordleRepository::new();
        let user = register(&repo, "stamped").await;
        let use_case = record_use_case(&repo);

        let mut previous = None;
        for score in [5, 6, 7] {
            let output = use_case.execute(input(user, "win", score)).await.unwrap();
            assert_eq!(output.result.created_at, output.leaderboard.updated_at);
            if let Some(previous) = previous {
                assert!(output.result.created_at >= previous);
            }
            previous = Some(output.result.created_at);
        }

        let history = user_use_case(&repo).history(&user, None).await.unwrap();
        assert!(
            history
                .windows(2)
                .all(|pair| pair[0].created_at >= pair[1].created_at)
        );
    }
}

#[cfg(test)]
mod config_tests {
    use crate::application::config::LeaderboardConfig;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = LeaderboardConfig::default();
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 100);
        assert!(config.win_milestones.contains(&1));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = LeaderboardConfig::default();
        assert_eq!(config.backoff_for(1), Duration::from_millis(25));
        assert_eq!(config.backoff_for(2), Duration::from_millis(50));
        assert_eq!(config.backoff_for(3), Duration::from_millis(100));
        assert_eq!(config.backoff_for(10), Duration::from_millis(400));
        assert_eq!(config.backoff_for(64), Duration::from_millis(400));
    }

    #[test]
    fn test_without_backoff() {
        let config = LeaderboardConfig::without_backoff();
        assert_eq!(config.backoff_for(3), Duration::ZERO);
    }
}

#[cfg(test)]
mod error_tests {
    use crate::error::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use kernel::error::{app_error::AppError, kind::ErrorKind};

    #[test]
    fn test_error_into_response_status_codes() {
        let test_cases: Vec<(DewordleError, StatusCode)> = vec![
            (DewordleError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (DewordleError::UserNotFound, StatusCode::NOT_FOUND),
            (DewordleError::GameNotFound, StatusCode::NOT_FOUND),
            (DewordleError::StandingNotFound, StatusCode::NOT_FOUND),
            (DewordleError::UserNameTaken, StatusCode::CONFLICT),
            (DewordleError::Conflict { attempts: 4 }, StatusCode::CONFLICT),
            (
                DewordleError::StoreUnavailable(sqlx::Error::PoolTimedOut),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                DewordleError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected_status) in test_cases {
            assert_eq!(error.status_code(), expected_status);
            assert_eq!(error.kind().status_code(), expected_status.as_u16());
            assert_eq!(error.into_response().status(), expected_status);
        }
    }

    #[test]
    fn test_sqlx_errors_are_classified() {
        assert!(matches!(
            DewordleError::from(sqlx::Error::PoolClosed),
            DewordleError::StoreUnavailable(_)
        ));
        assert!(matches!(
            DewordleError::from(sqlx::Error::RowNotFound),
            DewordleError::Database(_)
        ));
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let app = DewordleError::Internal("secret stack".into()).to_app_error();
        assert_eq!(app.kind(), ErrorKind::InternalServerError);
        assert!(!app.message().contains("secret"));

        let conflict = DewordleError::Conflict { attempts: 4 }.to_app_error();
        assert_eq!(conflict.action(), Some("Retry the request"));

        let db = AppError::from(DewordleError::Database(sqlx::Error::RowNotFound));
        assert_eq!(db.message(), "Internal server error");
        assert!(std::error::Error::source(&db).is_some());
    }
}

#[cfg(test)]
mod http_tests {
    use crate::application::config::LeaderboardConfig;
    use crate::infra::memory::MemoryDewordleRepository;
    use crate::infra::notifier::TracingNotifier;
    use crate::presentation::router::dewordle_router_generic;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        dewordle_router_generic(
            MemoryDewordleRepository::new(),
            TracingNotifier,
            LeaderboardConfig::without_backoff(),
        )
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_user(app: &Router, name: &str) -> String {
        let (status, body) = send(app, "POST", "/users", Some(json!({ "userName": name }))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["userId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_record_and_rank_over_http() {
        let app = app();
        let user_id = create_user(&app, "http_player").await;

        for (outcome, score) in [("win", 100), ("loss", 50), ("WIN", 90)] {
            let (status, body) = send(
                &app,
                "POST",
                "/games/1/results",
                Some(json!({ "userId": user_id, "outcome": outcome, "score": score, "guesses": 4 })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["result"]["guesses"], 4);
        }

        let (status, body) = send(&app, "GET", "/games/1/leaderboard?limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gameName"], "Dewordle");
        assert_eq!(body["limit"], 5);
        let entry = &body["entries"][0];
        assert_eq!(entry["rank"], 1);
        assert_eq!(entry["userName"], "http_player");
        assert_eq!(entry["totalAttempts"], 3);
        assert_eq!(entry["totalWins"], 2);
        assert_eq!(entry["averageScore"], 80.0);

        let (status, body) = send(&app, "GET", &format!("/games/1/leaderboard/{user_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rank"], 1);

        let (status, body) = send(&app, "GET", &format!("/users/{user_id}/results"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["outcome"], "win");
    }

    #[tokio::test]
    async fn test_negative_score_is_bad_request() {
        let app = app();
        let user_id = create_user(&app, "cheater").await;

        let (status, body) = send(
            &app,
            "POST",
            "/games/1/results",
            Some(json!({ "userId": user_id, "outcome": "win", "score": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["title"], "Bad Request");

        let (_, body) = send(&app, "GET", "/games/1/leaderboard", None).await;
        assert!(body["entries"].as_array().unwrap().is_empty());
    }

    fn assert_bad_request(status: StatusCode, body: &Value) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["title"], "Bad Request");
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_result_bodies_are_bad_request() {
        let app = app();
        let user_id = create_user(&app, "sloppy").await;

        let bodies = [
            json!({ "userId": user_id, "outcome": "win", "score": 90.5 }),
            json!({ "userId": user_id, "outcome": "win", "score": "abc" }),
            json!({ "userId": user_id, "score": 10 }),
            json!({ "userId": "not-a-uuid", "outcome": "win", "score": 10 }),
        ];
        for body in bodies {
            let (status, body) = send(&app, "POST", "/games/1/results", Some(body)).await;
            assert_bad_request(status, &body);
        }

        let (_, body) = send(&app, "GET", "/games/1/leaderboard", None).await;
        assert!(body["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let app = app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users")
                    .body(Body::from(r#"{"userName":"plain"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_bad_request(status, &body);
    }

    #[tokio::test]
    async fn test_malformed_query_and_path_are_bad_request() {
        let app = app();

        let (status, body) = send(&app, "GET", "/games/1/leaderboard?limit=abc", None).await;
        assert_bad_request(status, &body);

        let (status, body) = send(&app, "GET", "/games/one/leaderboard", None).await;
        assert_bad_request(status, &body);

        let (status, body) = send(&app, "GET", "/users/not-a-uuid", None).await;
        assert_bad_request(status, &body);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/games/1/results",
            Some(json!({
                "userId": "00000000-0000-0000-0000-000000000000",
                "outcome": "loss",
                "score": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "User not found");
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = app();
        create_user(&app, "twin").await;
        let (status, _) = send(&app, "POST", "/users", Some(json!({ "userName": "TWIN" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}

/// Runs against a throwaway database created by `#[sqlx::test]`.
///
/// `DATABASE_URL=postgres://... cargo test -p dewordle -- --ignored`
#[cfg(test)]
mod postgres_tests {
    use crate::application::config::LeaderboardConfig;
    use crate::application::{
        GetLeaderboardUseCase, RecordResultInput, RecordResultUseCase, RegisterUserInput,
        RegisterUserUseCase,
    };
    use crate::domain::entities::GameResult;
    use crate::domain::repository::ResultRepository;
    use crate::domain::value_objects::{GameId, Outcome, Score};
    use crate::error::DewordleError;
    use crate::infra::notifier::TracingNotifier;
    use crate::infra::postgres::PgDewordleRepository;
    use chrono::Utc;
    use kernel::id::{ResultId, UserId};
    use sqlx::PgPool;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    type PgRecordUseCase = RecordResultUseCase<
        PgDewordleRepository,
        PgDewordleRepository,
        PgDewordleRepository,
        TracingNotifier,
    >;

    fn record_use_case(repo: &PgDewordleRepository) -> PgRecordUseCase {
        let repo = Arc::new(repo.clone());
        RecordResultUseCase::new(
            repo.clone(),
            repo.clone(),
            repo,
            Arc::new(TracingNotifier),
            Arc::new(LeaderboardConfig::default()),
        )
    }

    async fn register(repo: &PgDewordleRepository, name: &str) -> UserId {
        RegisterUserUseCase::new(Arc::new(repo.clone()))
            .execute(RegisterUserInput {
                user_name: name.to_string(),
            })
            .await
            .unwrap()
            .user_id
    }

    fn input(user_id: UserId, outcome: &str, score: i64) -> RecordResultInput {
        RecordResultInput {
            user_id,
            game_id: 1,
            outcome: outcome.to_string(),
            score,
            guesses: Some(4),
        }
    }

    async fn result_rows(pool: &PgPool, user_id: UserId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM game_results WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_end_to_end_example(pool: PgPool) {
        let repo = PgDewordleRepository::new(pool.clone());
        let user = register(&repo, "player_one").await;
        let use_case = record_use_case(&repo);

        assert_ok!(use_case.execute(input(user, "win", 100)).await);
        assert_ok!(use_case.execute(input(user, "loss", 50)).await);
        let output = assert_ok!(use_case.execute(input(user, "win", 90)).await);

        let lb = output.leaderboard;
        assert_eq!(lb.total_attempts, 3);
        assert_eq!(lb.total_wins, 2);
        assert_eq!(lb.total_score, 240);
        assert_eq!(lb.average_score, 80.0);
        assert_eq!(lb.version, 3);
        assert_eq!(output.result.created_at, lb.updated_at);
        assert_eq!(result_rows(&pool, user).await, 3);

        let page = GetLeaderboardUseCase::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(LeaderboardConfig::default()),
        )
        .page(1, None, None)
        .await
        .unwrap();
        assert_eq!(page.game.name, "Dewordle");
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].rank, 1);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_records_on_one_pair(pool: PgPool) {
        const K: i64 = 32;

        let repo = PgDewordleRepository::new(pool.clone());
        let user = register(&repo, "contended").await;
        let use_case = Arc::new(record_use_case(&repo));

        let handles: Vec<_> = (0..K)
            .map(|i| {
                let use_case = use_case.clone();
                let outcome = if i % 2 == 0 { "win" } else { "loss" };
                tokio::spawn(async move { use_case.execute(input(user, outcome, i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let (attempts, wins, total, version): (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT total_attempts, total_wins, total_score, version \
             FROM leaderboards WHERE user_id = $1 AND game_id = 1",
        )
        .bind(user.as_uuid())
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(attempts, K);
        assert_eq!(wins, K / 2);
        assert_eq!(total, (0..K).sum::<i64>());
        assert_eq!(version, K);
        assert_eq!(result_rows(&pool, user).await, K);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_unknown_user_violates_reference(pool: PgPool) {
        let repo = PgDewordleRepository::new(pool.clone());
        let ghost = UserId::new();
        let result = GameResult {
            result_id: ResultId::new(),
            user_id: ghost,
            game_id: GameId::DEWORDLE,
            outcome: Outcome::Win,
            score: Score::new(10).unwrap(),
            guesses: None,
            created_at: Utc::now(),
        };

        let err = assert_err!(repo.record(&result).await);
        assert!(matches!(err, DewordleError::UserNotFound));

        let aggregates: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leaderboards")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(aggregates, 0);
        assert_eq!(result_rows(&pool, ghost).await, 0);
    }
}
