//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::pg_codes;
use kernel::id::{LeaderboardId, ResultId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{
    Game, GameResult, Leaderboard, LeaderboardEntry, RecordedResult, User,
};
use crate::domain::repository::{
    GameRepository, LeaderboardRepository, ResultRepository, UserRepository,
};
use crate::domain::value_objects::{GameId, Guesses, Outcome, PageRequest, Score, UserName};
use crate::error::{DewordleError, DewordleResult};

const FK_USER: [&str; 2] = ["fk_leaderboards_user", "fk_game_results_user"];
const FK_GAME: [&str; 2] = ["fk_leaderboards_game", "fk_game_results_game"];

/// Columns of a ranked aggregate, shared by the ranking queries
const RANKED_SELECT: &str = r#"
    SELECT
        l.leaderboard_id,
        l.user_id,
        l.game_id,
        l.total_wins,
        l.total_attempts,
        l.total_score,
        l.average_score,
        l.version,
        l.created_at,
        l.updated_at,
        u.user_name,
        ROW_NUMBER() OVER (
            ORDER BY
                l.total_wins DESC,
                l.average_score DESC,
                l.created_at ASC,
                l.leaderboard_id ASC
        ) AS rank
    FROM leaderboards l
    JOIN users u ON u.user_id = l.user_id
    WHERE l.game_id = $1
"#;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgDewordleRepository {
    pool: PgPool,
}

impl PgDewordleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Round-trip to the database, for health checks
    pub async fn ping(&self) -> DewordleResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgDewordleRepository {
    async fn create(&self, user: &User) -> DewordleResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                user_name,
                user_name_canonical,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match constraint_violation(&e, pg_codes::UNIQUE_VIOLATION) {
            Some(_) => DewordleError::UserNameTaken,
            None => e.into(),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> DewordleResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                user_name,
                user_name_canonical,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn exists(&self, user_id: &UserId) -> DewordleResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> DewordleResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_name_canonical = $1)",
        )
        .bind(user_name.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

// ============================================================================
// Game Repository Implementation
// ============================================================================

impl GameRepository for PgDewordleRepository {
    async fn find_by_id(&self, game_id: GameId) -> DewordleResult<Option<Game>> {
        let row = sqlx::query_as::<_, GameRow>(
            "SELECT game_id, game_name, created_at FROM games WHERE game_id = $1",
        )
        .bind(game_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(GameRow::into_game).transpose()
    }

    async fn exists(&self, game_id: GameId) -> DewordleResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM games WHERE game_id = $1)",
        )
        .bind(game_id.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

// ============================================================================
// Result Repository Implementation
// ============================================================================

impl ResultRepository for PgDewordleRepository {
    async fn record(&self, result: &GameResult) -> DewordleResult<RecordedResult> {
        // Dropping `tx` without commit rolls back, so a cancelled request
        // leaves neither the result nor the aggregate change behind.
        let mut tx = self.pool.begin().await?;

        // Single conditional upsert, issued first so that everything after it
        // runs under the aggregate's row lock. Concurrent results for the same
        // pair apply one after another against the latest committed counters,
        // and `clock_timestamp()` read under the lock follows commit order.
        let row = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            INSERT INTO leaderboards (
                leaderboard_id,
                user_id,
                game_id,
                total_wins,
                total_attempts,
                total_score,
                average_score,
                version,
                created_at,
                updated_at
            ) VALUES (
                $1, $2, $3, $4, 1, $5, $5::DOUBLE PRECISION, 1,
                clock_timestamp(), clock_timestamp()
            )
            ON CONFLICT (user_id, game_id) DO UPDATE SET
                total_wins = leaderboards.total_wins + EXCLUDED.total_wins,
                total_attempts = leaderboards.total_attempts + 1,
                total_score = leaderboards.total_score + EXCLUDED.total_score,
                average_score = (leaderboards.total_score + EXCLUDED.total_score)::DOUBLE PRECISION
                    / (leaderboards.total_attempts + 1),
                version = leaderboards.version + 1,
                updated_at = GREATEST(leaderboards.updated_at, clock_timestamp())
            RETURNING
                leaderboard_id,
                user_id,
                game_id,
                total_wins,
                total_attempts,
                total_score,
                average_score,
                version,
                created_at,
                updated_at
            "#,
        )
        .bind(LeaderboardId::new().as_uuid())
        .bind(result.user_id.as_uuid())
        .bind(result.game_id.value())
        .bind(if result.outcome.is_win() { 1i64 } else { 0i64 })
        .bind(i64::from(result.score.value()))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_reference_error)?;

        let leaderboard = row.into_leaderboard()?;

        // The result carries the same timestamp as the aggregate change it caused
        let recorded = GameResult {
            created_at: leaderboard.updated_at,
            ..result.clone()
        };

        sqlx::query(
            r#"
            INSERT INTO game_results (
                result_id,
                user_id,
                game_id,
                outcome,
                score,
                guesses,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(recorded.result_id.as_uuid())
        .bind(recorded.user_id.as_uuid())
        .bind(recorded.game_id.value())
        .bind(recorded.outcome.as_str())
        .bind(recorded.score.value())
        .bind(recorded.guesses.map(|g| g.value()))
        .bind(recorded.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_reference_error)?;

        tx.commit().await?;

        Ok(RecordedResult {
            result: recorded,
            leaderboard,
        })
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> DewordleResult<Vec<GameResult>> {
        let rows = sqlx::query_as::<_, GameResultRow>(
            r#"
            SELECT
                result_id,
                user_id,
                game_id,
                outcome,
                score,
                guesses,
                created_at
            FROM game_results
            WHERE user_id = $1
            ORDER BY created_at DESC, result_id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GameResultRow::into_result).collect()
    }
}

// ============================================================================
// Leaderboard Repository Implementation
// ============================================================================

impl LeaderboardRepository for PgDewordleRepository {
    async fn page(
        &self,
        game_id: GameId,
        page: PageRequest,
    ) -> DewordleResult<Vec<LeaderboardEntry>> {
        let sql = format!("{RANKED_SELECT} ORDER BY rank LIMIT $2 OFFSET $3");
        let rows = sqlx::query_as::<_, RankedRow>(&sql)
            .bind(game_id.value())
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(RankedRow::into_entry).collect()
    }

    async fn standing(
        &self,
        game_id: GameId,
        user_id: &UserId,
    ) -> DewordleResult<Option<LeaderboardEntry>> {
        let sql = format!("SELECT * FROM ({RANKED_SELECT}) ranked WHERE ranked.user_id = $2");
        let row = sqlx::query_as::<_, RankedRow>(&sql)
            .bind(game_id.value())
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(RankedRow::into_entry).transpose()
    }
}

/// Name of the violated constraint if `err` carries SQLSTATE `code`
fn constraint_violation(err: &sqlx::Error, code: &str) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(code) => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// Foreign keys double as the existence check for users and games removed
/// between validation and the write.
fn map_reference_error(err: sqlx::Error) -> DewordleError {
    match constraint_violation(&err, pg_codes::FOREIGN_KEY_VIOLATION) {
        Some(name) if FK_USER.contains(&name.as_str()) => DewordleError::UserNotFound,
        Some(name) if FK_GAME.contains(&name.as_str()) => DewordleError::GameNotFound,
        _ => err.into(),
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    user_name: String,
    user_name_canonical: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.user_id),
            user_name: UserName::from_stored(self.user_name, self.user_name_canonical),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GameRow {
    game_id: i32,
    game_name: String,
    created_at: DateTime<Utc>,
}

impl GameRow {
    fn into_game(self) -> DewordleResult<Game> {
        Ok(Game {
            game_id: GameId::new(self.game_id).ok_or_else(|| {
                DewordleError::Internal(format!("stored game id {} is not positive", self.game_id))
            })?,
            name: self.game_name,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GameResultRow {
    result_id: Uuid,
    user_id: Uuid,
    game_id: i32,
    outcome: String,
    score: i32,
    guesses: Option<i16>,
    created_at: DateTime<Utc>,
}

impl GameResultRow {
    fn into_result(self) -> DewordleResult<GameResult> {
        let corrupt = |what: &str| {
            DewordleError::Internal(format!("stored result {} has invalid {}", self.result_id, what))
        };
        Ok(GameResult {
            result_id: ResultId::from_uuid(self.result_id),
            user_id: UserId::from_uuid(self.user_id),
            game_id: GameId::new(self.game_id).ok_or_else(|| corrupt("game id"))?,
            outcome: self
                .outcome
                .parse::<Outcome>()
                .map_err(|_| corrupt("outcome"))?,
            score: Score::new(i64::from(self.score)).ok_or_else(|| corrupt("score"))?,
            guesses: self
                .guesses
                .map(|g| Guesses::new(i64::from(g)).ok_or_else(|| corrupt("guesses")))
                .transpose()?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LeaderboardRow {
    leaderboard_id: Uuid,
    user_id: Uuid,
    game_id: i32,
    total_wins: i64,
    total_attempts: i64,
    total_score: i64,
    average_score: f64,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeaderboardRow {
    fn into_leaderboard(self) -> DewordleResult<Leaderboard> {
        let game_id = GameId::new(self.game_id).ok_or_else(|| {
            DewordleError::Internal(format!(
                "leaderboard {} has non-positive game id {}",
                self.leaderboard_id, self.game_id
            ))
        })?;
        Ok(Leaderboard {
            leaderboard_id: LeaderboardId::from_uuid(self.leaderboard_id),
            user_id: UserId::from_uuid(self.user_id),
            game_id,
            total_wins: self.total_wins,
            total_attempts: self.total_attempts,
            total_score: self.total_score,
            average_score: self.average_score,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RankedRow {
    #[sqlx(flatten)]
    leaderboard: LeaderboardRow,
    user_name: String,
    rank: i64,
}

impl RankedRow {
    fn into_entry(self) -> DewordleResult<LeaderboardEntry> {
        Ok(LeaderboardEntry {
            rank: self.rank.max(1) as u64,
            user_name: self.user_name,
            leaderboard: self.leaderboard.into_leaderboard()?,
        })
    }
}
