use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::repository::{RecommendationRepository, ScoreComparison, ScoreFilter, ScoreOperation},
    error::{AppError, AppResult},
    models::{NewRecommendation, Recommendation},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Translates unique-constraint failures so the service can report them as conflicts
fn map_write_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return AppError::ConstraintViolation(db_error.message().to_string());
        }
    }
    AppError::Database(error)
}

/// PostgreSQL-backed recommendation storage
#[derive(Clone)]
pub struct PgRecommendationRepository {
    pool: PgPool,
}

impl PgRecommendationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for PgRecommendationRepository {
    async fn create(&self, new: &NewRecommendation) -> AppResult<Recommendation> {
        sqlx::query_as::<_, Recommendation>(
            r#"
            INSERT INTO recommendations (name, "youtubeLink")
            VALUES ($1, $2)
            RETURNING id, name, "youtubeLink", score
            "#,
        )
        .bind(&new.name)
        .bind(&new.youtube_link)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find(&self, id: i32) -> AppResult<Option<Recommendation>> {
        let row = sqlx::query_as::<_, Recommendation>(
            r#"SELECT id, name, "youtubeLink", score FROM recommendations WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Recommendation>> {
        let row = sqlx::query_as::<_, Recommendation>(
            r#"SELECT id, name, "youtubeLink", score FROM recommendations WHERE name = $1"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, filter: Option<ScoreFilter>) -> AppResult<Vec<Recommendation>> {
        let rows = match filter {
            None => {
                sqlx::query_as::<_, Recommendation>(
                    r#"SELECT id, name, "youtubeLink", score FROM recommendations ORDER BY id DESC"#,
                )
                .fetch_all(&self.pool)
                .await?
            }
            Some(filter) => {
                let sql = match filter.comparison {
                    ScoreComparison::GreaterThan => {
                        r#"
                        SELECT id, name, "youtubeLink", score FROM recommendations
                        WHERE score > $1
                        ORDER BY id DESC
                        "#
                    }
                    ScoreComparison::LessOrEqual => {
                        r#"
                        SELECT id, name, "youtubeLink", score FROM recommendations
                        WHERE score <= $1
                        ORDER BY id DESC
                        "#
                    }
                };

                sqlx::query_as::<_, Recommendation>(sql)
                    .bind(filter.score)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows)
    }

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT id, name, "youtubeLink", score FROM recommendations
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_amount_by_score(&self, amount: i64) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT id, name, "youtubeLink", score FROM recommendations
            ORDER BY score DESC, id ASC
            LIMIT $1
            "#,
        )
        .bind(amount)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update_score(&self, id: i32, operation: ScoreOperation) -> AppResult<Recommendation> {
        // Single statement so concurrent votes never lose an update
        let row = sqlx::query_as::<_, Recommendation>(
            r#"
            UPDATE recommendations
            SET score = score + $2
            WHERE id = $1
            RETURNING id, name, "youtubeLink", score
            "#,
        )
        .bind(id)
        .bind(operation.delta())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(AppError::not_found)
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM recommendations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn reset(&self) -> AppResult<()> {
        sqlx::query("TRUNCATE TABLE recommendations RESTART IDENTITY")
            .execute(&self.pool)
            .await?;

        tracing::warn!("Recommendations table truncated");

        Ok(())
    }
}
