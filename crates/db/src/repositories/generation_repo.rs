//! Repository for the `generations` table.

use sqlx::PgPool;

use reelforge_core::generation::GenerationStatus;
use reelforge_core::types::DbId;

use crate::models::generation::{CreateGeneration, GenerationRow};

/// Column list for generations queries.
const COLUMNS: &str = "id, shot_id, film_id, mode, engine, status, compile_hash, \
    prompt_snapshot, plan_snapshot, parent_generation_id, output_urls, seed, \
    last_error, created_at, updated_at";

/// CRUD for generation records (write-once after a terminal status).
pub struct GenerationRepo;

impl GenerationRepo {
    /// Insert a new generation row in the `created` status.
    pub async fn create(
        pool: &PgPool,
        input: &CreateGeneration,
    ) -> Result<GenerationRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO generations
                (shot_id, film_id, mode, engine, status, compile_hash,
                 prompt_snapshot, plan_snapshot, parent_generation_id)
             VALUES ($1, $2, $3, $4, 'created', $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationRow>(&query)
            .bind(input.shot_id)
            .bind(input.film_id)
            .bind(&input.mode)
            .bind(&input.engine)
            .bind(&input.compile_hash)
            .bind(&input.prompt_snapshot)
            .bind(&input.plan_snapshot)
            .bind(input.parent_generation_id)
            .fetch_one(pool)
            .await
    }

    /// Move a row into a running status. Guarded so a row that already
    /// reached a terminal status is never touched.
    /// Returns `true` if a row was updated.
    pub async fn mark_running(
        pool: &PgPool,
        id: DbId,
        status: GenerationStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generations SET status = $1, updated_at = now()
             WHERE id = $2 AND status = 'created'",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal success update. Only non-terminal rows are eligible.
    pub async fn mark_complete(
        pool: &PgPool,
        id: DbId,
        output_urls: &serde_json::Value,
        seed: Option<i64>,
        engine: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generations SET
                status = 'complete',
                output_urls = $1,
                seed = $2,
                engine = $3,
                updated_at = now()
             WHERE id = $4 AND status NOT IN ('complete', 'failed')",
        )
        .bind(output_urls)
        .bind(seed)
        .bind(engine)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal failure update. Only non-terminal rows are eligible.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        error_message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generations SET
                status = 'failed',
                last_error = $1,
                updated_at = now()
             WHERE id = $2 AND status NOT IN ('complete', 'failed')",
        )
        .bind(error_message)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a generation by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<GenerationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generations WHERE id = $1");
        sqlx::query_as::<_, GenerationRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all generations for a shot, newest first.
    pub async fn list_for_shot(
        pool: &PgPool,
        shot_id: DbId,
    ) -> Result<Vec<GenerationRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generations
             WHERE shot_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, GenerationRow>(&query)
            .bind(shot_id)
            .fetch_all(pool)
            .await
    }

    /// Mark generations stuck in a non-terminal status for longer than
    /// `older_than_secs` as failed. A crash mid-dispatch leaves such rows
    /// behind by design; this is the operator cleanup path.
    /// Returns the ids of the rows swept.
    pub async fn sweep_stuck(
        pool: &PgPool,
        older_than_secs: i64,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "UPDATE generations SET
                status = 'failed',
                last_error = 'Swept: stuck in-progress record (dispatcher crash or abandon)',
                updated_at = now()
             WHERE status NOT IN ('complete', 'failed')
               AND updated_at < now() - make_interval(secs => $1::double precision)
             RETURNING id",
        )
        .bind(older_than_secs)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
