//! Read-only repository for the upstream-owned `shots` and `films` tables.

use sqlx::PgPool;

use reelforge_core::types::DbId;

use crate::models::shot::ShotRow;

/// Column list for shots queries.
const COLUMNS: &str = "id, film_id, scene_number, action_text, camera, created_at";

/// Read access to shots and film existence.
pub struct ShotRepo;

impl ShotRepo {
    /// Find a shot by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ShotRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM shots WHERE id = $1");
        sqlx::query_as::<_, ShotRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all shots for a scene, in id order.
    pub async fn list_for_scene(
        pool: &PgPool,
        film_id: DbId,
        scene_number: i32,
    ) -> Result<Vec<ShotRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shots
             WHERE film_id = $1 AND scene_number = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, ShotRow>(&query)
            .bind(film_id)
            .bind(scene_number)
            .fetch_all(pool)
            .await
    }

    /// Whether a film row exists.
    pub async fn film_exists(pool: &PgPool, film_id: DbId) -> Result<bool, sqlx::Error> {
        let found: Option<(DbId,)> = sqlx::query_as("SELECT id FROM films WHERE id = $1")
            .bind(film_id)
            .fetch_optional(pool)
            .await?;
        Ok(found.is_some())
    }
}
