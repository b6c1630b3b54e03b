//! PostgreSQL implementations of the core collaborator traits.
//!
//! Thin adapters over the repositories: they translate sqlx errors into
//! `CoreError::Internal` and row structs into domain types, so the pipeline
//! crate stays free of sqlx.

use async_trait::async_trait;

use reelforge_core::error::CoreError;
use reelforge_core::generation::GenerationStatus;
use reelforge_core::providers::{
    FilmProvider, GenerationRecord, GenerationStore, NewGeneration, ShotProvider,
};
use reelforge_core::shot::Shot;
use reelforge_core::types::DbId;

use crate::models::generation::CreateGeneration;
use crate::repositories::{GenerationRepo, ShotRepo};
use crate::DbPool;

fn internal(context: &str, e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("{context}: {e}"))
}

/// [`ShotProvider`] and [`FilmProvider`] backed by the shots/films tables.
#[derive(Clone)]
pub struct PgShotProvider {
    pool: DbPool,
}

impl PgShotProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShotProvider for PgShotProvider {
    async fn get(&self, shot_id: DbId) -> Result<Option<Shot>, CoreError> {
        let row = ShotRepo::find_by_id(&self.pool, shot_id)
            .await
            .map_err(|e| internal("shot lookup failed", e))?;
        Ok(row.map(|r| r.into_domain()))
    }
}

#[async_trait]
impl FilmProvider for PgShotProvider {
    async fn exists(&self, film_id: DbId) -> Result<bool, CoreError> {
        ShotRepo::film_exists(&self.pool, film_id)
            .await
            .map_err(|e| internal("film lookup failed", e))
    }
}

/// [`GenerationStore`] backed by the generations table.
#[derive(Clone)]
pub struct PgGenerationStore {
    pool: DbPool,
}

impl PgGenerationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenerationStore for PgGenerationStore {
    async fn insert(&self, new: NewGeneration) -> Result<GenerationRecord, CoreError> {
        let row = GenerationRepo::create(&self.pool, &CreateGeneration::from(new))
            .await
            .map_err(|e| internal("generation insert failed", e))?;
        row.into_domain()
    }

    async fn mark_running(&self, id: DbId, status: GenerationStatus) -> Result<(), CoreError> {
        let updated = GenerationRepo::mark_running(&self.pool, id, status)
            .await
            .map_err(|e| internal("generation status update failed", e))?;
        if !updated {
            return Err(CoreError::Internal(format!(
                "Generation {id} was not in 'created' status"
            )));
        }
        Ok(())
    }

    async fn complete(
        &self,
        id: DbId,
        output_urls: &[String],
        seed: Option<i64>,
        engine: &str,
    ) -> Result<(), CoreError> {
        let urls = serde_json::to_value(output_urls)
            .map_err(|e| CoreError::Internal(format!("output_urls serialization: {e}")))?;
        let updated = GenerationRepo::mark_complete(&self.pool, id, &urls, seed, engine)
            .await
            .map_err(|e| internal("generation completion failed", e))?;
        if !updated {
            return Err(CoreError::Internal(format!(
                "Generation {id} already reached a terminal status"
            )));
        }
        Ok(())
    }

    async fn fail(&self, id: DbId, error: &str) -> Result<(), CoreError> {
        let updated = GenerationRepo::mark_failed(&self.pool, id, error)
            .await
            .map_err(|e| internal("generation failure update failed", e))?;
        if !updated {
            tracing::warn!(
                generation_id = id,
                "Failure update skipped: record already terminal",
            );
        }
        Ok(())
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<GenerationRecord>, CoreError> {
        let row = GenerationRepo::find_by_id(&self.pool, id)
            .await
            .map_err(|e| internal("generation lookup failed", e))?;
        row.map(|r| r.into_domain()).transpose()
    }
}
