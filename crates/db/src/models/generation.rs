//! Generation row struct and DTOs.
//!
//! One row per dispatch attempt. Rows are inserted in the `created` status,
//! moved to a mode-specific running status, and receive exactly one terminal
//! update. Failed rows are never deleted; retry is by fresh dispatch.

use serde::Serialize;
use sqlx::FromRow;

use reelforge_core::error::CoreError;
use reelforge_core::generation::{GenerationMode, GenerationStatus};
use reelforge_core::providers::{GenerationRecord, NewGeneration};
use reelforge_core::types::{DbId, Timestamp};

/// A row from the `generations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationRow {
    pub id: DbId,
    pub shot_id: DbId,
    pub film_id: DbId,
    pub mode: String,
    pub engine: String,
    pub status: String,
    pub compile_hash: String,
    pub prompt_snapshot: String,
    pub plan_snapshot: serde_json::Value,
    pub parent_generation_id: Option<DbId>,
    pub output_urls: serde_json::Value,
    pub seed: Option<i64>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GenerationRow {
    /// Convert into the domain record, rejecting rows whose mode/status
    /// strings do not parse (schema drift shows up loudly, not as defaults).
    pub fn into_domain(self) -> Result<GenerationRecord, CoreError> {
        let mode = match self.mode.as_str() {
            "anchor" => GenerationMode::Anchor,
            "animate" => GenerationMode::Animate,
            "targeted_edit" => GenerationMode::TargetedEdit,
            other => {
                return Err(CoreError::Internal(format!(
                    "Unknown generation mode in row {}: {other}",
                    self.id
                )))
            }
        };
        let status = GenerationStatus::parse(&self.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "Unknown generation status in row {}: {}",
                self.id, self.status
            ))
        })?;
        let output_urls: Vec<String> =
            serde_json::from_value(self.output_urls).unwrap_or_default();

        Ok(GenerationRecord {
            id: self.id,
            shot_id: self.shot_id,
            film_id: self.film_id,
            mode,
            engine: self.engine,
            status,
            compile_hash: self.compile_hash,
            prompt_snapshot: self.prompt_snapshot,
            plan_snapshot: self.plan_snapshot,
            parent_generation_id: self.parent_generation_id,
            output_urls,
            seed: self.seed,
            last_error: self.last_error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Input for inserting a new generation row.
#[derive(Debug, Clone)]
pub struct CreateGeneration {
    pub shot_id: DbId,
    pub film_id: DbId,
    pub mode: String,
    pub engine: String,
    pub compile_hash: String,
    pub prompt_snapshot: String,
    pub plan_snapshot: serde_json::Value,
    pub parent_generation_id: Option<DbId>,
}

impl From<NewGeneration> for CreateGeneration {
    fn from(new: NewGeneration) -> Self {
        Self {
            shot_id: new.shot_id,
            film_id: new.film_id,
            mode: new.mode.as_str().to_string(),
            engine: new.engine,
            compile_hash: new.compile_hash,
            prompt_snapshot: new.prompt_snapshot,
            plan_snapshot: new.plan_snapshot,
            parent_generation_id: new.parent_generation_id,
        }
    }
}
