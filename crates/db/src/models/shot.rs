//! Read models for the upstream-owned `films` and `shots` tables.

use serde::Serialize;
use sqlx::FromRow;

use reelforge_core::payload::CameraLanguage;
use reelforge_core::shot::Shot;
use reelforge_core::types::{DbId, Timestamp};

/// A row from the `films` table. This subsystem only checks existence.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FilmRow {
    pub id: DbId,
    pub title: String,
    pub created_at: Timestamp,
}

/// A row from the `shots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShotRow {
    pub id: DbId,
    pub film_id: DbId,
    pub scene_number: i32,
    pub action_text: String,
    /// Optional camera-language hint stored as JSONB.
    pub camera: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

impl ShotRow {
    /// Convert into the domain shot. A malformed camera JSON blob is
    /// treated as no hint rather than a read failure.
    pub fn into_domain(self) -> Shot {
        let camera = self
            .camera
            .and_then(|v| serde_json::from_value::<CameraLanguage>(v).ok());
        Shot {
            id: self.id,
            film_id: self.film_id,
            scene_number: self.scene_number,
            action_text: self.action_text,
            camera,
        }
    }
}
