//! Collaborator interfaces.
//!
//! The compilation and orchestration engine sits between the upstream
//! screenplay/style pipeline and the external generation vendors. Everything
//! it consumes or persists goes through the narrow traits in this module so
//! the pipeline can be exercised with in-memory implementations and the
//! production wiring can swap in PostgreSQL/object-storage backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::generation::{GenerationMode, GenerationStatus};
use crate::shot::Shot;
use crate::style::{IdentityToken, LockedAsset, SceneOverride, StyleContext};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Generation records (the store boundary's vocabulary)
// ---------------------------------------------------------------------------

/// Input for inserting a new generation record at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGeneration {
    pub shot_id: DbId,
    pub film_id: DbId,
    pub mode: GenerationMode,
    /// Engine the dispatch resolved to (post-fallback).
    pub engine: String,
    /// Fingerprint of the compiled payload, for dedup/audit downstream.
    pub compile_hash: String,
    /// Full prompt text at dispatch time.
    pub prompt_snapshot: String,
    /// Engine hint, fallback, and mode-specific params as JSON.
    pub plan_snapshot: serde_json::Value,
    /// The completed anchor generation this attempt derives from.
    /// Always set for animate/targeted-edit, always `None` for anchor.
    pub parent_generation_id: Option<DbId>,
}

/// One attempt to realize a compiled payload via a specific engine and mode.
///
/// Immutable after reaching a terminal status except for nothing — the
/// terminal update is the last write a record ever receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: DbId,
    pub shot_id: DbId,
    pub film_id: DbId,
    pub mode: GenerationMode,
    pub engine: String,
    pub status: GenerationStatus,
    pub compile_hash: String,
    pub prompt_snapshot: String,
    pub plan_snapshot: serde_json::Value,
    pub parent_generation_id: Option<DbId>,
    pub output_urls: Vec<String>,
    pub seed: Option<i64>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Upstream read-only providers
// ---------------------------------------------------------------------------

/// Read access to shots owned by the screenplay pipeline.
#[async_trait]
pub trait ShotProvider: Send + Sync {
    async fn get(&self, shot_id: DbId) -> Result<Option<Shot>, CoreError>;
}

/// Film existence check. A missing film is the one hard compile error.
#[async_trait]
pub trait FilmProvider: Send + Sync {
    async fn exists(&self, film_id: DbId) -> Result<bool, CoreError>;
}

/// Style contract snapshots per film. `None` degrades to defaults.
#[async_trait]
pub trait StyleContextProvider: Send + Sync {
    async fn get(&self, film_id: DbId) -> Result<Option<StyleContext>, CoreError>;
}

/// Optional per-scene overrides.
#[async_trait]
pub trait SceneOverrideProvider: Send + Sync {
    async fn get(
        &self,
        film_id: DbId,
        scene_number: i32,
    ) -> Result<Option<SceneOverride>, CoreError>;
}

/// Approved visual reference assets for a film.
#[async_trait]
pub trait LockedAssetProvider: Send + Sync {
    async fn list(&self, film_id: DbId) -> Result<Vec<LockedAsset>, CoreError>;
}

/// Resolves `{{REF_CODE}}` placeholder codes to identity tokens. Codes with
/// no binding are simply absent from the result.
#[async_trait]
pub trait IdentityRegistry: Send + Sync {
    async fn resolve(
        &self,
        film_id: DbId,
        ref_codes: &[String],
    ) -> Result<Vec<IdentityToken>, CoreError>;
}

// ---------------------------------------------------------------------------
// Shared mutable collaborators
// ---------------------------------------------------------------------------

/// Persistent binary media storage. Adapters upload every artifact and hand
/// URLs — never raw bytes — back to the orchestrator.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, CoreError>;
}

/// Persistence boundary for generation records. Single-record writes are
/// expected to be atomic; no cross-record transactions are required because
/// each record is owned exclusively by the dispatch that created it until it
/// reaches a terminal state.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn insert(&self, new: NewGeneration) -> Result<GenerationRecord, CoreError>;

    /// Move a record into its mode-specific running status.
    async fn mark_running(&self, id: DbId, status: GenerationStatus) -> Result<(), CoreError>;

    /// Terminal success update: outputs, seed, and the engine actually used.
    async fn complete(
        &self,
        id: DbId,
        output_urls: &[String],
        seed: Option<i64>,
        engine: &str,
    ) -> Result<(), CoreError>;

    /// Terminal failure update. Failed records are never deleted; retry is
    /// always by fresh dispatch.
    async fn fail(&self, id: DbId, error: &str) -> Result<(), CoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<GenerationRecord>, CoreError>;
}

// ---------------------------------------------------------------------------
// Auth and usage accounting
// ---------------------------------------------------------------------------

/// The authenticated caller a dispatch is attributed to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: DbId,
    pub name: String,
}

/// Opaque credential material presented by the caller layer.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub token: String,
}

/// Pass-through authentication collaborator.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn authorize(&self, request: &AuthRequest) -> Result<Principal, CoreError>;
}

/// Usage/cost event sink.
#[async_trait]
pub trait UsageLogger: Send + Sync {
    async fn log(&self, principal: &Principal, operation: &str, cost: f64);
}
