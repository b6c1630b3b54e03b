//! Generation dispatch orchestration.
//!
//! One `dispatch` call owns one generation record for its whole lifetime:
//! validate, compile, resolve an adapter, insert the record, run the engine
//! call, and write exactly one terminal update. Failed records are never
//! deleted or retried in place; retry is always a fresh dispatch, which
//! keeps the audit trail append-only.

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use reelforge_core::error::CoreError;
use reelforge_core::generation::{
    validate_dispatch, DispatchOptions, GenerationMode, GenerationStatus,
};
use reelforge_core::hashing;
use reelforge_core::payload::CompiledPayload;
use reelforge_core::providers::{GenerationStore, NewGeneration, Principal, UsageLogger};
use reelforge_core::types::DbId;
use reelforge_engines::{EngineAdapter, EngineError, EngineRegistry, EngineResult, ReferenceBundle};

use crate::compile::Compiler;
use crate::usage::usage_cost;

/// What a successful dispatch hands back to the caller.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub generation_id: DbId,
    pub status: GenerationStatus,
    pub output_urls: Vec<String>,
    pub seed: i64,
    /// Engine actually used; differs from the routing hint after fallback.
    pub engine: String,
}

/// Dispatch failures. Engine and store failures carry the id of the
/// now-failed record so the caller can inspect it or resubmit.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Validation or lookup failure before any record was created.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The engine call failed; the record is marked failed.
    #[error("Generation {generation_id} failed: {source}")]
    Engine {
        generation_id: DbId,
        #[source]
        source: EngineError,
    },

    /// A store write failed after the record was created. The record is
    /// left in place for operator inspection.
    #[error("Generation {generation_id} store update failed: {detail}")]
    Store { generation_id: DbId, detail: String },
}

/// Drives generation records through their state machine.
pub struct GenerationOrchestrator {
    compiler: Compiler,
    registry: Arc<EngineRegistry>,
    store: Arc<dyn GenerationStore>,
    usage: Arc<dyn UsageLogger>,
}

impl GenerationOrchestrator {
    pub fn new(
        compiler: Compiler,
        registry: Arc<EngineRegistry>,
        store: Arc<dyn GenerationStore>,
        usage: Arc<dyn UsageLogger>,
    ) -> Self {
        Self {
            compiler,
            registry,
            store,
            usage,
        }
    }

    /// Dispatch one generation for a shot.
    ///
    /// Preconditions are rejected before any record exists: invalid options,
    /// a missing shot or film, or (for animate/targeted-edit) a parent
    /// generation that is not complete. From record insertion onward every
    /// path ends in exactly one terminal update.
    pub async fn dispatch(
        &self,
        shot_id: DbId,
        mode: GenerationMode,
        options: DispatchOptions,
        principal: &Principal,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        validate_dispatch(mode, &options)?;
        if let Some(parent_id) = options.parent_generation_id {
            self.check_parent(parent_id).await?;
        }

        let (shot, mut payload) = self.compiler.compile_shot(shot_id).await?;
        payload.exec.seed = options.seed;
        if let Some(duration) = options.duration_secs {
            payload.exec.duration_secs = duration;
        }

        let compile_hash = hashing::fingerprint(&payload);
        let adapter = self.registry.resolve(&payload.routing);

        let plan_snapshot = json!({
            "mode": mode.as_str(),
            "resolved_engine": adapter.name(),
            "routing": payload.routing,
            "options": options,
        });

        let record = self
            .store
            .insert(NewGeneration {
                shot_id,
                film_id: shot.film_id,
                mode,
                engine: adapter.name().to_string(),
                compile_hash,
                prompt_snapshot: payload.prompt.clone(),
                plan_snapshot,
                parent_generation_id: options.parent_generation_id,
            })
            .await?;

        tracing::info!(
            generation_id = record.id,
            shot_id,
            mode = mode.as_str(),
            engine = adapter.name(),
            "Dispatching generation",
        );

        if let Err(e) = self
            .store
            .mark_running(record.id, GenerationStatus::running_for(mode))
            .await
        {
            return Err(DispatchError::Store {
                generation_id: record.id,
                detail: e.to_string(),
            });
        }

        let refs = ReferenceBundle::from_payload(&payload);
        let call = self.run_engine(adapter.as_ref(), mode, &payload, &refs, &options, cancel);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(EngineError::Cancelled),
            res = call => res,
        };

        match result {
            Ok(engine_result) => {
                self.complete(record.id, &engine_result).await?;
                self.usage
                    .log(principal, mode.as_str(), usage_cost(mode, &options))
                    .await;
                Ok(DispatchOutcome {
                    generation_id: record.id,
                    status: GenerationStatus::Complete,
                    output_urls: engine_result.output_urls,
                    seed: engine_result.seed,
                    engine: engine_result.engine,
                })
            }
            Err(engine_error) => {
                tracing::warn!(
                    generation_id = record.id,
                    error = %engine_error,
                    "Generation failed",
                );
                if let Err(e) = self.store.fail(record.id, &engine_error.to_string()).await {
                    tracing::error!(
                        generation_id = record.id,
                        error = %e,
                        "Failure update could not be persisted",
                    );
                }
                Err(DispatchError::Engine {
                    generation_id: record.id,
                    source: engine_error,
                })
            }
        }
    }

    /// The parent of an animate/targeted-edit dispatch must be a completed
    /// generation; anything else is a caller error, not an engine failure.
    async fn check_parent(&self, parent_id: DbId) -> Result<(), CoreError> {
        let parent = self
            .store
            .find_by_id(parent_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "generation",
                id: parent_id,
            })?;
        if parent.status != GenerationStatus::Complete {
            return Err(CoreError::Validation(format!(
                "Parent generation {parent_id} is {}, not complete",
                parent.status.as_str()
            )));
        }
        Ok(())
    }

    async fn run_engine(
        &self,
        adapter: &dyn EngineAdapter,
        mode: GenerationMode,
        payload: &CompiledPayload,
        refs: &ReferenceBundle,
        options: &DispatchOptions,
        cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        match mode {
            GenerationMode::Anchor => {
                adapter
                    .generate_anchor(
                        payload,
                        refs,
                        options.count.unwrap_or(1),
                        options.seed,
                        cancel,
                    )
                    .await
            }
            GenerationMode::Animate => {
                // Presence validated before the record was created.
                let anchor_url = options.anchor_url.as_deref().unwrap_or_default();
                adapter
                    .animate_from_anchor(
                        anchor_url,
                        payload,
                        refs,
                        payload.exec.duration_secs,
                        options.seed,
                        cancel,
                    )
                    .await
            }
            GenerationMode::TargetedEdit => {
                let source_url = options.anchor_url.as_deref().unwrap_or_default();
                let region = options.target_region.as_ref().ok_or_else(|| {
                    EngineError::Vendor("targeted_edit dispatched without a region".into())
                })?;
                let delta = options.prompt_delta.as_deref().unwrap_or(&payload.prompt);
                adapter
                    .targeted_edit(payload, source_url, region, delta, options.seed, cancel)
                    .await
            }
        }
    }

    async fn complete(&self, id: DbId, result: &EngineResult) -> Result<(), DispatchError> {
        self.store
            .complete(id, &result.output_urls, Some(result.seed), &result.engine)
            .await
            .map_err(|e| DispatchError::Store {
                generation_id: id,
                detail: e.to_string(),
            })?;
        tracing::info!(
            generation_id = id,
            engine = %result.engine,
            outputs = result.output_urls.len(),
            "Generation complete",
        );
        Ok(())
    }
}
