//! Orchestrator integration tests over in-memory collaborators.
//!
//! The in-memory store enforces the status transition table, so any illegal
//! write the orchestrator attempts fails the test that triggered it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use reelforge_core::compiler::EngineHint;
use reelforge_core::error::CoreError;
use reelforge_core::generation::{
    DispatchOptions, GenerationMode, GenerationStatus, TargetRegion,
};
use reelforge_core::payload::CompiledPayload;
use reelforge_core::providers::{
    AuthGate, AuthRequest, FilmProvider, GenerationRecord, GenerationStore, IdentityRegistry,
    LockedAssetProvider, NewGeneration, Principal, SceneOverrideProvider, ShotProvider,
    StyleContextProvider, UsageLogger,
};
use reelforge_core::shot::Shot;
use reelforge_core::style::{IdentityToken, LockedAsset, SceneOverride, StyleContext};
use reelforge_core::types::DbId;
use reelforge_engines::{
    EngineAdapter, EngineError, EngineRegistry, EngineResult, ReferenceBundle,
};
use reelforge_pipeline::{Compiler, DispatchError, GenerationOrchestrator};

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

/// Upstream world: shots, films, and optional context, all behind one struct.
#[derive(Default)]
struct World {
    shots: HashMap<DbId, Shot>,
    films: HashSet<DbId>,
    style: Option<StyleContext>,
    assets: Vec<LockedAsset>,
    tokens: Vec<IdentityToken>,
}

#[async_trait]
impl ShotProvider for World {
    async fn get(&self, shot_id: DbId) -> Result<Option<Shot>, CoreError> {
        Ok(self.shots.get(&shot_id).cloned())
    }
}

#[async_trait]
impl FilmProvider for World {
    async fn exists(&self, film_id: DbId) -> Result<bool, CoreError> {
        Ok(self.films.contains(&film_id))
    }
}

#[async_trait]
impl StyleContextProvider for World {
    async fn get(&self, _film_id: DbId) -> Result<Option<StyleContext>, CoreError> {
        Ok(self.style.clone())
    }
}

#[async_trait]
impl SceneOverrideProvider for World {
    async fn get(&self, _: DbId, _: i32) -> Result<Option<SceneOverride>, CoreError> {
        Ok(None)
    }
}

#[async_trait]
impl LockedAssetProvider for World {
    async fn list(&self, _film_id: DbId) -> Result<Vec<LockedAsset>, CoreError> {
        Ok(self.assets.clone())
    }
}

#[async_trait]
impl IdentityRegistry for World {
    async fn resolve(
        &self,
        _film_id: DbId,
        ref_codes: &[String],
    ) -> Result<Vec<IdentityToken>, CoreError> {
        Ok(self
            .tokens
            .iter()
            .filter(|t| ref_codes.contains(&t.ref_code))
            .cloned()
            .collect())
    }
}

/// Generation store that enforces the transition table on every write.
#[derive(Default)]
struct MemStore {
    inner: Mutex<MemStoreInner>,
}

#[derive(Default)]
struct MemStoreInner {
    next_id: DbId,
    records: HashMap<DbId, GenerationRecord>,
}

impl MemStore {
    fn records(&self) -> Vec<GenerationRecord> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    fn transition(
        &self,
        id: DbId,
        next: GenerationStatus,
        update: impl FnOnce(&mut GenerationRecord),
    ) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .get_mut(&id)
            .ok_or(CoreError::NotFound {
                entity: "generation",
                id,
            })?;
        if !record.status.can_transition_to(next) {
            return Err(CoreError::Internal(format!(
                "Illegal transition {} -> {} for generation {id}",
                record.status.as_str(),
                next.as_str()
            )));
        }
        record.status = next;
        record.updated_at = chrono::Utc::now();
        update(record);
        Ok(())
    }
}

#[async_trait]
impl GenerationStore for MemStore {
    async fn insert(&self, new: NewGeneration) -> Result<GenerationRecord, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let now = chrono::Utc::now();
        let record = GenerationRecord {
            id: inner.next_id,
            shot_id: new.shot_id,
            film_id: new.film_id,
            mode: new.mode,
            engine: new.engine,
            status: GenerationStatus::Created,
            compile_hash: new.compile_hash,
            prompt_snapshot: new.prompt_snapshot,
            plan_snapshot: new.plan_snapshot,
            parent_generation_id: new.parent_generation_id,
            output_urls: Vec::new(),
            seed: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn mark_running(&self, id: DbId, status: GenerationStatus) -> Result<(), CoreError> {
        self.transition(id, status, |_| {})
    }

    async fn complete(
        &self,
        id: DbId,
        output_urls: &[String],
        seed: Option<i64>,
        engine: &str,
    ) -> Result<(), CoreError> {
        self.transition(id, GenerationStatus::Complete, |r| {
            r.output_urls = output_urls.to_vec();
            r.seed = seed;
            r.engine = engine.to_string();
        })
    }

    async fn fail(&self, id: DbId, error: &str) -> Result<(), CoreError> {
        self.transition(id, GenerationStatus::Failed, |r| {
            r.last_error = Some(error.to_string());
        })
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<GenerationRecord>, CoreError> {
        Ok(self.inner.lock().unwrap().records.get(&id).cloned())
    }
}

#[derive(Default)]
struct RecordingUsage {
    events: Mutex<Vec<(String, String, f64)>>,
}

#[async_trait]
impl UsageLogger for RecordingUsage {
    async fn log(&self, principal: &Principal, operation: &str, cost: f64) {
        self.events
            .lock()
            .unwrap()
            .push((principal.name.clone(), operation.to_string(), cost));
    }
}

/// Single-token credential check standing in for the real caller layer.
struct StaticAuthGate {
    token: String,
    principal: Principal,
}

#[async_trait]
impl AuthGate for StaticAuthGate {
    async fn authorize(&self, request: &AuthRequest) -> Result<Principal, CoreError> {
        if request.token == self.token {
            Ok(self.principal.clone())
        } else {
            Err(CoreError::Unauthorized("Unknown token".to_string()))
        }
    }
}

/// Adapter that blocks until cancelled, for cancellation-path tests.
struct HangingEngine;

#[async_trait]
impl EngineAdapter for HangingEngine {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn generate_anchor(
        &self,
        _payload: &CompiledPayload,
        _refs: &ReferenceBundle,
        _count: u32,
        _seed: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        cancel.cancelled().await;
        Err(EngineError::Cancelled)
    }

    async fn animate_from_anchor(
        &self,
        _anchor_url: &str,
        _payload: &CompiledPayload,
        _refs: &ReferenceBundle,
        _duration_secs: f64,
        _seed: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        cancel.cancelled().await;
        Err(EngineError::Cancelled)
    }

    async fn targeted_edit(
        &self,
        _payload: &CompiledPayload,
        _source_url: &str,
        _region: &TargetRegion,
        _prompt_delta: &str,
        _seed: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        cancel.cancelled().await;
        Err(EngineError::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

const SHOT_ID: DbId = 10;
const FILM_ID: DbId = 1;

fn world() -> World {
    let mut world = World::default();
    world.films.insert(FILM_ID);
    world.shots.insert(
        SHOT_ID,
        Shot {
            id: SHOT_ID,
            film_id: FILM_ID,
            scene_number: 3,
            action_text: "A courier sprints across the rooftop at dusk.".into(),
            camera: None,
        },
    );
    world
}

struct Harness {
    orchestrator: GenerationOrchestrator,
    store: Arc<MemStore>,
    usage: Arc<RecordingUsage>,
}

fn harness(world: World, registry: EngineRegistry, hint: EngineHint) -> Harness {
    let world = Arc::new(world);
    let store = Arc::new(MemStore::default());
    let usage = Arc::new(RecordingUsage::default());
    let compiler = Compiler::new(
        world.clone(),
        world.clone(),
        world.clone(),
        world.clone(),
        world.clone(),
        world.clone(),
        hint,
    );
    let orchestrator = GenerationOrchestrator::new(
        compiler,
        Arc::new(registry),
        store.clone(),
        usage.clone(),
    );
    Harness {
        orchestrator,
        store,
        usage,
    }
}

fn principal() -> Principal {
    Principal {
        id: 7,
        name: "director".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anchor_dispatch_with_no_credentials_completes_via_stub() {
    // Routing prefers a backend that is not configured.
    let hint = EngineHint {
        preferred: Some("gemini".into()),
        fallback: None,
    };
    let h = harness(world(), EngineRegistry::stub_only(), hint);

    let outcome = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Anchor,
            DispatchOptions::default(),
            &principal(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, GenerationStatus::Complete);
    assert_eq!(outcome.engine, "stub");
    assert!(!outcome.output_urls.is_empty());

    let records = h.store.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, outcome.generation_id);
    assert_eq!(record.status, GenerationStatus::Complete);
    assert_eq!(record.mode, GenerationMode::Anchor);
    assert_eq!(record.compile_hash.len(), 64);
    assert!(!record.prompt_snapshot.is_empty());
    assert_eq!(record.output_urls, outcome.output_urls);

    assert_eq!(
        h.usage.events.lock().unwrap().as_slice(),
        &[("director".to_string(), "anchor".to_string(), 1.0)]
    );
}

#[tokio::test]
async fn explicit_seed_is_honored_and_persisted() {
    let h = harness(world(), EngineRegistry::stub_only(), EngineHint::default());

    let outcome = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Anchor,
            DispatchOptions {
                seed: Some(42),
                ..Default::default()
            },
            &principal(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.seed, 42);
    assert_eq!(h.store.records()[0].seed, Some(42));
}

#[tokio::test]
async fn animate_without_anchor_is_rejected_before_any_record() {
    let h = harness(world(), EngineRegistry::stub_only(), EngineHint::default());

    let err = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Animate,
            DispatchOptions::default(),
            &principal(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, DispatchError::Core(CoreError::Validation(_)));
    assert!(h.store.records().is_empty());
    assert!(h.usage.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn animate_with_unknown_parent_is_rejected() {
    let h = harness(world(), EngineRegistry::stub_only(), EngineHint::default());

    let err = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Animate,
            DispatchOptions {
                anchor_url: Some("stub://anchor".into()),
                parent_generation_id: Some(999),
                ..Default::default()
            },
            &principal(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_matches!(
        err,
        DispatchError::Core(CoreError::NotFound {
            entity: "generation",
            ..
        })
    );
    assert!(h.store.records().is_empty());
}

#[tokio::test]
async fn anchor_then_animate_chains_through_parent() {
    let h = harness(world(), EngineRegistry::stub_only(), EngineHint::default());
    let cancel = CancellationToken::new();

    let anchor = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Anchor,
            DispatchOptions::default(),
            &principal(),
            &cancel,
        )
        .await
        .unwrap();

    let animate = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Animate,
            DispatchOptions {
                anchor_url: Some(anchor.output_urls[0].clone()),
                parent_generation_id: Some(anchor.generation_id),
                duration_secs: Some(4.0),
                ..Default::default()
            },
            &principal(),
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(animate.status, GenerationStatus::Complete);

    let records = h.store.records();
    assert_eq!(records.len(), 2);
    let clip = &records[1];
    assert_eq!(clip.mode, GenerationMode::Animate);
    assert_eq!(clip.parent_generation_id, Some(anchor.generation_id));
    assert!(clip.parent_generation_id.unwrap() < clip.id);

    // Animate usage scales with clip length: 1.5 * 4.0.
    let events = h.usage.events.lock().unwrap();
    assert_eq!(
        events[1],
        ("director".to_string(), "animate".to_string(), 6.0)
    );
}

#[tokio::test]
async fn targeted_edit_without_region_is_rejected() {
    let h = harness(world(), EngineRegistry::stub_only(), EngineHint::default());

    let err = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::TargetedEdit,
            DispatchOptions {
                anchor_url: Some("stub://anchor".into()),
                parent_generation_id: Some(1),
                ..Default::default()
            },
            &principal(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, DispatchError::Core(CoreError::Validation(_)));
    assert!(h.store.records().is_empty());
}

#[tokio::test]
async fn missing_shot_is_not_found() {
    let h = harness(world(), EngineRegistry::stub_only(), EngineHint::default());

    let err = h
        .orchestrator
        .dispatch(
            404,
            GenerationMode::Anchor,
            DispatchOptions::default(),
            &principal(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, DispatchError::Core(CoreError::NotFound { entity: "shot", .. }));
    assert!(h.store.records().is_empty());
}

#[tokio::test]
async fn cancellation_marks_the_record_failed() {
    let mut registry = EngineRegistry::stub_only();
    registry.register(Arc::new(HangingEngine));
    let hint = EngineHint {
        preferred: Some("hanging".into()),
        fallback: None,
    };
    let h = harness(world(), registry, hint);

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Anchor,
            DispatchOptions::default(),
            &principal(),
            &cancel,
        )
        .await
        .unwrap_err();

    assert_matches!(
        err,
        DispatchError::Engine {
            source: EngineError::Cancelled,
            ..
        }
    );

    let records = h.store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, GenerationStatus::Failed);
    assert!(records[0].last_error.as_deref().unwrap().contains("cancelled"));
    assert!(h.usage.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn authorized_principal_is_attributed_on_usage_events() {
    let gate = StaticAuthGate {
        token: "session-abc".into(),
        principal: Principal {
            id: 21,
            name: "producer".into(),
        },
    };
    let h = harness(world(), EngineRegistry::stub_only(), EngineHint::default());

    // The caller layer authorizes first; the dispatch runs as whoever the
    // gate vouched for.
    let principal = gate
        .authorize(&AuthRequest {
            token: "session-abc".into(),
        })
        .await
        .unwrap();

    h.orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Anchor,
            DispatchOptions::default(),
            &principal,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        h.usage.events.lock().unwrap().as_slice(),
        &[("producer".to_string(), "anchor".to_string(), 1.0)]
    );
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let gate = StaticAuthGate {
        token: "session-abc".into(),
        principal: Principal {
            id: 21,
            name: "producer".into(),
        },
    };

    let err = gate
        .authorize(&AuthRequest {
            token: "forged".into(),
        })
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Unauthorized(_));
}

#[tokio::test]
async fn identity_tokens_flow_into_the_prompt_snapshot() {
    let mut world = world();
    world.shots.get_mut(&SHOT_ID).unwrap().action_text =
        "{{LOC_01}} burns as {{CHAR_JD}} runs.".into();
    world.assets.push(LockedAsset {
        film_id: FILM_ID,
        ref_code: "LOC_01".into(),
        name: "Old Warehouse".into(),
        kind: "location".into(),
        description: "Brick warehouse with broken skylights".into(),
        image_url: "https://cdn.test/loc01.png".into(),
    });
    let h = harness(world, EngineRegistry::stub_only(), EngineHint::default());

    let outcome = h
        .orchestrator
        .dispatch(
            SHOT_ID,
            GenerationMode::Anchor,
            DispatchOptions::default(),
            &principal(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let record = &h.store.records()[0];
    assert_eq!(record.id, outcome.generation_id);
    assert!(record.prompt_snapshot.contains("Old Warehouse"));
    // The unresolved character code is dropped, not left in the text.
    assert!(!record.prompt_snapshot.contains("{{CHAR_JD}}"));
}
