//! Compile service: fetches a shot's upstream context and runs the payload
//! compiler over it.
//!
//! The only hard failure here besides the shot lookup is a missing film.
//! Style contract, scene override, and assets are all optional collaborators
//! whose absence degrades the payload to documented defaults.

use std::sync::Arc;

use reelforge_core::compiler::{self, CompileInputs, EngineHint};
use reelforge_core::error::CoreError;
use reelforge_core::payload::CompiledPayload;
use reelforge_core::providers::{
    FilmProvider, IdentityRegistry, LockedAssetProvider, SceneOverrideProvider, ShotProvider,
    StyleContextProvider,
};
use reelforge_core::shot::Shot;
use reelforge_core::types::DbId;

/// Resolves a shot id into a [`CompiledPayload`] by gathering context from
/// the upstream providers.
pub struct Compiler {
    shots: Arc<dyn ShotProvider>,
    films: Arc<dyn FilmProvider>,
    styles: Arc<dyn StyleContextProvider>,
    scene_overrides: Arc<dyn SceneOverrideProvider>,
    locked_assets: Arc<dyn LockedAssetProvider>,
    identities: Arc<dyn IdentityRegistry>,
    engine_hint: EngineHint,
}

impl Compiler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shots: Arc<dyn ShotProvider>,
        films: Arc<dyn FilmProvider>,
        styles: Arc<dyn StyleContextProvider>,
        scene_overrides: Arc<dyn SceneOverrideProvider>,
        locked_assets: Arc<dyn LockedAssetProvider>,
        identities: Arc<dyn IdentityRegistry>,
        engine_hint: EngineHint,
    ) -> Self {
        Self {
            shots,
            films,
            styles,
            scene_overrides,
            locked_assets,
            identities,
            engine_hint,
        }
    }

    /// Compile the payload for a shot.
    pub async fn compile_for_shot(&self, shot_id: DbId) -> Result<CompiledPayload, CoreError> {
        let (_, payload) = self.compile_shot(shot_id).await?;
        Ok(payload)
    }

    /// Compile and also hand back the shot, for callers that need its film
    /// and scene attribution (the orchestrator's generation record).
    pub(crate) async fn compile_shot(
        &self,
        shot_id: DbId,
    ) -> Result<(Shot, CompiledPayload), CoreError> {
        let shot = self
            .shots
            .get(shot_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "shot",
                id: shot_id,
            })?;

        if !self.films.exists(shot.film_id).await? {
            return Err(CoreError::NotFound {
                entity: "film",
                id: shot.film_id,
            });
        }

        let style = self.styles.get(shot.film_id).await?;
        let scene_override = self
            .scene_overrides
            .get(shot.film_id, shot.scene_number)
            .await?;
        let assets = self.locked_assets.list(shot.film_id).await?;

        let ref_codes = compiler::scan_ref_codes(&shot.action_text);
        let tokens = if ref_codes.is_empty() {
            Vec::new()
        } else {
            self.identities.resolve(shot.film_id, &ref_codes).await?
        };

        tracing::debug!(
            shot_id,
            film_id = shot.film_id,
            ref_codes = ref_codes.len(),
            tokens = tokens.len(),
            has_style = style.is_some(),
            has_override = scene_override.is_some(),
            "Compiling payload",
        );

        let payload = compiler::compile(&CompileInputs {
            shot: &shot,
            style: style.as_ref(),
            scene_override: scene_override.as_ref(),
            locked_assets: &assets,
            identity_tokens: &tokens,
            engine_hint: self.engine_hint.clone(),
        });

        Ok((shot, payload))
    }
}
