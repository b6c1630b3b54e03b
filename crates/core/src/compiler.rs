//! Payload compiler.
//!
//! [`compile`] merges a shot and its upstream context into one
//! [`CompiledPayload`]. It is a pure function of its inputs: no I/O, no
//! hidden state. Callers (the pipeline crate) are responsible for fetching
//! the context objects; a missing style contract, scene override, or asset
//! list degrades to documented defaults and is never an error here.

use std::sync::OnceLock;

use regex::Regex;

use crate::anachronism;
use crate::payload::{
    CameraLanguage, CinematographySpec, CompiledPayload, ExecutionParams, RoutingHints,
    DEFAULT_ANGLE, DEFAULT_GRADE, DEFAULT_LENS, DEFAULT_LIGHTING, DEFAULT_MOVEMENT,
    DEFAULT_SHOT_SIZE,
};
use crate::safety::derive_safety_tier;
use crate::shot::Shot;
use crate::style::{IdentityToken, LockedAsset, SceneOverride, StyleContext};

/// Process-level engine routing defaults, passed through into the payload's
/// routing hints. Comes from configuration, not from any upstream record.
#[derive(Debug, Clone, Default)]
pub struct EngineHint {
    pub preferred: Option<String>,
    pub fallback: Option<String>,
}

/// Everything [`compile`] needs. Only the shot is mandatory.
#[derive(Debug)]
pub struct CompileInputs<'a> {
    pub shot: &'a Shot,
    pub style: Option<&'a StyleContext>,
    pub scene_override: Option<&'a SceneOverride>,
    pub locked_assets: &'a [LockedAsset],
    pub identity_tokens: &'a [IdentityToken],
    pub engine_hint: EngineHint,
}

fn ref_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([A-Z0-9_]+)\}\}").unwrap())
}

/// Extract `{{CODE}}` placeholder codes from action text, in order of first
/// appearance, deduplicated.
pub fn scan_ref_codes(action_text: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for caps in ref_code_pattern().captures_iter(action_text) {
        let code = caps[1].to_string();
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

/// Compile a shot and its context into a vendor-neutral generation request.
///
/// Precedence for cinematography fields, per field: shot-level camera hint,
/// then scene override, then style-contract defaults, then the neutral
/// constants in [`crate::payload`]. The negative prompt is the order-stable
/// union of the contract's negative base, the period-derived anachronism
/// terms, and the scene's negative terms. Unmatched placeholder codes are
/// dropped silently from both the prompt text and the token list.
pub fn compile(inputs: &CompileInputs) -> CompiledPayload {
    let fallback_style = StyleContext::default();
    let style = inputs.style.unwrap_or(&fallback_style);

    let cinematography = resolve_cinematography(
        inputs.shot.camera.as_ref(),
        inputs.scene_override.map(|o| &o.camera),
        &style.defaults,
    );

    let negative_terms = resolve_negative_terms(style, inputs.scene_override);
    let negative_prompt = negative_terms.join(", ");

    let identity_tokens = resolve_identity_tokens(
        &inputs.shot.action_text,
        inputs.identity_tokens,
        inputs.locked_assets,
    );

    let prompt = build_prompt(
        &inputs.shot.action_text,
        &identity_tokens,
        &cinematography,
        style,
        inputs.scene_override,
    );

    CompiledPayload {
        prompt,
        negative_terms,
        negative_prompt,
        cinematography,
        identity_tokens,
        locked_assets: inputs.locked_assets.to_vec(),
        exec: ExecutionParams::default(),
        routing: RoutingHints {
            preferred_engine: inputs.engine_hint.preferred.clone(),
            fallback_engine: inputs.engine_hint.fallback.clone(),
            safety_tier: derive_safety_tier(style.content_flags),
        },
    }
}

/// Field-wise three-level coalesce ending in the neutral defaults.
fn resolve_cinematography(
    shot: Option<&CameraLanguage>,
    scene: Option<&CameraLanguage>,
    style: &CameraLanguage,
) -> CinematographySpec {
    let pick = |f: fn(&CameraLanguage) -> &Option<String>, default: &str| -> String {
        shot.and_then(|c| f(c).clone())
            .or_else(|| scene.and_then(|c| f(c).clone()))
            .or_else(|| f(style).clone())
            .unwrap_or_else(|| default.to_string())
    };

    CinematographySpec {
        shot_size: pick(|c| &c.shot_size, DEFAULT_SHOT_SIZE),
        angle: pick(|c| &c.angle, DEFAULT_ANGLE),
        lens: pick(|c| &c.lens, DEFAULT_LENS),
        movement: pick(|c| &c.movement, DEFAULT_MOVEMENT),
        lighting: pick(|c| &c.lighting, DEFAULT_LIGHTING),
        grade: pick(|c| &c.grade, DEFAULT_GRADE),
    }
}

/// Order-stable set union: contract negative base, then anachronism terms,
/// then scene-specific terms. First occurrence wins; comparison is exact.
fn resolve_negative_terms(style: &StyleContext, scene: Option<&SceneOverride>) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    let mut push = |term: &str| {
        if !term.is_empty() && !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    };

    for term in &style.negative_base {
        push(term);
    }
    if let Some(period) = &style.time_period {
        for term in anachronism::terms_for_period(period) {
            push(term);
        }
    }
    if let Some(scene) = scene {
        for term in &scene.negative_terms {
            push(term);
        }
    }
    terms
}

/// Match scanned codes against the resolved registry tokens first, then
/// against the locked-asset list. Codes with no match anywhere are dropped.
fn resolve_identity_tokens(
    action_text: &str,
    registry: &[IdentityToken],
    locked_assets: &[LockedAsset],
) -> Vec<IdentityToken> {
    scan_ref_codes(action_text)
        .into_iter()
        .filter_map(|code| {
            if let Some(token) = registry.iter().find(|t| t.ref_code == code) {
                return Some(token.clone());
            }
            locked_assets
                .iter()
                .find(|a| a.ref_code == code)
                .map(|asset| IdentityToken {
                    ref_code: asset.ref_code.clone(),
                    asset_name: asset.name.clone(),
                    image_url: asset.image_url.clone(),
                    dirty: false,
                })
        })
        .collect()
}

/// Substitute placeholders and append cinematography and style prose.
fn build_prompt(
    action_text: &str,
    tokens: &[IdentityToken],
    cine: &CinematographySpec,
    style: &StyleContext,
    scene: Option<&SceneOverride>,
) -> String {
    let substituted = ref_code_pattern().replace_all(action_text, |caps: &regex::Captures| {
        tokens
            .iter()
            .find(|t| t.ref_code == caps[1])
            .map(|t| t.asset_name.clone())
            .unwrap_or_default()
    });
    // Collapse the double spaces left behind by dropped placeholders.
    let action: String = substituted.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut parts: Vec<String> = vec![action];

    parts.push(format!(
        "{}, {} angle, {} lens, {} camera, {} lighting, {} grade",
        cine.shot_size, cine.angle, cine.lens, cine.movement, cine.lighting, cine.grade
    ));

    for prose in [&style.color_palette, &style.texture] {
        if !prose.is_empty() {
            parts.push(prose.clone());
        }
    }
    if let Some(scene) = scene {
        for prose in [&scene.mood, &scene.color_shift, &scene.time_of_day] {
            if let Some(p) = prose {
                if !p.is_empty() {
                    parts.push(p.clone());
                }
            }
        }
    }
    // Character directives for characters actually present in this shot.
    for token in tokens {
        if let Some(directive) = style.character_directives.get(&token.ref_code) {
            parts.push(directive.clone());
        }
    }

    parts.retain(|p| !p.is_empty());
    parts.join(". ")
}
