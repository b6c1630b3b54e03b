//! The compiled generation payload.
//!
//! A [`CompiledPayload`] is the single artifact handed to an engine adapter.
//! Invariant: it is fully self-describing — an adapter must never need to
//! re-query the database to act on it. Payloads are created fresh on every
//! compile call and never mutated, only superseded.

use serde::{Deserialize, Serialize};

use crate::safety::SafetyTier;
use crate::style::{IdentityToken, LockedAsset};

/// Partial cinematography hint. Used at three precedence levels (shot,
/// scene override, style defaults); absent fields fall through to the next
/// level during compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraLanguage {
    pub shot_size: Option<String>,
    pub angle: Option<String>,
    pub lens: Option<String>,
    pub movement: Option<String>,
    pub lighting: Option<String>,
    pub grade: Option<String>,
}

/// Fully resolved cinematography spec. Every field is concrete; fields no
/// level specified resolve to the documented neutral defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CinematographySpec {
    pub shot_size: String,
    pub angle: String,
    pub lens: String,
    pub movement: String,
    pub lighting: String,
    pub grade: String,
}

/// Neutral defaults used when no precedence level specifies a field.
pub const DEFAULT_SHOT_SIZE: &str = "medium shot";
pub const DEFAULT_ANGLE: &str = "eye level";
pub const DEFAULT_LENS: &str = "35mm";
pub const DEFAULT_MOVEMENT: &str = "static";
pub const DEFAULT_LIGHTING: &str = "naturalistic";
pub const DEFAULT_GRADE: &str = "neutral";

/// Execution parameters for the engine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    pub duration_secs: f64,
    pub fps: i32,
    pub width: i32,
    pub height: i32,
    /// Fixed seed for reproducibility; `None` lets the engine pick one.
    pub seed: Option<i64>,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            duration_secs: 5.0,
            fps: 24,
            width: 1920,
            height: 1080,
            seed: None,
        }
    }
}

/// Routing hints consumed by the engine registry, not by adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingHints {
    /// Engine the caller would like to use, e.g. `"gemini"`.
    pub preferred_engine: Option<String>,
    /// Engine to try when the preferred one is not configured.
    pub fallback_engine: Option<String>,
    pub safety_tier: SafetyTier,
}

/// The vendor-neutral generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledPayload {
    /// Resolved prompt text: action text with placeholders substituted,
    /// plus style and cinematography prose.
    pub prompt: String,
    /// Ordered, deduplicated negative terms. The joined form is in
    /// [`negative_prompt`](Self::negative_prompt).
    pub negative_terms: Vec<String>,
    pub negative_prompt: String,
    pub cinematography: CinematographySpec,
    pub identity_tokens: Vec<IdentityToken>,
    pub locked_assets: Vec<LockedAsset>,
    pub exec: ExecutionParams,
    pub routing: RoutingHints,
}
