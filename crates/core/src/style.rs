//! Upstream visual-context inputs.
//!
//! These types mirror what the entity/style pipeline produces: a versioned
//! style contract, optional per-scene overrides, locked (approved) visual
//! reference assets, and resolved identity tokens. All of them are read-only
//! snapshots from this crate's point of view.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::payload::CameraLanguage;
use crate::types::DbId;

/// Genre-blended visual rules for a film. Immutable snapshot per `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleContext {
    pub film_id: DbId,
    pub version: i32,
    /// Lighting/color/texture prose appended to every prompt.
    pub lighting: String,
    pub color_palette: String,
    pub texture: String,
    /// Base negative-prompt terms, e.g. `["watermark", "text overlay"]`.
    pub negative_base: Vec<String>,
    /// Per-character visual directives keyed by character ref code.
    pub character_directives: HashMap<String, String>,
    /// Time period the film is set in, e.g. `"1920s"` or `"victorian"`.
    /// Drives the anachronism negative terms.
    pub time_period: Option<String>,
    /// Cinematography defaults for the genre blend. Lowest precedence.
    pub defaults: CameraLanguage,
    /// Content flags from the script rating pass.
    pub content_flags: ContentFlags,
}

impl Default for StyleContext {
    /// Neutral contract used when no style context exists for a film yet.
    /// Compilation degrades to these defaults rather than failing.
    fn default() -> Self {
        Self {
            film_id: 0,
            version: 0,
            lighting: String::new(),
            color_palette: String::new(),
            texture: String::new(),
            negative_base: Vec::new(),
            character_directives: HashMap::new(),
            time_period: None,
            defaults: CameraLanguage::default(),
            content_flags: ContentFlags::default(),
        }
    }
}

/// Independent content flags derived upstream from the script.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ContentFlags {
    pub violence: bool,
    pub nudity: bool,
    pub language: bool,
}

/// Optional per-scene deltas that take precedence over [`StyleContext`]
/// defaults for that scene only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneOverride {
    pub scene_number: i32,
    pub mood: Option<String>,
    /// Scene-level cinematography overrides. Middle precedence.
    pub camera: CameraLanguage,
    pub color_shift: Option<String>,
    pub time_of_day: Option<String>,
    /// Scene-specific negative terms appended to the negative prompt.
    pub negative_terms: Vec<String>,
}

/// A named, approved visual reference scoped to a film.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedAsset {
    pub film_id: DbId,
    /// Placeholder code as it appears in shot text, e.g. `LOC_01`.
    pub ref_code: String,
    pub name: String,
    /// Asset kind: location, prop, vehicle, wardrobe.
    pub kind: String,
    pub description: String,
    pub image_url: String,
}

/// A `{{REF_CODE}}` placeholder resolved to a concrete visual reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityToken {
    pub ref_code: String,
    pub asset_name: String,
    pub image_url: String,
    /// Stale reference that needs regeneration upstream. Carried through
    /// to the payload for auditing; does not block compilation.
    #[serde(default)]
    pub dirty: bool,
}
