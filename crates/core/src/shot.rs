//! Shot input model.
//!
//! A [`Shot`] is one unit of footage owned by the upstream screenplay
//! pipeline. This crate never writes shots; they arrive fully formed through
//! [`crate::providers::ShotProvider`].

use serde::{Deserialize, Serialize};

use crate::payload::CameraLanguage;
use crate::types::DbId;

/// One unit of footage to generate, as parsed from the screenplay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shot {
    pub id: DbId,
    pub film_id: DbId,
    pub scene_number: i32,
    /// Free-text action/description, possibly containing `{{REF_CODE}}`
    /// placeholders for locked assets and characters.
    pub action_text: String,
    /// Optional per-shot camera-language hint. Fields set here win over
    /// scene overrides and style-contract defaults.
    pub camera: Option<CameraLanguage>,
}
