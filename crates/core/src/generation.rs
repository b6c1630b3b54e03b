//! Generation lifecycle: modes, statuses, transition legality, and dispatch
//! validation.
//!
//! A generation record is created in [`GenerationStatus::Created`], moved to
//! the mode-specific running status before the engine call, and transitions
//! exactly once to a terminal status. It is write-once after that.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What kind of output a generation attempt produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Still-image candidates used as the visual basis for animation.
    Anchor,
    /// One video clip animated from a chosen anchor.
    Animate,
    /// Localized regeneration of part of an existing output.
    TargetedEdit,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Anchor => "anchor",
            GenerationMode::Animate => "animate",
            GenerationMode::TargetedEdit => "targeted_edit",
        }
    }

    /// Whether this mode derives from a prior anchor generation.
    pub fn requires_anchor(&self) -> bool {
        matches!(self, GenerationMode::Animate | GenerationMode::TargetedEdit)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a generation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Created,
    Anchoring,
    Animating,
    Repairing,
    Complete,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Created => "created",
            GenerationStatus::Anchoring => "anchoring",
            GenerationStatus::Animating => "animating",
            GenerationStatus::Repairing => "repairing",
            GenerationStatus::Complete => "complete",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(GenerationStatus::Created),
            "anchoring" => Some(GenerationStatus::Anchoring),
            "animating" => Some(GenerationStatus::Animating),
            "repairing" => Some(GenerationStatus::Repairing),
            "complete" => Some(GenerationStatus::Complete),
            "failed" => Some(GenerationStatus::Failed),
            _ => None,
        }
    }

    /// The in-progress status a record enters while the engine call for
    /// `mode` is running.
    pub fn running_for(mode: GenerationMode) -> Self {
        match mode {
            GenerationMode::Anchor => GenerationStatus::Anchoring,
            GenerationMode::Animate => GenerationStatus::Animating,
            GenerationMode::TargetedEdit => GenerationStatus::Repairing,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Complete | GenerationStatus::Failed)
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Anchoring | GenerationStatus::Animating | GenerationStatus::Repairing
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Legal paths: `created -> running -> terminal`, plus
    /// `created -> failed` (validation after insert) and
    /// `created/running -> failed` for sweeper cleanup. Terminal states
    /// admit no further transitions.
    pub fn can_transition_to(&self, next: GenerationStatus) -> bool {
        match self {
            GenerationStatus::Created => next.is_running() || next == GenerationStatus::Failed,
            s if s.is_running() => next.is_terminal(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch options and validation
// ---------------------------------------------------------------------------

/// A rectangular region to regenerate, in normalized 0..1 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Caller-supplied options for one dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchOptions {
    /// Number of anchor candidates to request. Defaults to 1.
    pub count: Option<u32>,
    /// Fixed seed for reproducibility.
    pub seed: Option<i64>,
    /// Anchor output URL from a prior generation. Required for animate
    /// and targeted-edit modes.
    pub anchor_url: Option<String>,
    /// The completed generation this one derives from. Required for
    /// animate and targeted-edit modes.
    pub parent_generation_id: Option<DbId>,
    /// Clip length for animate mode; falls back to the payload default.
    pub duration_secs: Option<f64>,
    /// Region to regenerate for targeted-edit mode.
    pub target_region: Option<TargetRegion>,
    /// Prompt delta describing the correction for targeted-edit mode.
    pub prompt_delta: Option<String>,
}

/// Validate dispatch preconditions before any record is created.
///
/// Animate and targeted-edit generations always derive from a prior anchor;
/// the anchor URL and parent generation id are explicit inputs, never
/// inferred.
pub fn validate_dispatch(mode: GenerationMode, options: &DispatchOptions) -> Result<(), CoreError> {
    if mode.requires_anchor() {
        match options.anchor_url.as_deref() {
            None | Some("") => {
                return Err(CoreError::Validation(format!(
                    "{} requires an anchor_url from a prior generation",
                    mode.as_str()
                )));
            }
            Some(_) => {}
        }
        if options.parent_generation_id.is_none() {
            return Err(CoreError::Validation(format!(
                "{} requires a parent_generation_id",
                mode.as_str()
            )));
        }
    }
    if mode == GenerationMode::TargetedEdit && options.target_region.is_none() {
        return Err(CoreError::Validation(
            "targeted_edit requires a target_region".to_string(),
        ));
    }
    if let Some(count) = options.count {
        if count == 0 {
            return Err(CoreError::Validation(
                "count must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Status transitions --

    #[test]
    fn created_can_start_running() {
        assert!(GenerationStatus::Created.can_transition_to(GenerationStatus::Anchoring));
        assert!(GenerationStatus::Created.can_transition_to(GenerationStatus::Animating));
        assert!(GenerationStatus::Created.can_transition_to(GenerationStatus::Repairing));
    }

    #[test]
    fn created_cannot_complete_directly() {
        assert!(!GenerationStatus::Created.can_transition_to(GenerationStatus::Complete));
    }

    #[test]
    fn running_reaches_exactly_terminal_states() {
        for running in [
            GenerationStatus::Anchoring,
            GenerationStatus::Animating,
            GenerationStatus::Repairing,
        ] {
            assert!(running.can_transition_to(GenerationStatus::Complete));
            assert!(running.can_transition_to(GenerationStatus::Failed));
            assert!(!running.can_transition_to(GenerationStatus::Created));
            assert!(!running.can_transition_to(GenerationStatus::Anchoring));
        }
    }

    #[test]
    fn terminal_states_are_write_once() {
        for terminal in [GenerationStatus::Complete, GenerationStatus::Failed] {
            for next in [
                GenerationStatus::Created,
                GenerationStatus::Anchoring,
                GenerationStatus::Animating,
                GenerationStatus::Repairing,
                GenerationStatus::Complete,
                GenerationStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn running_status_matches_mode() {
        assert_eq!(
            GenerationStatus::running_for(GenerationMode::Anchor),
            GenerationStatus::Anchoring
        );
        assert_eq!(
            GenerationStatus::running_for(GenerationMode::Animate),
            GenerationStatus::Animating
        );
        assert_eq!(
            GenerationStatus::running_for(GenerationMode::TargetedEdit),
            GenerationStatus::Repairing
        );
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            GenerationStatus::Created,
            GenerationStatus::Anchoring,
            GenerationStatus::Animating,
            GenerationStatus::Repairing,
            GenerationStatus::Complete,
            GenerationStatus::Failed,
        ] {
            assert_eq!(GenerationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(GenerationStatus::parse("queued"), None);
    }

    // -- Dispatch validation --

    #[test]
    fn anchor_mode_needs_no_anchor() {
        assert!(validate_dispatch(GenerationMode::Anchor, &DispatchOptions::default()).is_ok());
    }

    #[test]
    fn animate_without_anchor_is_rejected() {
        let err = validate_dispatch(GenerationMode::Animate, &DispatchOptions::default());
        assert!(matches!(err, Err(CoreError::Validation(_))));
    }

    #[test]
    fn animate_with_empty_anchor_is_rejected() {
        let options = DispatchOptions {
            anchor_url: Some(String::new()),
            parent_generation_id: Some(7),
            ..Default::default()
        };
        assert!(validate_dispatch(GenerationMode::Animate, &options).is_err());
    }

    #[test]
    fn animate_without_parent_is_rejected() {
        let options = DispatchOptions {
            anchor_url: Some("https://blobs.test/anchor.png".into()),
            ..Default::default()
        };
        assert!(validate_dispatch(GenerationMode::Animate, &options).is_err());
    }

    #[test]
    fn targeted_edit_requires_region() {
        let options = DispatchOptions {
            anchor_url: Some("https://blobs.test/anchor.png".into()),
            parent_generation_id: Some(7),
            ..Default::default()
        };
        assert!(validate_dispatch(GenerationMode::TargetedEdit, &options).is_err());

        let with_region = DispatchOptions {
            target_region: Some(TargetRegion {
                x: 0.1,
                y: 0.1,
                width: 0.2,
                height: 0.2,
            }),
            ..options
        };
        assert!(validate_dispatch(GenerationMode::TargetedEdit, &with_region).is_ok());
    }

    #[test]
    fn zero_count_is_rejected() {
        let options = DispatchOptions {
            count: Some(0),
            ..Default::default()
        };
        assert!(validate_dispatch(GenerationMode::Anchor, &options).is_err());
    }
}
