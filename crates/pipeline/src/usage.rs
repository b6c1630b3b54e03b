//! Usage/cost accounting.
//!
//! Costs are relative units, not currency: anchors are cheap stills,
//! targeted edits cost a fixed premium, and animation scales with clip
//! length. Credit ledger semantics live with the caller; this crate only
//! emits sized events.

use async_trait::async_trait;

use reelforge_core::generation::{DispatchOptions, GenerationMode};
use reelforge_core::payload::ExecutionParams;
use reelforge_core::providers::{Principal, UsageLogger};

const TARGETED_EDIT_COST: f64 = 2.5;
const ANIMATE_COST_PER_SEC: f64 = 1.5;

/// Cost of one dispatch in relative units.
///
/// Anchor: 1.0 per requested candidate. Targeted edit: flat 2.5.
/// Animate: 1.5 per second of requested clip length.
pub fn usage_cost(mode: GenerationMode, options: &DispatchOptions) -> f64 {
    match mode {
        GenerationMode::Anchor => f64::from(options.count.unwrap_or(1)),
        GenerationMode::TargetedEdit => TARGETED_EDIT_COST,
        GenerationMode::Animate => {
            let duration = options
                .duration_secs
                .unwrap_or(ExecutionParams::default().duration_secs);
            ANIMATE_COST_PER_SEC * duration
        }
    }
}

/// Default [`UsageLogger`] that emits structured tracing events.
#[derive(Debug, Clone, Default)]
pub struct TracingUsageLogger;

#[async_trait]
impl UsageLogger for TracingUsageLogger {
    async fn log(&self, principal: &Principal, operation: &str, cost: f64) {
        tracing::info!(
            principal_id = principal.id,
            principal = %principal.name,
            operation,
            cost,
            "Usage event",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_cost_scales_with_candidate_count() {
        let mut options = DispatchOptions::default();
        assert_eq!(usage_cost(GenerationMode::Anchor, &options), 1.0);
        options.count = Some(4);
        assert_eq!(usage_cost(GenerationMode::Anchor, &options), 4.0);
    }

    #[test]
    fn animate_cost_scales_with_duration() {
        let options = DispatchOptions {
            duration_secs: Some(8.0),
            ..Default::default()
        };
        assert_eq!(usage_cost(GenerationMode::Animate, &options), 12.0);
        // Default clip length when the caller does not specify one.
        assert_eq!(
            usage_cost(GenerationMode::Animate, &DispatchOptions::default()),
            7.5
        );
    }

    #[test]
    fn cost_ordering_anchor_edit_animate() {
        let options = DispatchOptions::default();
        let anchor = usage_cost(GenerationMode::Anchor, &options);
        let edit = usage_cost(GenerationMode::TargetedEdit, &options);
        let animate = usage_cost(GenerationMode::Animate, &options);
        assert!(anchor < edit);
        assert!(edit < animate);
    }
}
