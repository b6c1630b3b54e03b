//! The engine adapter interface.
//!
//! Every backend implements the same three capabilities: anchor-image
//! generation, anchor-to-video animation, and targeted region repair.
//! Vendor request/response shapes stay confined inside each adapter; the
//! orchestrator only ever sees [`EngineResult`] or a normalized
//! [`crate::error::EngineError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use reelforge_core::generation::TargetRegion;
use reelforge_core::payload::CompiledPayload;

use crate::error::EngineError;

/// Image references an adapter may pass to the vendor for identity
/// conditioning. Extracted from the payload so adapters do not walk domain
/// structures themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceBundle {
    /// Identity-token reference image URLs (characters, locations).
    pub identity_urls: Vec<String>,
    /// Locked-asset reference image URLs.
    pub asset_urls: Vec<String>,
}

impl ReferenceBundle {
    /// Collect reference URLs from a compiled payload.
    pub fn from_payload(payload: &CompiledPayload) -> Self {
        Self {
            identity_urls: payload
                .identity_tokens
                .iter()
                .map(|t| t.image_url.clone())
                .collect(),
            asset_urls: payload
                .locked_assets
                .iter()
                .map(|a| a.image_url.clone())
                .collect(),
        }
    }
}

/// Output of a successful adapter call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResult {
    /// Public blob-store URLs, never raw bytes.
    pub output_urls: Vec<String>,
    /// Seed actually used, for reproducibility.
    pub seed: i64,
    /// Concrete engine name used; may differ from the routing hint when
    /// fallback occurred.
    pub engine: String,
}

/// A pluggable integration with one external generation backend.
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Stable engine name used in routing hints and generation records.
    fn name(&self) -> &'static str;

    /// Produce `count` still-image anchor candidates.
    async fn generate_anchor(
        &self,
        payload: &CompiledPayload,
        refs: &ReferenceBundle,
        count: u32,
        seed: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError>;

    /// Produce one video clip animated from a chosen anchor image.
    async fn animate_from_anchor(
        &self,
        anchor_url: &str,
        payload: &CompiledPayload,
        refs: &ReferenceBundle,
        duration_secs: f64,
        seed: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError>;

    /// Regenerate a localized region of an existing output. The payload
    /// supplies the negative prompt and safety tier; the delta describes
    /// only the correction.
    async fn targeted_edit(
        &self,
        payload: &CompiledPayload,
        source_url: &str,
        region: &TargetRegion,
        prompt_delta: &str,
        seed: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError>;
}
