//! Deterministic no-network engine.
//!
//! Used in tests and in any environment without live vendor credentials —
//! the registry falls back to this adapter rather than failing a dispatch.
//! Output URLs are derived from the payload fingerprint and seed, so the
//! same request always yields the same placeholders.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use reelforge_core::generation::TargetRegion;
use reelforge_core::hashing;
use reelforge_core::payload::CompiledPayload;

use crate::adapter::{EngineAdapter, EngineResult, ReferenceBundle};
use crate::error::EngineError;

pub const STUB_ENGINE_NAME: &str = "stub";

#[derive(Debug, Default, Clone)]
pub struct StubEngine;

impl StubEngine {
    pub fn new() -> Self {
        Self
    }

    /// Seed used when the caller does not pin one. Derived from the input
    /// key so repeated stub runs stay reproducible.
    fn derive_seed(key: &str, seed: Option<i64>) -> i64 {
        seed.unwrap_or_else(|| {
            let digest = hashing::sha256_hex(key.as_bytes());
            // First 8 hex chars as a positive integer.
            i64::from_str_radix(&digest[..8], 16).unwrap_or(0)
        })
    }
}

#[async_trait]
impl EngineAdapter for StubEngine {
    fn name(&self) -> &'static str {
        STUB_ENGINE_NAME
    }

    async fn generate_anchor(
        &self,
        payload: &CompiledPayload,
        _refs: &ReferenceBundle,
        count: u32,
        seed: Option<i64>,
        _cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        let fp = hashing::fingerprint(payload);
        let seed = Self::derive_seed(&fp, seed);
        let output_urls = (0..count)
            .map(|i| format!("stub://anchor/{}/{i}.png", &fp[..16]))
            .collect();
        tracing::debug!(count, seed, "Stub anchor generation");
        Ok(EngineResult {
            output_urls,
            seed,
            engine: STUB_ENGINE_NAME.to_string(),
        })
    }

    async fn animate_from_anchor(
        &self,
        anchor_url: &str,
        payload: &CompiledPayload,
        _refs: &ReferenceBundle,
        duration_secs: f64,
        seed: Option<i64>,
        _cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        let fp = hashing::fingerprint(payload);
        let seed = Self::derive_seed(&fp, seed);
        let key = hashing::sha256_hex(format!("{anchor_url}|{duration_secs}").as_bytes());
        Ok(EngineResult {
            output_urls: vec![format!("stub://clip/{}.mp4", &key[..16])],
            seed,
            engine: STUB_ENGINE_NAME.to_string(),
        })
    }

    async fn targeted_edit(
        &self,
        _payload: &CompiledPayload,
        source_url: &str,
        region: &TargetRegion,
        prompt_delta: &str,
        seed: Option<i64>,
        _cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        let key = hashing::sha256_hex(
            format!(
                "{source_url}|{:.3},{:.3},{:.3},{:.3}|{prompt_delta}",
                region.x, region.y, region.width, region.height
            )
            .as_bytes(),
        );
        let seed = Self::derive_seed(&key, seed);
        Ok(EngineResult {
            output_urls: vec![format!("stub://edit/{}.png", &key[..16])],
            seed,
            engine: STUB_ENGINE_NAME.to_string(),
        })
    }
}
