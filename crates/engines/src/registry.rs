//! Engine registry and routing-hint resolution.
//!
//! The registry owns one adapter instance per configured backend plus the
//! always-available stub. Resolution follows the payload's routing hints:
//! preferred engine, then fallback engine, then stub. Absence of credentials
//! for a hinted engine is not an error — the request degrades to the next
//! choice.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reelforge_core::payload::RoutingHints;
use reelforge_core::providers::BlobStore;

use crate::adapter::EngineAdapter;
use crate::error::EngineError;
use crate::gemini::{GeminiConfig, GeminiEngine};
use crate::http::RetryingHttpClient;
use crate::stub::StubEngine;

/// Backend credentials and tuning, loaded once at process start.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Gemini API key. `None` means the Gemini adapter is not registered
    /// and hints naming it fall through to the stub.
    pub gemini_api_key: Option<String>,
    /// Hard per-request timeout for all vendor HTTP calls.
    pub request_timeout: Duration,
    /// Poll interval for long-running video jobs.
    pub poll_interval: Duration,
    /// Hard cap on poll attempts.
    pub max_poll_attempts: u32,
    /// Retry budget per vendor call.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 36,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Owns the configured adapters for the lifetime of the process.
pub struct EngineRegistry {
    engines: HashMap<&'static str, Arc<dyn EngineAdapter>>,
    stub: Arc<dyn EngineAdapter>,
}

impl EngineRegistry {
    /// Build the registry from configuration. Only backends with complete
    /// credentials are registered.
    pub fn from_config(
        config: &EngineConfig,
        blobs: Arc<dyn BlobStore>,
    ) -> Result<Self, EngineError> {
        let mut engines: HashMap<&'static str, Arc<dyn EngineAdapter>> = HashMap::new();

        if let Some(api_key) = &config.gemini_api_key {
            let gemini_config = GeminiConfig {
                poll_interval: config.poll_interval,
                max_poll_attempts: config.max_poll_attempts,
                max_retries: config.max_retries,
                base_delay: config.base_delay,
                ..GeminiConfig::new(api_key.clone())
            };
            let http = RetryingHttpClient::new(config.request_timeout)?;
            let engine: Arc<dyn EngineAdapter> =
                Arc::new(GeminiEngine::new(gemini_config, http, blobs));
            engines.insert(engine.name(), engine);
            tracing::info!("Gemini engine registered");
        } else {
            tracing::info!("No backend credentials configured; stub engine only");
        }

        Ok(Self {
            engines,
            stub: Arc::new(StubEngine::new()),
        })
    }

    /// A registry containing only the stub engine.
    pub fn stub_only() -> Self {
        Self {
            engines: HashMap::new(),
            stub: Arc::new(StubEngine::new()),
        }
    }

    /// Register an additional adapter under its own name. A later
    /// registration replaces an earlier one with the same name.
    pub fn register(&mut self, engine: Arc<dyn EngineAdapter>) {
        self.engines.insert(engine.name(), engine);
    }

    /// Resolve an adapter for the given routing hints: preferred engine,
    /// then fallback engine, then stub. Never fails.
    pub fn resolve(&self, routing: &RoutingHints) -> Arc<dyn EngineAdapter> {
        for hint in [&routing.preferred_engine, &routing.fallback_engine] {
            if let Some(name) = hint {
                if let Some(engine) = self.engines.get(name.as_str()) {
                    return engine.clone();
                }
                tracing::debug!(engine = %name, "Hinted engine not configured, falling through");
            }
        }
        self.stub.clone()
    }

    /// Names of the configured vendor engines (stub excluded).
    pub fn configured(&self) -> Vec<&'static str> {
        self.engines.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_core::safety::SafetyTier;

    fn hints(preferred: Option<&str>, fallback: Option<&str>) -> RoutingHints {
        RoutingHints {
            preferred_engine: preferred.map(String::from),
            fallback_engine: fallback.map(String::from),
            safety_tier: SafetyTier::Permissive,
        }
    }

    #[test]
    fn unconfigured_hint_falls_back_to_stub() {
        let registry = EngineRegistry::stub_only();
        let adapter = registry.resolve(&hints(Some("gemini"), None));
        assert_eq!(adapter.name(), "stub");
    }

    #[test]
    fn no_hint_resolves_to_stub() {
        let registry = EngineRegistry::stub_only();
        assert_eq!(registry.resolve(&hints(None, None)).name(), "stub");
    }

    #[test]
    fn configured_preferred_engine_wins() {
        let blobs = blob_stub();
        let config = EngineConfig {
            gemini_api_key: Some("test-key".into()),
            ..Default::default()
        };
        let registry = EngineRegistry::from_config(&config, blobs).unwrap();
        assert_eq!(registry.resolve(&hints(Some("gemini"), None)).name(), "gemini");
        assert_eq!(registry.configured(), vec!["gemini"]);
    }

    #[test]
    fn fallback_hint_used_when_preferred_missing() {
        let blobs = blob_stub();
        let config = EngineConfig {
            gemini_api_key: Some("test-key".into()),
            ..Default::default()
        };
        let registry = EngineRegistry::from_config(&config, blobs).unwrap();
        let adapter = registry.resolve(&hints(Some("unobtainium"), Some("gemini")));
        assert_eq!(adapter.name(), "gemini");
    }

    fn blob_stub() -> Arc<dyn BlobStore> {
        use async_trait::async_trait;
        use reelforge_core::error::CoreError;

        struct NullBlobs;

        #[async_trait]
        impl BlobStore for NullBlobs {
            async fn put(&self, _bytes: Vec<u8>, _ct: &str) -> Result<String, CoreError> {
                Ok("null://blob".to_string())
            }
        }
        Arc::new(NullBlobs)
    }
}
