use std::time::Duration;

use reelforge_core::compiler::EngineHint;
use reelforge_engines::EngineConfig;

/// Pipeline configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables. Absent backend
/// credentials are not an error; dispatches degrade to the stub engine.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Gemini API key; `None` leaves the Gemini adapter unregistered.
    pub gemini_api_key: Option<String>,
    /// Engine the routing hints should prefer (default: `gemini`).
    pub preferred_engine: Option<String>,
    /// Engine to fall back to before the stub, if any.
    pub fallback_engine: Option<String>,
    /// Hard per-request timeout for vendor HTTP calls in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// Poll interval for long-running video jobs in seconds (default: `5`).
    pub poll_interval_secs: u64,
    /// Hard cap on poll attempts (default: `36`, i.e. three minutes at 5s).
    pub max_poll_attempts: u32,
    /// Retry budget per vendor call (default: `3`).
    pub max_retries: u32,
    /// Base backoff delay in milliseconds (default: `500`).
    pub base_delay_ms: u64,
    /// How often the worker sweeps for stuck generations, in seconds
    /// (default: `60`).
    pub sweep_interval_secs: u64,
    /// Age past which a non-terminal generation counts as stuck, in seconds
    /// (default: `900`).
    pub stuck_after_secs: i64,
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                                  |
    /// |-----------------------|------------------------------------------|
    /// | `DATABASE_URL`        | `postgres://localhost:5432/reelforge`    |
    /// | `GEMINI_API_KEY`      | unset                                    |
    /// | `PREFERRED_ENGINE`    | `gemini`                                 |
    /// | `FALLBACK_ENGINE`     | unset                                    |
    /// | `REQUEST_TIMEOUT_SECS`| `60`                                     |
    /// | `POLL_INTERVAL_SECS`  | `5`                                      |
    /// | `MAX_POLL_ATTEMPTS`   | `36`                                     |
    /// | `MAX_RETRIES`         | `3`                                      |
    /// | `BASE_DELAY_MS`       | `500`                                    |
    /// | `SWEEP_INTERVAL_SECS` | `60`                                     |
    /// | `STUCK_AFTER_SECS`    | `900`                                    |
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost:5432/reelforge".into());

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let preferred_engine = std::env::var("PREFERRED_ENGINE")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| Some("gemini".into()));

        let fallback_engine = std::env::var("FALLBACK_ENGINE")
            .ok()
            .filter(|s| !s.is_empty());

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let max_poll_attempts: u32 = std::env::var("MAX_POLL_ATTEMPTS")
            .unwrap_or_else(|_| "36".into())
            .parse()
            .expect("MAX_POLL_ATTEMPTS must be a valid u32");

        let max_retries: u32 = std::env::var("MAX_RETRIES")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("MAX_RETRIES must be a valid u32");

        let base_delay_ms: u64 = std::env::var("BASE_DELAY_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("BASE_DELAY_MS must be a valid u64");

        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");

        let stuck_after_secs: i64 = std::env::var("STUCK_AFTER_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("STUCK_AFTER_SECS must be a valid i64");

        Self {
            database_url,
            gemini_api_key,
            preferred_engine,
            fallback_engine,
            request_timeout_secs,
            poll_interval_secs,
            max_poll_attempts,
            max_retries,
            base_delay_ms,
            sweep_interval_secs,
            stuck_after_secs,
        }
    }

    /// Backend credentials and tuning for the engine registry.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            gemini_api_key: self.gemini_api_key.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_poll_attempts: self.max_poll_attempts,
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }

    /// Routing defaults stamped into every compiled payload.
    pub fn engine_hint(&self) -> EngineHint {
        EngineHint {
            preferred: self.preferred_engine.clone(),
            fallback: self.fallback_engine.clone(),
        }
    }
}
