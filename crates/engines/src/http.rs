//! Retrying HTTP client for vendor API calls.
//!
//! Wraps outbound requests with exponential backoff and jitter. Retries are
//! limited to HTTP 429 and 5xx; other 4xx responses are the vendor telling
//! us the request itself is wrong and are returned immediately. A
//! `Retry-After` header (integer seconds or HTTP-date) overrides the
//! computed backoff delay. After exhausting the retry budget the last
//! failing response is returned `Ok` so callers can inspect status and body.

use std::time::Duration;

use rand::Rng;
use reqwest::{RequestBuilder, Response, StatusCode};

use crate::error::EngineError;

/// Jitter applied to every delay, as a fraction of the delay (±25%).
pub const JITTER_FRACTION: f64 = 0.25;

/// HTTP client wrapper shared by the real adapters.
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    client: reqwest::Client,
}

impl RetryingHttpClient {
    /// Build a client with a hard per-request timeout. A stuck vendor call
    /// must never hang the dispatching task indefinitely.
    pub fn new(request_timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Reuse an existing `reqwest::Client` (connection pooling across
    /// adapters).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send `request`, retrying on 429/5xx up to `max_retries` times
    /// (at most `max_retries + 1` attempts in total).
    ///
    /// Transport errors are retried the same way; if the final attempt also
    /// fails at the transport level the error is returned. A final attempt
    /// that reaches the server returns its response regardless of status.
    pub async fn send(
        &self,
        request: RequestBuilder,
        max_retries: u32,
        base_delay: Duration,
    ) -> Result<Response, EngineError> {
        let mut attempt: u32 = 0;
        loop {
            // Bodies built via `.json(..)` are cloneable; a non-cloneable
            // request (streaming body) gets exactly one attempt.
            let this_try = match request.try_clone() {
                Some(clone) => clone,
                None if attempt == 0 => return Ok(request.send().await?),
                None => unreachable!("non-cloneable request cannot reach attempt > 0"),
            };

            match this_try.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) || attempt >= max_retries {
                        return Ok(response);
                    }
                    let delay = retry_after(&response)
                        .unwrap_or_else(|| backoff_delay(base_delay, attempt));
                    let delay = apply_jitter(delay, sample_jitter());
                    tracing::warn!(
                        status = status.as_u16(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retryable vendor response, backing off",
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if attempt >= max_retries {
                        return Err(EngineError::Http(e));
                    }
                    let delay = apply_jitter(backoff_delay(base_delay, attempt), sample_jitter());
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transport error, backing off",
                    );
                    tokio::time::sleep(delay).await;
                }
            }
            attempt += 1;
        }
    }
}

/// 429 and any 5xx are retryable; everything else is not.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Exponential backoff: `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Apply a jitter factor in `[-JITTER_FRACTION, +JITTER_FRACTION]`.
pub fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    let factor = 1.0 + jitter.clamp(-JITTER_FRACTION, JITTER_FRACTION);
    Duration::from_secs_f64(delay.as_secs_f64() * factor)
}

fn sample_jitter() -> f64 {
    rand::rng().random_range(-JITTER_FRACTION..=JITTER_FRACTION)
}

/// Parse a `Retry-After` response header: integer seconds or HTTP-date.
pub fn retry_after(response: &Response) -> Option<Duration> {
    let raw = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?;
    parse_retry_after(raw)
}

/// Parse the header value independent of any live response (testable).
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
    if let Ok(secs) = raw.trim().parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let when = chrono::DateTime::parse_from_rfc2822(raw.trim()).ok()?;
    let delta = when.signed_duration_since(chrono::Utc::now());
    // A date in the past means "retry now".
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}
