//! Gemini adapter: Imagen still images + Veo video over the Google
//! generative-language HTTP API.
//!
//! All vendor request/response shapes live in this module and nowhere else.
//! Anchors come from a single synchronous `:predict` call; video is a
//! long-running job submitted with `:predictLongRunning` and polled on a
//! fixed interval up to a hard cap. Vendor safety filtering
//! (`raiFilteredReason` / `raiMediaFilteredReasons`) maps to
//! [`EngineError::PolicyFiltered`] and is never retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use reelforge_core::generation::TargetRegion;
use reelforge_core::payload::CompiledPayload;
use reelforge_core::providers::BlobStore;
use reelforge_core::safety::SafetyTier;

use crate::adapter::{EngineAdapter, EngineResult, ReferenceBundle};
use crate::encode::base64_chunked;
use crate::error::EngineError;
use crate::http::RetryingHttpClient;

pub const GEMINI_ENGINE_NAME: &str = "gemini";

/// Connection and tuning parameters for the Gemini adapter.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Base API URL, e.g. `https://generativelanguage.googleapis.com`.
    pub api_base: String,
    pub image_model: String,
    pub video_model: String,
    /// Interval between status polls for long-running video jobs.
    pub poll_interval: Duration,
    /// Hard cap on poll attempts; 36 * 5s ≈ 3 minutes.
    pub max_poll_attempts: u32,
    /// Retry budget handed to the HTTP client per vendor call.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            video_model: "veo-2.0-generate-001".to_string(),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 36,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// One decoded output artifact, ready for upload.
struct Artifact {
    bytes: Vec<u8>,
    content_type: String,
}

/// Outcome of parsing a long-running operation poll response.
#[derive(Debug)]
enum OperationState {
    Pending,
    Done(Vec<serde_json::Value>),
    Filtered(String),
}

pub struct GeminiEngine {
    config: GeminiConfig,
    http: RetryingHttpClient,
    blobs: Arc<dyn BlobStore>,
}

impl GeminiEngine {
    pub fn new(
        config: GeminiConfig,
        http: RetryingHttpClient,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config,
            http,
            blobs,
        }
    }

    fn model_url(&self, model: &str, verb: &str) -> String {
        format!("{}/v1beta/models/{model}:{verb}", self.config.api_base)
    }

    /// Send one vendor call through the retrying client and surface a
    /// non-success final status as the appropriate error kind.
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, EngineError> {
        let request = self
            .http
            .inner()
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body);

        let response = self
            .http
            .send(request, self.config.max_retries, self.config.base_delay)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(EngineError::Transient {
                    status: status.as_u16(),
                    detail: body,
                });
            }
            return Err(EngineError::Vendor(format!("HTTP {status}: {body}")));
        }
        Ok(response.json::<serde_json::Value>().await?)
    }

    /// Fetch raw bytes from a URL (anchor images, vendor-hosted videos).
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, EngineError> {
        let response = self
            .http
            .send(
                self.http.inner().get(url),
                self.config.max_retries,
                self.config.base_delay,
            )
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Vendor(format!(
                "Failed to fetch {url}: HTTP {status}"
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Upload decoded artifacts and return their public URLs.
    async fn upload_all(&self, artifacts: Vec<Artifact>) -> Result<Vec<String>, EngineError> {
        let mut urls = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let url = self
                .blobs
                .put(artifact.bytes, &artifact.content_type)
                .await
                .map_err(|e| EngineError::Upload(e.to_string()))?;
            urls.push(url);
        }
        Ok(urls)
    }

    /// Decode one prediction/video value into an artifact. Accepts inline
    /// base64 bytes or a vendor-hosted URI.
    async fn decode_artifact(
        &self,
        value: &serde_json::Value,
        default_mime: &str,
    ) -> Result<Artifact, EngineError> {
        let content_type = value
            .get("mimeType")
            .and_then(|m| m.as_str())
            .unwrap_or(default_mime)
            .to_string();

        if let Some(b64) = value.get("bytesBase64Encoded").and_then(|b| b.as_str()) {
            let bytes = BASE64
                .decode(b64)
                .map_err(|e| EngineError::Vendor(format!("Invalid base64 artifact: {e}")))?;
            return Ok(Artifact {
                bytes,
                content_type,
            });
        }
        if let Some(uri) = value
            .get("uri")
            .or_else(|| value.get("video").and_then(|v| v.get("uri")))
            .and_then(|u| u.as_str())
        {
            let bytes = self.fetch_bytes(uri).await?;
            return Ok(Artifact {
                bytes,
                content_type,
            });
        }
        Err(EngineError::Vendor(
            "Artifact carries neither inline bytes nor a uri".to_string(),
        ))
    }

    /// Poll a long-running operation until done, filtered, timed out, or
    /// cancelled. One cancellation check per iteration.
    async fn poll_operation(
        &self,
        operation_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<serde_json::Value>, EngineError> {
        let url = format!("{}/v1beta/{operation_name}", self.config.api_base);

        for attempt in 0..self.config.max_poll_attempts {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            let request = self
                .http
                .inner()
                .get(&url)
                .header("x-goog-api-key", &self.config.api_key);
            let response = self
                .http
                .send(request, self.config.max_retries, self.config.base_delay)
                .await?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(EngineError::Transient {
                    status: status.as_u16(),
                    detail: body,
                });
            }
            let value = response.json::<serde_json::Value>().await?;

            match parse_operation(&value)? {
                OperationState::Pending => {
                    tracing::debug!(operation = operation_name, attempt, "Video job still running");
                }
                OperationState::Done(videos) => return Ok(videos),
                OperationState::Filtered(reasons) => {
                    return Err(EngineError::PolicyFiltered { reasons });
                }
            }
        }

        Err(EngineError::Timeout {
            waited_secs: self.config.max_poll_attempts as u64
                * self.config.poll_interval.as_secs(),
        })
    }

    fn resolve_seed(seed: Option<i64>) -> i64 {
        seed.unwrap_or_else(|| rand::rng().random_range(0..i64::MAX))
    }
}

/// Map the payload's safety tier onto the vendor's filter threshold.
pub fn safety_setting(tier: SafetyTier) -> &'static str {
    match tier {
        SafetyTier::Permissive => "block_only_high",
        SafetyTier::Standard => "block_medium_and_above",
        SafetyTier::Strict => "block_low_and_above",
    }
}

/// Parameters for a mask-region edit call. Carries the same negative
/// prompt and safety threshold as the anchor call, so an edit is filtered
/// under the same policy as the output it corrects.
fn edit_parameters(
    payload: &CompiledPayload,
    region: &TargetRegion,
    seed: i64,
) -> serde_json::Value {
    serde_json::json!({
        "sampleCount": 1,
        "negativePrompt": payload.negative_prompt,
        "seed": seed,
        "safetySetting": safety_setting(payload.routing.safety_tier),
        "editMode": "EDIT_MODE_INPAINT_INSERTION",
        "maskBounds": {
            "x": region.x,
            "y": region.y,
            "width": region.width,
            "height": region.height,
        },
    })
}

/// Split an image `:predict` response into kept predictions and filter
/// reasons. All-filtered responses are a policy rejection.
fn parse_image_predictions(
    value: &serde_json::Value,
) -> Result<Vec<serde_json::Value>, EngineError> {
    let predictions = value
        .get("predictions")
        .and_then(|p| p.as_array())
        .ok_or_else(|| EngineError::Vendor("Response has no predictions array".to_string()))?;

    let mut kept = Vec::new();
    let mut reasons = Vec::new();
    for prediction in predictions {
        if let Some(reason) = prediction.get("raiFilteredReason").and_then(|r| r.as_str()) {
            reasons.push(reason.to_string());
        } else {
            kept.push(prediction.clone());
        }
    }

    if kept.is_empty() {
        if reasons.is_empty() {
            return Err(EngineError::Vendor("Empty predictions array".to_string()));
        }
        return Err(EngineError::PolicyFiltered {
            reasons: reasons.join("; "),
        });
    }
    Ok(kept)
}

/// Interpret one long-running-operation poll response.
fn parse_operation(value: &serde_json::Value) -> Result<OperationState, EngineError> {
    if !value.get("done").and_then(|d| d.as_bool()).unwrap_or(false) {
        return Ok(OperationState::Pending);
    }
    if let Some(error) = value.get("error") {
        return Err(EngineError::Vendor(format!("Operation failed: {error}")));
    }

    let response = value
        .get("response")
        .ok_or_else(|| EngineError::Vendor("Done operation has no response".to_string()))?;

    if let Some(reasons) = response
        .get("raiMediaFilteredReasons")
        .and_then(|r| r.as_array())
    {
        if !reasons.is_empty() {
            let joined = reasons
                .iter()
                .filter_map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Ok(OperationState::Filtered(joined));
        }
    }

    let videos = response
        .get("generateVideoResponse")
        .and_then(|g| g.get("generatedSamples"))
        .or_else(|| response.get("videos"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| EngineError::Vendor("Done operation has no videos".to_string()))?;

    Ok(OperationState::Done(videos.clone()))
}

#[async_trait]
impl EngineAdapter for GeminiEngine {
    fn name(&self) -> &'static str {
        GEMINI_ENGINE_NAME
    }

    async fn generate_anchor(
        &self,
        payload: &CompiledPayload,
        _refs: &ReferenceBundle,
        count: u32,
        seed: Option<i64>,
        _cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        let seed = Self::resolve_seed(seed);
        let body = serde_json::json!({
            "instances": [{ "prompt": payload.prompt }],
            "parameters": {
                "sampleCount": count,
                "negativePrompt": payload.negative_prompt,
                "seed": seed,
                "safetySetting": safety_setting(payload.routing.safety_tier),
                "aspectRatio": "16:9",
            },
        });

        let url = self.model_url(&self.config.image_model, "predict");
        let response = self.post_json(&url, &body).await?;
        let predictions = parse_image_predictions(&response)?;

        let mut artifacts = Vec::with_capacity(predictions.len());
        for prediction in &predictions {
            artifacts.push(self.decode_artifact(prediction, "image/png").await?);
        }
        let output_urls = self.upload_all(artifacts).await?;

        tracing::info!(count = output_urls.len(), seed, "Anchor candidates generated");
        Ok(EngineResult {
            output_urls,
            seed,
            engine: GEMINI_ENGINE_NAME.to_string(),
        })
    }

    async fn animate_from_anchor(
        &self,
        anchor_url: &str,
        payload: &CompiledPayload,
        _refs: &ReferenceBundle,
        duration_secs: f64,
        seed: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        let seed = Self::resolve_seed(seed);
        let anchor_bytes = self.fetch_bytes(anchor_url).await?;
        let encoded = base64_chunked(&anchor_bytes);

        let body = serde_json::json!({
            "instances": [{
                "prompt": payload.prompt,
                "image": {
                    "bytesBase64Encoded": encoded,
                    "mimeType": "image/png",
                },
            }],
            "parameters": {
                "durationSeconds": duration_secs.round() as i64,
                "negativePrompt": payload.negative_prompt,
                "seed": seed,
                "safetySetting": safety_setting(payload.routing.safety_tier),
            },
        });

        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        let submit = self.post_json(&url, &body).await?;
        let operation_name = submit
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| EngineError::Vendor("Submit response has no operation name".into()))?
            .to_string();

        tracing::info!(operation = %operation_name, duration_secs, "Video job submitted");
        let videos = self.poll_operation(&operation_name, cancel).await?;

        let mut artifacts = Vec::with_capacity(videos.len());
        for video in &videos {
            artifacts.push(self.decode_artifact(video, "video/mp4").await?);
        }
        let output_urls = self.upload_all(artifacts).await?;

        Ok(EngineResult {
            output_urls,
            seed,
            engine: GEMINI_ENGINE_NAME.to_string(),
        })
    }

    async fn targeted_edit(
        &self,
        payload: &CompiledPayload,
        source_url: &str,
        region: &TargetRegion,
        prompt_delta: &str,
        seed: Option<i64>,
        _cancel: &CancellationToken,
    ) -> Result<EngineResult, EngineError> {
        let seed = Self::resolve_seed(seed);
        let source_bytes = self.fetch_bytes(source_url).await?;
        let encoded = base64_chunked(&source_bytes);

        let body = serde_json::json!({
            "instances": [{
                "prompt": prompt_delta,
                "image": {
                    "bytesBase64Encoded": encoded,
                    "mimeType": "image/png",
                },
            }],
            "parameters": edit_parameters(payload, region, seed),
        });

        let url = self.model_url(&self.config.image_model, "predict");
        let response = self.post_json(&url, &body).await?;
        let predictions = parse_image_predictions(&response)?;

        let mut artifacts = Vec::with_capacity(predictions.len());
        for prediction in &predictions {
            artifacts.push(self.decode_artifact(prediction, "image/png").await?);
        }
        let output_urls = self.upload_all(artifacts).await?;

        Ok(EngineResult {
            output_urls,
            seed,
            engine: GEMINI_ENGINE_NAME.to_string(),
        })
    }
}
