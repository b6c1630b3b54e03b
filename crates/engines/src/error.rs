//! Normalized engine error taxonomy.
//!
//! Adapters never let raw vendor errors cross the interface boundary; they
//! map everything onto these variants, preserving the vendor's message as
//! diagnostic detail. The distinction between variants matters to callers:
//! policy filters and timeouts are terminal and should not be resubmitted
//! unchanged, while transient failures already had their retries spent.

/// Errors from engine adapters and the retrying HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 429/5xx from the vendor after retries were exhausted.
    #[error("Transient backend error ({status}): {detail}")]
    Transient { status: u16, detail: String },

    /// The vendor's safety policy rejected the prompt or the output.
    /// Retrying reproduces the same rejection, so this is terminal.
    #[error("Generation filtered by safety policy: {reasons}")]
    PolicyFiltered { reasons: String },

    /// The long-running job did not finish within the poll cap.
    #[error("Generation timed out after {waited_secs}s of polling")]
    Timeout { waited_secs: u64 },

    /// The dispatch was cancelled while waiting on the vendor.
    #[error("Generation cancelled")]
    Cancelled,

    /// The vendor returned something the adapter could not interpret.
    #[error("Unexpected vendor response: {0}")]
    Vendor(String),

    /// Upload of a returned artifact to the blob store failed.
    #[error("Artifact upload failed: {0}")]
    Upload(String),

    /// Transport-level failure (DNS, TLS, connect, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl EngineError {
    /// Whether resubmitting the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Transient { .. } | EngineError::Http(_) | EngineError::Timeout { .. }
        )
    }
}
