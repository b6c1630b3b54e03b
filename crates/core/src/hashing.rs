//! Content-addressed fingerprinting of compiled payloads.
//!
//! The fingerprint is a SHA-256 hex digest of a canonical JSON rendering of
//! the payload. Collections whose order carries no meaning (identity tokens,
//! locked assets) are sorted by ref code before hashing so that insertion
//! order never changes the digest. Negative terms are *not* sorted: the
//! compiler defines their order and that order is part of the payload.
//!
//! Collisions are treated as "same request" for dedup/audit purposes and
//! are not verified further.

use sha2::{Digest, Sha256};

use crate::payload::CompiledPayload;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Stable fingerprint of a compiled payload.
pub fn fingerprint(payload: &CompiledPayload) -> String {
    let mut value =
        serde_json::to_value(payload).expect("CompiledPayload always serializes to JSON");

    for key in ["identity_tokens", "locked_assets"] {
        if let Some(serde_json::Value::Array(items)) = value.get_mut(key) {
            items.sort_by(|a, b| {
                let code = |v: &serde_json::Value| {
                    v.get("ref_code")
                        .and_then(|c| c.as_str())
                        .unwrap_or_default()
                        .to_string()
                };
                code(a).cmp(&code(b))
            });
        }
    }

    // serde_json object keys are BTreeMap-ordered, so the rendered string
    // is canonical once the arrays above are normalized.
    let canonical =
        serde_json::to_string(&value).expect("canonical JSON value always renders");
    sha256_hex(canonical.as_bytes())
}
