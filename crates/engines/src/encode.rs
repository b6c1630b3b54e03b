//! Transport encoding for reference images.
//!
//! Vendor animate calls take the anchor image inline as base64. Anchors can
//! be tens of megabytes, so the encoder works in chunks instead of one
//! allocation-heavy pass over the whole buffer. The chunk size is a multiple
//! of 3 bytes, which keeps each chunk's base64 output free of padding and
//! makes plain concatenation a valid encoding of the whole input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// 48 KiB, divisible by 3.
const CHUNK_SIZE: usize = 48 * 1024;

/// Base64-encode `bytes` chunk by chunk.
pub fn base64_chunked(bytes: &[u8]) -> String {
    // 4/3 expansion, rounded up to the next 4-byte group.
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(CHUNK_SIZE) {
        STANDARD.encode_string(chunk, &mut out);
    }
    out
}
