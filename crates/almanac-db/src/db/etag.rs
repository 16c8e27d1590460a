//! `ETag` generation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

/// ## Summary
/// Generates an `ETag` from the canonical encoded bytes of a resource.
///
/// The value is base64(SHA-1(bytes)), unquoted. Two logically equal
/// resources canonicalize to the same bytes and therefore the same tag;
/// the HTTP layer adds the surrounding quotes.
#[must_use]
pub fn from_data(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}
