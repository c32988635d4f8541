//! Content fingerprinting for cheap change detection on rescan.

use sha2::{Digest, Sha256};

/// SHA-256 over lower-cased, whitespace-normalised text, hex-encoded.
///
/// Insensitive to markup reshuffles that only move whitespace around, so a
/// rescan can tell "the page meaningfully changed" from "the template was
/// re-rendered" and skip the AI call for the latter.
#[must_use]
pub fn content_hash(text: &str) -> String {
    let normalised = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    format!("{:x}", Sha256::digest(normalised.as_bytes()))
}
