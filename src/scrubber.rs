//! Pluggable credential/PII scrubber (spec.md's "Out of scope" note: "a
//! pluggable byte-to-byte transform applied before storage"; SPEC_FULL.md
//! §C gives it a concrete trait seam so C6 has something to call).

use crate::config::ScrubberKind;
use crate::error::PromptStoryError;
use regex::Regex;
use std::sync::OnceLock;

/// A byte-to-byte transform applied to transcript bytes before they are
/// hashed and stored as a blob.
pub trait Scrubber: Send + Sync {
    fn scrub(&self, bytes: &[u8]) -> Result<Vec<u8>, PromptStoryError>;
}

/// No-op scrubber — stores transcripts verbatim.
pub struct IdentityScrubber;

impl Scrubber for IdentityScrubber {
    fn scrub(&self, bytes: &[u8]) -> Result<Vec<u8>, PromptStoryError> {
        Ok(bytes.to_vec())
    }
}

/// Redacts common secret shapes (API keys, bearer tokens, AWS-style
/// access keys) by pattern, replacing the matched span with `***`. Not
/// exhaustive — a best-effort filter, not a security boundary.
pub struct RedactingScrubber;

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"sk-[A-Za-z0-9_-]{20,}").unwrap(),
            Regex::new(r"(?i)bearer\s+[A-Za-z0-9._-]{20,}").unwrap(),
            Regex::new(r"AKIA[0-9A-Z]{16}").unwrap(),
            Regex::new(r"ghp_[A-Za-z0-9]{30,}").unwrap(),
        ]
    })
}

impl Scrubber for RedactingScrubber {
    fn scrub(&self, bytes: &[u8]) -> Result<Vec<u8>, PromptStoryError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| PromptStoryError::ScrubberError(e.to_string()))?;
        let mut out = text.to_string();
        for pattern in patterns() {
            out = pattern.replace_all(&out, "***").into_owned();
        }
        Ok(out.into_bytes())
    }
}

/// Build the configured scrubber.
pub fn from_kind(kind: &ScrubberKind) -> Box<dyn Scrubber> {
    match kind {
        ScrubberKind::Identity => Box::new(IdentityScrubber),
        ScrubberKind::Redacting => Box::new(RedactingScrubber),
    }
}

#[cfg(test)]
mod tests;
