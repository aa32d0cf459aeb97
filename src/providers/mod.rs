//! C3 — provider registry and discoverers (spec.md §4.3).
//!
//! A process-wide capability table keyed by tool tag. Providers are
//! stateless (no per-process setup beyond reading env vars), so the
//! registry just builds the fixed set of reference providers once and
//! hands out shared references — there is nothing dynamic to guard with a
//! mutex (spec.md §9: "keep it behind a locked accessor so new providers
//! can be added without changing engine code" is satisfied by adding a
//! line to `all()`, not by runtime registration).

pub mod claude_code;
pub mod cursor;

use chrono::{DateTime, Utc};
use std::sync::OnceLock;

/// The discovery record produced by a provider (spec.md §3 `RawSession`).
/// Immutable after discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSession {
    pub id: String,
    pub tool: String,
    pub locator: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub repo_path: String,
    pub extension: String,
}

/// Capability set a tool-specific session provider implements (spec.md
/// §4.3, §9 — a capability set, not a class hierarchy).
pub trait Provider: Send + Sync {
    /// The tool tag stored in manifests and trailers (e.g. `claude-code`).
    fn name(&self) -> &'static str;

    /// File extension stored sessions get in the transcripts tree.
    fn file_extension(&self) -> &'static str;

    /// Scan this tool's local data store for sessions overlapping
    /// `[start, end]` that plausibly belong to `repo_path`. Must not hang
    /// on a missing or inaccessible store — return an empty vec instead.
    fn discover(&self, repo_path: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<RawSession>;

    /// Read a session's raw bytes, ready for scrubbing and storage.
    fn read_transcript(&self, session: &RawSession) -> std::io::Result<Vec<u8>>;
}

/// All registered providers, built once per process.
pub fn all() -> &'static [Box<dyn Provider>] {
    static PROVIDERS: OnceLock<Vec<Box<dyn Provider>>> = OnceLock::new();
    PROVIDERS.get_or_init(|| {
        vec![
            Box::new(claude_code::ClaudeCodeProvider::default()),
            Box::new(cursor::CursorProvider::default()),
        ]
    })
}

/// Look up a single provider by tool tag (used when a config's
/// `providers` allowlist restricts discovery to a subset of `all()`).
pub fn by_name(name: &str) -> Option<&'static dyn Provider> {
    all().iter().find(|p| p.name() == name).map(|p| p.as_ref())
}
