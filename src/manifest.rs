//! The per-commit Manifest (spec.md §3, §6) and its deterministic
//! serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One session entry inside a [`Manifest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub tool: String,
    pub id: String,
    /// Logical path into the transcripts tree: `{tool}/{id}{ext}`.
    pub path: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_at: Option<DateTime<Utc>>,
}

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "v")]
    pub version: u32,
    pub start_work: DateTime<Utc>,
    pub sessions: Vec<SessionEntry>,
}

impl Manifest {
    pub fn new(start_work: DateTime<Utc>, mut sessions: Vec<SessionEntry>) -> Self {
        sessions.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Self {
            version: MANIFEST_VERSION,
            start_work,
            sessions,
        }
    }

    /// Serialize as the stable textual record spec.md §6 defines: UTF-8,
    /// two-space indentation, sessions already ordered by `created`.
    pub fn serialize(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn parse(bytes: &str) -> serde_json::Result<Self> {
        serde_json::from_str(bytes)
    }

    /// Merge manifests produced by a rewrite (amend/rebase/squash) per
    /// spec.md §4.8: version = max, start_work = min, sessions = union
    /// deduplicated by id, sorted by created. No session metadata is
    /// invented — when the same `(tool, id)` appears in more than one
    /// input with different fields, the first occurrence (in input order)
    /// wins.
    pub fn merge(manifests: &[Manifest]) -> Option<Manifest> {
        let version = manifests.iter().map(|m| m.version).max()?;
        let start_work = manifests.iter().map(|m| m.start_work).min()?;
        let mut seen = std::collections::HashSet::new();
        let mut sessions = Vec::new();
        for m in manifests {
            for s in &m.sessions {
                let key = (s.tool.clone(), s.id.clone());
                if seen.insert(key) {
                    sessions.push(s.clone());
                }
            }
        }
        sessions.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Some(Manifest {
            version,
            start_work,
            sessions,
        })
    }

    /// Lexicographically sorted, unique display names for the tools used
    /// in this manifest — the trailer's `Used <names>` list.
    pub fn display_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sessions
            .iter()
            .map(|s| display_name(&s.tool).to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Map a provider tool tag to its commit-trailer display name (spec.md §6).
pub fn display_name(tool: &str) -> &str {
    match tool {
        "claude-code" => "Claude Code",
        "cursor" => "Cursor",
        "codex" => "Codex",
        "gemini-cli" => "Gemini CLI",
        other => other,
    }
}
