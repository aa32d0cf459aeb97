//! Claude Code provider (spec.md §4.3, §6).
//!
//! Scans every directory under `~/.claude/projects/` rather than trusting
//! the directory-name encoding, because users move and rename repos after
//! a project folder was created under the old path.

use super::{Provider, RawSession};
use crate::attribution::{is_under, normalize};
use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Default)]
pub struct ClaudeCodeProvider {
    /// Override for `~/.claude/projects`, used by tests. `None` reads
    /// `$HOME` at call time.
    root_override: Option<PathBuf>,
}

impl ClaudeCodeProvider {
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root_override: Some(root),
        }
    }

    fn projects_root(&self) -> Option<PathBuf> {
        if let Some(root) = &self.root_override {
            return Some(root.clone());
        }
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".claude").join("projects"))
    }
}

/// Parse a record's `timestamp` (or, for snapshot records, its
/// `snapshot.timestamp`) into a UTC instant.
fn record_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let raw = value
        .get("timestamp")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("snapshot").and_then(|s| s.get("timestamp")).and_then(|v| v.as_str()))?;
    DateTime::parse_from_rfc3339(raw).ok().map(|d| d.with_timezone(&Utc))
}

fn file_mtime(path: &std::path::Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(std::time::UNIX_EPOCH).ok()?;
    Utc.timestamp_opt(since_epoch.as_secs() as i64, since_epoch.subsec_nanos()).single()
}

/// A session is a plausible candidate for `repo_path` if its claimed `cwd`
/// is in a subdirectory/ancestor relationship with it — the loose check
/// C3 performs; C4 applies the authoritative, narrower rule.
fn plausibly_related(cwd: &str, repo_path: &str) -> bool {
    let cwd = normalize(cwd);
    let repo = normalize(repo_path);
    is_under(&cwd, &repo) || is_under(&repo, &cwd)
}

impl Provider for ClaudeCodeProvider {
    fn name(&self) -> &'static str {
        "claude-code"
    }

    fn file_extension(&self) -> &'static str {
        ".jsonl"
    }

    fn discover(&self, repo_path: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<RawSession> {
        let Some(root) = self.projects_root() else {
            return Vec::new();
        };
        let Ok(project_dirs) = fs::read_dir(&root) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for project_dir in project_dirs.flatten() {
            let Ok(files) = fs::read_dir(project_dir.path()) else {
                continue;
            };
            for file in files.flatten() {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                    continue;
                }
                if let Some(session) = scan_one(&path, repo_path, start, end) {
                    out.push(session);
                }
            }
        }
        out
    }

    fn read_transcript(&self, session: &RawSession) -> std::io::Result<Vec<u8>> {
        fs::read(&session.locator)
    }
}

fn scan_one(
    path: &std::path::Path,
    repo_path: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<RawSession> {
    // Step 1: mtime pre-filter.
    let mtime = file_mtime(path)?;
    if mtime < start {
        return None;
    }

    let file = fs::File::open(path).ok()?;
    let reader = BufReader::new(file);

    let mut first_cwd: Option<String> = None;
    let mut first_timestamp: Option<DateTime<Utc>> = None;
    let mut created: Option<DateTime<Utc>> = None;
    let mut modified: Option<DateTime<Utc>> = None;

    for line in reader.lines() {
        let Ok(line) = line else { continue };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };

        if first_cwd.is_none() {
            if let Some(cwd) = value.get("cwd").and_then(|v| v.as_str()) {
                if !cwd.is_empty() {
                    first_cwd = Some(cwd.to_string());
                    first_timestamp = record_timestamp(&value);
                }
            }
        }

        if let Some(ts) = record_timestamp(&value) {
            created = Some(created.map_or(ts, |c: DateTime<Utc>| c.min(ts)));
            modified = Some(modified.map_or(ts, |m: DateTime<Utc>| m.max(ts)));
        }
    }

    let cwd = first_cwd?;
    if !plausibly_related(&cwd, repo_path) {
        return None;
    }
    // Step 3: reject if the session's first timestamp is after `end`.
    if let Some(ts) = first_timestamp {
        if ts > end {
            return None;
        }
    }

    let created = created?;
    let modified = modified?;
    let session_id = path.file_stem().and_then(|s| s.to_str())?.to_string();

    Some(RawSession {
        id: session_id,
        tool: "claude-code".to_string(),
        locator: path.to_string_lossy().into_owned(),
        created,
        modified,
        repo_path: repo_path.to_string(),
        extension: ".jsonl".to_string(),
    })
}
