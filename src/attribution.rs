//! C4 — repo-attribution filter (spec.md §4.4).
//!
//! Decides whether a Claude-Code-style transcript belongs to the repository
//! under test, from its `cwd` marker alone except in the ambiguous
//! "session started in a parent directory" case, where a write/edit scan is
//! required. Cursor sessions never reach this filter — their attribution
//! happens inside the provider during discovery (spec.md §4.4).

use crate::transcript::{ContentBlock, MessageContent, Transcript, TranscriptEntry};
use std::path::{Component, Path, PathBuf};

/// Normalize a path for comparison: resolve `.`/`..` components lexically
/// (no filesystem access — the session may reference a machine we aren't
/// running on) and strip a trailing separator.
pub(crate) fn normalize(p: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in Path::new(p).components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub(crate) fn is_under(child: &Path, ancestor: &Path) -> bool {
    child == ancestor || child.starts_with(ancestor)
}

/// The first `cwd` marker found by scanning transcript entries in file
/// order, per spec.md §4.4 step 1.
fn first_cwd(transcript: &Transcript) -> Option<&str> {
    transcript.entries().iter().find_map(TranscriptEntry::cwd)
}

/// Scan for a `Write` or `Edit` tool_use block targeting a path inside
/// `repo`, per spec.md §4.4 step 4.
fn has_write_into(transcript: &Transcript, repo: &Path) -> bool {
    transcript.entries().iter().any(|entry| {
        let TranscriptEntry::Assistant(conv) = entry else {
            return false;
        };
        let MessageContent::Blocks(blocks) = &conv.message.content else {
            return false;
        };
        blocks.iter().any(|block| {
            let ContentBlock::ToolUse(tu) = block else {
                return false;
            };
            if tu.name != "Write" && tu.name != "Edit" {
                return false;
            }
            let Some(path) = tu.input.get("file_path").and_then(|v| v.as_str()) else {
                return false;
            };
            is_under(&normalize(path), repo)
        })
    })
}

/// Decide whether `transcript` belongs to `repo_path`, per spec.md §4.4.
pub fn belongs_to_repo(transcript: &Transcript, repo_path: &str) -> bool {
    let Some(cwd) = first_cwd(transcript) else {
        return false; // step 1: absent cwd -> reject
    };
    if cwd.is_empty() {
        return false;
    }

    let cwd = normalize(cwd);
    let repo = normalize(repo_path);

    if is_under(&cwd, &repo) {
        return true; // step 3
    }
    if is_under(&repo, &cwd) {
        // step 4: session started above the repo; only a write/edit into
        // the repo disambiguates it as belonging here.
        return has_write_into(transcript, &repo);
    }
    false // step 5
}
