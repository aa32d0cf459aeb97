//! C5 — user-activity filter and counter (spec.md §4.5).
//!
//! A session passes the filter if it has at least one user-originated
//! action inside the work window. The same classification feeds the
//! `(<N> user prompts)` count embedded in the commit trailer.

use crate::transcript::{ContentBlock, MessageContent, Transcript, TranscriptEntry};
use chrono::{DateTime, Utc};

/// Sessions whose id has this prefix are tool-driven sub-sessions and are
/// excluded from activity counts (spec.md §4.5).
pub const AGENT_SESSION_PREFIX: &str = "agent-";

pub fn is_agent_subsession(session_id: &str) -> bool {
    session_id.starts_with(AGENT_SESSION_PREFIX)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Extract plain text out of a tool-result `content` field, which may be a
/// bare string or an array of `{type, text}` blocks.
fn tool_result_text(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Whether a `user`-kind entry's content is itself a rejected tool-use
/// result (spec.md §4.5(d)) — the `tool_reject` kind.
fn is_tool_reject(blocks: &[ContentBlock]) -> bool {
    blocks.iter().any(|block| match block {
        ContentBlock::ToolResult(tr) => {
            tr.is_error == Some(true) && tool_result_text(&tr.content).contains("tool use was rejected")
        }
        _ => false,
    })
}

/// Whether a transcript entry counts as a user action, per spec.md §4.5.
pub fn is_user_action(entry: &TranscriptEntry) -> bool {
    match entry {
        TranscriptEntry::User(conv) => {
            if conv.is_meta == Some(true) {
                return false;
            }
            match &conv.message.content {
                MessageContent::Text(t) => {
                    let t = t.trim();
                    !t.is_empty() && !t.starts_with("<local-command-stdout>")
                }
                MessageContent::Blocks(blocks) => is_tool_reject(blocks),
            }
        }
        TranscriptEntry::QueueOperation(q) => {
            if q.operation != "enqueue" {
                return false;
            }
            match &q.content {
                Some(c) => {
                    let c = c.trim();
                    !c.is_empty() && !c.starts_with("<bash-notification>") && !c.starts_with('/')
                }
                None => false,
            }
        }
        _ => false,
    }
}

/// True if `label` is a `<command-name>...</command-name>`-wrapped prompt
/// (spec.md §4.5 — reported with a `COMMAND` label by the display layer;
/// does not change whether it counts as an action).
pub fn is_command(text: &str) -> bool {
    let t = text.trim();
    t.starts_with("<command-name>") && t.contains("</command-name>")
}

/// Whether `entry`'s timestamp falls inside `[start, end]`. Entries without
/// a parseable timestamp are treated as outside the window.
fn in_window(entry: &TranscriptEntry, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    entry
        .timestamp()
        .and_then(parse_timestamp)
        .is_some_and(|ts| ts >= start && ts <= end)
}

/// Filter predicate (spec.md §4.5): does this transcript have at least one
/// in-window user action?
pub fn passes_activity_filter(transcript: &Transcript, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    transcript
        .entries()
        .iter()
        .any(|e| in_window(e, start, end) && is_user_action(e))
}

/// Count in-window user actions across a transcript.
pub fn count_user_actions(transcript: &Transcript, start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
    transcript
        .entries()
        .iter()
        .filter(|e| in_window(e, start, end) && is_user_action(e))
        .count()
}
