use serde::Deserialize;
use std::collections::HashMap;

// ===================================================================
// Top-level transcript entry — one per JSONL line
// ===================================================================

/// A single line in a Claude Code `.jsonl` transcript file.
///
/// Discriminated by the `type` field (camelCase JSON throughout).
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum TranscriptEntry {
    #[serde(rename = "user")]
    User(ConversationEntry),
    #[serde(rename = "assistant")]
    Assistant(ConversationEntry),
    #[serde(rename = "progress")]
    Progress(ProgressEntry),
    #[serde(rename = "file-history-snapshot")]
    FileHistorySnapshot(FileHistorySnapshotEntry),
    #[serde(rename = "queue-operation")]
    QueueOperation(QueueOperationEntry),
    #[serde(rename = "system")]
    System(SystemEntry),
}

// ===================================================================
// Conversation entries (user + assistant share the same shape)
// ===================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub uuid: String,
    #[serde(default)]
    pub parent_uuid: Option<String>,
    pub is_sidechain: bool,
    pub user_type: String,
    pub cwd: String,
    pub session_id: String,
    pub timestamp: String,
    pub version: String,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    pub message: Message,

    // --- fields that only appear on some entries ---
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub thinking_metadata: Option<ThinkingMetadata>,
    #[serde(default)]
    pub todos: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub permission_mode: Option<String>,
    #[serde(default)]
    pub tool_use_result: Option<ToolUseResult>,
    #[serde(default)]
    pub source_tool_assistant_uuid: Option<String>,
    #[serde(default)]
    pub is_meta: Option<bool>,
    /// Present on plan-implementation prompts injected by Claude Code after
    /// the user approves an ExitPlanMode plan.
    #[serde(default)]
    pub plan_content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingMetadata {
    pub level: String,
    pub disabled: bool,
    #[serde(default)]
    pub triggers: Vec<String>,
}

// ===================================================================
// Message
// ===================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// `message.content` can be a plain string (user text) or an array of
/// content blocks (assistant responses, tool results).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

// ===================================================================
// Content blocks inside message.content[]
// ===================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text(TextBlock),
    #[serde(rename = "thinking")]
    Thinking(ThinkingBlock),
    #[serde(rename = "tool_use")]
    ToolUse(ToolUseBlock),
    #[serde(rename = "tool_result")]
    ToolResult(ToolResultBlock),
}

#[derive(Debug, Deserialize)]
pub struct TextBlock {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ThinkingBlock {
    pub thinking: String,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
    #[serde(default)]
    pub caller: Option<Caller>,
}

#[derive(Debug, Deserialize)]
pub struct Caller {
    #[serde(rename = "type")]
    pub caller_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    pub content: serde_json::Value,
    #[serde(default)]
    pub is_error: Option<bool>,
}

// ===================================================================
// Usage (token counts on assistant messages)
// ===================================================================

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub service_tier: Option<String>,
    #[serde(default)]
    pub cache_creation: Option<CacheCreation>,
    #[serde(default)]
    pub inference_geo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CacheCreation {
    #[serde(default)]
    pub ephemeral_5m_input_tokens: u64,
    #[serde(default)]
    pub ephemeral_1h_input_tokens: u64,
}

// ===================================================================
// ToolUseResult — attached to user entries that carry tool responses
// ===================================================================

/// The result payload varies by tool. We use an untagged enum because
/// some variants have a `type` field and some don't.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ToolUseResult {
    Read(ReadToolResult),
    Write(WriteToolResult),
    Edit(EditToolResult),
    Bash(BashToolResult),
    /// Catch-all for tools we haven't typed yet.
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadToolResult {
    /// Always `"text"` for Read results.
    #[serde(rename = "type")]
    pub result_type: String,
    pub file: ReadFileInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFileInfo {
    pub file_path: String,
    pub content: String,
    pub num_lines: i64,
    pub start_line: i64,
    pub total_lines: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteToolResult {
    /// Always `"update"` for Write results.
    #[serde(rename = "type")]
    pub result_type: String,
    pub file_path: String,
    pub content: String,
    #[serde(default)]
    pub structured_patch: Option<Vec<DiffHunk>>,
    #[serde(default)]
    pub original_file: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditToolResult {
    pub file_path: String,
    pub old_string: String,
    pub new_string: String,
    #[serde(default)]
    pub original_file: Option<String>,
    #[serde(default)]
    pub structured_patch: Option<Vec<DiffHunk>>,
    #[serde(default)]
    pub user_modified: Option<bool>,
    #[serde(default)]
    pub replace_all: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    pub old_start: i64,
    pub old_lines: i64,
    pub new_start: i64,
    pub new_lines: i64,
    pub lines: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BashToolResult {
    pub stdout: String,
    pub stderr: String,
    #[serde(default)]
    pub interrupted: Option<bool>,
    #[serde(default)]
    pub is_image: Option<bool>,
}

// ===================================================================
// Progress entries (e.g. streaming bash output)
// ===================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub uuid: String,
    #[serde(default)]
    pub parent_uuid: Option<String>,
    // Fields below vary by progress subtype (e.g. hook-fired progress
    // entries may omit toolUseID/data), so all are defaulted.
    #[serde(default)]
    pub is_sidechain: bool,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "toolUseID")]
    pub tool_use_id: Option<String>,
    #[serde(default, rename = "parentToolUseID")]
    pub parent_tool_use_id: Option<String>,
    #[serde(default)]
    pub data: Option<ProgressData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    #[serde(rename = "type")]
    pub progress_type: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub full_output: Option<String>,
    #[serde(default)]
    pub elapsed_time_seconds: Option<f64>,
    #[serde(default)]
    pub total_lines: Option<i64>,
}

// ===================================================================
// File history snapshots
// ===================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHistorySnapshotEntry {
    pub message_id: String,
    pub snapshot: FileSnapshot,
    #[serde(default)]
    pub is_snapshot_update: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSnapshot {
    pub message_id: String,
    pub timestamp: String,
    pub tracked_file_backups: HashMap<String, FileBackup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBackup {
    pub backup_file_name: String,
    pub version: i64,
    pub backup_time: String,
}

// ===================================================================
// Queue operations
// ===================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueOperationEntry {
    pub operation: String,
    pub timestamp: String,
    pub session_id: String,
    #[serde(default)]
    pub content: Option<String>,
}

// ===================================================================
// System entries (e.g. turn_duration)
// ===================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemEntry {
    pub uuid: String,
    pub subtype: String,
    #[serde(default)]
    pub parent_uuid: Option<String>,
    // Fields below vary by subtype (e.g. stop_hook_summary omits isSidechain
    // and userType), so all are defaulted to allow any system entry to parse.
    #[serde(default)]
    pub is_sidechain: bool,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub is_meta: Option<bool>,
}

impl TranscriptEntry {
    /// Return the working-directory marker if this entry type carries one
    /// (non-empty only on user/assistant conversation entries).
    pub fn cwd(&self) -> Option<&str> {
        match self {
            Self::User(e) | Self::Assistant(e) => Some(e.cwd.as_str()),
            Self::Progress(e) if !e.cwd.is_empty() => Some(e.cwd.as_str()),
            Self::System(e) if !e.cwd.is_empty() => Some(e.cwd.as_str()),
            _ => None,
        }
    }

    /// Return the record's `timestamp` field, if this entry type carries one.
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Self::User(e) | Self::Assistant(e) => Some(e.timestamp.as_str()),
            Self::Progress(e) if !e.timestamp.is_empty() => Some(e.timestamp.as_str()),
            Self::System(e) if !e.timestamp.is_empty() => Some(e.timestamp.as_str()),
            Self::QueueOperation(e) => Some(e.timestamp.as_str()),
            Self::FileHistorySnapshot(e) => Some(e.snapshot.timestamp.as_str()),
        }
    }
}

// ===================================================================
// Transcript — parsed JSONL with typed entries
// ===================================================================

/// A parsed Claude Code JSONL transcript: one typed entry per line that
/// parsed successfully.
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// An empty transcript (no entries).
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Parse a JSONL transcript string. Returns the transcript and any
    /// lines that failed to parse (with 1-based line number and error) —
    /// per-line failures are skipped rather than aborting the whole
    /// transcript (spec.md §7 `MalformedSessionRecord`).
    pub fn parse(contents: &str) -> (Self, Vec<(usize, String)>) {
        let mut entries = Vec::new();
        let mut errors = Vec::new();

        for (i, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TranscriptEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => errors.push((i + 1, format!("{e}"))),
            }
        }

        (Self { entries }, errors)
    }

    /// All typed entries in parse order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests;
