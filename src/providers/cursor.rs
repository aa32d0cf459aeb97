//! Cursor provider (spec.md §4.3, §6).
//!
//! Cursor keeps its conversation state in a per-application SQLite
//! database (`state.vscdb`) rather than one file per session. Composers
//! (conversations) live under key `composerData:<id>`; their messages
//! ("bubbles") live under `bubbleId:<id>:<bubbleId>`. Workspace attribution
//! happens here, in discovery, rather than in C4 (spec.md §4.4): we derive
//! the workspace from a file URI referenced by the composer and walk
//! upward to the nearest directory containing `.git`.

use super::{Provider, RawSession};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct CursorProvider {
    /// Override for the `state.vscdb` path, used by tests. `None` resolves
    /// the platform-specific default at call time.
    db_override: Option<PathBuf>,
}

impl CursorProvider {
    pub fn with_db_path(path: PathBuf) -> Self {
        Self {
            db_override: Some(path),
        }
    }

    /// Platform-specific path to Cursor's global state database, resolved
    /// via environment variables the same way the Claude Code provider
    /// resolves `$HOME` — no extra directory-lookup crate.
    fn db_path(&self) -> Option<PathBuf> {
        if let Some(p) = &self.db_override {
            return Some(p.clone());
        }
        if let Ok(appdata) = std::env::var("APPDATA") {
            return Some(PathBuf::from(appdata).join("Cursor/User/globalStorage/state.vscdb"));
        }
        if let Ok(home) = std::env::var("HOME") {
            if cfg!(target_os = "macos") {
                return Some(PathBuf::from(&home).join(
                    "Library/Application Support/Cursor/User/globalStorage/state.vscdb",
                ));
            }
            return Some(PathBuf::from(&home).join(".config/Cursor/User/globalStorage/state.vscdb"));
        }
        None
    }
}

#[derive(Debug, Clone)]
struct ComposerRow {
    composer_id: String,
    value: serde_json::Value,
}

/// Walk a path's ancestors looking for a `.git` entry, returning the
/// directory that contains it.
fn nearest_repo_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if d.join(".git").exists() {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

/// Extract the first `file://` URI found anywhere in a JSON value,
/// recursively — composer/bubble documents embed file references at
/// varying depth depending on what the turn touched.
fn first_file_uri(value: &serde_json::Value) -> Option<PathBuf> {
    match value {
        serde_json::Value::String(s) => {
            s.strip_prefix("file://").map(PathBuf::from)
        }
        serde_json::Value::Array(items) => items.iter().find_map(first_file_uri),
        serde_json::Value::Object(map) => map.values().find_map(first_file_uri),
        _ => None,
    }
}

fn parse_millis(value: &serde_json::Value, field: &str) -> Option<DateTime<Utc>> {
    let millis = value.get(field)?.as_i64()?;
    Utc.timestamp_millis_opt(millis).single()
}

impl Provider for CursorProvider {
    fn name(&self) -> &'static str {
        "cursor"
    }

    fn file_extension(&self) -> &'static str {
        ".json"
    }

    fn discover(&self, repo_path: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<RawSession> {
        let Some(db_path) = self.db_path() else {
            return Vec::new();
        };
        if !db_path.exists() {
            return Vec::new();
        }
        let Ok(conn) = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY) else {
            return Vec::new();
        };

        let composers = match read_composers(&conn) {
            Ok(rows) => rows,
            Err(_) => return Vec::new(),
        };

        let target_repo = PathBuf::from(repo_path);
        let mut out = Vec::new();
        for composer in composers {
            let Some(file_path) = first_file_uri(&composer.value) else {
                continue;
            };
            let Some(workspace) = nearest_repo_root(&file_path) else {
                continue;
            };
            if workspace != target_repo {
                continue;
            }

            let created = parse_millis(&composer.value, "createdAt");
            let modified = parse_millis(&composer.value, "lastUpdatedAt").or(created);
            let (Some(created), Some(modified)) = (created, modified) else {
                continue;
            };
            if modified < start || created > end {
                continue;
            }

            out.push(RawSession {
                id: composer.composer_id,
                tool: "cursor".to_string(),
                locator: db_path.to_string_lossy().into_owned(),
                created,
                modified,
                repo_path: repo_path.to_string(),
                extension: ".json".to_string(),
            });
        }
        out
    }

    fn read_transcript(&self, session: &RawSession) -> std::io::Result<Vec<u8>> {
        let conn = Connection::open_with_flags(&session.locator, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(to_io_error)?;
        let document = assemble_transcript(&conn, &session.id).map_err(to_io_error)?;
        Ok(serde_json::to_vec_pretty(&document).unwrap_or_default())
    }
}

fn to_io_error(e: rusqlite::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

fn read_composers(conn: &Connection) -> rusqlite::Result<Vec<ComposerRow>> {
    let mut stmt =
        conn.prepare("SELECT key, value FROM cursorDiskKV WHERE key LIKE 'composerData:%'")?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        let value: String = row.get(1)?;
        Ok((key, value))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (key, value) = row?;
        let Some(composer_id) = key.strip_prefix("composerData:") else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&value) else {
            continue;
        };
        out.push(ComposerRow {
            composer_id: composer_id.to_string(),
            value,
        });
    }
    Ok(out)
}

/// Concatenate a composer row with its per-bubble rows into one
/// self-contained JSON document for storage (spec.md §4.3).
fn assemble_transcript(conn: &Connection, composer_id: &str) -> rusqlite::Result<serde_json::Value> {
    let mut composer_stmt =
        conn.prepare("SELECT value FROM cursorDiskKV WHERE key = ?1")?;
    let composer_value: String =
        composer_stmt.query_row([format!("composerData:{composer_id}")], |row| row.get(0))?;
    let composer: serde_json::Value =
        serde_json::from_str(&composer_value).unwrap_or(serde_json::Value::Null);

    let prefix = format!("bubbleId:{composer_id}:%");
    let mut bubble_stmt =
        conn.prepare("SELECT value FROM cursorDiskKV WHERE key LIKE ?1 ORDER BY key ASC")?;
    let bubble_rows = bubble_stmt.query_map([prefix], |row| {
        let value: String = row.get(0)?;
        Ok(value)
    })?;
    let mut bubbles = Vec::new();
    for row in bubble_rows {
        let value = row?;
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&value) {
            bubbles.push(parsed);
        }
    }

    Ok(serde_json::json!({
        "composer": composer,
        "bubbles": bubbles,
    }))
}
