//! Configuration layer: `.prompt-story/config.toml` (SPEC_FULL.md §B.3),
//! generalizing the load-or-create TOML pattern.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DIR_NAME: &str = ".prompt-story";
const FILENAME: &str = "config.toml";

pub const DEFAULT_NOTES_REF: &str = "refs/notes/prompt-story";
pub const DEFAULT_TRANSCRIPTS_REF: &str = "refs/notes/prompt-story-transcripts";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ScrubberKind {
    /// No transform — store transcript bytes verbatim.
    Identity,
    /// Regex-based redaction of common secret shapes (SPEC_FULL.md §C).
    Redacting,
}

impl Default for ScrubberKind {
    fn default() -> Self {
        ScrubberKind::Identity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_providers() -> Vec<String> {
    vec!["claude-code".to_string(), "cursor".to_string()]
}

fn default_notes_ref() -> String {
    DEFAULT_NOTES_REF.to_string()
}

fn default_transcripts_ref() -> String {
    DEFAULT_TRANSCRIPTS_REF.to_string()
}

/// User-facing configuration stored in `.prompt-story/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which registered providers to query during discovery.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// Byte-transform applied to transcripts before storage.
    #[serde(default)]
    pub scrubber: ScrubberKind,

    #[serde(default = "default_notes_ref")]
    pub notes_ref: String,

    #[serde(default = "default_transcripts_ref")]
    pub transcripts_ref: String,

    #[serde(default)]
    pub push: PushConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            scrubber: ScrubberKind::default(),
            notes_ref: default_notes_ref(),
            transcripts_ref: default_transcripts_ref(),
            push: PushConfig::default(),
        }
    }
}

impl Config {
    fn path(repo_root: &Path) -> PathBuf {
        repo_root.join(DIR_NAME).join(FILENAME)
    }

    /// Load configuration from `<repo_root>/.prompt-story/config.toml`.
    ///
    /// If the file doesn't exist it is created with defaults. Missing keys
    /// in an existing file are filled in with defaults via serde, same as
    /// the teacher's preference loader.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let path = Self::path(repo_root);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Config::default();
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                let toml_str =
                    toml::to_string_pretty(&config).context("serializing default config")?;
                fs::write(&path, &toml_str)
                    .with_context(|| format!("writing default {}", path.display()))?;
                Ok(config)
            }
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Load configuration without creating anything — used by read-only
    /// commands (`show`, `review`) that should not mutate the working tree
    /// just to display data.
    pub fn load_or_default(repo_root: &Path) -> Self {
        let path = Self::path(repo_root);
        fs::read_to_string(&path)
            .ok()
            .and_then(|c| toml::from_str(&c).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests;
