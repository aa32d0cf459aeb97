//! Hook entry points orchestrating C1–C9 (spec.md §2, §7 "Exit behavior").
//!
//! No hook ever fails the VCS operation it rides on because of its own
//! errors: everything here logs a warning via `tracing` and degrades —
//! `prepare_commit_msg` falls back to `Prompt-Story: none`; the others are
//! simply skipped.

use crate::activity;
use crate::attribution;
use crate::config::Config;
use crate::content_store::{self, PendingSession};
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::manifest::{Manifest, MANIFEST_VERSION};
use crate::note_writer;
use crate::providers::{self, RawSession};
use crate::push_sync;
use crate::rewrite::{self, RewritePair};
use crate::scrubber;
use crate::transcript::Transcript;
use chrono::Utc;
use git2::Oid;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Gather, filter, and store every session this commit should capture,
/// returning the manifest entries plus the total in-window user-prompt
/// count (spec.md §2 control flow through C2–C6).
fn gather(gateway: &Gateway, config: &Config, workdir: &str, is_amend: bool) -> Option<(Manifest, usize)> {
    let period = crate::work_period::compute(gateway, is_amend, Utc::now()).ok()?;

    let mut pending = Vec::new();
    let mut total_user_prompts = 0usize;

    for provider_name in &config.providers {
        let Some(provider) = providers::by_name(provider_name) else {
            continue;
        };
        for candidate in provider.discover(workdir, period.start, period.end) {
            let Some((bytes, transcript)) = read_and_parse(provider, &candidate) else {
                continue;
            };

            // C4: repo-attribution. Cursor sessions are already attributed
            // during discovery; only Claude-style transcripts need the
            // cwd/write-scan filter.
            if provider.name() == "claude-code" && !attribution::belongs_to_repo(&transcript, workdir) {
                continue;
            }

            // C5: activity filter + counter.
            if !activity::passes_activity_filter(&transcript, period.start, period.end) {
                continue;
            }
            if !activity::is_agent_subsession(&candidate.id) {
                total_user_prompts += activity::count_user_actions(&transcript, period.start, period.end);
            }

            pending.push(PendingSession { session: candidate, bytes });
        }
    }

    if pending.is_empty() {
        return None;
    }

    let scrubber = scrubber::from_kind(&config.scrubber);
    let session_entries = content_store::store(gateway, &config.transcripts_ref, scrubber.as_ref(), pending).ok()?;
    if session_entries.is_empty() {
        return None;
    }
    Some((Manifest::new(period.start, session_entries), total_user_prompts))
}

fn read_and_parse(provider: &dyn providers::Provider, candidate: &RawSession) -> Option<(Vec<u8>, Transcript)> {
    let bytes = provider.read_transcript(candidate).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    let (transcript, _errors) = Transcript::parse(text);
    Some((bytes, transcript))
}

/// `prepare-commit-msg` hook: build this commit's manifest, pre-hash it,
/// and append the trailer line to the commit message file.
pub fn prepare_commit_msg(repo_root: &Path, message_path: &Path, is_amend: bool) {
    let result = (|| -> Result<(), GatewayError> {
        let gateway = Gateway::discover(repo_root)?;
        let workdir_path = gateway.workdir()?.to_path_buf();
        let config = Config::load(&workdir_path).unwrap_or_else(|_| Config::load_or_default(&workdir_path));
        let workdir = workdir_path.to_string_lossy().into_owned();

        let gathered = gather(&gateway, &config, &workdir, is_amend);
        let trailer = match &gathered {
            Some((manifest, count)) => {
                note_writer::write_pending(&gateway, manifest)?;
                note_writer::active_trailer(manifest, *count)
            }
            None => note_writer::inactive_trailer(MANIFEST_VERSION),
        };

        let message = fs::read_to_string(message_path).map_err(|e| GatewayError::Other(e.to_string()))?;
        let updated = note_writer::replace_trailer(&message, &trailer);
        fs::write(message_path, updated).map_err(|e| GatewayError::Other(e.to_string()))?;
        Ok(())
    })();

    if let Err(e) = result {
        tracing::warn!("prompt-story: prepare-commit-msg failed, falling back to none: {e}");
        if let Ok(message) = fs::read_to_string(message_path) {
            let fallback = note_writer::replace_trailer(&message, &note_writer::inactive_trailer(MANIFEST_VERSION));
            let _ = fs::write(message_path, fallback);
        }
    }
}

/// `post-commit` hook: attach the pending manifest blob to `HEAD`.
pub fn post_commit(repo_root: &Path) {
    let result = (|| -> Result<(), GatewayError> {
        let gateway = Gateway::discover(repo_root)?;
        let config = Config::load_or_default(gateway.workdir()?);
        let Some(head) = gateway.head()? else {
            return Ok(());
        };
        let sig = gateway.signature()?;
        note_writer::attach_pending(&gateway, &config.notes_ref, head, &sig)?;
        Ok(())
    })();

    if let Err(e) = result {
        tracing::warn!("prompt-story: post-commit note attach failed: {e}");
    }
}

/// `pre-push` hook: push the two prompt-story references alongside the
/// user's own push, guarded against recursion.
pub fn pre_push(repo_root: &Path, remote_name: &str) {
    let result = (|| -> Result<(), GatewayError> {
        let gateway = Gateway::discover(repo_root)?;
        let config = Config::load_or_default(gateway.workdir()?);
        push_sync::sync(&gateway, remote_name, &config.notes_ref, &config.transcripts_ref)?;
        Ok(())
    })();

    if let Err(e) = result {
        tracing::warn!("prompt-story: pre-push sync failed: {e}");
    }
}

/// Parse `post-rewrite` stdin: one `old_sha new_sha` pair per line (extra
/// whitespace-separated fields, if any, are ignored).
pub fn parse_rewrite_pairs(stdin: &str) -> Vec<RewritePair> {
    stdin
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let old_sha = Oid::from_str(parts.next()?).ok()?;
            let new_sha = Oid::from_str(parts.next()?).ok()?;
            Some(RewritePair { old_sha, new_sha })
        })
        .collect()
}

/// `post-rewrite` hook: merge and carry forward manifests across rewrites.
pub fn post_rewrite(repo_root: &Path, pairs: &[RewritePair]) {
    if pairs.is_empty() {
        return;
    }
    let result = (|| -> Result<(), GatewayError> {
        let gateway = Gateway::discover(repo_root)?;
        let config = Config::load_or_default(gateway.workdir()?);
        let sig = gateway.signature()?;
        rewrite::handle(&gateway, &config.notes_ref, pairs, &sig)?;
        Ok(())
    })();

    if let Err(e) = result {
        tracing::warn!("prompt-story: post-rewrite merge failed: {e}");
    }
}
