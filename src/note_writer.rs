//! C7 — manifest and note writer (spec.md §4.7).
//!
//! Two-phase attach: the commit SHA doesn't exist yet when the commit
//! message is being composed, so Phase A pre-hashes the manifest blob and
//! records its OID in a sidecar file; Phase B, running after the commit
//! object exists, re-reads that same blob (already durable in the object
//! database from Phase A's `hash-object -w`) and attaches it as a note —
//! the content-addressing guarantee means the note's blob lands at the
//! exact OID recorded in the sidecar.

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::manifest::Manifest;
use git2::{Oid, Signature};
use std::fs;
use std::str::FromStr;

pub const SIDECAR_FILENAME: &str = "PENDING-PROMPT-STORY";
pub const TRAILER_PREFIX: &str = "Prompt-Story:";

fn sidecar_path(gateway: &Gateway) -> std::path::PathBuf {
    gateway.git_dir().join(SIDECAR_FILENAME)
}

/// Phase A: serialize `manifest`, hash-and-store it as a blob, and record
/// its OID in the sidecar file. Returns the serialized bytes (the caller
/// needs them only to log/inspect; the durable record is the sidecar).
pub fn write_pending(gateway: &Gateway, manifest: &Manifest) -> Result<String, GatewayError> {
    let text = manifest
        .serialize()
        .map_err(|e| GatewayError::Other(e.to_string()))?;
    let oid = gateway.hash_object_write(text.as_bytes())?;
    fs::write(sidecar_path(gateway), oid.to_string())
        .map_err(|e| GatewayError::Other(e.to_string()))?;
    Ok(text)
}

/// Phase B: read the sidecar, attach its pre-hashed blob as a note on
/// `commit`, and delete the sidecar. Returns `true` if a note was
/// attached, `false` if there was no pending manifest (the common case:
/// no sessions survived filtering, so Phase A never wrote a sidecar).
pub fn attach_pending(
    gateway: &Gateway,
    ref_name: &str,
    commit: Oid,
    sig: &Signature,
) -> Result<bool, GatewayError> {
    let path = sidecar_path(gateway);
    let hex = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(GatewayError::Other(e.to_string())),
    };
    let oid = Oid::from_str(hex.trim()).map_err(|_| GatewayError::Invalid(format!("malformed sidecar contents: {hex:?}")))?;
    let content = gateway.read_blob(oid)?;
    let content = String::from_utf8(content).map_err(|e| GatewayError::Other(e.to_string()))?;

    gateway.notes_add_from_blob(ref_name, commit, &content, sig)?;
    let _ = fs::remove_file(&path);
    Ok(true)
}

/// Build the commit-message trailer line for an active manifest
/// (spec.md §6).
pub fn active_trailer(manifest: &Manifest, user_prompt_count: usize) -> String {
    let names = manifest.display_names().join(", ");
    format!(
        "{TRAILER_PREFIX} Used {names} ({user_prompt_count} user prompts) [{}]",
        manifest.version
    )
}

/// Build the commit-message trailer line when no sessions survived
/// filtering (spec.md §6).
pub fn inactive_trailer(version: u32) -> String {
    format!("{TRAILER_PREFIX} none [{version}]")
}

/// Remove any pre-existing `Prompt-Story:` trailer line and append
/// `trailer` as the new last line (spec.md §4.7, "idempotent amend" in
/// spec.md §8). Preserves a trailing newline if the input had one.
pub fn replace_trailer(message: &str, trailer: &str) -> String {
    let had_trailing_newline = message.ends_with('\n');
    let mut lines: Vec<&str> = message
        .lines()
        .filter(|l| !l.trim_start().starts_with(TRAILER_PREFIX))
        .collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines.push(trailer);
    let mut out = lines.join("\n");
    if had_trailing_newline {
        out.push('\n');
    }
    out
}
