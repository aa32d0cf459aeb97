//! C8 — rewrite handler (spec.md §4.8).
//!
//! Invoked with the `(old_sha, new_sha)` pairs the host VCS reports for a
//! commit-rewriting operation (amend, rebase, squash, cherry-pick).
//! Buckets old SHAs by the new SHA they landed on, merges their manifests,
//! and attaches the merged manifest to the new commit.

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::manifest::Manifest;
use git2::{Oid, Signature};
use std::collections::HashMap;

/// One `(old_sha, new_sha)` pair as reported by a `post-rewrite` hook.
#[derive(Debug, Clone, Copy)]
pub struct RewritePair {
    pub old_sha: Oid,
    pub new_sha: Oid,
}

/// Process a batch of rewrite pairs: read and merge the notes of every old
/// SHA landing on each new SHA, then attach the merged manifest. Returns
/// the new SHAs that received a merged manifest.
pub fn handle(
    gateway: &Gateway,
    ref_name: &str,
    pairs: &[RewritePair],
    sig: &Signature,
) -> Result<Vec<Oid>, GatewayError> {
    // Bucket by new_sha: a squash produces multiple old_sha mapped to one
    // new_sha.
    let mut buckets: HashMap<Oid, Vec<Oid>> = HashMap::new();
    for pair in pairs {
        buckets.entry(pair.new_sha).or_default().push(pair.old_sha);
    }

    let mut updated = Vec::new();
    for (new_sha, old_shas) in buckets {
        // `new_sha` may already carry a note of its own: the normal
        // prepare-commit-msg/post-commit pair runs before post-rewrite for
        // the same commit (e.g. `git commit --amend`), so its note can
        // already reflect sessions the old SHAs never saw. Merge it in
        // first so the rewrite pass only ever adds, never regresses it.
        let mut manifests: Vec<Manifest> = gateway
            .notes_show(ref_name, new_sha)
            .ok()
            .flatten()
            .and_then(|text| Manifest::parse(&text).ok())
            .into_iter()
            .collect();
        manifests.extend(
            old_shas
                .iter()
                .filter_map(|old| gateway.notes_show(ref_name, *old).ok().flatten())
                .filter_map(|text| Manifest::parse(&text).ok()),
        );

        let Some(merged) = Manifest::merge(&manifests) else {
            continue; // nothing to carry forward onto new_sha
        };

        let text = merged
            .serialize()
            .map_err(|e| GatewayError::Other(e.to_string()))?;
        gateway.notes_add_from_blob(ref_name, new_sha, &text, sig)?;
        updated.push(new_sha);
    }
    Ok(updated)
}

#[cfg(test)]
mod tests;
