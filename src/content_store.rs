//! C6 — content store for transcripts (spec.md §4.6).
//!
//! Writes transcript bytes as content-addressed blobs, assembles per-tool
//! subtrees, and merges them with the prior root tree of the transcripts
//! reference. The "read old root → compute → update-ref" sequence is not
//! atomic against other processes, but hook invocations for one working
//! tree are serialized by the host VCS (spec.md §4.6 concurrency note);
//! cross-working-tree races are tolerated by force-updating.

use crate::error::GatewayError;
use crate::gateway::{Gateway, TreeEntry};
use crate::manifest::SessionEntry;
use crate::providers::RawSession;
use crate::scrubber::Scrubber;
use chrono::{DateTime, Utc};
use git2::Oid;
use std::collections::HashMap;

/// One session with its raw (unscrubbed) bytes already read from its
/// provider, ready to be scrubbed and stored.
pub struct PendingSession {
    pub session: RawSession,
    pub bytes: Vec<u8>,
}

/// Store every pending session as a blob, refresh the transcripts tree,
/// and return the manifest-ready [`SessionEntry`] for each — ordered the
/// same as the input.
pub fn store(
    gateway: &Gateway,
    transcripts_ref: &str,
    scrubber: &dyn Scrubber,
    pending: Vec<PendingSession>,
) -> Result<Vec<SessionEntry>, GatewayError> {
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    // Step 1: scrub + hash-store each session's bytes.
    struct Stored {
        tool: String,
        id: String,
        extension: String,
        blob: Oid,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    }
    let mut stored = Vec::with_capacity(pending.len());
    for p in pending {
        let scrubbed = scrubber
            .scrub(&p.bytes)
            .map_err(|e| GatewayError::Other(e.to_string()))?;
        let blob = gateway.hash_object_write(&scrubbed)?;
        stored.push(Stored {
            tool: p.session.tool,
            id: p.session.id,
            extension: p.session.extension,
            blob,
            created: p.session.created,
            modified: p.session.modified,
        });
    }

    // Step 2: group by tool.
    let mut by_tool: HashMap<String, Vec<&Stored>> = HashMap::new();
    for s in &stored {
        by_tool.entry(s.tool.clone()).or_default().push(s);
    }

    // Step 3: read the current root and its per-tool subtrees.
    let old_root = gateway.show_ref(transcripts_ref)?;
    let old_root_entries = gateway.ls_tree(old_root)?;
    let mut old_subtrees: HashMap<String, Oid> = old_root_entries
        .into_iter()
        .filter(|e| e.is_tree)
        .map(|e| (e.name, e.oid))
        .collect();

    // Step 4: rebuild each affected tool's subtree.
    let mut new_root_entries: HashMap<String, TreeEntry> = HashMap::new();
    for (tool, sessions) in &by_tool {
        let old_subtree_oid = old_subtrees.remove(tool);
        let old_entries = gateway.ls_tree(old_subtree_oid)?;

        let mut names_used: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut entries: Vec<TreeEntry> = Vec::new();
        for s in sessions {
            let name = format!("{}{}", s.id, s.extension);
            names_used.insert(name.clone());
            entries.push(TreeEntry {
                name,
                oid: s.blob,
                is_tree: false,
            });
        }
        for old in old_entries {
            if !names_used.contains(&old.name) {
                entries.push(old);
            }
        }

        let subtree_oid = gateway.mktree(&entries)?;
        new_root_entries.insert(
            tool.clone(),
            TreeEntry {
                name: tool.clone(),
                oid: subtree_oid,
                is_tree: true,
            },
        );
    }

    // Step 5: compose the new root from updated subtrees plus untouched
    // existing ones.
    for (tool, oid) in old_subtrees {
        new_root_entries.entry(tool.clone()).or_insert(TreeEntry {
            name: tool,
            oid,
            is_tree: true,
        });
    }
    let mut root_entries: Vec<TreeEntry> = new_root_entries.into_values().collect();
    root_entries.sort_by(|a, b| a.name.cmp(&b.name));
    let new_root = gateway.mktree(&root_entries)?;

    // Step 6: update the transcripts reference.
    gateway.update_ref(transcripts_ref, new_root, "prompt-story: refresh transcripts tree")?;

    Ok(stored
        .into_iter()
        .map(|s| SessionEntry {
            path: format!("{}/{}{}", s.tool, s.id, s.extension),
            tool: s.tool,
            id: s.id,
            created: s.created,
            modified: s.modified,
            removed: None,
            removed_at: None,
        })
        .collect())
}

#[cfg(test)]
mod tests;
