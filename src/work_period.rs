//! C2 — work-period oracle (spec.md §4.2).
//!
//! Computes the `[start, end]` window the rest of the engine treats as "the
//! developer's work for this commit", from the reflog and commit history
//! alone. Nothing here reads transcripts.

use crate::error::GatewayError;
use crate::gateway::Gateway;
use chrono::{DateTime, Utc};

/// The `[start, end]` window plus a human-readable trace of how `start` was
/// derived, for the `explain` diagnostic command.
#[derive(Debug, Clone)]
pub struct WorkPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub explanation: String,
}

fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
}

/// Compute the work window for a commit about to be made (`is_amend`
/// reflects whether this is `git commit --amend`).
pub fn compute(gateway: &Gateway, is_amend: bool, now: DateTime<Utc>) -> Result<WorkPeriod, GatewayError> {
    let prev_commit_spec = if is_amend { "HEAD^" } else { "HEAD" };
    let prev_commit_time = match gateway.rev_parse(prev_commit_spec) {
        Ok(oid) => Some(gateway.committer_time(oid)?),
        Err(GatewayError::NotFound | GatewayError::Invalid(_)) => None,
        Err(e) => return Err(e),
    };

    let last_branch_switch_time = last_checkout_time(gateway)?;

    let (start_secs, explanation) = match (prev_commit_time, last_branch_switch_time) {
        (Some(p), Some(s)) if s > p => (
            s,
            format!(
                "start = last checkout at {s} (after {prev_commit_spec} at {p})"
            ),
        ),
        (Some(p), Some(s)) => (
            p,
            format!(
                "start = {prev_commit_spec} committer time {p} (last checkout at {s} is older)"
            ),
        ),
        (Some(p), None) => (p, format!("start = {prev_commit_spec} committer time {p} (no checkout entries in reflog)")),
        (None, Some(s)) => (s, format!("start = last checkout at {s} (no {prev_commit_spec})")),
        (None, None) => (0, "start = 0 (no prior commit, no checkout entries)".to_string()),
    };

    Ok(WorkPeriod {
        start: from_epoch(start_secs),
        end: now,
        explanation,
    })
}

/// Compute the work window for introspecting an already-made commit (used
/// by `explain`/`review`): `end` is the commit's own committer time rather
/// than "now".
pub fn compute_for_commit(
    gateway: &Gateway,
    commit: git2::Oid,
) -> Result<WorkPeriod, GatewayError> {
    let end = from_epoch(gateway.committer_time(commit)?);
    let parent = gateway.parent(commit)?;
    let prev_commit_time = match parent {
        Some(p) => Some(gateway.committer_time(p)?),
        None => None,
    };
    let last_branch_switch_time = last_checkout_time(gateway)?;

    let (start_secs, explanation) = match (prev_commit_time, last_branch_switch_time) {
        (Some(p), Some(s)) if s > p => (s, format!("start = last checkout at {s} (after parent commit at {p})")),
        (Some(p), Some(s)) => (p, format!("start = parent committer time {p} (last checkout at {s} is older)")),
        (Some(p), None) => (p, format!("start = parent committer time {p} (no checkout entries in reflog)")),
        (None, Some(s)) => (s, format!("start = last checkout at {s} (no parent commit)")),
        (None, None) => (0, "start = 0 (root commit, no checkout entries)".to_string()),
    };

    Ok(WorkPeriod {
        start: from_epoch(start_secs),
        end,
        explanation,
    })
}

/// The committer time of the most recent reflog entry on `HEAD` whose
/// action begins with `checkout:`, or `None` if the reflog has none
/// (pruned, or a fresh clone / detached-HEAD-only history).
fn last_checkout_time(gateway: &Gateway) -> Result<Option<i64>, GatewayError> {
    let entries = gateway.reflog("HEAD")?;
    Ok(entries
        .iter()
        .find(|e| e.message.starts_with("checkout:"))
        .map(|e| e.committer_time))
}
