//! C9 — push synchronizer (spec.md §4.9).
//!
//! The pre-push hook issues one extra push of the two prompt-story
//! references, force-refspec'd, guarded against triggering itself again
//! (the extra push is itself a push, which would itself invoke pre-push)
//! by a process-environment recursion latch.

use crate::error::GatewayError;
use crate::gateway::Gateway;

pub const RECURSION_GUARD_ENV: &str = "GIT_PROMPT_STORY_PUSHING_NOTES";

/// Build a force refspec for `ref_name` if it exists locally.
fn force_refspec(gateway: &Gateway, ref_name: &str) -> Result<Option<String>, GatewayError> {
    Ok(gateway
        .show_ref(ref_name)?
        .map(|_| format!("+{ref_name}:{ref_name}")))
}

/// Whether an error from the extra push should be treated as "nothing
/// changed" rather than a real failure (spec.md §4.9).
fn is_nothing_to_push(err: &GatewayError) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("up-to-date") || msg.contains("up to date") || msg.contains("nothing to push")
}

/// Push `notes_ref` and `transcripts_ref` (whichever exist locally) to
/// `remote_name`, force-updating the remote side. Returns `false` without
/// doing anything if the recursion guard is already set (we are being
/// called from inside our own extra push) or if neither reference exists
/// locally.
pub fn sync(
    gateway: &Gateway,
    remote_name: &str,
    notes_ref: &str,
    transcripts_ref: &str,
) -> Result<bool, GatewayError> {
    if std::env::var(RECURSION_GUARD_ENV).is_ok() {
        return Ok(false);
    }

    let refspecs: Vec<String> = [notes_ref, transcripts_ref]
        .into_iter()
        .filter_map(|r| force_refspec(gateway, r).transpose())
        .collect::<Result<Vec<_>, _>>()?;
    if refspecs.is_empty() {
        return Ok(false);
    }

    // Safety: this process is single-threaded for the duration of a hook
    // invocation; the guard is removed before returning in every path.
    unsafe {
        std::env::set_var(RECURSION_GUARD_ENV, "1");
    }
    let result = gateway.push(remote_name, &refspecs);
    unsafe {
        std::env::remove_var(RECURSION_GUARD_ENV);
    }

    match result {
        Ok(()) => Ok(true),
        Err(e) if is_nothing_to_push(&e) => Ok(true),
        Err(e) => Err(e),
    }
}
