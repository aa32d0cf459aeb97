use thiserror::Error;

/// Failure taxonomy for the capture path.
///
/// The capture path (hooks) never lets one of these reach the user as a
/// process failure — it logs a warning and degrades to "no transcripts
/// for this commit". Explicit commands (`show`, `review`, `explain`,
/// `push`) may propagate these as a non-zero exit via `anyhow`.
#[derive(Debug, Error)]
pub enum PromptStoryError {
    #[error("not inside a git repository")]
    NotAnRepo,

    #[error("git operation failed: {0}")]
    VcsTransient(String),

    #[error("malformed transcript record at line {line}: {reason}")]
    MalformedSessionRecord { line: usize, reason: String },

    #[error("could not read transcript for session {id}: {reason}")]
    UnreadableTranscript { id: String, reason: String },

    #[error("scrubber failed: {0}")]
    ScrubberError(String),

    #[error("could not attach note to {commit}: {reason}")]
    NoteAttachFailed { commit: String, reason: String },

    /// Reserved for a rewrite merge that cannot be resolved deterministically.
    /// `Manifest::merge` never actually produces this today — version takes
    /// the max and start_work takes the min unconditionally (spec.md §7: "take
    /// the maximum; never surface an error") — but the taxonomy carries the
    /// variant so a future merge rule with a genuine conflict has somewhere
    /// to report it without changing the public error shape.
    #[error("ambiguous manifest merge for {commit}: {reason}")]
    MergeAmbiguity { commit: String, reason: String },
}

/// Classification of a single [`crate::gateway`] call's outcome, matching
/// spec.md §7's taxonomy for VCS invocations specifically.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("not found")]
    NotFound,
    #[error("invalid argument: {0}")]
    Invalid(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{0}")]
    Other(String),
}

impl From<git2::Error> for GatewayError {
    fn from(e: git2::Error) -> Self {
        use git2::ErrorCode::*;
        match e.code() {
            NotFound | UnbornBranch => GatewayError::NotFound,
            InvalidSpec | Ambiguous => GatewayError::Invalid(e.message().to_string()),
            _ => match e.class() {
                git2::ErrorClass::Net | git2::ErrorClass::Ssh | git2::ErrorClass::Http => {
                    GatewayError::Transport(e.message().to_string())
                }
                _ => GatewayError::Other(e.message().to_string()),
            },
        }
    }
}
