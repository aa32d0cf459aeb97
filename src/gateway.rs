//! C1 — VCS gateway.
//!
//! A thin, synchronous wrapper around the host VCS (git, via `git2`). No
//! capture-engine business logic lives here: every method is a direct
//! translation of one git plumbing operation, returning a [`GatewayError`]
//! instead of panicking or unwinding `git2::Error` directly so callers can
//! match on failure *kind* the way spec.md §7 describes.

use crate::error::GatewayError;
use git2::{ObjectType, Oid, Repository, Signature};
use std::path::Path;

pub struct Gateway {
    repo: Repository,
}

/// One entry in a tree, as read back by [`Gateway::ls_tree`].
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub name: String,
    pub oid: Oid,
    pub is_tree: bool,
}

/// One reflog entry, as read back by [`Gateway::reflog`].
#[derive(Debug, Clone)]
pub struct ReflogEntry {
    pub message: String,
    pub committer_time: i64,
}

/// One commit, as read back by [`Gateway::log`] / [`Gateway::rev_list`].
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub oid: Oid,
    pub committer_time: i64,
    pub summary: String,
}

impl Gateway {
    /// Discover the repository containing `cwd` (equivalent of `git rev-parse
    /// --show-toplevel`, walking up through parent directories).
    pub fn discover(cwd: &Path) -> Result<Self, GatewayError> {
        let repo = Repository::discover(cwd).map_err(|_| GatewayError::NotFound)?;
        Ok(Self { repo })
    }

    pub fn workdir(&self) -> Result<&Path, GatewayError> {
        self.repo
            .workdir()
            .ok_or_else(|| GatewayError::Other("repository is bare, no working directory".into()))
    }

    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // -----------------------------------------------------------------
    // Blob / tree plumbing
    // -----------------------------------------------------------------

    /// `git hash-object -w --stdin`
    pub fn hash_object_write(&self, bytes: &[u8]) -> Result<Oid, GatewayError> {
        Ok(self.repo.blob(bytes)?)
    }

    pub fn read_blob(&self, oid: Oid) -> Result<Vec<u8>, GatewayError> {
        let blob = self.repo.find_blob(oid)?;
        Ok(blob.content().to_vec())
    }

    /// `git ls-tree <oid>` — entries of a tree object, or an empty list if
    /// `oid` is `None` (a not-yet-created tree).
    pub fn ls_tree(&self, oid: Option<Oid>) -> Result<Vec<TreeEntry>, GatewayError> {
        let Some(oid) = oid else {
            return Ok(Vec::new());
        };
        let tree = self.repo.find_tree(oid)?;
        Ok(tree
            .iter()
            .map(|e| TreeEntry {
                name: e.name().unwrap_or_default().to_string(),
                oid: e.id(),
                is_tree: e.kind() == Some(ObjectType::Tree),
            })
            .collect())
    }

    /// `git mktree` — build a tree object from a flat entry list. Entries
    /// are blobs (mode 100644) unless `is_tree` is set (mode 040000).
    pub fn mktree(&self, entries: &[TreeEntry]) -> Result<Oid, GatewayError> {
        let mut builder = self.repo.treebuilder(None)?;
        for entry in entries {
            let mode = if entry.is_tree { 0o040000 } else { 0o100644 };
            builder.insert(&entry.name, entry.oid, mode)?;
        }
        Ok(builder.write()?)
    }

    // -----------------------------------------------------------------
    // Refs
    // -----------------------------------------------------------------

    /// `git show-ref <name>`
    pub fn show_ref(&self, name: &str) -> Result<Option<Oid>, GatewayError> {
        match self.repo.find_reference(name) {
            Ok(r) => Ok(r.target()),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// `git update-ref <name> <oid>` — force-updates the reference to point
    /// directly at `oid` (which may be a tree, blob, or commit object).
    pub fn update_ref(&self, name: &str, oid: Oid, log_message: &str) -> Result<(), GatewayError> {
        self.repo.reference(name, oid, true, log_message)?;
        Ok(())
    }

    pub fn rev_parse(&self, spec: &str) -> Result<Oid, GatewayError> {
        let obj = self.repo.revparse_single(spec)?;
        Ok(obj.id())
    }

    // -----------------------------------------------------------------
    // Notes
    // -----------------------------------------------------------------

    /// `git notes --ref <ref_name> add -C <blob_oid> <commit>` — attach a
    /// note whose content is `content` (the exact bytes of a blob hashed
    /// earlier via [`Gateway::hash_object_write`]). Content-addressing
    /// guarantees the note's blob lands at the same OID that was
    /// pre-computed, even though libgit2 re-creates the blob internally
    /// rather than accepting an existing OID directly.
    pub fn notes_add_from_blob(
        &self,
        ref_name: &str,
        commit: Oid,
        content: &str,
        sig: &Signature,
    ) -> Result<Oid, GatewayError> {
        Ok(self
            .repo
            .note(sig, sig, Some(ref_name), commit, content, true)?)
    }

    /// `git notes --ref <ref_name> add -m <message> <commit>`
    pub fn notes_add_from_message(
        &self,
        ref_name: &str,
        commit: Oid,
        message: &str,
        sig: &Signature,
    ) -> Result<(), GatewayError> {
        self.repo
            .note(sig, sig, Some(ref_name), commit, message, true)?;
        Ok(())
    }

    /// `git notes --ref <ref_name> show <commit>`
    pub fn notes_show(&self, ref_name: &str, commit: Oid) -> Result<Option<String>, GatewayError> {
        match self.repo.find_note(Some(ref_name), commit) {
            Ok(note) => Ok(note.message().map(str::to_string)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// `git notes --ref <ref_name> list` — (commit, note blob) pairs.
    pub fn notes_list(&self, ref_name: &str) -> Result<Vec<(Oid, Oid)>, GatewayError> {
        let mut out = Vec::new();
        let iter = match self.repo.notes(Some(ref_name)) {
            Ok(i) => i,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        for item in iter {
            let (note_oid, annotated_oid) = item?;
            out.push((annotated_oid, note_oid));
        }
        Ok(out)
    }

    // -----------------------------------------------------------------
    // History queries
    // -----------------------------------------------------------------

    pub fn committer_time(&self, commit: Oid) -> Result<i64, GatewayError> {
        Ok(self.repo.find_commit(commit)?.committer().when().seconds())
    }

    pub fn head(&self) -> Result<Option<Oid>, GatewayError> {
        match self.repo.head() {
            Ok(r) => Ok(r.target()),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parent(&self, commit: Oid) -> Result<Option<Oid>, GatewayError> {
        let c = self.repo.find_commit(commit)?;
        Ok(c.parent_id(0).ok())
    }

    /// `git reflog show HEAD`, newest entry first.
    pub fn reflog(&self, reference: &str) -> Result<Vec<ReflogEntry>, GatewayError> {
        let reflog = match self.repo.reflog(reference) {
            Ok(r) => r,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::with_capacity(reflog.len());
        for entry in reflog.iter() {
            out.push(ReflogEntry {
                message: entry.message().unwrap_or_default().to_string(),
                committer_time: entry.committer().when().seconds(),
            });
        }
        Ok(out)
    }

    /// `git log --format=...` over a single ref, newest first.
    pub fn log(&self, starting_at: Oid) -> Result<Vec<CommitInfo>, GatewayError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(starting_at)?;
        let mut out = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            out.push(CommitInfo {
                oid,
                committer_time: commit.committer().when().seconds(),
                summary: commit.summary().unwrap_or_default().to_string(),
            });
        }
        Ok(out)
    }

    /// `git rev-list <range>`
    pub fn rev_list(&self, range: &str) -> Result<Vec<Oid>, GatewayError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_range(range)?;
        Ok(revwalk.collect::<Result<Vec<_>, _>>()?)
    }

    // -----------------------------------------------------------------
    // Remotes
    // -----------------------------------------------------------------

    pub fn ls_remote(&self, remote_name: &str) -> Result<Vec<(String, Oid)>, GatewayError> {
        let mut remote = self.repo.find_remote(remote_name)?;
        remote.connect(git2::Direction::Fetch)?;
        let heads = remote
            .list()?
            .iter()
            .map(|h| (h.name().to_string(), h.oid()))
            .collect();
        remote.disconnect()?;
        Ok(heads)
    }

    /// `git push --force <remote> <refspecs...>`
    pub fn push(&self, remote_name: &str, refspecs: &[String]) -> Result<(), GatewayError> {
        let mut remote = self.repo.find_remote(remote_name)?;
        let specs: Vec<&str> = refspecs.iter().map(String::as_str).collect();
        remote.push(&specs, None).map_err(GatewayError::from)?;
        Ok(())
    }

    pub fn signature(&self) -> Result<Signature<'static>, GatewayError> {
        Ok(self.repo.signature()?)
    }

    pub fn status_is_clean(&self) -> Result<bool, GatewayError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses.len() == 0)
    }

    /// Access to the underlying `git2::Repository` for operations that have
    /// no plumbing-level equivalent above (e.g. commit message rewriting via
    /// `commit-msg` file I/O, which is not a git object operation).
    pub fn repo(&self) -> &Repository {
        &self.repo
    }
}
