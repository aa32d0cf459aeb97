use super::*;
use crate::manifest::SessionEntry;
use chrono::{TimeZone, Utc};
use git2::Repository;

const NOTES_REF: &str = "refs/notes/prompt-story";

struct TestRepo {
    _dir: tempfile::TempDir,
    gateway: Gateway,
}

fn init_repo() -> TestRepo {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test").unwrap();
    config.set_str("user.email", "test@test.com").unwrap();
    drop(repo);
    let gateway = Gateway::discover(dir.path()).unwrap();
    TestRepo { _dir: dir, gateway }
}

fn commit(t: &TestRepo, message: &str) -> Oid {
    let repo = t.gateway.repo();
    let sig = repo.signature().unwrap();
    let tree_oid = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

fn manifest_with(id: &str, start: i64, created: i64) -> Manifest {
    Manifest::new(
        Utc.timestamp_opt(start, 0).unwrap(),
        vec![SessionEntry {
            tool: "claude-code".to_string(),
            id: id.to_string(),
            path: format!("claude-code/{id}.jsonl"),
            created: Utc.timestamp_opt(created, 0).unwrap(),
            modified: Utc.timestamp_opt(created + 10, 0).unwrap(),
            removed: None,
            removed_at: None,
        }],
    )
}

fn attach_note(t: &TestRepo, commit: Oid, manifest: &Manifest) {
    let sig = t.gateway.signature().unwrap();
    let text = manifest.serialize().unwrap();
    t.gateway.notes_add_from_blob(NOTES_REF, commit, &text, &sig).unwrap();
}

#[test]
fn squash_merges_two_old_shas_onto_one_new_sha() {
    let t = init_repo();
    let a = commit(&t, "a");
    let b = commit(&t, "b");
    let c = commit(&t, "c (squashed)");

    attach_note(&t, a, &manifest_with("s1", 100, 100));
    attach_note(&t, b, &manifest_with("s2", 50, 200));

    let sig = t.gateway.signature().unwrap();
    let pairs = [
        RewritePair { old_sha: a, new_sha: c },
        RewritePair { old_sha: b, new_sha: c },
    ];
    let updated = handle(&t.gateway, NOTES_REF, &pairs, &sig).unwrap();
    assert_eq!(updated, vec![c]);

    let note = t.gateway.notes_show(NOTES_REF, c).unwrap().unwrap();
    let merged = Manifest::parse(&note).unwrap();
    assert_eq!(merged.sessions.len(), 2);
    assert_eq!(merged.start_work.timestamp(), 50);
    assert_eq!(merged.sessions[0].id, "s1");
    assert_eq!(merged.sessions[1].id, "s2");
}

#[test]
fn old_shas_without_notes_are_skipped_not_errors() {
    let t = init_repo();
    let a = commit(&t, "a");
    let b = commit(&t, "b (amended)");
    attach_note(&t, a, &manifest_with("s1", 100, 100));

    let sig = t.gateway.signature().unwrap();
    let pairs = [RewritePair { old_sha: a, new_sha: b }];
    let updated = handle(&t.gateway, NOTES_REF, &pairs, &sig).unwrap();
    assert_eq!(updated, vec![b]);
    assert!(t.gateway.notes_show(NOTES_REF, b).unwrap().is_some());
}

#[test]
fn amend_does_not_regress_a_note_the_normal_flow_already_attached() {
    // Mirrors `git commit --amend`: post-commit (C2-C7) already attached a
    // note to `b` that reflects the amended working tree (s1 + s2), before
    // post-rewrite sees the (a, b) pair whose only discoverable note is a's
    // stale s1-only manifest. The merge must not throw away s2.
    let t = init_repo();
    let a = commit(&t, "a");
    let b = commit(&t, "b (amended)");
    attach_note(&t, a, &manifest_with("s1", 100, 100));
    attach_note(&t, b, &manifest_with("s2", 50, 200));

    let sig = t.gateway.signature().unwrap();
    let pairs = [RewritePair { old_sha: a, new_sha: b }];
    let updated = handle(&t.gateway, NOTES_REF, &pairs, &sig).unwrap();
    assert_eq!(updated, vec![b]);

    let note = t.gateway.notes_show(NOTES_REF, b).unwrap().unwrap();
    let merged = Manifest::parse(&note).unwrap();
    assert_eq!(merged.sessions.len(), 2);
    let ids: Vec<&str> = merged.sessions.iter().map(|s| s.id.as_str()).collect();
    assert!(ids.contains(&"s1"));
    assert!(ids.contains(&"s2"));
}

#[test]
fn bucket_with_no_parseable_notes_is_left_untouched() {
    let t = init_repo();
    let a = commit(&t, "a");
    let b = commit(&t, "b");

    let sig = t.gateway.signature().unwrap();
    let pairs = [RewritePair { old_sha: a, new_sha: b }];
    let updated = handle(&t.gateway, NOTES_REF, &pairs, &sig).unwrap();
    assert!(updated.is_empty());
    assert!(t.gateway.notes_show(NOTES_REF, b).unwrap().is_none());
}
