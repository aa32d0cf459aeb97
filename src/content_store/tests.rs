use super::*;
use crate::scrubber::IdentityScrubber;
use git2::Repository;

const TRANSCRIPTS_REF: &str = "refs/notes/prompt-story-transcripts";

struct TestRepo {
    _dir: tempfile::TempDir,
    gateway: Gateway,
}

fn init_repo() -> TestRepo {
    let dir = tempfile::tempdir().unwrap();
    Repository::init(dir.path()).unwrap();
    let gateway = Gateway::discover(dir.path()).unwrap();
    TestRepo { _dir: dir, gateway }
}

fn session(tool: &str, id: &str, ext: &str) -> RawSession {
    RawSession {
        id: id.to_string(),
        tool: tool.to_string(),
        locator: String::new(),
        created: Utc::now(),
        modified: Utc::now(),
        repo_path: "/repo".to_string(),
        extension: ext.to_string(),
    }
}

#[test]
fn stores_one_session_into_a_fresh_tree() {
    let t = init_repo();
    let pending = vec![PendingSession {
        session: session("claude-code", "s1", ".jsonl"),
        bytes: b"hello transcript".to_vec(),
    }];
    let entries = store(&t.gateway, TRANSCRIPTS_REF, &IdentityScrubber, pending).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "claude-code/s1.jsonl");

    let root = t.gateway.show_ref(TRANSCRIPTS_REF).unwrap().unwrap();
    let root_entries = t.gateway.ls_tree(Some(root)).unwrap();
    assert_eq!(root_entries.len(), 1);
    assert_eq!(root_entries[0].name, "claude-code");

    let subtree = t.gateway.ls_tree(Some(root_entries[0].oid)).unwrap();
    assert_eq!(subtree.len(), 1);
    assert_eq!(subtree[0].name, "s1.jsonl");
    assert_eq!(t.gateway.read_blob(subtree[0].oid).unwrap(), b"hello transcript");
}

#[test]
fn second_tool_adds_a_sibling_subtree_without_disturbing_the_first() {
    let t = init_repo();
    store(
        &t.gateway,
        TRANSCRIPTS_REF,
        &IdentityScrubber,
        vec![PendingSession {
            session: session("claude-code", "s1", ".jsonl"),
            bytes: b"claude bytes".to_vec(),
        }],
    )
    .unwrap();

    store(
        &t.gateway,
        TRANSCRIPTS_REF,
        &IdentityScrubber,
        vec![PendingSession {
            session: session("cursor", "c1", ".json"),
            bytes: b"cursor bytes".to_vec(),
        }],
    )
    .unwrap();

    let root = t.gateway.show_ref(TRANSCRIPTS_REF).unwrap().unwrap();
    let mut root_entries = t.gateway.ls_tree(Some(root)).unwrap();
    root_entries.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(root_entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["claude-code", "cursor"]);

    let claude_subtree = t.gateway.ls_tree(Some(root_entries[0].oid)).unwrap();
    assert_eq!(claude_subtree[0].name, "s1.jsonl");
}

#[test]
fn replacing_a_session_overwrites_its_entry_but_keeps_siblings() {
    let t = init_repo();
    store(
        &t.gateway,
        TRANSCRIPTS_REF,
        &IdentityScrubber,
        vec![
            PendingSession {
                session: session("claude-code", "s1", ".jsonl"),
                bytes: b"v1".to_vec(),
            },
            PendingSession {
                session: session("claude-code", "s2", ".jsonl"),
                bytes: b"untouched".to_vec(),
            },
        ],
    )
    .unwrap();

    store(
        &t.gateway,
        TRANSCRIPTS_REF,
        &IdentityScrubber,
        vec![PendingSession {
            session: session("claude-code", "s1", ".jsonl"),
            bytes: b"v2".to_vec(),
        }],
    )
    .unwrap();

    let root = t.gateway.show_ref(TRANSCRIPTS_REF).unwrap().unwrap();
    let root_entries = t.gateway.ls_tree(Some(root)).unwrap();
    let subtree = t.gateway.ls_tree(Some(root_entries[0].oid)).unwrap();
    assert_eq!(subtree.len(), 2);

    let s1 = subtree.iter().find(|e| e.name == "s1.jsonl").unwrap();
    assert_eq!(t.gateway.read_blob(s1.oid).unwrap(), b"v2");
    let s2 = subtree.iter().find(|e| e.name == "s2.jsonl").unwrap();
    assert_eq!(t.gateway.read_blob(s2.oid).unwrap(), b"untouched");
}

#[test]
fn empty_input_is_a_no_op() {
    let t = init_repo();
    let entries = store(&t.gateway, TRANSCRIPTS_REF, &IdentityScrubber, Vec::new()).unwrap();
    assert!(entries.is_empty());
    assert!(t.gateway.show_ref(TRANSCRIPTS_REF).unwrap().is_none());
}
