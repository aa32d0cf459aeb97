use std::path::Path;
use std::process::Command;

/// Run the `prompt-story` binary with `args`, inside `cwd`, optionally
/// piping `stdin` to it (used by `post-rewrite`, which reads rewrite
/// pairs from standard input the way git itself feeds them).
pub fn run_cli(cwd: &Path, args: &[&str], stdin: &str) -> (i32, String, String) {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = Command::new(env!("CARGO_BIN_EXE_prompt-story"))
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn binary");

    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();

    let output = child.wait_with_output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

/// Create a temp dir containing a git repo with an initial commit and
/// return it. The `TempDir` must be kept alive for the duration of the
/// test.
pub fn temp_git_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();

    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test").unwrap();
    config.set_str("user.email", "test@test.com").unwrap();

    let sig = repo.signature().unwrap();
    let tree_oid = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();

    dir
}

/// Pin discovery to zero providers so capture behavior in a test is
/// deterministic no matter what the test machine's own tool data
/// directories happen to contain.
pub fn write_no_provider_config(repo_root: &Path) {
    let dir = repo_root.join(".prompt-story");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "providers = []\n").unwrap();
}

/// Commit whatever message currently sits in `message_path`, the way git
/// itself would after running `prepare-commit-msg` to completion.
pub fn commit_with_message_file(repo_path: &Path, message_path: &Path) -> git2::Oid {
    let repo = git2::Repository::open(repo_path).unwrap();
    let message = std::fs::read_to_string(message_path).unwrap();
    let sig = repo.signature().unwrap();
    let tree_oid = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, &message, &tree, &parents)
        .unwrap()
}

/// Read a plain-text git note from a specific ref on a given commit.
pub fn read_note(repo_path: &Path, ref_name: &str, commit: git2::Oid) -> Option<String> {
    let repo = git2::Repository::open(repo_path).unwrap();
    repo.find_note(Some(ref_name), commit)
        .ok()
        .and_then(|note| note.message().map(|s| s.to_string()))
}
