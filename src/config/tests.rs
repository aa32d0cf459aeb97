use super::*;

#[test]
fn load_creates_default_file_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.notes_ref, DEFAULT_NOTES_REF);
    assert_eq!(config.transcripts_ref, DEFAULT_TRANSCRIPTS_REF);
    assert!(config.push.enabled);
    assert!(dir.path().join(".prompt-story/config.toml").exists());
}

#[test]
fn load_fills_missing_keys_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".prompt-story")).unwrap();
    fs::write(
        dir.path().join(".prompt-story/config.toml"),
        "providers = [\"claude-code\"]\n",
    )
    .unwrap();

    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.providers, vec!["claude-code".to_string()]);
    assert_eq!(config.scrubber, ScrubberKind::Identity);
    assert_eq!(config.notes_ref, DEFAULT_NOTES_REF);
}

#[test]
fn load_or_default_never_errors_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_or_default(dir.path());
    assert_eq!(config.notes_ref, DEFAULT_NOTES_REF);
    assert!(!dir.path().join(".prompt-story").exists());
}
