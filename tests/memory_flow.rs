use std::fs;

use tempfile::TempDir;

use megg::core::view::ViewMode;
use megg::{append_entry, init_scope, load_context, Config, ContextRequest, MemoryError, NewEntry};

#[test]
fn test_init_learn_and_load_context() {
    let dir = TempDir::new().unwrap();
    let proj = dir.path().canonicalize().unwrap().join("proj");
    fs::create_dir_all(&proj).unwrap();
    let config = Config::default();

    init_scope(&proj, "# Proj\n\nhello", None, &config).unwrap();
    let entry = NewEntry::new("Use X", "decision", ["infra"], "because Y");
    let outcome = append_entry(&proj, &entry, &config).unwrap();
    assert!(outcome.warning.is_none());

    let result = load_context(&ContextRequest::new(&proj), &config).unwrap();
    assert_eq!(result.chain.len(), 1);
    assert!(result.chain[0].identity.contains("hello"));
    let knowledge = result.knowledge.unwrap();
    assert_eq!(knowledge.mode, ViewMode::Full);
    assert_eq!(knowledge.entry_count, 1);
    assert!(knowledge.content.contains("because Y"));

    let infra = load_context(
        &ContextRequest::new(&proj).with_topic(Some("infra".to_string())),
        &config,
    )
    .unwrap();
    assert!(infra.knowledge.unwrap().content.contains("Use X"));

    let nope = load_context(
        &ContextRequest::new(&proj).with_topic(Some("nope".to_string())),
        &config,
    )
    .unwrap();
    let nope = nope.knowledge.unwrap();
    assert_eq!(nope.entry_count, 0);
    assert!(nope.content.contains("No entries found for topic"));
}

#[test]
fn test_nested_scopes_share_identity_chain() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let api = root.join("services/api");
    fs::create_dir_all(&api).unwrap();
    let config = Config::default();

    init_scope(&root, "# Company", None, &config).unwrap();
    init_scope(&api, "# API", Some("Initial notes"), &config).unwrap();

    let result = load_context(&ContextRequest::new(api.join("src")), &config).unwrap();
    let names: Vec<&str> = result.chain.iter().map(|c| c.identity.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].contains("# Company"));
    assert!(names[1].contains("# API"));
    assert!(result.knowledge.unwrap().content.contains("Initial notes"));
}

#[test]
fn test_rejected_entry_leaves_log_untouched() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let config = Config::default();
    init_scope(&root, "# Root", None, &config).unwrap();

    let entry = NewEntry::new("T", "urgent", ["x"], "b");
    let err = append_entry(&root, &entry, &config).unwrap_err();
    assert!(matches!(err, MemoryError::InvalidInput { field: "type", .. }));
    assert!(!root.join(".megg/knowledge.md").exists());
}
