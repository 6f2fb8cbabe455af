use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from any user or local config file
fn megg(config_dir: &Path) -> Command {
    let config_path = config_dir.join("config.toml");
    if !config_path.exists() {
        fs::write(&config_path, "").unwrap();
    }
    let mut cmd = Command::cargo_bin("megg").unwrap();
    cmd.arg("--config").arg(&config_path);
    cmd
}

/// Command that resolves config the normal way under a throwaway home
fn megg_at_home(home: &Path, cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("megg").unwrap();
    cmd.env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("MEGG_CONFIG")
        .current_dir(cwd);
    cmd
}

fn project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

#[test]
fn test_init_learn_context() {
    let (_dir, root) = project();
    let proj = root.join("proj");
    fs::create_dir_all(&proj).unwrap();

    megg(&root)
        .args(["init"])
        .arg(&proj)
        .args(["--info", "# Proj\n\nhello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("megg initialized"));
    assert!(proj.join(".megg/info.md").exists());

    megg(&root)
        .args(["learn", "Use X", "decision", "infra", "because Y", "--path"])
        .arg(&proj)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added entry \"Use X\""));

    megg(&root)
        .arg("context")
        .arg(&proj)
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("## Knowledge (full)"))
        .stdout(predicate::str::contains("because Y"));
}

#[test]
fn test_learn_rejects_unknown_type() {
    let (_dir, root) = project();
    fs::create_dir_all(root.join(".megg")).unwrap();

    megg(&root)
        .args(["learn", "T", "urgent", "x", "body", "--path"])
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input (type)"));
    assert!(!root.join(".megg/knowledge.md").exists());
}

#[test]
fn test_learn_without_scope_fails() {
    let (_dir, root) = project();
    // A marker name nothing above the temp dir will carry
    fs::write(root.join("config.toml"), "[scope]\nmarker_dir = \".megg-cli-test\"\n").unwrap();

    megg(&root)
        .args(["learn", "T", "pattern", "x", "body", "--path"])
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not initialized"));
}

#[test]
fn test_context_json_payload() {
    let (_dir, root) = project();
    megg(&root)
        .arg("init")
        .arg(&root)
        .args(["--info", "# Root\n\nroot identity"])
        .assert()
        .success();

    megg(&root)
        .args(["context", "--json"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hookEventName\": \"SessionStart\""))
        .stdout(predicate::str::contains("root identity"));
}

#[test]
fn test_state_set_read_done() {
    let (_dir, root) = project();
    fs::create_dir_all(root.join(".megg")).unwrap();

    megg(&root)
        .args(["state", "--set", "Working on parser", "--path"])
        .arg(&root)
        .assert()
        .success();

    megg(&root)
        .args(["state", "--path"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Working on parser"));

    megg(&root)
        .args(["state", "--done", "--path"])
        .arg(&root)
        .assert()
        .success();
    assert!(!root.join(".megg/state.md").exists());
}

#[test]
fn test_maintain_reports_healthy() {
    let (_dir, root) = project();
    megg(&root)
        .arg("init")
        .arg(&root)
        .args(["--info", "# Root"])
        .assert()
        .success();

    megg(&root)
        .arg("maintain")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("All knowledge files are healthy"));
}

#[test]
fn test_config_key_lookup() {
    let (_dir, root) = project();
    megg(&root)
        .args(["config", "knowledge.full_threshold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8000"));
}

#[test]
fn test_learn_fails_under_home_with_user_config() {
    let (_dir, home) = project();
    let work = home.join("code/uninitialized");
    fs::create_dir_all(&work).unwrap();

    megg_at_home(&home, &home)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));
    assert!(!home.join(".megg").exists());

    megg_at_home(&home, &work)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(global)"));

    megg_at_home(&home, &work)
        .args(["learn", "T", "pattern", "x", "body", "--path"])
        .arg(&work)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not initialized:"));
    assert!(!home.join(".megg").exists());
}

#[test]
fn test_config_init_inside_scope_writes_scope_marker() {
    let (_home_dir, home) = project();
    let (_dir, root) = project();
    fs::create_dir_all(root.join(".megg")).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();

    megg_at_home(&home, &root.join("src"))
        .args(["config", "--init"])
        .assert()
        .success();
    assert!(root.join(".megg/config.toml").exists());
    assert!(!root.join("src/.megg").exists());

    megg_at_home(&home, &root.join("src"))
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(local)"));
}

#[test]
fn test_learn_missing_file_names_path() {
    let (_dir, root) = project();
    fs::create_dir_all(root.join(".megg")).unwrap();
    let missing = root.join("notes/missing.md");

    megg(&root)
        .args(["learn", "T", "pattern", "x", "--file"])
        .arg(&missing)
        .arg("--path")
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"))
        .stderr(predicate::str::contains("missing.md"));
    assert!(!root.join(".megg/knowledge.md").exists());
}

#[test]
fn test_state_warns_about_malformed_file() {
    let (_dir, root) = project();
    fs::create_dir_all(root.join(".megg")).unwrap();
    fs::write(root.join(".megg/state.md"), "scribbled notes without a header").unwrap();

    megg(&root)
        .args(["state", "--path"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Malformed content at"))
        .stdout(predicate::str::contains("No active state."));
}
