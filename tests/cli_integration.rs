//! CLI integration tests for changelog
//!
//! These tests drive the binary through complete release workflows, checking
//! both command output and the file left on disk.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FILE: &str = "README-CHANGES.xml";

/// Get a command instance for the changelog binary, isolated in `dir`
fn changelog_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("changelog"));
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("CHANGELOG_FILE")
        .env_remove("CHANGELOG_LOG");
    cmd
}

/// Create a temporary directory holding a fresh changelog
fn setup_changelog() -> TempDir {
    let dir = TempDir::new().unwrap();
    changelog_cmd(&dir)
        .args([
            "initialize",
            "--project",
            "com.example.widgets",
            "--ticket-system-name",
            "gh",
            "--ticket-system-uri",
            "https://github.com/example/widgets/issues/",
        ])
        .assert()
        .success();
    dir
}

fn read_file(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join(FILE)).unwrap()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_initialize_creates_file() {
    let dir = TempDir::new().unwrap();

    changelog_cmd(&dir)
        .args([
            "initialize",
            "--project",
            "com.example.widgets",
            "--ticket-system-name",
            "gh",
            "--ticket-system-uri",
            "https://github.com/example/widgets/issues/",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created changelog"));

    let content = read_file(&dir);
    assert!(content.contains(r#"project="com.example.widgets""#));
    assert!(content.contains(r#"xmlns:c="urn:com.io7m.changelog:4.0""#));
    assert!(content.contains(r#"id="gh""#));
    assert!(content.contains(r#"default="true""#));
    assert!(!dir.path().join("README-CHANGES.xml.tmp").exists());
}

#[test]
fn test_initialize_refuses_existing_file() {
    let dir = setup_changelog();
    let before = read_file(&dir);

    changelog_cmd(&dir)
        .args([
            "initialize",
            "--project",
            "com.example.other",
            "--ticket-system-name",
            "jira",
            "--ticket-system-uri",
            "https://jira.example.com/browse/",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(read_file(&dir), before);
}

#[test]
fn test_initialize_rejects_bad_project_name() {
    let dir = TempDir::new().unwrap();

    changelog_cmd(&dir)
        .args([
            "initialize",
            "--project",
            "Widgets",
            "--ticket-system-name",
            "gh",
            "--ticket-system-uri",
            "https://github.com/example/widgets/issues/",
        ])
        .assert()
        .failure();

    assert!(!dir.path().join(FILE).exists());
}

// =============================================================================
// Release Lifecycle Tests
// =============================================================================

#[test]
fn test_release_lifecycle() {
    let dir = setup_changelog();

    changelog_cmd(&dir)
        .args(["release-begin", "--version", "1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Began release 1.0.0"));

    changelog_cmd(&dir)
        .args(["change-add", "--summary", "x"])
        .assert()
        .success();

    changelog_cmd(&dir)
        .arg("release-finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished release 1.0.0"));

    changelog_cmd(&dir)
        .arg("release-begin")
        .assert()
        .success()
        .stdout(predicate::str::contains("Began release 1.1.0"));

    changelog_cmd(&dir)
        .arg("release-current")
        .assert()
        .success()
        .stdout("1.1.0 (open)\n");

    let content = read_file(&dir);
    assert!(content.contains(r#"is-open="false" ticket-system="gh" version="1.0.0""#));
    assert!(content.contains(r#"is-open="true" ticket-system="gh" version="1.1.0""#));
    assert!(content.contains(r#"summary="x""#));
}

#[test]
fn test_first_release_defaults_to_1_0_0() {
    let dir = setup_changelog();

    changelog_cmd(&dir)
        .args(["--format", "json", "release-begin"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""version":"1.0.0""#))
        .stdout(predicate::str::contains(r#""open":true"#));
}

#[test]
fn test_release_begin_while_open_fails() {
    let dir = setup_changelog();
    changelog_cmd(&dir).arg("release-begin").assert().success();

    changelog_cmd(&dir)
        .args(["release-begin", "--version", "2.0.0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("A release with version 1.0.0 is already open"));
}

#[test]
fn test_release_begin_existing_version_fails() {
    let dir = setup_changelog();
    changelog_cmd(&dir).arg("release-begin").assert().success();
    changelog_cmd(&dir).arg("release-finish").assert().success();

    changelog_cmd(&dir)
        .args(["release-begin", "--version", "1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("A release with version 1.0.0 already exists"));
}

#[test]
fn test_append_when_closed_leaves_file_unchanged() {
    let dir = setup_changelog();
    changelog_cmd(&dir).arg("release-begin").assert().success();
    changelog_cmd(&dir).arg("release-finish").assert().success();
    let before = read_file(&dir);

    changelog_cmd(&dir)
        .args(["change-add", "--summary", "Too late"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not open"));

    assert_eq!(read_file(&dir), before);
}

#[test]
fn test_change_add_without_release_fails() {
    let dir = setup_changelog();
    let before = read_file(&dir);

    changelog_cmd(&dir)
        .args(["change-add", "--summary", "Nowhere to go"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No release is currently open"));

    assert_eq!(read_file(&dir), before);
}

#[test]
fn test_change_add_with_details() {
    let dir = setup_changelog();
    changelog_cmd(&dir).arg("release-begin").assert().success();

    changelog_cmd(&dir)
        .args([
            "change-add",
            "--summary",
            "Renamed flags",
            "--module",
            "widgets.cli",
            "--ticket",
            "12",
            "--ticket",
            "13",
            "--incompatible",
        ])
        .assert()
        .success();

    let content = read_file(&dir);
    assert!(content.contains(r#"module="widgets.cli" compatible="false""#));
    assert!(content.contains(r#"<c:ticket id="12"/>"#));
    assert!(content.contains(r#"<c:ticket id="13"/>"#));
}

#[test]
fn test_release_set_version() {
    let dir = setup_changelog();
    changelog_cmd(&dir).arg("release-begin").assert().success();
    changelog_cmd(&dir)
        .args(["change-add", "--summary", "Kept"])
        .assert()
        .success();

    changelog_cmd(&dir)
        .args(["release-set-version", "--version", "0.9.0-rc1"])
        .assert()
        .success();

    changelog_cmd(&dir)
        .arg("release-current")
        .assert()
        .success()
        .stdout("0.9.0-rc1 (open)\n");

    let content = read_file(&dir);
    assert!(!content.contains(r#"version="1.0.0""#));
    assert!(content.contains(r#"summary="Kept""#));
}

#[test]
fn test_release_finish_explicit_version() {
    let dir = setup_changelog();
    changelog_cmd(&dir).arg("release-begin").assert().success();

    changelog_cmd(&dir)
        .args(["release-finish", "--version", "3.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Release 3.0.0 not found"));

    changelog_cmd(&dir)
        .args(["release-finish", "--version", "1.0.0"])
        .assert()
        .success();

    changelog_cmd(&dir)
        .args(["--format", "json", "release-current"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""open":false"#))
        .stdout(predicate::str::contains(r#""version":"1.0.0""#));
}

#[test]
fn test_release_current_without_releases() {
    let dir = setup_changelog();

    changelog_cmd(&dir)
        .arg("release-current")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No current release exists"));
}

#[test]
fn test_release_touch() {
    let dir = setup_changelog();
    changelog_cmd(&dir).arg("release-begin").assert().success();
    changelog_cmd(&dir).arg("release-finish").assert().success();

    changelog_cmd(&dir).arg("release-touch").assert().success();

    changelog_cmd(&dir)
        .arg("release-current")
        .assert()
        .success()
        .stdout("1.0.0 (closed)\n");
}

// =============================================================================
// Ticket System Tests
// =============================================================================

#[test]
fn test_ticket_system_add_and_default() {
    let dir = setup_changelog();

    changelog_cmd(&dir)
        .args([
            "ticket-system-add",
            "--id",
            "jira",
            "--uri",
            "https://jira.example.com/browse/",
            "--default",
        ])
        .assert()
        .success();

    changelog_cmd(&dir).arg("release-begin").assert().success();
    let content = read_file(&dir);
    assert!(content.contains(r#"ticket-system="jira""#));
    assert!(content.contains(r#"<c:ticket-system id="gh" url="https://github.com/example/widgets/issues/" default="false"/>"#));

    changelog_cmd(&dir)
        .args(["ticket-system-set-default", "--id", "gh"])
        .assert()
        .success();
    changelog_cmd(&dir)
        .args(["release-set-ticket-system", "--ticket-system", "gh"])
        .assert()
        .success();

    let content = read_file(&dir);
    assert!(content.contains(r#"ticket-system="gh""#));
    assert!(content.contains(r#"<c:ticket-system id="jira" url="https://jira.example.com/browse/" default="false"/>"#));
}

#[test]
fn test_unknown_ticket_system_fails() {
    let dir = setup_changelog();

    changelog_cmd(&dir)
        .args(["release-begin", "--ticket-system", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No ticket system named 'missing' is defined"));
}

#[test]
fn test_duplicate_ticket_system_fails() {
    let dir = setup_changelog();

    changelog_cmd(&dir)
        .args(["ticket-system-add", "--id", "gh", "--uri", "https://example.com/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already defined"));
}

// =============================================================================
// Rendering Tests
// =============================================================================

fn setup_history() -> TempDir {
    let dir = setup_changelog();
    for (summary, ticket) in [("First", "1"), ("Second", "2"), ("Third", "3")] {
        changelog_cmd(&dir).arg("release-begin").assert().success();
        changelog_cmd(&dir)
            .args(["change-add", "--summary", summary, "--ticket", ticket])
            .assert()
            .success();
        changelog_cmd(&dir).arg("release-finish").assert().success();
    }
    dir
}

#[test]
fn test_write_plain() {
    let dir = setup_history();

    changelog_cmd(&dir)
        .arg("write-plain")
        .assert()
        .success()
        .stdout(
            "Release: com.example.widgets 1.2.0\n\
             Change: Third (Ticket: #3)\n\
             Release: com.example.widgets 1.1.0\n\
             Change: Second (Ticket: #2)\n\
             Release: com.example.widgets 1.0.0\n\
             Change: First (Ticket: #1)\n",
        );
}

#[test]
fn test_write_plain_selection() {
    let dir = setup_history();

    changelog_cmd(&dir)
        .args(["write-plain", "--count", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.0"))
        .stdout(predicate::str::contains("1.1.0").not());

    changelog_cmd(&dir)
        .args(["write-plain", "--version", "1.1.0", "--count", "1"])
        .assert()
        .success()
        .stdout("Release: com.example.widgets 1.1.0\nChange: Second (Ticket: #2)\n");

    changelog_cmd(&dir)
        .args(["write-plain", "--version", "7.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Release 7.0.0 not found"));
}

#[test]
fn test_write_xhtml() {
    let dir = setup_history();

    changelog_cmd(&dir)
        .arg("write-xhtml")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"class="changelog""#))
        .stdout(predicate::str::contains(
            r#"<a href="https://github.com/example/widgets/issues/2">2</a>"#,
        ));
}

#[test]
fn test_write_atom() {
    let dir = setup_history();

    changelog_cmd(&dir)
        .args([
            "write-atom",
            "--uri",
            "https://example.com/widgets.atom",
            "--author-name",
            "Release Bot",
            "--author-email",
            "bot@example.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>com.example.widgets releases</title>"))
        .stdout(predicate::str::contains("<title>com.example.widgets 1.2.0 released</title>"));
}

#[test]
fn test_write_atom_requires_metadata() {
    let dir = setup_history();

    changelog_cmd(&dir)
        .arg("write-atom")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--uri"));
}

// =============================================================================
// File and Configuration Tests
// =============================================================================

#[test]
fn test_file_flag_and_env() {
    let dir = TempDir::new().unwrap();

    changelog_cmd(&dir)
        .args([
            "--file",
            "docs/CHANGES.xml",
            "initialize",
            "--project",
            "com.example",
            "--ticket-system-name",
            "gh",
            "--ticket-system-uri",
            "https://example.com/",
        ])
        .assert()
        .success();
    assert!(dir.path().join("docs/CHANGES.xml").is_file());

    changelog_cmd(&dir)
        .env("CHANGELOG_FILE", "docs/CHANGES.xml")
        .arg("release-begin")
        .assert()
        .success();

    changelog_cmd(&dir)
        .arg("release-current")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Changelog not found"));
}

#[test]
fn test_project_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".changelog.toml"),
        "file = \"CHANGES.xml\"\nformat = \"json\"\n",
    )
    .unwrap();

    changelog_cmd(&dir)
        .args([
            "initialize",
            "--project",
            "com.example",
            "--ticket-system-name",
            "gh",
            "--ticket-system-uri",
            "https://example.com/",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""project":"com.example""#));

    assert!(dir.path().join("CHANGES.xml").is_file());
}

#[test]
fn test_malformed_config_fails() {
    let dir = setup_changelog();
    fs::write(dir.path().join(".changelog.toml"), "format = [").unwrap();

    changelog_cmd(&dir)
        .arg("release-current")
        .assert()
        .failure()
        .stderr(predicate::str::contains(".changelog.toml"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_malformed_changelog_reports_diagnostics() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(FILE),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<c:changelog project="com.example" xmlns:c="urn:com.io7m.changelog:4.0">
  <c:releases>
    <c:release date="someday" is-open="false" ticket-system="gh" version="1.0.0"/>
  </c:releases>
</c:changelog>
"#,
    )
    .unwrap();

    changelog_cmd(&dir)
        .arg("release-current")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("README-CHANGES.xml:4:5: Invalid date 'someday'"))
        .stderr(predicate::str::contains(
            "At least one error was encountered during parsing and/or validation",
        ));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = setup_changelog();

    changelog_cmd(&dir)
        .args(["--verbose", "release-begin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Began release 1.0.0"))
        .stderr(predicate::str::contains("loaded changelog"));
}
