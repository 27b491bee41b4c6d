//! CLI integration tests for the todo command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Invalid inputs are rejected with appropriate messages
//! - Offline commands (config, auth status) read the layered config
//!
//! Note: These tests do not require a running server.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Isolated config, data and working directories.
struct Sandbox {
    config: TempDir,
    data: TempDir,
    cwd: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            config: TempDir::new().unwrap(),
            data: TempDir::new().unwrap(),
            cwd: TempDir::new().unwrap(),
        }
    }

    fn write_user_config(&self, contents: &str) {
        fs::write(self.config.path().join("config.toml"), contents).unwrap();
    }

    fn write_project_config(&self, contents: &str) {
        fs::write(self.cwd.path().join("todo.toml"), contents).unwrap();
    }

    /// A command for the todo binary that cannot see the real user's files.
    fn todo(&self) -> Command {
        let mut cmd = Command::cargo_bin("todo").unwrap();
        cmd.current_dir(self.cwd.path())
            .env("TODO_CONFIG_DIR", self.config.path())
            .env("TODO_DATA_DIR", self.data.path())
            .env_remove("TODO_SERVER_URL")
            .env_remove("TODO_PASSWORD")
            .env_remove("RUST_LOG");
        cmd
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    Sandbox::new()
        .todo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("manage your todos"));
}

#[test]
fn test_version_displays() {
    Sandbox::new()
        .todo()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("todo"));
}

#[test]
fn test_help_lists_subcommands() {
    Sandbox::new()
        .todo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("done"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_global_flags_accepted() {
    Sandbox::new()
        .todo()
        .args(["--verbose", "--json", "--server", "http://localhost:9999", "--help"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommand Help Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_list_help() {
    Sandbox::new()
        .todo()
        .args(["list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--keyword"))
        .stdout(predicate::str::contains("--order-by"));
}

#[test]
fn test_add_help() {
    Sandbox::new()
        .todo()
        .args(["add", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--content"))
        .stdout(predicate::str::contains("--tag"));
}

#[test]
fn test_auth_help() {
    Sandbox::new()
        .todo()
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("status"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid Input Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    Sandbox::new()
        .todo()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_add_requires_content() {
    Sandbox::new()
        .todo()
        .args(["add", "Buy milk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--content"));
}

#[test]
fn test_delete_requires_ids() {
    Sandbox::new()
        .todo()
        .arg("delete")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_page_zero_rejected() {
    Sandbox::new()
        .todo()
        .args(["list", "--page", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_done_and_undone_conflict() {
    Sandbox::new()
        .todo()
        .args(["edit", "1", "--done", "--undone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_edit_without_fields_fails() {
    Sandbox::new()
        .todo()
        .args(["edit", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to change"));
}

#[test]
fn test_invalid_server_reported() {
    Sandbox::new()
        .todo()
        .args(["--server", "localhost:3000", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("client.server"));
}

#[test]
fn test_unreachable_server_fails_cleanly() {
    // Port 9 (discard) is essentially never served over HTTP.
    Sandbox::new()
        .todo()
        .args(["--server", "http://127.0.0.1:9", "show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Network error"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Subcommand Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_defaults() {
    Sandbox::new()
        .todo()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No config files loaded"))
        .stdout(predicate::str::contains("http://localhost:3000"));
}

#[test]
fn test_config_show_layers() {
    let sandbox = Sandbox::new();
    sandbox.write_user_config("[client]\nserver = \"http://user:3000\"\ntimeout_secs = 42\n");
    sandbox.write_project_config("[client]\nserver = \"http://project:3000\"\n");

    sandbox
        .todo()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://project:3000"))
        .stdout(predicate::str::contains("42s"));
}

#[test]
fn test_config_show_server_flag_wins() {
    let sandbox = Sandbox::new();
    sandbox.write_user_config("[client]\nserver = \"http://user:3000\"\n");

    sandbox
        .todo()
        .args(["--json", "--server", "http://flag:3000", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"server\": \"http://flag:3000\""))
        .stdout(predicate::str::contains("\"serverSource\": \"command line\""));
}

#[test]
fn test_config_show_reports_broken_layer() {
    let sandbox = Sandbox::new();
    sandbox.write_project_config("[client\n");

    sandbox
        .todo()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings:"));
}

#[test]
fn test_config_path() {
    let sandbox = Sandbox::new();
    sandbox
        .todo()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_writes_defaults() {
    let sandbox = Sandbox::new();
    sandbox
        .todo()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    let written = fs::read_to_string(sandbox.config.path().join("config.toml")).unwrap();
    assert!(written.contains("[client]"));
    assert!(written.contains("http://localhost:3000"));

    sandbox
        .todo()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config files:"));
}

#[test]
fn test_config_init_keeps_existing_file() {
    let sandbox = Sandbox::new();
    sandbox.write_user_config("[client]\nserver = \"http://mine:3000\"\n");

    sandbox
        .todo()
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    sandbox
        .todo()
        .args(["config", "init", "--force", "--server", "http://other:4000"])
        .assert()
        .success();
    let written = fs::read_to_string(sandbox.config.path().join("config.toml")).unwrap();
    assert!(written.contains("http://other:4000"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Subcommand Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_auth_status_without_session() {
    Sandbox::new()
        .todo()
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not logged in"));
}

#[test]
fn test_auth_status_reads_saved_session() {
    let sandbox = Sandbox::new();
    fs::write(
        sandbox.data.path().join("session.json"),
        r#"{"accessToken":"tok","refreshToken":"ref","rememberedEmail":"me@example.com"}"#,
    )
    .unwrap();

    sandbox
        .todo()
        .args(["--json", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"loggedIn\": true"))
        .stdout(predicate::str::contains("me@example.com"));
}

#[test]
fn test_logout_keeps_remembered_email() {
    let sandbox = Sandbox::new();
    let session = sandbox.data.path().join("session.json");
    fs::write(
        &session,
        r#"{"accessToken":"tok","refreshToken":"ref","rememberedEmail":"me@example.com"}"#,
    )
    .unwrap();

    sandbox
        .todo()
        .args(["auth", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"))
        .stderr(predicate::str::contains("Session ended").not());

    let contents = fs::read_to_string(&session).unwrap();
    assert!(!contents.contains("accessToken"));
    assert!(contents.contains("me@example.com"));
}

#[test]
fn test_login_without_email_or_memory_fails() {
    Sandbox::new()
        .todo()
        .args(["auth", "login", "--password", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email"));
}
