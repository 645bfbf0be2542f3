// crates/actiongate-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Runs the actiongate binary against a throwaway actions map.
// Purpose: Pin stdout, stderr, and exit codes of the CLI surface.
// Dependencies: actiongate-cli binary
// ============================================================================
//! ## Overview
//! Each test writes `actiongate.toml` and `actions.json` into a temp dir and
//! runs the binary with `--config`. Actions are `sh -c` scripts, so the suite
//! is unix-only.

#![cfg(unix)]
#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// SHA-256 of `admin:secret`.
const ADMIN_DIGEST: &str = "901b281c4e0c4007e8526ef27153b79330811e733976d5e65c8343a39e54ec81";

const ACTIONS: &str = r#"{
    "actions": [
        {
            "tid": "greet.hello",
            "http_routes": ["GET /greet"],
            "command": ["sh", "-c", "echo hi"],
            "help": "Say hi"
        },
        {
            "tid": "notes.create",
            "http_routes": ["POST /notes"],
            "arguments": {"title": {"type": "str"}},
            "command": ["sh", "-c", "cat"]
        },
        {
            "tid": "jobs.fail",
            "command": ["sh", "-c", "echo broken >&2; exit 3"]
        },
        {
            "tid": "admin.reset",
            "auth_profile": "admin",
            "lock_required": true,
            "command": ["sh", "-c", "echo \"$ACTIONGATE_PROFILE\""]
        }
    ]
}"#;

fn actiongate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_actiongate"))
}

fn workspace(config: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("actions.json"), ACTIONS).expect("write actions");
    fs::write(dir.path().join("actiongate.toml"), config.trim()).expect("write config");
    dir
}

fn default_workspace() -> TempDir {
    workspace(&format!(
        r#"
[actions]
map_path = "actions.json"

[[auth.profiles]]
name = "admin"
credential_sha256 = ["{ADMIN_DIGEST}"]
"#
    ))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    let config = dir.join("actiongate.toml");
    Command::new(actiongate_bin())
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("ACTIONGATE_CREDENTIALS")
        .env_remove("ACTIONGATE_LANG")
        .env_remove("ACTIONGATE_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("run actiongate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ============================================================================
// SECTION: Builtin Commands
// ============================================================================

#[test]
fn config_validate_accepts_a_consistent_setup() {
    let dir = default_workspace();
    let output = run(dir.path(), &["config", "validate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Configuration is valid");
}

#[test]
fn invalid_config_exits_with_config_status() {
    let dir = workspace(
        r"
[server]
max_body_bytes = 0
",
    );
    let output = run(dir.path(), &["config", "validate"]);
    assert_eq!(output.status.code(), Some(78));
}

#[test]
fn unknown_action_profile_exits_with_config_status() {
    let dir = workspace(
        r#"
[actions]
map_path = "actions.json"
"#,
    );
    let output = run(dir.path(), &["config", "validate"]);
    assert_eq!(output.status.code(), Some(78));
    assert!(stderr(&output).contains("admin"));
}

#[test]
fn actions_listing_shows_routes_and_gates() {
    let dir = default_workspace();
    let output = run(dir.path(), &["actions"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let listing = stdout(&output);
    assert!(listing.contains("greet.hello  [GET /greet]"));
    assert!(listing.contains("Say hi"));
    assert!(listing.contains("admin.reset  (requires profile admin)  (locked)"));
}

// ============================================================================
// SECTION: Action Invocation
// ============================================================================

#[test]
fn command_path_runs_the_matching_action() {
    let dir = default_workspace();
    let output = run(dir.path(), &["greet", "hello"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "hi");
}

#[test]
fn json_output_renders_the_action_result() {
    let dir = default_workspace();
    let output = run(dir.path(), &["--output-as", "json", "notes", "create", "groceries"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("\"title\": \"groceries\""));
}

#[test]
fn none_output_prints_nothing() {
    let dir = default_workspace();
    let output = run(dir.path(), &["--output-as", "none", "greet", "hello"]);
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn unknown_command_path_is_a_usage_error() {
    let dir = default_workspace();
    let output = run(dir.path(), &["nope"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("nope"));
}

#[test]
fn missing_required_argument_is_a_usage_error() {
    let dir = default_workspace();
    let output = run(dir.path(), &["notes", "create"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn failing_command_is_a_domain_error() {
    let dir = default_workspace();
    let output = run(dir.path(), &["jobs", "fail"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("broken"));
}

#[test]
fn gated_action_needs_credentials() {
    let dir = default_workspace();
    let anonymous = run(dir.path(), &["admin", "reset"]);
    assert_eq!(anonymous.status.code(), Some(3));

    let rejected = run(dir.path(), &["--credentials", "admin:wrong", "admin", "reset"]);
    assert_eq!(rejected.status.code(), Some(3));

    let accepted = run(dir.path(), &["--credentials", "admin:secret", "admin", "reset"]);
    assert!(accepted.status.success(), "stderr: {}", stderr(&accepted));
    assert_eq!(stdout(&accepted), "admin");
}

#[test]
fn lang_flag_localizes_errors() {
    let dir = default_workspace();
    let output = run(dir.path(), &["--lang", "fr", "nope"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Aucune action"));
}
