//! Action map loading tests for actiongate-config.
// crates/actiongate-config/tests/actions_loading.rs
// =============================================================================
// Module: Action Map Loading Tests
// Description: Validate JSON and TOML action registries.
// Purpose: Ensure both encodings yield identical declarations in order.
// =============================================================================

use std::fs;

use actiongate_config::ActionsFormat;
use actiongate_config::ConfigError;
use actiongate_config::load_actions_map;
use actiongate_config::parse_actions_map;

type TestResult = Result<(), String>;

const JSON_MAP: &str = r#"{
  "actions": [
    {
      "tid": "backup.create",
      "http_routes": ["POST /backup"],
      "auth_profile": "admin",
      "lock_required": true,
      "arguments": {
        "name": {"type": "str"},
        "-t": {"type": "append", "full": "tag"},
        "--force": {"type": "store_true"}
      },
      "command": ["/usr/local/bin/backup", "create"]
    }
  ]
}"#;

const TOML_MAP: &str = r#"
[[actions]]
tid = "backup.create"
http_routes = ["POST /backup"]
auth_profile = "admin"
lock_required = true
command = ["/usr/local/bin/backup", "create"]

[actions.arguments]
name = { type = "str" }
"-t" = { type = "append", full = "tag" }
"--force" = { type = "store_true" }
"#;

#[test]
fn json_and_toml_yield_the_same_declarations() -> TestResult {
    let json = parse_actions_map(JSON_MAP, ActionsFormat::Json).map_err(|err| err.to_string())?;
    let toml = parse_actions_map(TOML_MAP, ActionsFormat::Toml).map_err(|err| err.to_string())?;
    if json != toml {
        return Err("encodings disagree".to_string());
    }
    let keys: Vec<&str> = json.actions[0].arguments.keys().map(String::as_str).collect();
    if keys != ["name", "-t", "--force"] {
        return Err(format!("argument order lost: {}", keys.join(",")));
    }
    Ok(())
}

#[test]
fn unknown_extension_is_rejected() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("actions.yaml");
    fs::write(&path, "actions: []").map_err(|err| err.to_string())?;
    match load_actions_map(&path) {
        Err(ConfigError::Invalid(message)) if message.contains(".json or .toml") => Ok(()),
        _ => Err("expected invalid format".to_string()),
    }
}

#[test]
fn loads_from_disk() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("actions.json");
    fs::write(&path, JSON_MAP).map_err(|err| err.to_string())?;
    let map = load_actions_map(&path).map_err(|err| err.to_string())?;
    if map.actions.len() != 1 || !map.actions[0].lock_required {
        return Err("declaration not loaded".to_string());
    }
    Ok(())
}

#[test]
fn unknown_declaration_fields_are_parse_errors() {
    let result = parse_actions_map(r#"{"actions": [{"tid": "x", "route": "GET /x"}]}"#, ActionsFormat::Json);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}
