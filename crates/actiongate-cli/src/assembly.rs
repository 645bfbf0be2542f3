// crates/actiongate-cli/src/assembly.rs
// ============================================================================
// Module: ActionGate Gateway Assembly
// Description: Builds the shared gateway from validated configuration.
// Purpose: Give `serve` and action subcommands the same registry and profiles.
// Dependencies: actiongate-config, actiongate-core
// ============================================================================

//! ## Overview
//! Assembly happens once per process: profiles become session managers with
//! signed-cookie evidence and static credential digests, the actions map
//! becomes a route table of command-backed actions, and `[dispatch]` sets
//! the deadline and lock name. Load-time problems (duplicate routes, unknown
//! profiles, actions without a command) fail the whole assembly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use actiongate_config::ActionGateConfig;
use actiongate_config::ConfigError;
use actiongate_config::load_actions_map;
use actiongate_core::Action;
use actiongate_core::ActionId;
use actiongate_core::ActionsMap;
use actiongate_core::CommandHandler;
use actiongate_core::Dispatcher;
use actiongate_core::Gateway;
use actiongate_core::ProfileRegistry;
use actiongate_core::RegistryError;
use actiongate_core::RouteTable;
use actiongate_core::SessionManager;
use actiongate_core::SignedCookieAuthenticator;
use actiongate_core::StaticCredentials;
use actiongate_core::TracingAuditSink;
use actiongate_core::runtime::random_session_key;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway assembly failures.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The actions map could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The registry rejected a declaration.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A declared action names no program to run.
    #[error("action '{0}' declares no command")]
    MissingCommand(ActionId),
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Builds the gateway described by `config`.
///
/// # Errors
///
/// Returns [`AssemblyError`] when the actions map cannot be loaded or
/// registered.
pub fn build_gateway(config: &ActionGateConfig) -> Result<Gateway, AssemblyError> {
    let profiles = build_profiles(config);
    let routes = match config.actions_map_path() {
        Some(path) => {
            let map = load_actions_map(&path)?;
            build_routes(&map, path.parent())?
        }
        None => RouteTable::new(),
    };
    let dispatcher = Dispatcher::new()
        .with_timeout(config.dispatch.timeout())
        .with_lock_name(config.dispatch.lock_name.clone());
    let gateway = Gateway::new(routes, profiles, dispatcher)?;
    tracing::debug!(
        actions = gateway.routes().len(),
        profiles = gateway.profiles().profiles().count(),
        "gateway assembled"
    );
    Ok(gateway)
}

/// Builds one session manager per configured profile.
///
/// Without a configured secret every profile shares one random per-process
/// key, so evidence does not survive a restart.
#[must_use]
pub fn build_profiles(config: &ActionGateConfig) -> ProfileRegistry {
    let key = config.auth.session_key().unwrap_or_else(random_session_key);
    let mut registry = ProfileRegistry::new();
    for profile in &config.auth.profiles {
        let verifier = Arc::new(StaticCredentials::new(&profile.credential_sha256));
        let mut authenticator = SignedCookieAuthenticator::new(profile.name.as_str(), verifier, key.clone());
        if let Some(max_age) = config.auth.session_max_age() {
            authenticator = authenticator.with_max_age(max_age);
        }
        registry.insert(SessionManager::new(
            profile.name.as_str(),
            Arc::new(authenticator),
            Arc::new(TracingAuditSink),
        ));
    }
    let default_profile = config
        .auth
        .default_profile
        .clone()
        .or_else(|| config.auth.profiles.first().map(|profile| profile.name.clone()));
    if let Some(default_profile) = default_profile {
        registry.set_default(default_profile);
    }
    registry
}

/// Registers every declaration as a command-backed action.
///
/// Commands run in `working_dir` when given, so relative programs resolve
/// next to the actions map.
///
/// # Errors
///
/// Returns [`AssemblyError`] for declarations without a command or rejected
/// by the route table.
pub fn build_routes(map: &ActionsMap, working_dir: Option<&Path>) -> Result<RouteTable, AssemblyError> {
    let mut routes = RouteTable::new();
    for declaration in &map.actions {
        let mut handler = CommandHandler::new(&declaration.command)
            .ok_or_else(|| AssemblyError::MissingCommand(declaration.tid.clone()))?;
        if let Some(dir) = working_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            handler = handler.in_dir(dir);
        }
        routes.register(Action::from_declaration(declaration, Arc::new(handler))?)?;
    }
    Ok(routes)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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

    use actiongate_config::ProfileConfig;
    use actiongate_core::ProfileName;

    use super::*;

    fn map(json: &str) -> ActionsMap {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn first_profile_is_the_default() {
        let mut config = ActionGateConfig::default();
        for name in ["ops", "admin"] {
            config.auth.profiles.push(ProfileConfig {
                name: name.to_string(),
                credential_sha256: Vec::new(),
            });
        }
        let registry = build_profiles(&config);
        assert_eq!(registry.default_profile(), Some(&ProfileName::new("ops")));
        assert!(registry.get(&ProfileName::new("admin")).is_some());
    }

    #[test]
    fn declarations_without_commands_are_rejected() {
        let map = map(r#"{"actions": [{"tid": "ping", "http_routes": ["GET /ping"]}]}"#);
        let error = build_routes(&map, None).unwrap_err();
        assert!(matches!(error, AssemblyError::MissingCommand(tid) if tid.as_str() == "ping"));
    }

    #[test]
    fn duplicate_routes_fail_assembly() {
        let map = map(
            r#"{"actions": [
                {"tid": "a", "http_routes": ["GET /x"], "command": ["true"]},
                {"tid": "b", "http_routes": ["GET /x"], "command": ["true"]}
            ]}"#,
        );
        let error = build_routes(&map, None).unwrap_err();
        assert!(matches!(error, AssemblyError::Registry(RegistryError::DuplicateRoute { .. })));
    }

    #[test]
    fn unknown_profiles_fail_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.json");
        std::fs::write(
            &path,
            r#"{"actions": [{"tid": "admin.reset", "auth_profile": "admin", "command": ["true"]}]}"#,
        )
        .unwrap();
        let mut config = ActionGateConfig::default();
        config.actions.map_path = Some(path.display().to_string());
        let error = build_gateway(&config).err().unwrap();
        assert!(matches!(error, AssemblyError::Registry(RegistryError::UnknownProfile { .. })));
    }
}
