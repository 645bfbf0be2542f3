// crates/actiongate-core/src/runtime/gateway.rs
// ============================================================================
// Module: ActionGate Gateway
// Description: Request pipeline shared by the CLI and HTTP surfaces.
// Purpose: Authorize, normalize, and dispatch through one code path.
// Dependencies: crate::runtime
// ============================================================================

//! ## Overview
//! [`Gateway`] owns the route table, the profile registry, and the
//! dispatcher. Surfaces resolve an action, then call
//! [`Gateway::authorize`] (HTTP evidence) or [`Gateway::authenticate_cli`]
//! (per-invocation credentials), then [`Gateway::invoke_http`] or
//! [`Gateway::invoke_cli`]. Both invoke paths end in the same validating
//! parser and the same dispatcher.
//!
//! Each HTTP invocation owns a fresh staging area; it is removed when the
//! invocation returns, whatever the outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::core::error::GatewayError;
use crate::core::error::RegistryError;
use crate::core::result::ResultValue;
use crate::core::session::Session;
use crate::core::transport::TransportParams;
use crate::core::transport::TransportValue;
use crate::i18n::Locale;
use crate::interfaces::ActionContext;
use crate::interfaces::Credentials;
use crate::interfaces::Interface;
use crate::msg;
use crate::runtime::auth::ProfileRegistry;
use crate::runtime::dispatch::Dispatcher;
use crate::runtime::normalize::NormalizeError;
use crate::runtime::normalize::normalize;
use crate::runtime::parser::ArgumentParser;
use crate::runtime::parser::lex_cli;
use crate::runtime::routes::Action;
use crate::runtime::routes::ResolvedRoute;
use crate::runtime::routes::RouteTable;
use crate::runtime::staging::StagingArea;

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Shared invocation pipeline.
pub struct Gateway {
    /// Registered actions.
    routes: RouteTable,
    /// Session managers by profile.
    profiles: ProfileRegistry,
    /// Deadline and lock enforcement.
    dispatcher: Dispatcher,
    /// Parent directory for staging areas; system temp when `None`.
    staging_root: Option<PathBuf>,
}

impl Gateway {
    /// Assembles a gateway, checking that every action names a known profile.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProfile`] when an action references a
    /// profile that is not configured.
    pub fn new(
        routes: RouteTable,
        profiles: ProfileRegistry,
        dispatcher: Dispatcher,
    ) -> Result<Self, RegistryError> {
        profiles.check_actions(&routes)?;
        Ok(Self {
            routes,
            profiles,
            dispatcher,
            staging_root: None,
        })
    }

    /// Stages uploads under `root`.
    #[must_use]
    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = Some(root.into());
        self
    }

    /// Returns the route table.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Returns the profile registry.
    #[must_use]
    pub const fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Checks caller evidence against the action's profile.
    ///
    /// Actions without a profile skip authentication and yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Authentication`] when evidence is missing or invalid.
    pub fn authorize(
        &self,
        action: &Action,
        evidence: Option<&str>,
        interface: Interface,
    ) -> Result<Option<Session>, GatewayError> {
        let Some(profile) = &action.auth_profile else {
            return Ok(None);
        };
        let manager = self
            .profiles
            .get(profile)
            .ok_or_else(|| GatewayError::authentication("auth.unable_authenticate"))?;
        manager.authorize(evidence, action.tid.as_str(), interface).map(Some)
    }

    /// Logs a CLI caller in for one invocation when the action requires a profile.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Authentication`] when credentials are missing
    /// or rejected.
    pub async fn authenticate_cli(
        &self,
        action: &Action,
        credentials: Option<&Credentials>,
    ) -> Result<Option<Session>, GatewayError> {
        let Some(profile) = &action.auth_profile else {
            return Ok(None);
        };
        let credentials = credentials.ok_or_else(|| {
            GatewayError::Authentication(msg!(
                "cli.credentials.missing",
                tid = action.tid,
                profile = profile
            ))
        })?;
        let manager = self
            .profiles
            .get(profile)
            .ok_or_else(|| GatewayError::authentication("auth.unable_authenticate"))?;
        let issued = manager.login(credentials, None, Interface::Cli).await?;
        Ok(Some(issued.session))
    }

    /// Normalizes HTTP parameters and dispatches the resolved action.
    ///
    /// Path captures are added to `params` unless the request already named
    /// them. Normalization stages uploads on disk, so it runs on the blocking
    /// pool, as does removal of the staging area.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for validation, staging, dispatch, or action failures.
    pub async fn invoke_http(
        &self,
        resolved: &ResolvedRoute,
        mut params: TransportParams,
        session: Option<Session>,
        locale: Locale,
        timeout: Option<Duration>,
    ) -> Result<ResultValue, GatewayError> {
        let action = Arc::clone(&resolved.action);
        let route = resolved.route.to_string();
        for (name, value) in &resolved.path_params {
            params.insert_if_absent(name.clone(), TransportValue::Text(value.clone()));
        }
        let received = params.to_json();
        let staging = match &self.staging_root {
            Some(root) => StagingArea::in_dir(root),
            None => StagingArea::new(),
        };

        let owner = Arc::clone(&action);
        let (staging, normalized) = tokio::task::spawn_blocking(move || {
            let mut staging = staging;
            let normalized = normalize(&params, &owner.schema, &mut staging);
            (staging, normalized)
        })
        .await
        .map_err(|error| staging_failure(&action, &route, received.clone(), error.to_string()))?;
        let arguments = normalized.map_err(|error| match error {
            NormalizeError::Validation(error) => GatewayError::from(error),
            NormalizeError::Staging(error) => staging_failure(&action, &route, received, error.to_string()),
        });

        let outcome = match arguments {
            Ok(arguments) => {
                let context = invocation_context(&action, Interface::Api, session, locale);
                self.dispatcher.dispatch(Arc::clone(&action), &route, arguments, context, timeout).await
            }
            Err(error) => Err(error),
        };
        if staging.path().is_some() {
            match tokio::task::spawn_blocking(move || staging.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => tracing::warn!(tid = %action.tid, error = %error, "staging cleanup failed"),
                Err(error) => tracing::warn!(tid = %action.tid, error = %error, "staging cleanup task failed"),
            }
        }
        outcome
    }

    /// Parses CLI words for `action` and dispatches it.
    ///
    /// Internal failures are labelled with the command path (`backup restore`).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for validation, dispatch, or action failures.
    pub async fn invoke_cli<S: AsRef<str>>(
        &self,
        action: &Arc<Action>,
        words: &[S],
        session: Option<Session>,
        locale: Locale,
        timeout: Option<Duration>,
    ) -> Result<ResultValue, GatewayError> {
        let tokens = lex_cli(words, &action.schema)?;
        let arguments = ArgumentParser::new(&action.schema).parse(&tokens)?;
        let command_path = action.tid.as_str().replace('.', " ");
        let context = invocation_context(action, Interface::Cli, session, locale);
        self.dispatcher.dispatch(Arc::clone(action), &command_path, arguments, context, timeout).await
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the handler context for one invocation.
fn invocation_context(
    action: &Action,
    interface: Interface,
    session: Option<Session>,
    locale: Locale,
) -> ActionContext {
    ActionContext {
        tid: action.tid.clone(),
        interface,
        session,
        locale,
    }
}

/// Logs an upload staging failure and wraps it for translation.
fn staging_failure(action: &Action, route: &str, received: serde_json::Value, trace: String) -> GatewayError {
    tracing::error!(tid = %action.tid, route = %route, error = %trace, "upload staging failed");
    GatewayError::internal(msg!("dispatch.internal", tid = action.tid), route, received, trace)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
