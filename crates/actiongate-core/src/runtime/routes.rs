// crates/actiongate-core/src/runtime/routes.rs
// ============================================================================
// Module: ActionGate Route Table
// Description: Registry of actions keyed by tid and by HTTP route.
// Purpose: Resolve requests from either surface to one immutable action.
// Dependencies: indexmap, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The [`RouteTable`] owns every registered [`Action`]. Registration is the
//! only mutation and happens at load time; all conflicts (duplicate routes,
//! duplicate tids, routes that are all invalid) fail registration rather than
//! surfacing at request time.
//!
//! Route strings have the form `METHOD /path` with `METHOD` in
//! `GET|POST|PUT|DELETE` and a path of at least one non-space character after
//! the leading slash. Path segments written `<name>` capture the request
//! segment as the transport parameter `name`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::error::GatewayError;
use crate::core::error::RegistryError;
use crate::core::identifiers::ActionId;
use crate::core::identifiers::ProfileName;
use crate::core::schema::ActionDeclaration;
use crate::core::schema::ArgumentSchema;
use crate::interfaces::ActionHandler;
use crate::msg;

// ============================================================================
// SECTION: Routes
// ============================================================================

/// HTTP methods an action route may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Parses an upper-case method name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(method, path)` pair identifying a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template.
    pub path: String,
}

impl RouteKey {
    /// Parses `METHOD /path`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (method, path) = raw.split_once(' ')?;
        let method = HttpMethod::parse(method)?;
        let rest = path.strip_prefix('/')?;
        if rest.is_empty() || path.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self {
            method,
            path: path.to_string(),
        })
    }

    /// Returns true when the path contains `<name>` captures.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.path.split('/').any(is_capture)
    }

    /// Matches a request path against this template, returning captures.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let template: Vec<&str> = self.path.split('/').collect();
        let actual: Vec<&str> = path.split('/').collect();
        if template.len() != actual.len() {
            return None;
        }
        let mut captures = Vec::new();
        for (expected, segment) in template.iter().zip(actual.iter()) {
            if is_capture(expected) {
                if segment.is_empty() {
                    return None;
                }
                let name = &expected[1 .. expected.len() - 1];
                captures.push((name.to_string(), (*segment).to_string()));
            } else if expected != segment {
                return None;
            }
        }
        Some(captures)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Returns true for a `<name>` template segment.
fn is_capture(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('<') && segment.ends_with('>')
}

// ============================================================================
// SECTION: Actions
// ============================================================================

/// A registered action.
#[derive(Clone)]
pub struct Action {
    /// Hierarchical identifier.
    pub tid: ActionId,
    /// Argument schema.
    pub schema: ArgumentSchema,
    /// Profile that must approve callers.
    pub auth_profile: Option<ProfileName>,
    /// Whether dispatch serializes on the global lock.
    pub lock_required: bool,
    /// HTTP routes; empty for CLI-only actions.
    pub routes: Vec<RouteKey>,
    /// Help text.
    pub help: Option<String>,
    /// Implementation.
    pub handler: Arc<dyn ActionHandler>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("tid", &self.tid)
            .field("auth_profile", &self.auth_profile)
            .field("lock_required", &self.lock_required)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Creates an unauthenticated, lock-free, CLI-only action.
    #[must_use]
    pub fn new(
        tid: impl Into<ActionId>,
        schema: ArgumentSchema,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        Self {
            tid: tid.into(),
            schema,
            auth_profile: None,
            lock_required: false,
            routes: Vec::new(),
            help: None,
            handler,
        }
    }

    /// Adds an HTTP route.
    #[must_use]
    pub fn with_route(mut self, method: HttpMethod, path: impl Into<String>) -> Self {
        self.routes.push(RouteKey {
            method,
            path: path.into(),
        });
        self
    }

    /// Requires `profile` to approve callers.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<ProfileName>) -> Self {
        self.auth_profile = Some(profile.into());
        self
    }

    /// Sets the lock requirement.
    #[must_use]
    pub fn with_lock(mut self, lock_required: bool) -> Self {
        self.lock_required = lock_required;
        self
    }

    /// Builds an action from a registry declaration.
    ///
    /// Invalid route strings are logged and skipped; when routes were
    /// declared but none is valid, registration fails.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for malformed tids, schema errors, or
    /// declarations whose routes are all invalid.
    pub fn from_declaration(
        declaration: &ActionDeclaration,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<Self, RegistryError> {
        let tid = declaration.tid.clone();
        if !tid.is_well_formed() {
            return Err(RegistryError::InvalidAction(tid));
        }
        let schema = ArgumentSchema::from_declarations(&declaration.arguments).map_err(|source| {
            RegistryError::Schema {
                tid: tid.clone(),
                source,
            }
        })?;
        let mut routes = Vec::with_capacity(declaration.http_routes.len());
        for raw in &declaration.http_routes {
            match RouteKey::parse(raw) {
                Some(route) => routes.push(route),
                None => tracing::warn!(
                    tid = %tid,
                    route = %raw,
                    "{}",
                    crate::t!("route.invalid", route = raw, tid = tid)
                ),
            }
        }
        if routes.is_empty() && !declaration.http_routes.is_empty() {
            return Err(RegistryError::NoValidRoute(tid));
        }
        Ok(Self {
            tid,
            schema,
            auth_profile: declaration.profile().cloned(),
            lock_required: declaration.lock_required,
            routes,
            help: declaration.help.clone(),
            handler,
        })
    }
}

// ============================================================================
// SECTION: Route Table
// ============================================================================

/// Action resolved from an HTTP request.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// Matched action.
    pub action: Arc<Action>,
    /// Route that matched.
    pub route: RouteKey,
    /// Captured `<name>` segments.
    pub path_params: Vec<(String, String)>,
}

/// Registry of actions.
#[derive(Debug, Default)]
pub struct RouteTable {
    /// Actions keyed by tid, in registration order.
    actions: IndexMap<ActionId, Arc<Action>>,
    /// Exact routes.
    exact: HashMap<RouteKey, ActionId>,
    /// Template routes, in registration order.
    templates: Vec<(RouteKey, ActionId)>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateAction`] when the tid exists and
    /// [`RegistryError::DuplicateRoute`] when any route is already owned.
    pub fn register(&mut self, action: Action) -> Result<(), RegistryError> {
        if self.actions.contains_key(&action.tid) {
            return Err(RegistryError::DuplicateAction(action.tid));
        }
        if !action.tid.is_well_formed() {
            return Err(RegistryError::InvalidAction(action.tid));
        }
        let mut seen: Vec<&RouteKey> = Vec::new();
        for route in &action.routes {
            let existing = self
                .exact
                .get(route)
                .or_else(|| self.templates.iter().find(|(key, _)| key == route).map(|(_, tid)| tid))
                .or_else(|| seen.contains(&route).then_some(&action.tid));
            if let Some(existing) = existing {
                return Err(RegistryError::DuplicateRoute {
                    route: route.to_string(),
                    existing: existing.clone(),
                });
            }
            seen.push(route);
        }
        for route in &action.routes {
            if route.is_template() {
                self.templates.push((route.clone(), action.tid.clone()));
            } else {
                self.exact.insert(route.clone(), action.tid.clone());
            }
        }
        self.actions.insert(action.tid.clone(), Arc::new(action));
        Ok(())
    }

    /// Resolves an HTTP request; exact routes win over templates.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RouteNotFound`] when nothing matches.
    pub fn resolve(&self, method: HttpMethod, path: &str) -> Result<ResolvedRoute, GatewayError> {
        let key = RouteKey {
            method,
            path: path.to_string(),
        };
        if let Some(tid) = self.exact.get(&key) {
            return self.resolve_by_tid(tid).map(|action| ResolvedRoute {
                action,
                route: key,
                path_params: Vec::new(),
            });
        }
        for (route, tid) in &self.templates {
            if route.method != method {
                continue;
            }
            if let Some(path_params) = route.captures(path) {
                return self.resolve_by_tid(tid).map(|action| ResolvedRoute {
                    action,
                    route: route.clone(),
                    path_params,
                });
            }
        }
        Err(GatewayError::RouteNotFound(msg!("route.not_found", target = key)))
    }

    /// Resolves an action by tid.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RouteNotFound`] for unknown tids.
    pub fn resolve_by_tid(&self, tid: &ActionId) -> Result<Arc<Action>, GatewayError> {
        self.actions
            .get(tid)
            .cloned()
            .ok_or_else(|| GatewayError::RouteNotFound(msg!("route.not_found", target = tid)))
    }

    /// Resolves the longest prefix of CLI `words` naming an action.
    ///
    /// Returns the action and the number of words consumed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RouteNotFound`] when no prefix names an action.
    pub fn resolve_cli<S: AsRef<str>>(
        &self,
        words: &[S],
    ) -> Result<(Arc<Action>, usize), GatewayError> {
        for consumed in (1 ..= words.len()).rev() {
            let tid = ActionId::from_segments(&words[.. consumed]);
            if let Some(action) = self.actions.get(&tid) {
                return Ok((Arc::clone(action), consumed));
            }
        }
        let command: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
        Err(GatewayError::RouteNotFound(msg!("cli.action.not_found", command = command.join(" "))))
    }

    /// Iterates actions in registration order.
    pub fn actions(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.actions.values()
    }

    /// Returns the number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true when no action is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
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

    use super::*;
    use crate::core::error::ActionError;
    use crate::core::result::ResultValue;
    use crate::interfaces::handler_fn;

    fn handler() -> Arc<dyn ActionHandler> {
        handler_fn(|_, _| async { Ok::<_, ActionError>(ResultValue::Null) })
    }

    #[test]
    fn route_strings_follow_method_path_form() {
        assert!(RouteKey::parse("GET /ping").is_some());
        assert!(RouteKey::parse("DELETE /users/<name>").is_some());
        assert!(RouteKey::parse("PATCH /ping").is_none());
        assert!(RouteKey::parse("get /ping").is_none());
        assert!(RouteKey::parse("GET ping").is_none());
        assert!(RouteKey::parse("GET /").is_none());
        assert!(RouteKey::parse("GET /a b").is_none());
    }

    #[test]
    fn duplicate_route_fails_registration() {
        let mut table = RouteTable::new();
        table
            .register(Action::new("a", ArgumentSchema::default(), handler()).with_route(HttpMethod::Get, "/x"))
            .unwrap();
        let error = table
            .register(Action::new("b", ArgumentSchema::default(), handler()).with_route(HttpMethod::Get, "/x"))
            .unwrap_err();
        assert_eq!(
            error,
            RegistryError::DuplicateRoute {
                route: "GET /x".to_string(),
                existing: ActionId::new("a"),
            }
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn same_path_different_method_is_allowed() {
        let mut table = RouteTable::new();
        table
            .register(Action::new("a", ArgumentSchema::default(), handler()).with_route(HttpMethod::Get, "/x"))
            .unwrap();
        table
            .register(Action::new("b", ArgumentSchema::default(), handler()).with_route(HttpMethod::Post, "/x"))
            .unwrap();
        assert_eq!(table.resolve(HttpMethod::Post, "/x").unwrap().action.tid.as_str(), "b");
    }

    #[test]
    fn templates_capture_segments_and_exact_wins() {
        let mut table = RouteTable::new();
        table
            .register(
                Action::new("user.info", ArgumentSchema::default(), handler())
                    .with_route(HttpMethod::Get, "/users/<username>"),
            )
            .unwrap();
        table
            .register(
                Action::new("user.me", ArgumentSchema::default(), handler())
                    .with_route(HttpMethod::Get, "/users/me"),
            )
            .unwrap();
        let resolved = table.resolve(HttpMethod::Get, "/users/alice").unwrap();
        assert_eq!(resolved.action.tid.as_str(), "user.info");
        assert_eq!(resolved.path_params, vec![("username".to_string(), "alice".to_string())]);
        assert_eq!(table.resolve(HttpMethod::Get, "/users/me").unwrap().action.tid.as_str(), "user.me");
        assert!(matches!(
            table.resolve(HttpMethod::Get, "/users/"),
            Err(GatewayError::RouteNotFound(_))
        ));
    }

    #[test]
    fn cli_words_resolve_longest_prefix() {
        let mut table = RouteTable::new();
        table.register(Action::new("user", ArgumentSchema::default(), handler())).unwrap();
        table.register(Action::new("user.create", ArgumentSchema::default(), handler())).unwrap();
        let (action, consumed) = table.resolve_cli(&["user", "create", "alice"]).unwrap();
        assert_eq!(action.tid.as_str(), "user.create");
        assert_eq!(consumed, 2);
        assert!(table.resolve_cli(&["nope"]).is_err());
    }

    #[test]
    fn tids_resolve_without_a_route() {
        let mut table = RouteTable::new();
        table.register(Action::new("jobs.sweep", ArgumentSchema::default(), handler())).unwrap();
        let action = table.resolve_by_tid(&ActionId::new("jobs.sweep")).unwrap();
        assert!(action.routes.is_empty());
        assert!(matches!(
            table.resolve_by_tid(&ActionId::new("jobs.nope")),
            Err(GatewayError::RouteNotFound(_))
        ));
    }

    #[test]
    fn declarations_skip_invalid_routes_but_need_one_valid() {
        let mut declaration: ActionDeclaration = serde_json::from_value(serde_json::json!({
            "tid": "ping",
            "http_routes": ["GET /ping", "FETCH /ping"],
        }))
        .unwrap();
        let action = Action::from_declaration(&declaration, handler()).unwrap();
        assert_eq!(action.routes.len(), 1);

        declaration.http_routes = vec!["bogus".to_string()];
        assert_eq!(
            Action::from_declaration(&declaration, handler()).unwrap_err(),
            RegistryError::NoValidRoute(ActionId::new("ping"))
        );

        declaration.http_routes.clear();
        assert!(Action::from_declaration(&declaration, handler()).unwrap().routes.is_empty());
    }
}
