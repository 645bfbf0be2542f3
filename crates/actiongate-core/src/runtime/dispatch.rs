// crates/actiongate-core/src/runtime/dispatch.rs
// ============================================================================
// Module: ActionGate Dispatcher
// Description: Runs actions under a deadline and the optional global lock.
// Purpose: Bound every invocation and normalize every failure it can produce.
// Dependencies: tokio, tracing
// ============================================================================

//! ## Overview
//! [`Dispatcher::dispatch`] spawns the handler on its own task. The deadline
//! covers both the wait for the global lock and the handler itself; when it
//! elapses the task is aborted, which drops the lock guard and any child
//! process the handler owns.
//!
//! Domain errors pass through untouched. Internal errors, panics, and task
//! cancellations are logged with their trace and reported as
//! [`GatewayError::Internal`] carrying the route and received arguments.
//!
//! Lifecycle events are published on a broadcast channel; a slow or absent
//! subscriber never blocks dispatch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinError;

use crate::core::arguments::CanonicalArgumentSet;
use crate::core::error::ActionError;
use crate::core::error::GatewayError;
use crate::core::identifiers::ActionId;
use crate::core::result::ResultValue;
use crate::interfaces::ActionContext;
use crate::msg;
use crate::runtime::routes::Action;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default dispatch deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default name of the global lock.
pub const DEFAULT_LOCK_NAME: &str = "actiongate";

/// Capacity of the lifecycle event channel.
const EVENT_CAPACITY: usize = 256;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Dispatch lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// The action task was spawned.
    Started {
        /// Action identifier.
        tid: ActionId,
        /// Originating interface label.
        interface: &'static str,
    },
    /// The action returned a result.
    Succeeded {
        /// Action identifier.
        tid: ActionId,
        /// Wall-clock duration.
        elapsed_ms: u64,
    },
    /// The action failed or timed out.
    Failed {
        /// Action identifier.
        tid: ActionId,
        /// Error classification.
        kind: &'static str,
        /// Wall-clock duration.
        elapsed_ms: u64,
    },
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Invokes actions with a deadline and the named global lock.
#[derive(Debug)]
pub struct Dispatcher {
    /// Global lock for lock-requiring actions.
    lock: Arc<Mutex<()>>,
    /// Lock name used in diagnostics.
    lock_name: String,
    /// Deadline used when a call supplies none.
    timeout: Duration,
    /// Lifecycle event channel.
    events: broadcast::Sender<DispatchEvent>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default deadline and lock name.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            lock: Arc::new(Mutex::new(())),
            lock_name: DEFAULT_LOCK_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            events,
        }
    }

    /// Sets the default deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the lock name.
    #[must_use]
    pub fn with_lock_name(mut self, lock_name: impl Into<String>) -> Self {
        self.lock_name = lock_name.into();
        self
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.events.subscribe()
    }

    /// Runs `action` with `arguments`.
    ///
    /// `route` labels internal failures: the matched `METHOD /path` for HTTP
    /// calls, the command path for CLI calls.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ActionTimeout`] when the deadline elapses,
    /// [`GatewayError::Domain`] for handler domain errors, and
    /// [`GatewayError::Internal`] for every other failure.
    pub async fn dispatch(
        &self,
        action: Arc<Action>,
        route: &str,
        arguments: CanonicalArgumentSet,
        context: ActionContext,
        timeout: Option<Duration>,
    ) -> Result<ResultValue, GatewayError> {
        let deadline = timeout.unwrap_or(self.timeout);
        let tid = action.tid.clone();
        let received = arguments.to_json();
        self.publish(DispatchEvent::Started {
            tid: tid.clone(),
            interface: context.interface.as_str(),
        });

        let lock = action.lock_required.then(|| Arc::clone(&self.lock));
        let lock_name = self.lock_name.clone();
        let handler = Arc::clone(&action.handler);
        let started = Instant::now();
        let mut task = tokio::spawn(async move {
            let _guard = match lock {
                Some(lock) => {
                    tracing::debug!("{}", crate::t!("dispatch.lock_wait", lock = lock_name));
                    Some(lock.lock_owned().await)
                }
                None => None,
            };
            handler.invoke(context, arguments).await
        });

        let outcome = match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(ActionError::Domain(error)))) => Err(GatewayError::Domain(error)),
            Ok(Ok(Err(ActionError::Internal(trace)))) => Err(internal_failure(&tid, route, received, trace)),
            Ok(Err(join_error)) => Err(internal_failure(&tid, route, received, join_trace(join_error))),
            Err(_) => {
                task.abort();
                tracing::warn!(tid = %tid, millis = deadline.as_millis(), "action timed out");
                Err(GatewayError::ActionTimeout(msg!(
                    "dispatch.timeout",
                    tid = tid,
                    millis = deadline.as_millis()
                )))
            }
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.publish(match &outcome {
            Ok(_) => DispatchEvent::Succeeded {
                tid,
                elapsed_ms,
            },
            Err(error) => DispatchEvent::Failed {
                tid,
                kind: error.kind().as_str(),
                elapsed_ms,
            },
        });
        outcome
    }

    /// Publishes an event; having no subscribers is not an error.
    fn publish(&self, event: DispatchEvent) {
        let _ = self.events.send(event);
    }
}

// ============================================================================
// SECTION: Failure Normalization
// ============================================================================

/// Logs an internal failure and wraps it for translation.
fn internal_failure(
    tid: &ActionId,
    route: &str,
    arguments: serde_json::Value,
    trace: String,
) -> GatewayError {
    tracing::error!(tid = %tid, route = %route, trace = %trace, "action failed");
    GatewayError::internal(msg!("dispatch.internal", tid = tid), route, arguments, trace)
}

/// Extracts a trace from a panicked or cancelled task.
fn join_trace(error: JoinError) -> String {
    if error.is_cancelled() {
        return "action task cancelled".to_string();
    }
    match error.try_into_panic() {
        Ok(payload) => format!("action panicked: {}", panic_message(payload.as_ref())),
        Err(error) => error.to_string(),
    }
}

/// Renders a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
