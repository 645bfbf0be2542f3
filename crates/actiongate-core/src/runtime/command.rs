// crates/actiongate-core/src/runtime/command.rs
// ============================================================================
// Module: ActionGate Command Handler
// Description: Action handler backed by an external process.
// Purpose: Bind declared actions to programs without linking their code.
// Dependencies: tokio (process), serde_json
// ============================================================================

//! ## Overview
//! [`CommandHandler`] spawns the declared program, writes the canonical
//! argument set to stdin as one JSON object, and reads stdout as JSON,
//! falling back to plain text. A non-zero exit status is a domain failure
//! carrying stderr. The child is killed when the dispatch task is aborted.
//!
//! The child sees `ACTIONGATE_TID`, `ACTIONGATE_INTERFACE`,
//! `ACTIONGATE_LOCALE`, and, for authenticated calls, `ACTIONGATE_PROFILE`
//! and `ACTIONGATE_SESSION_ID`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::arguments::CanonicalArgumentSet;
use crate::core::error::ActionError;
use crate::core::error::DomainError;
use crate::core::result::ResultValue;
use crate::interfaces::ActionContext;
use crate::interfaces::ActionHandler;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status reported when a command exits unsuccessfully.
pub const COMMAND_FAILURE_STATUS: u16 = 500;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Runs an external program per invocation.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// Program to execute.
    program: String,
    /// Fixed arguments.
    args: Vec<String>,
    /// Working directory; inherited when `None`.
    working_dir: Option<PathBuf>,
}

impl CommandHandler {
    /// Creates a handler from `[program, args...]`; returns `None` when empty.
    #[must_use]
    pub fn new<S: AsRef<str>>(command: &[S]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.as_ref().to_string(),
            args: args.iter().map(|arg| arg.as_ref().to_string()).collect(),
            working_dir: None,
        })
    }

    /// Runs the program in `dir`.
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl ActionHandler for CommandHandler {
    async fn invoke(
        &self,
        context: ActionContext,
        arguments: CanonicalArgumentSet,
    ) -> Result<ResultValue, ActionError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .env("ACTIONGATE_TID", context.tid.as_str())
            .env("ACTIONGATE_INTERFACE", context.interface.as_str())
            .env("ACTIONGATE_LOCALE", context.locale.as_str());
        if let Some(session) = &context.session {
            command
                .env("ACTIONGATE_PROFILE", session.profile.as_str())
                .env("ACTIONGATE_SESSION_ID", session.id.as_str());
        }
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|error| {
            ActionError::Internal(crate::t!("command.spawn_failed", program = self.program, error = error))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = arguments.to_json().to_string();
            // Children that ignore stdin close the pipe early.
            if let Err(error) = stdin.write_all(payload.as_bytes()).await {
                tracing::debug!(program = %self.program, error = %error, "command did not read stdin");
            }
        }

        let output = child.wait_with_output().await.map_err(|error| {
            ActionError::Internal(crate::t!("command.spawn_failed", program = self.program, error = error))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let status = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |code| code.to_string());
            tracing::info!(program = %self.program, status = %status, "command failed");
            return Err(DomainError::text(
                COMMAND_FAILURE_STATUS,
                crate::t!("command.failed", program = self.program, status = status, stderr = stderr),
            )
            .into());
        }
        Ok(parse_stdout(&output.stdout))
    }
}

/// Parses stdout as JSON, falling back to trimmed text; empty output is null.
fn parse_stdout(stdout: &[u8]) -> ResultValue {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ResultValue::Null;
    }
    serde_json::from_str::<serde_json::Value>(trimmed)
        .map_or_else(|_| ResultValue::Text(trimmed.to_string()), ResultValue::from)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(all(test, unix))]
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
    use crate::core::arguments::ArgumentValue;
    use crate::core::identifiers::ActionId;
    use crate::i18n::Locale;
    use crate::interfaces::Interface;

    fn context() -> ActionContext {
        ActionContext {
            tid: ActionId::new("demo.run"),
            interface: Interface::Cli,
            session: None,
            locale: Locale::En,
        }
    }

    fn sh(script: &str) -> CommandHandler {
        CommandHandler::new(&["sh", "-c", script]).unwrap()
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandHandler::new::<&str>(&[]).is_none());
    }

    #[tokio::test]
    async fn arguments_arrive_as_json_on_stdin() {
        let mut arguments = CanonicalArgumentSet::new();
        arguments.push("echo", ArgumentValue::Text("hello".into()));
        let value = sh("cat").invoke(context(), arguments).await.unwrap();
        assert_eq!(value.to_json(), serde_json::json!({"echo": "hello"}));
    }

    #[tokio::test]
    async fn plain_stdout_becomes_text() {
        let value = sh("echo \"$ACTIONGATE_TID\"")
            .invoke(context(), CanonicalArgumentSet::new())
            .await
            .unwrap();
        assert_eq!(value, ResultValue::Text("demo.run".into()));
    }

    #[tokio::test]
    async fn failing_command_is_a_domain_error() {
        let error = sh("echo nope >&2; exit 3")
            .invoke(context(), CanonicalArgumentSet::new())
            .await
            .unwrap_err();
        let ActionError::Domain(error) = error else {
            panic!("expected domain error");
        };
        assert_eq!(error.status, COMMAND_FAILURE_STATUS);
        assert!(error.payload.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn missing_program_is_internal() {
        let handler = CommandHandler::new(&["/nonexistent/actiongate-test-binary"]).unwrap();
        let error = handler.invoke(context(), CanonicalArgumentSet::new()).await.unwrap_err();
        assert!(matches!(error, ActionError::Internal(_)));
    }
}
