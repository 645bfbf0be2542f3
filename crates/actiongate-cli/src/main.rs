// crates/actiongate-cli/src/main.rs
// ============================================================================
// Module: ActionGate CLI Entry Point
// Description: Command dispatcher for the gateway server and action invocations.
// Purpose: Run actions from a shell with the same validation as the HTTP API.
// Dependencies: clap, actiongate-core, actiongate-config, actiongate-http, tokio.
// ============================================================================

//! ## Overview
//! `actiongate serve` starts the HTTP API; `actiongate actions` lists the
//! registry; `actiongate config validate` checks configuration and the
//! actions map. Any other command path is resolved against action tids, so
//! `actiongate backup restore dump.tar --target prod` runs `backup.restore`.
//! Global options must precede the command path.
//!
//! Results go to stdout in the `--output-as` format; errors go to stderr and
//! the exit code follows the gateway error taxonomy.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use actiongate_cli::build_gateway;
use actiongate_cli::init_logging;
use actiongate_config::ActionGateConfig;
use actiongate_core::CliOutputFormat;
use actiongate_core::Credentials;
use actiongate_core::EXIT_CONFIG;
use actiongate_core::EXIT_INTERNAL;
use actiongate_core::EXIT_USAGE;
use actiongate_core::Gateway;
use actiongate_core::GatewayError;
use actiongate_core::Locale;
use actiongate_core::i18n::SUPPORTED_LOCALES;
use actiongate_core::i18n::current_locale;
use actiongate_core::i18n::set_locale;
use actiongate_core::runtime::render_cli;
use actiongate_core::runtime::render_cli_error;
use actiongate_core::t;
use actiongate_http::HttpServerError;
use actiongate_http::serve_config;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting the output language.
const LANG_ENV: &str = "ACTIONGATE_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "actiongate", version, disable_help_subcommand = true)]
struct Cli {
    /// Configuration file (overrides `ACTIONGATE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Result format: `json`, `plain`, or `none`.
    #[arg(long = "output-as", value_name = "FORMAT", default_value = "plain", global = true)]
    output_as: CliOutputFormat,
    /// Preferred output language (overrides `ACTIONGATE_LANG`).
    #[arg(long, value_name = "LANG", global = true)]
    lang: Option<String>,
    /// Deadline for the action in seconds (overrides `[dispatch] timeout_ms`).
    #[arg(long, value_name = "SECONDS", global = true)]
    timeout: Option<u64>,
    /// Credentials for profile-gated actions.
    #[arg(long, env = "ACTIONGATE_CREDENTIALS", hide_env_values = true, global = true)]
    credentials: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API.
    Serve,
    /// List registered actions.
    Actions,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Run the action named by the command path.
    #[command(external_subcommand)]
    Action(Vec<String>),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and the actions map.
    Validate,
}

/// Options that shape one action invocation.
#[derive(Debug)]
struct InvocationOptions {
    /// Result format.
    output_as: CliOutputFormat,
    /// Deadline override.
    timeout: Option<Duration>,
    /// Credentials for gated actions.
    credentials: Option<Credentials>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a localized message and exit code.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Process exit code.
    exit_code: u8,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String, exit_code: u8) -> Self {
        Self {
            message,
            exit_code,
        }
    }

    /// Configuration or assembly failure.
    const fn config(message: String) -> Self {
        Self::new(message, EXIT_CONFIG)
    }

    /// Gateway failure rendered in the process locale.
    fn gateway(error: &GatewayError) -> Self {
        Self::new(render_cli_error(error, current_locale()), error.exit_code())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => emit_error(&error),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang.as_deref(), env_lang.as_deref())?;
    set_locale(locale);

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging).map_err(|error| CliError::config(error.to_string()))?;

    match command {
        Commands::Serve => command_serve(&config).await,
        Commands::Actions => command_actions(&config),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(&config),
        Commands::Action(words) => {
            let options = InvocationOptions {
                output_as: cli.output_as,
                timeout: cli.timeout.map(Duration::from_secs),
                credentials: cli.credentials.map(Credentials::new),
            };
            command_action(&config, &words, &options).await
        }
    }
}

/// Picks the locale from `--lang`, then `ACTIONGATE_LANG`, then English.
fn resolve_locale(flag: Option<&str>, env: Option<&str>) -> CliResult<Locale> {
    if let Some(value) = flag {
        return parse_locale(value);
    }
    match env {
        Some(value) if !value.trim().is_empty() => parse_locale(value),
        _ => Ok(Locale::En),
    }
}

/// Parses a locale label or fails with the supported list.
fn parse_locale(value: &str) -> CliResult<Locale> {
    Locale::parse(value).ok_or_else(|| {
        let supported: Vec<&str> = SUPPORTED_LOCALES.iter().map(|locale| locale.as_str()).collect();
        CliError::new(
            t!("cli.locale.unsupported", value = value, supported = supported.join(", ")),
            EXIT_USAGE,
        )
    })
}

/// Loads configuration; a missing implicit `actiongate.toml` yields defaults.
fn load_config(path: Option<&Path>) -> CliResult<ActionGateConfig> {
    ActionGateConfig::load_or_default(path).map_err(|error| CliError::config(error.to_string()))
}

/// Assembles the gateway or fails with a configuration error.
fn assemble(config: &ActionGateConfig) -> CliResult<Gateway> {
    build_gateway(config).map_err(|error| CliError::config(t!("cli.actions.load_failed", error = error)))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(config: &ActionGateConfig) -> CliResult<ExitCode> {
    let gateway = Arc::new(assemble(config)?);
    serve_config(gateway, config).await.map_err(|error| match error {
        HttpServerError::Config(message) => CliError::config(message),
        other => CliError::new(other.to_string(), EXIT_INTERNAL),
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `actions` command.
fn command_actions(config: &ActionGateConfig) -> CliResult<ExitCode> {
    let gateway = assemble(config)?;
    if gateway.routes().is_empty() {
        write_stdout_line(&t!("cli.action.none"))?;
        return Ok(ExitCode::SUCCESS);
    }
    for action in gateway.routes().actions() {
        let mut line = action.tid.to_string();
        for route in &action.routes {
            line.push_str(&format!("  [{route}]"));
        }
        if let Some(profile) = &action.auth_profile {
            line.push_str(&format!("  {}", t!("cli.action.requires_profile", profile = profile)));
        }
        if action.lock_required {
            line.push_str(&format!("  {}", t!("cli.action.locked")));
        }
        if let Some(help) = &action.help {
            line.push_str(&format!("\n    {help}"));
        }
        write_stdout_line(&line)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the config validation command.
fn command_config_validate(config: &ActionGateConfig) -> CliResult<ExitCode> {
    assemble(config).map(drop)?;
    write_stdout_line(&t!("cli.config.valid"))?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves the command path to an action, authenticates, and runs it.
async fn command_action(
    config: &ActionGateConfig,
    words: &[String],
    options: &InvocationOptions,
) -> CliResult<ExitCode> {
    let gateway = assemble(config)?;
    let (action, consumed) = gateway.routes().resolve_cli(words).map_err(|error| CliError::gateway(&error))?;
    let session = gateway
        .authenticate_cli(&action, options.credentials.as_ref())
        .await
        .map_err(|error| CliError::gateway(&error))?;
    let rest = words.get(consumed ..).unwrap_or_default();
    let value = gateway
        .invoke_cli(&action, rest, session, current_locale(), options.timeout)
        .await
        .map_err(|error| CliError::gateway(&error))?;
    if let Some(rendered) = render_cli(&value, options.output_as) {
        write_stdout_line(&rendered)?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(help.trim_end())
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|error| output_error("stdout", &error))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error.
fn output_error(stream: &str, error: &std::io::Error) -> CliError {
    CliError::new(t!("output.write_failed", stream = stream, error = error), EXIT_INTERNAL)
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(error: &CliError) -> ExitCode {
    let _ = write_stderr_line(&error.message);
    ExitCode::from(error.exit_code)
}
