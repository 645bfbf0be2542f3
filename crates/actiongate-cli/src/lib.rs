// crates/actiongate-cli/src/lib.rs
// ============================================================================
// Module: ActionGate CLI Library
// Description: Assembly and logging helpers behind the `actiongate` binary.
// Purpose: Keep process wiring testable outside the entry point.
// Dependencies: actiongate-config, actiongate-core, tracing-subscriber
// ============================================================================

//! ## Overview
//! The binary loads configuration, installs logging, assembles one
//! [`actiongate_core::Gateway`], and then either serves it over HTTP or runs
//! a single action from the command line.

pub mod assembly;
pub mod logging;

pub use assembly::AssemblyError;
pub use assembly::build_gateway;
pub use logging::LoggingError;
pub use logging::init_logging;
