// crates/actiongate-config/src/lib.rs
// ============================================================================
// Module: ActionGate Config Library
// Description: Canonical config model, validation, and action map loading.
// Purpose: Single source of truth for actiongate.toml semantics.
// Dependencies: actiongate-core, serde, toml
// ============================================================================

//! ## Overview
//! `actiongate-config` defines the canonical configuration model for
//! ActionGate and loads the declarative action registry. Validation is
//! strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod actions;
pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use actions::ActionsFormat;
pub use actions::load_actions_map;
pub use actions::parse_actions_map;
pub use config::*;
