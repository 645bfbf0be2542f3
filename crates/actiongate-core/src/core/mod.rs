// crates/actiongate-core/src/core/mod.rs
// ============================================================================
// Module: ActionGate Core Types
// Description: Declarations, schemas, argument values, sessions, and errors.
// Purpose: Provide the types every surface and runtime module agrees on.
// Dependencies: serde, serde_json, regex, time
// ============================================================================

//! ## Overview
//! Core types describe actions as declared, the closed set of parameter value
//! kinds, the canonical argument set every surface produces, and the error
//! taxonomy every surface translates.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod arguments;
pub mod error;
pub mod identifiers;
pub mod result;
pub mod schema;
pub mod session;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use arguments::ArgToken;
pub use arguments::ArgumentValue;
pub use arguments::CanonicalArgumentSet;
pub use error::ActionError;
pub use error::DomainError;
pub use error::DomainPayload;
pub use error::EXIT_AUTH;
pub use error::EXIT_CONFIG;
pub use error::EXIT_DOMAIN;
pub use error::EXIT_INTERNAL;
pub use error::EXIT_TIMEOUT;
pub use error::EXIT_USAGE;
pub use error::ErrorKind;
pub use error::GatewayError;
pub use error::InternalFailure;
pub use error::RegistryError;
pub use identifiers::ActionId;
pub use identifiers::ProfileName;
pub use identifiers::SessionId;
pub use result::ResultValue;
pub use schema::ActionDeclaration;
pub use schema::ActionsMap;
pub use schema::ArgumentDeclaration;
pub use schema::ArgumentSchema;
pub use schema::ExtraDeclaration;
pub use schema::ParameterKind;
pub use schema::ParameterSpec;
pub use schema::SchemaError;
pub use schema::ValueKind;
pub use session::Claims;
pub use session::InvalidTransition;
pub use session::Session;
pub use session::SessionEvent;
pub use session::SessionState;
pub use transport::TransportParams;
pub use transport::TransportValue;
pub use transport::UploadedFile;
