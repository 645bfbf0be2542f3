// crates/actiongate-core/src/i18n.rs
// ============================================================================
// Module: ActionGate Internationalization Helpers
// Description: Message catalog and translation utilities shared by both surfaces.
// Purpose: Centralize user-facing strings so CLI and HTTP speak identically.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! ActionGate stores user-facing strings in a small translation catalog. The
//! CLI selects one process-wide locale through [`set_locale`]; the HTTP
//! surface renders each response in the locale requested by its caller, so
//! errors carry a deferred [`Message`] that is translated only when rendered.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported locales.
///
/// # Invariants
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Locale {
    /// English (default).
    En,
    /// French.
    Fr,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// Attempts to parse a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let lang = normalized.split(['-', '_']).next().unwrap_or_default();
        match lang {
            "en" => Some(Self::En),
            "fr" => Some(Self::Fr),
            _ => None,
        }
    }
}

/// Ordered list of supported locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Fr];

/// A formatted message argument captured by [`macro@crate::t`] and [`macro@crate::msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"name"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// A catalog key plus arguments whose translation is deferred until rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Catalog key.
    key: &'static str,
    /// Placeholder substitutions.
    args: Vec<MessageArg>,
}

impl Message {
    /// Creates a message without arguments.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    /// Creates a message with arguments.
    #[must_use]
    pub const fn with_args(key: &'static str, args: Vec<MessageArg>) -> Self {
        Self {
            key,
            args,
        }
    }

    /// Returns the catalog key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Renders the message in the given locale.
    #[must_use]
    pub fn render(&self, locale: Locale) -> String {
        translate_in(locale, self.key, &self.args)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(current_locale()))
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Process-wide locale used by the CLI surface and log output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the process locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the process locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog entries.
const CATALOG_EN: &[(&str, &str)] = &[
    ("auth.logged_in", "Logged in"),
    ("auth.logged_out", "Logged out"),
    ("auth.not_logged_in", "You are not logged in"),
    ("auth.authentication_required", "Authentication required"),
    ("auth.unable_authenticate", "Unable to authenticate"),
    ("auth.invalid_password", "Invalid password"),
    ("auth.missing_credentials", "Missing credentials parameter"),
    ("auth.unknown_profile", "Unknown authentication profile '{profile}'"),
    ("csrf.rejected", "CSRF protection"),
    ("route.not_found", "No action is registered for {target}"),
    ("route.invalid", "Ignoring invalid route '{route}' for action '{tid}'"),
    ("validation.required", "Argument '{name}' is required"),
    ("validation.unknown_option", "Unrecognized option '{option}'"),
    ("validation.extra_positional", "Unexpected positional argument '{value}'"),
    ("validation.missing_value", "Option '{option}' expects a value"),
    ("validation.single_value", "Argument '{name}' expects a single value"),
    ("validation.flag_value", "Flag '{name}' does not take a value"),
    ("validation.pattern", "Argument '{name}' is invalid: {message}"),
    ("normalize.skipped", "Skipping parameter '{name}': unsupported value shape {shape}"),
    ("normalize.unknown_parameter", "Ignoring parameter '{name}' not declared by the action"),
    ("dispatch.timeout", "Action '{tid}' did not complete within {millis} ms"),
    ("dispatch.internal", "Unexpected error while running action '{tid}'"),
    ("dispatch.lock_wait", "Waiting for the '{lock}' lock"),
    ("command.spawn_failed", "Unable to start '{program}': {error}"),
    ("command.failed", "'{program}' exited with status {status}: {stderr}"),
    ("encode.unencodable", "Value cannot be encoded in JSON: {value}"),
    ("request.invalid_json", "Request body is not a JSON object"),
    ("request.invalid_multipart", "Malformed multipart body: {error}"),
    ("request.body_too_large", "Request body exceeds {limit} bytes"),
    ("server.already_running", "The server is already running on {address}"),
    ("server.listening", "ActionGate API listening on {address}"),
    ("server.bind_failed", "Unable to bind {address}: {error}"),
    ("server.failed", "The HTTP server stopped: {error}"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("cli.config.valid", "Configuration is valid"),
    ("cli.action.not_found", "No action matches '{command}'"),
    ("cli.action.none", "No actions are registered"),
    ("cli.action.requires_profile", "(requires profile {profile})"),
    ("cli.action.locked", "(locked)"),
    ("cli.credentials.missing", "Action '{tid}' requires credentials for profile '{profile}'"),
    ("cli.locale.unsupported", "Unsupported locale '{value}'; expected one of: {supported}"),
    ("cli.actions.load_failed", "Failed to load the actions map: {error}"),
];

/// French catalog entries.
const CATALOG_FR: &[(&str, &str)] = &[
    ("auth.logged_in", "Connecté"),
    ("auth.logged_out", "Déconnecté"),
    ("auth.not_logged_in", "Vous n'êtes pas connecté"),
    ("auth.authentication_required", "Authentification requise"),
    ("auth.unable_authenticate", "Impossible de s'authentifier"),
    ("auth.invalid_password", "Mot de passe incorrect"),
    ("auth.missing_credentials", "Paramètre credentials manquant"),
    ("auth.unknown_profile", "Profil d'authentification inconnu « {profile} »"),
    ("csrf.rejected", "Protection CSRF"),
    ("route.not_found", "Aucune action n'est enregistrée pour {target}"),
    ("route.invalid", "Route invalide « {route} » ignorée pour l'action « {tid} »"),
    ("validation.required", "L'argument « {name} » est requis"),
    ("validation.unknown_option", "Option non reconnue « {option} »"),
    ("validation.extra_positional", "Argument positionnel inattendu « {value} »"),
    ("validation.missing_value", "L'option « {option} » attend une valeur"),
    ("validation.single_value", "L'argument « {name} » attend une seule valeur"),
    ("validation.flag_value", "Le drapeau « {name} » n'accepte pas de valeur"),
    ("validation.pattern", "L'argument « {name} » est invalide : {message}"),
    ("normalize.skipped", "Paramètre « {name} » ignoré : forme de valeur non prise en charge {shape}"),
    ("normalize.unknown_parameter", "Paramètre « {name} » non déclaré par l'action, ignoré"),
    ("dispatch.timeout", "L'action « {tid} » ne s'est pas terminée en {millis} ms"),
    ("dispatch.internal", "Erreur inattendue lors de l'exécution de l'action « {tid} »"),
    ("dispatch.lock_wait", "En attente du verrou « {lock} »"),
    ("command.spawn_failed", "Impossible de lancer « {program} » : {error}"),
    ("command.failed", "« {program} » s'est terminé avec le statut {status} : {stderr}"),
    ("encode.unencodable", "Valeur impossible à encoder en JSON : {value}"),
    ("request.invalid_json", "Le corps de la requête n'est pas un objet JSON"),
    ("request.invalid_multipart", "Corps multipart invalide : {error}"),
    ("request.body_too_large", "Le corps de la requête dépasse {limit} octets"),
    ("server.already_running", "Le serveur est déjà en cours d'exécution sur {address}"),
    ("server.listening", "API ActionGate à l'écoute sur {address}"),
    ("server.bind_failed", "Impossible d'écouter sur {address} : {error}"),
    ("server.failed", "Le serveur HTTP s'est arrêté : {error}"),
    ("output.write_failed", "Échec de l'écriture sur {stream} : {error}"),
    ("cli.config.valid", "La configuration est valide"),
    ("cli.action.not_found", "Aucune action ne correspond à « {command} »"),
    ("cli.action.none", "Aucune action n'est enregistrée"),
    ("cli.action.requires_profile", "(nécessite le profil {profile})"),
    ("cli.action.locked", "(verrouillée)"),
    (
        "cli.credentials.missing",
        "L'action « {tid} » nécessite des identifiants pour le profil « {profile} »",
    ),
    ("cli.locale.unsupported", "Langue « {value} » non prise en charge ; valeurs possibles : {supported}"),
    ("cli.actions.load_failed", "Impossible de charger la carte des actions : {error}"),
];

/// Returns the key/template map for `locale`.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_FR_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Fr => CATALOG_FR_MAP.get_or_init(|| CATALOG_FR.iter().copied().collect()),
    }
}

/// Returns every catalog key known for `locale`, sorted.
#[must_use]
pub fn catalog_keys(locale: Locale) -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = catalog_for(locale).keys().copied().collect();
    keys.sort_unstable();
    keys
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the process locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_in(current_locale(), key, &args)
}

/// Translates `key` in an explicit `locale`.
#[must_use]
pub fn translate_in(locale: Locale, key: &str, args: &[MessageArg]) -> String {
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macros
// ============================================================================

/// Formats a localized message from a key and named arguments in the process locale.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

/// Builds a deferred [`Message`](crate::i18n::Message) from a key and named arguments.
#[macro_export]
macro_rules! msg {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        $crate::i18n::Message::with_args(
            $key,
            ::std::vec![
                $(
                    $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
                )*
            ],
        )
    }};
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

    #[test]
    fn catalogs_have_identical_keys() {
        assert_eq!(catalog_keys(Locale::En), catalog_keys(Locale::Fr));
    }

    #[test]
    fn locale_parse_accepts_region_tags() {
        assert_eq!(Locale::parse("fr_FR.UTF-8"), Some(Locale::Fr));
        assert_eq!(Locale::parse(" EN-us "), Some(Locale::En));
        assert_eq!(Locale::parse("de"), None);
        assert_eq!(Locale::parse(""), None);
    }

    #[test]
    fn deferred_message_renders_per_locale() {
        let message = crate::msg!("validation.required", name = "echo");
        assert_eq!(message.render(Locale::En), "Argument 'echo' is required");
        assert_eq!(message.render(Locale::Fr), "L'argument « echo » est requis");
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(translate_in(Locale::Fr, "missing.key", &[]), "missing.key");
    }
}
