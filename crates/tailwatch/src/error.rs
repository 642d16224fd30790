//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use tailwatch_config::ConfigError;
use tailwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Capture ──────────────────────────────────────────────────────
    #[error("No capture database found at {location}")]
    #[diagnostic(
        code(tailwatch::no_snapshot),
        help(
            "Start a Kismet capture, or point at an existing database:\n\
             tailwatch --database ~/Kismet-20240101-00-00-00-1.kismet analyze\n\
             The search directory can also be set with [capture] directory = \"...\""
        )
    )]
    NoSnapshot { location: String },

    #[error("Analysis failed: {message}")]
    #[diagnostic(code(tailwatch::analysis_failed))]
    AnalysisFailed { message: String },

    #[error("Capture database error: {message}")]
    #[diagnostic(
        code(tailwatch::database),
        help("Make sure the file is a Kismet database and is readable.")
    )]
    Database { message: String },

    // ── Geo ──────────────────────────────────────────────────────────
    #[error("WiGLE lookups are not configured")]
    #[diagnostic(
        code(tailwatch::geo_not_configured),
        help(
            "Set [geo] username in the config file and export TAILWATCH_WIGLE_PASSWORD,\n\
             or set TAILWATCH_WIGLE_USER and TAILWATCH_WIGLE_PASSWORD."
        )
    )]
    GeoNotConfigured,

    #[error("WiGLE rejected the credentials: {message}")]
    #[diagnostic(
        code(tailwatch::auth_failed),
        help("Check the API name and token at https://wigle.net/account.")
    )]
    AuthFailed { message: String },

    #[error("Geo service error: {message}")]
    #[diagnostic(code(tailwatch::geo))]
    Geo { message: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(tailwatch::timeout),
        help("Raise [geo] timeout_secs / nearby_timeout_secs or try again later.")
    )]
    Timeout { seconds: u64 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(tailwatch::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Lists ────────────────────────────────────────────────────────
    #[error("Could not save list to {}", path.display())]
    #[diagnostic(
        code(tailwatch::persistence),
        help("The list was not changed on disk. Check permissions and retry.")
    )]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("List file {} is unreadable or malformed", path.display())]
    #[diagnostic(
        code(tailwatch::list_unreadable),
        help("Fix or remove the file; it was left unchanged.")
    )]
    ListUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tailwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(tailwatch::config),
        help("Run `tailwatch config path` to locate the config file.")
    )]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(tailwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(tailwatch::internal))]
    Internal { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(tailwatch::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(tailwatch::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML output failed: {0}")]
    #[diagnostic(code(tailwatch::toml))]
    Toml(#[from] toml::ser::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Geo(core) => core.into(),
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoSnapshot { .. } | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::GeoNotConfigured | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Geo { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoSnapshot { location } => CliError::NoSnapshot { location },

            CoreError::Database(e) => CliError::Database {
                message: e.to_string(),
            },

            CoreError::ListPersistence { path, source } => CliError::Persistence { path, source },

            CoreError::ListUnreadable { path, source } => CliError::ListUnreadable { path, source },

            CoreError::GeoUnavailable => CliError::GeoNotConfigured,

            CoreError::GeoAuthentication { message } => CliError::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Geo { message, status } => CliError::Geo {
                message: match status {
                    Some(code) => format!("{message} (HTTP {code})"),
                    None => message,
                },
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::ServiceStopped => CliError::Internal {
                message: "classification service stopped".into(),
            },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}
