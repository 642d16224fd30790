// ── Core error types ──
//
// User-facing errors from tailwatch-core. Consumers never see raw HTTP
// status codes or SQLite error codes directly; the `From` impls translate
// transport-layer failures into domain-appropriate variants.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Snapshot errors ──────────────────────────────────────────────
    #[error("No capture snapshot available at {location}")]
    NoSnapshot { location: String },

    #[error("Capture database error: {0}")]
    Database(#[from] rusqlite::Error),

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Failed to persist list to {path}: {source}")]
    ListPersistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("List file {path} is unreadable or malformed: {source}")]
    ListUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Geo lookup errors ────────────────────────────────────────────
    #[error("Geo lookup is not configured (missing WiGLE credentials)")]
    GeoUnavailable,

    #[error("Geo service authentication failed: {message}")]
    GeoAuthentication { message: String },

    #[error("Geo lookup timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Geo service error: {message}")]
    Geo {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Service has been shut down")]
    ServiceStopped,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tailwatch_api::Error> for CoreError {
    fn from(err: tailwatch_api::Error) -> Self {
        match err {
            tailwatch_api::Error::Authentication { message } => {
                CoreError::GeoAuthentication { message }
            }
            tailwatch_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            tailwatch_api::Error::Transport(ref e) if e.is_timeout() => {
                CoreError::Timeout { timeout_secs: 0 }
            }
            tailwatch_api::Error::Transport(e) => CoreError::Geo {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            tailwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid geo API URL: {e}"),
            },
            tailwatch_api::Error::RateLimited { retry_after_secs } => CoreError::Geo {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                status: Some(429),
            },
            tailwatch_api::Error::Api { message, status } => CoreError::Geo {
                message,
                status: Some(status),
            },
            tailwatch_api::Error::Deserialization { message, body: _ } => CoreError::Geo {
                message: format!("Deserialization error: {message}"),
                status: None,
            },
        }
    }
}

impl From<tokio::task::JoinError> for CoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        CoreError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_timeout_maps_to_timeout() {
        let err: CoreError = tailwatch_api::Error::Timeout { timeout_secs: 5 }.into();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 5 }));
    }

    #[test]
    fn api_rate_limit_keeps_status() {
        let err: CoreError = tailwatch_api::Error::RateLimited {
            retry_after_secs: 30,
        }
        .into();
        assert!(matches!(err, CoreError::Geo { status: Some(429), .. }));
    }
}
