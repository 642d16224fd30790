//! Configuration for tailwatch.
//!
//! TOML file + environment layering, WiGLE credential resolution
//! (env + plaintext), and translation to `tailwatch_core::ServiceConfig`.
//! The CLI adds flag-aware overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tailwatch_api::Credentials;
use tailwatch_core::{KismetSource, ServiceConfig, Thresholds, WigleResolver};

/// Environment variable consulted for the WiGLE API name.
pub const WIGLE_USER_ENV: &str = "TAILWATCH_WIGLE_USER";
/// Environment variable consulted for the WiGLE API token.
pub const WIGLE_PASSWORD_ENV: &str = "TAILWATCH_WIGLE_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("geo client setup failed: {0}")]
    Geo(#[from] tailwatch_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub lists: ListsConfig,

    #[serde(default)]
    pub geo: GeoConfig,
}

/// Where the Kismet capture database lives.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// A specific database file. Takes precedence over `directory`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Directory scanned for the newest `Kismet-*.kismet` file.
    /// Defaults to the home directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    #[serde(default = "default_min_appearances")]
    pub min_appearances: u64,

    #[serde(default = "default_persistence_secs")]
    pub persistence_secs: u64,

    #[serde(default = "default_recency_mins")]
    pub recency_mins: u64,

    #[serde(default = "default_report_limit")]
    pub report_limit: usize,

    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Entries kept per device in the sighting history (0 = unbounded).
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_appearances: default_min_appearances(),
            persistence_secs: default_persistence_secs(),
            recency_mins: default_recency_mins(),
            report_limit: default_report_limit(),
            batch_limit: default_batch_limit(),
            history_depth: default_history_depth(),
        }
    }
}

fn default_min_appearances() -> u64 {
    3
}
fn default_persistence_secs() -> u64 {
    300
}
fn default_recency_mins() -> u64 {
    10
}
fn default_report_limit() -> usize {
    50
}
fn default_batch_limit() -> usize {
    1000
}
fn default_history_depth() -> usize {
    64
}

/// Allow/deny list files. Both default to the platform data directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denylist: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowlist: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// WiGLE API name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// WiGLE API token (plaintext; prefer `password_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable containing the WiGLE API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    #[serde(default = "default_geo_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_nearby_timeout")]
    pub nearby_timeout_secs: u64,

    /// Geo cache entry lifetime; unset keeps entries for the process lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            username: None,
            password: None,
            password_env: None,
            timeout_secs: default_geo_timeout(),
            nearby_timeout_secs: default_nearby_timeout(),
            cache_ttl_secs: None,
        }
    }
}

fn default_api_url() -> String {
    "https://api.wigle.net".into()
}
fn default_geo_timeout() -> u64 {
    5
}
fn default_nearby_timeout() -> u64 {
    10
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "tailwatch", "tailwatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding the allow/deny lists by default.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_dir() -> PathBuf {
    BaseDirs::new().map_or_else(|| PathBuf::from("."), |b| b.home_dir().to_path_buf())
}

fn dirs_fallback(base: &str) -> PathBuf {
    home_dir().join(base).join("tailwatch")
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Layering: built-in defaults, then the TOML file (if present), then
/// `TAILWATCH_`-prefixed variables with `__` separating sections, e.g.
/// `TAILWATCH_DETECTION__RECENCY_MINS=15`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TAILWATCH_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.detection;
        if d.min_appearances == 0 {
            return Err(invalid("detection.min_appearances", "must be at least 1"));
        }
        if d.report_limit == 0 {
            return Err(invalid("detection.report_limit", "must be at least 1"));
        }
        if d.batch_limit == 0 {
            return Err(invalid("detection.batch_limit", "must be at least 1"));
        }
        if self.geo.timeout_secs == 0 || self.geo.nearby_timeout_secs == 0 {
            return Err(invalid("geo.timeout_secs", "timeouts must be non-zero"));
        }
        url::Url::parse(&self.geo.api_url)
            .map_err(|e| invalid("geo.api_url", format!("{e}: {}", self.geo.api_url)))?;
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        let d = &self.detection;
        Thresholds {
            min_appearances: d.min_appearances,
            persistence: Duration::from_secs(d.persistence_secs),
            recency: Duration::from_secs(d.recency_mins.saturating_mul(60)),
            report_limit: d.report_limit,
            batch_limit: d.batch_limit,
        }
    }

    /// Build the engine configuration, filling unset paths with platform
    /// defaults.
    pub fn service_config(&self) -> ServiceConfig {
        let mut svc = ServiceConfig::with_data_dir(data_dir());
        svc.thresholds = self.thresholds();
        svc.history_depth = self.detection.history_depth;
        if let Some(path) = &self.lists.denylist {
            svc.denylist_path.clone_from(path);
        }
        if let Some(path) = &self.lists.allowlist {
            svc.allowlist_path.clone_from(path);
        }
        svc.geo_timeout = Duration::from_secs(self.geo.timeout_secs);
        svc.nearby_timeout = Duration::from_secs(self.geo.nearby_timeout_secs);
        svc.geo_cache_ttl = self.geo.cache_ttl_secs.map(Duration::from_secs);
        svc
    }

    /// The capture source: `database_override`, else `capture.database`,
    /// else the newest capture in `capture.directory` (home by default).
    pub fn snapshot_source(&self, database_override: Option<&Path>) -> KismetSource {
        if let Some(db) = database_override.or(self.capture.database.as_deref()) {
            return KismetSource::file(db);
        }
        let dir = self.capture.directory.clone().unwrap_or_else(home_dir);
        KismetSource::newest_in(dir)
    }

    /// WiGLE resolver, or `None` when no credentials are configured.
    pub fn geo_resolver(&self) -> Result<Option<WigleResolver>, ConfigError> {
        let Some(credentials) = resolve_wigle_credentials(&self.geo) else {
            return Ok(None);
        };
        let resolver = WigleResolver::new(
            &self.geo.api_url,
            credentials,
            Duration::from_secs(self.geo.timeout_secs),
            Duration::from_secs(self.geo.nearby_timeout_secs),
        )?;
        Ok(Some(resolver))
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve WiGLE credentials from config and the process environment.
pub fn resolve_wigle_credentials(geo: &GeoConfig) -> Option<Credentials> {
    resolve_wigle_credentials_with(geo, |name| std::env::var(name).ok())
}

/// Credential chain with an injectable environment lookup.
///
/// Username: `geo.username`, then `TAILWATCH_WIGLE_USER`.
/// Token: the variable named by `geo.password_env`, then
/// `TAILWATCH_WIGLE_PASSWORD`, then plaintext `geo.password`.
pub fn resolve_wigle_credentials_with<F>(geo: &GeoConfig, env: F) -> Option<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |v: String| (!v.is_empty()).then_some(v);

    let username = geo
        .username
        .clone()
        .and_then(non_empty)
        .or_else(|| env(WIGLE_USER_ENV).and_then(non_empty))?;

    let token = geo
        .password_env
        .as_deref()
        .and_then(&env)
        .and_then(non_empty)
        .or_else(|| env(WIGLE_PASSWORD_ENV).and_then(non_empty))
        .or_else(|| geo.password.clone().and_then(non_empty))?;

    Some(Credentials::new(username, SecretString::from(token)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_engine_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.thresholds(), Thresholds::default());
        assert_eq!(cfg.service_config().history_depth, 64);
        assert_eq!(cfg.geo.timeout_secs, 5);
        assert_eq!(cfg.geo.nearby_timeout_secs, 10);
        assert!(cfg.service_config().geo_cache_ttl.is_none());
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [detection]
                min_appearances = 4
                recency_mins = 15

                [lists]
                denylist = "/tmp/tw/deny.json"
                "#,
            )?;
            jail.set_env("TAILWATCH_DETECTION__RECENCY_MINS", "20");
            jail.set_env("TAILWATCH_GEO__CACHE_TTL_SECS", "3600");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.detection.min_appearances, 4);
            assert_eq!(cfg.detection.recency_mins, 20);
            assert_eq!(cfg.detection.report_limit, 50);
            assert_eq!(cfg.geo.cache_ttl_secs, Some(3600));

            let svc = cfg.service_config();
            assert_eq!(svc.denylist_path, PathBuf::from("/tmp/tw/deny.json"));
            assert_eq!(svc.thresholds.recency, Duration::from_secs(20 * 60));
            Ok(())
        });
    }

    #[test]
    fn missing_file_uses_defaults() {
        Jail::expect_with(|_| {
            let cfg = load_config_from(Path::new("absent.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.detection.batch_limit, 1000);
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[detection]\nreport_limit = 0\n")?;
            let err = load_config_from(Path::new("config.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "detection.report_limit"));
            Ok(())
        });
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.capture.database = Some(PathBuf::from("/data/Kismet-1.kismet"));
        cfg.geo.username = Some("AIDtest".into());
        save_config_to(&cfg, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[capture]"));
        assert!(!written.contains("password"));

        let parsed: Config = toml::from_str(&written).unwrap();
        assert_eq!(parsed.capture.database, cfg.capture.database);
        assert_eq!(parsed.geo.username.as_deref(), Some("AIDtest"));
    }

    #[test]
    fn snapshot_source_precedence() {
        let mut cfg = Config::default();
        cfg.capture.directory = Some(PathBuf::from("/captures"));
        let source = cfg.snapshot_source(None);
        assert_eq!(
            source.location(),
            &tailwatch_core::KismetLocation::Newest(PathBuf::from("/captures"))
        );

        cfg.capture.database = Some(PathBuf::from("/captures/a.kismet"));
        let flag = Path::new("/tmp/b.kismet");
        assert_eq!(
            cfg.snapshot_source(Some(flag)).location(),
            &tailwatch_core::KismetLocation::File(flag.to_path_buf())
        );
        assert_eq!(
            cfg.snapshot_source(None).location(),
            &tailwatch_core::KismetLocation::File(PathBuf::from("/captures/a.kismet"))
        );
    }

    #[test]
    fn credential_chain_order() {
        let mut geo = GeoConfig {
            username: Some("AIDtest".into()),
            password: Some("plain".into()),
            password_env: Some("MY_WIGLE_TOKEN".into()),
            ..GeoConfig::default()
        };

        let env = env_of(&[("MY_WIGLE_TOKEN", "custom"), (WIGLE_PASSWORD_ENV, "standard")]);
        let creds = resolve_wigle_credentials_with(&geo, &env).unwrap();
        assert_eq!(creds.name(), "AIDtest");

        geo.password_env = None;
        let env = env_of(&[]);
        assert!(resolve_wigle_credentials_with(&geo, &env).is_some());

        geo.password = None;
        assert!(resolve_wigle_credentials_with(&geo, &env).is_none());

        geo.username = None;
        let env = env_of(&[(WIGLE_USER_ENV, "AIDenv"), (WIGLE_PASSWORD_ENV, "t")]);
        let creds = resolve_wigle_credentials_with(&geo, &env).unwrap();
        assert_eq!(creds.name(), "AIDenv");
    }
}
