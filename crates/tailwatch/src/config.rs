//! CLI configuration -- thin wrapper around `tailwatch_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (--config,
//! --database) and wires the classification service.

use std::path::PathBuf;
use std::sync::Arc;

use tailwatch_core::ClassificationService;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use tailwatch_config::{Config, config_path, load_config_from};

/// Config file in effect: `--config` / `TAILWATCH_CONFIG`, else the
/// platform default.
pub fn effective_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&effective_path(global))?)
}

/// Build the service from config plus flag overrides. Geo lookups are
/// enabled only when WiGLE credentials resolve.
pub fn build_service(cfg: &Config, global: &GlobalOpts) -> Result<ClassificationService, CliError> {
    let source = cfg.snapshot_source(global.database.as_deref());
    let mut service = ClassificationService::new(cfg.service_config(), Arc::new(source));
    if let Some(resolver) = cfg.geo_resolver()? {
        service = service.with_geo(Arc::new(resolver));
    } else {
        tracing::debug!("no WiGLE credentials, geo lookups disabled");
    }
    Ok(service)
}
