//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut out = cfg.clone();
    if out.geo.password.is_some() {
        out.geo.password = Some(MASK.into());
    }
    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = config::effective_path(global);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let text = toml::to_string_pretty(&cfg)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| text.clone(),
                |c| {
                    c.capture
                        .database
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                },
            )?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_masked() {
        let mut cfg = Config::default();
        cfg.geo.username = Some("AIDtest".into());
        cfg.geo.password = Some("hunter2".into());
        let shown = redacted(&cfg);
        assert_eq!(shown.geo.password.as_deref(), Some(MASK));
        assert_eq!(shown.geo.username.as_deref(), Some("AIDtest"));
        assert!(redacted(&Config::default()).geo.password.is_none());
    }
}
