//! Command dispatch: bridges CLI args -> service calls -> output formatting.

pub mod analyze;
pub mod config_cmd;
pub mod geo;
pub mod lists;
pub mod track;
pub mod util;
pub mod watch;

use tailwatch_core::ClassificationService;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    service: &ClassificationService,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Analyze(args) => analyze::handle(service, args, global).await,
        Command::Watch(args) => watch::handle(service, args, global).await,
        Command::Track(args) => track::handle(service, args, global).await,
        Command::Geo(args) => geo::handle(service, args, global).await,
        Command::Deny(args) => lists::handle_deny(service, args, global).await,
        Command::Allow(args) => lists::handle_allow(service, args, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
