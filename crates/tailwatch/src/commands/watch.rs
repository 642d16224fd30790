//! Periodic analysis: prints each pass until Ctrl-C or `--passes`.

use tracing::{info, warn};

use tailwatch_core::ClassificationService;

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::analyze::render_report;

pub async fn handle(
    service: &ClassificationService,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let mut rx = service.spawn_watch(args.interval).await?;
    let mut passes: u32 = 0;

    loop {
        let report = rx.borrow_and_update().clone();
        passes += 1;

        if let Some(err) = &report.error {
            warn!(pass = passes, error = %err, "analysis pass failed");
            if global.output.is_structured() {
                output::print_output(&render_report(&report, global, false)?, global.quiet);
            }
        } else {
            output::print_output(&render_report(&report, global, true)?, global.quiet);
        }

        if args.passes.is_some_and(|limit| passes >= limit) {
            break;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping watch");
                break;
            }
        }
    }

    Ok(())
}
