//! Deny list and allowlist command handlers.

use std::collections::BTreeSet;

use tabled::Tabled;

use tailwatch_core::{AutoDenyOutcome, ClassificationService, DeviceIdentity, ListUpdate, vendor};

use crate::cli::{AllowArgs, AllowCommand, DenyArgs, DenyCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
}

impl From<&DeviceIdentity> for EntryRow {
    fn from(id: &DeviceIdentity) -> Self {
        Self {
            mac: id.to_string(),
            vendor: vendor::lookup(id).unwrap_or("Unknown").into(),
        }
    }
}

// ── Rendering ───────────────────────────────────────────────────────

fn print_list(set: &BTreeSet<DeviceIdentity>, global: &GlobalOpts) -> Result<(), CliError> {
    let entries: Vec<&DeviceIdentity> = set.iter().collect();
    let out = output::render_list(
        &global.output,
        &entries,
        |id| EntryRow::from(*id),
        |id| id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_update(
    verb: &str,
    label: &str,
    update: ListUpdate,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        &update,
        |u| format!("{verb} {} ({} on the {label} list)", u.changed, u.total),
        |u| u.total.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_auto(outcome: AutoDenyOutcome, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        &outcome,
        |o| {
            format!(
                "Denied {} new of {} devices in the capture ({} on the deny list)",
                o.added, o.seen, o.total
            )
        },
        |o| o.total.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_deny(
    service: &ClassificationService,
    args: DenyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DenyCommand::List => print_list(&service.deny_list()?, global),

        DenyCommand::Add { macs } => {
            let ids = util::parse_identities(&macs)?;
            print_update("Denied", "deny", service.deny(ids)?, global)
        }

        DenyCommand::Remove { mac } => {
            let id = util::parse_identity(&mac)?;
            print_update("Removed", "deny", service.undeny(&id)?, global)
        }

        DenyCommand::Clear => {
            if !util::confirm("Clear the entire deny list?", global.yes)? {
                return Ok(());
            }
            print_update("Cleared", "deny", service.clear_denied()?, global)
        }

        DenyCommand::Auto => {
            if !util::confirm("Deny every device in the current capture?", global.yes)? {
                return Ok(());
            }
            print_auto(service.deny_all_current().await?, global)
        }
    }
}

pub fn handle_allow(
    service: &ClassificationService,
    args: AllowArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AllowCommand::List => print_list(&service.allow_list()?, global),

        AllowCommand::Add { macs } => {
            let ids = util::parse_identities(&macs)?;
            print_update("Allowed", "allow", service.allow(ids)?, global)
        }

        AllowCommand::Remove { mac } => {
            let id = util::parse_identity(&mac)?;
            print_update("Removed", "allow", service.unallow(&id)?, global)
        }

        AllowCommand::Clear => {
            if !util::confirm("Clear the entire allowlist?", global.yes)? {
                return Ok(());
            }
            print_update("Cleared", "allow", service.clear_allowed()?, global)
        }
    }
}
