//! Shared helpers for command handlers.

use tailwatch_core::DeviceIdentity;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so the operation is refused
/// rather than silently approved.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Parse a user-supplied MAC address into a canonical identity.
///
/// Accepts colon or dash separators in any case.
pub fn parse_identity(raw: &str) -> Result<DeviceIdentity, CliError> {
    let identity = DeviceIdentity::new(raw.trim());
    let octets: Vec<&str> = identity.as_str().split(':').collect();
    let valid = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(identity)
    } else {
        Err(CliError::Validation {
            field: "mac".into(),
            reason: format!("'{raw}' is not a MAC address"),
        })
    }
}

pub fn parse_identities(raw: &[String]) -> Result<Vec<DeviceIdentity>, CliError> {
    raw.iter().map(|m| parse_identity(m)).collect()
}
