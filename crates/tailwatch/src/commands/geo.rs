//! WiGLE lookup command handlers.

use tabled::Tabled;

use tailwatch_core::{ClassificationService, GeoLocation, NearbyNetwork};

use crate::cli::{GeoArgs, GeoCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NearbyRow {
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "BSSID")]
    bssid: String,
    #[tabled(rename = "Encryption")]
    encryption: String,
    #[tabled(rename = "Ch")]
    channel: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&NearbyNetwork> for NearbyRow {
    fn from(n: &NearbyNetwork) -> Self {
        let location = match (n.latitude, n.longitude) {
            (Some(lat), Some(lon)) => format!("{lat:.5}, {lon:.5}"),
            _ => String::new(),
        };
        Self {
            ssid: n.ssid.clone(),
            bssid: n.bssid.clone(),
            encryption: n.encryption.clone(),
            channel: n.channel.map(|c| c.to_string()).unwrap_or_default(),
            location,
            updated: n
                .last_update
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

fn detail(ssid: &str, loc: &GeoLocation) -> String {
    let mut lines = vec![
        format!("SSID:      {ssid}"),
        format!("Location:  {:.6}, {:.6}", loc.latitude, loc.longitude),
        format!("City:      {}", loc.city),
        format!("Country:   {}", loc.country),
    ];
    if let Some(at) = loc.last_update {
        lines.push(format!("Updated:   {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    service: &ClassificationService,
    args: GeoArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GeoCommand::Lookup { ssid } => {
            let Some(loc) = service.resolve_network(&ssid).await? else {
                return Err(CliError::NotFound {
                    resource_type: "network".into(),
                    identifier: ssid,
                });
            };
            let out = output::render_single(
                &global.output,
                &loc,
                |l| detail(&ssid, l),
                |l| format!("{},{}", l.latitude, l.longitude),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GeoCommand::Nearby { lat, lon } => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(CliError::Validation {
                    field: "coordinates".into(),
                    reason: format!("{lat}, {lon} is not a valid position"),
                });
            }
            let networks = service.nearby(lat, lon).await?;
            let out = output::render_list(
                &global.output,
                &networks,
                |n| NearbyRow::from(n),
                |n| n.bssid.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
