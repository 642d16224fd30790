//! Device track command handler.

use tabled::Tabled;

use tailwatch_core::{ClassificationService, TrackPoint};

use crate::cli::{GlobalOpts, TrackArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TrackRow {
    #[tabled(rename = "Latitude")]
    latitude: String,
    #[tabled(rename = "Longitude")]
    longitude: String,
    #[tabled(rename = "First Seen")]
    first_seen: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl From<&TrackPoint> for TrackRow {
    fn from(t: &TrackPoint) -> Self {
        Self {
            latitude: format!("{:.6}", t.latitude),
            longitude: format!("{:.6}", t.longitude),
            first_seen: t.first_seen.format("%Y-%m-%d %H:%M:%S").to_string(),
            last_seen: t.last_seen.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub async fn handle(
    service: &ClassificationService,
    args: TrackArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let identity = util::parse_identity(&args.mac)?;
    let points = service.track(&identity).await?;

    if points.is_empty() && !global.output.is_structured() {
        if !global.quiet {
            eprintln!("No position data recorded for {identity}");
        }
        return Ok(());
    }

    let out = output::render_list(
        &global.output,
        &points,
        |t| TrackRow::from(t),
        |t| format!("{},{}", t.latitude, t.longitude),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
