//! Analysis command handler and the report renderer shared with `watch`.

use std::fmt::Write as _;
use std::time::Duration;

use owo_colors::OwoColorize;
use tabled::Tabled;

use tailwatch_core::{ClassificationService, ClassifiedDevice, SurveillanceReport};

use crate::cli::{AnalyzeArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Type")]
    transport: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Seen")]
    appearances: u64,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ClassifiedDevice> for DeviceRow {
    fn from(d: &ClassifiedDevice) -> Self {
        let p = &d.profile;
        Self {
            mac: p.identity.to_string(),
            transport: p.transport.to_string(),
            vendor: p.manufacturer.clone(),
            name: p.name.clone().unwrap_or_default(),
            signal: p.signal_dbm.map(|s| format!("{s} dBm")).unwrap_or_default(),
            appearances: d.appearances,
            duration: format_secs(d.duration_secs),
            age: format!("{}m", d.age_minutes),
            status: status(d).into(),
        }
    }
}

fn status(d: &ClassifiedDevice) -> &'static str {
    if d.is_following {
        "FOLLOWING"
    } else if d.is_persistent {
        "persistent"
    } else {
        "-"
    }
}

fn format_secs(secs: i64) -> String {
    let secs = u64::try_from(secs).unwrap_or(0);
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

// ── Rendering ───────────────────────────────────────────────────────

fn summary(report: &SurveillanceReport) -> String {
    format!(
        "{} devices analyzed at {}, {} persistent, {} following now ({} flagged since start)",
        report.total_devices,
        report.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.persistent_count(),
        report.following.len(),
        report.following_total,
    )
}

fn alert(report: &SurveillanceReport, color: bool) -> String {
    let n = report.following.len();
    let text = format!(
        "ALERT: {n} device{} may be following you",
        if n == 1 { "" } else { "s" }
    );
    if color {
        text.red().bold().to_string()
    } else {
        text
    }
}

/// Render a report in the selected format.
///
/// Structured formats serialize the whole report (or just the following
/// candidates with `following_only`); table mode adds a summary line and
/// an alert banner.
pub fn render_report(
    report: &SurveillanceReport,
    global: &GlobalOpts,
    following_only: bool,
) -> Result<String, CliError> {
    let devices = if following_only {
        &report.following
    } else {
        &report.devices
    };

    match global.output {
        OutputFormat::Table => {
            let mut out = String::new();
            if !report.following.is_empty() {
                let _ = writeln!(out, "{}", alert(report, output::should_color(&global.color)));
            }
            if !devices.is_empty() {
                let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
                let _ = writeln!(out, "{}", output::render_table(&rows));
            }
            out.push_str(&summary(report));
            Ok(out)
        }
        OutputFormat::Plain => Ok(devices
            .iter()
            .map(|d| d.profile.identity.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        _ if following_only => output::render_list(
            &global.output,
            devices,
            |d| DeviceRow::from(d),
            |d| d.profile.identity.to_string(),
        ),
        _ => output::render_single(&global.output, report, |_| String::new(), |_| String::new()),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    service: &ClassificationService,
    args: AnalyzeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let report = service.analyze().await;

    if let Some(message) = &report.error {
        if global.output.is_structured() {
            let out = render_report(&report, global, false)?;
            output::print_output(&out, global.quiet);
        }
        return Err(CliError::AnalysisFailed {
            message: message.clone(),
        });
    }

    let out = render_report(&report, global, args.following_only)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
