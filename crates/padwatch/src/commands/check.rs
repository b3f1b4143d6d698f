//! `padwatch check`: one evaluation cycle.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use padwatch_core::{
    CycleReport, CycleStatus, DebounceStore, FileStore, LiveMonitor, MemoryStore,
    RemediationOutcome,
};

use crate::cli::{CheckArgs, GlobalOpts, OutputFormat};
use crate::commands::util;
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::lock::CycleLock;
use crate::output::{self, Tone};
use crate::status::{self, CycleFailure};

pub async fn handle(args: CheckArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let (profile_name, profile) = config::active_profile(global, &cfg)?;
    let status_file = profile.status_file(profile_name);
    let log_dir = global.log_dir.as_deref().or(profile.log_dir.as_deref());
    let dry_run = args.dry_run;

    let report = match run(args, global, &cfg, profile_name, profile).await {
        Ok(report) => report,
        Err(e) => {
            // A concurrent check owns the status file; leave it alone.
            if !dry_run && !matches!(e, CliError::Locked { .. }) {
                record(&status_file, log_dir, &CycleFailure::new(&e));
            }
            return Err(e);
        }
    };

    // Debounce state is already durable at this point; artifact failures
    // are reported but do not fail the check.
    if !dry_run {
        record(&status_file, log_dir, &report);
    }

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| r.alert_lines().collect::<Vec<_>>().join("\n"),
    )?;
    output::print_output(&out, global.quiet);

    if profile.policy.strict_serial_required && report.has_unresolved_serials() {
        let mut devices: Vec<&str> = report
            .missing_serial
            .iter()
            .map(|m| m.device.as_str())
            .collect();
        devices.dedup();
        return Err(CliError::UnresolvedSerials {
            count: devices.len(),
            devices: devices.join(", "),
        });
    }
    Ok(())
}

/// Lock, load state and run one cycle.
async fn run(
    args: CheckArgs,
    global: &GlobalOpts,
    cfg: &Config,
    profile_name: &str,
    profile: &Profile,
) -> Result<CycleReport, CliError> {
    let monitor_config = config::monitor_config(global, cfg, profile_name, profile)?;

    let state_dir = profile.state_dir(profile_name);
    let mut lock = CycleLock::open(&state_dir)?;
    let _guard = lock.try_acquire()?;

    let store = FileStore::open(&state_dir)?;
    let serials = util::load_serials(profile)?;
    let monitor = LiveMonitor::from_config(&monitor_config)?.with_dry_run(args.dry_run);

    info!(
        profile = profile_name,
        owner = %monitor_config.owner,
        dry_run = args.dry_run,
        "running check"
    );

    let spinner = spinner(global);
    let result = if args.dry_run {
        let scratch = MemoryStore::from_entries(store.entries()?);
        monitor.run_cycle(&scratch, &serials).await
    } else {
        monitor.run_cycle(&store, &serials).await
    };
    if let Some(ref pb) = spinner {
        pb.finish_and_clear();
    }
    Ok(result?)
}

/// Write the status file and cycle log line; failures only warn.
fn record<T: Serialize>(status_file: &Path, log_dir: Option<&Path>, doc: &T) {
    if let Err(e) = status::write_status(status_file, doc) {
        warn!(error = %e, "could not write status file");
    }
    if let Some(dir) = log_dir {
        if let Err(e) = status::append_cycle_log(dir, doc) {
            warn!(error = %e, "could not append cycle log");
        }
    }
}

fn spinner(global: &GlobalOpts) -> Option<ProgressBar> {
    let interactive = std::io::stderr().is_terminal();
    if global.quiet || !interactive || !matches!(global.output, OutputFormat::Table) {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Evaluating fleet…");
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Human-readable cycle summary.
fn detail(report: &CycleReport, color: bool) -> String {
    let mut out = String::new();

    let status = match report.status {
        CycleStatus::Healthy => output::paint("healthy", Tone::Good, color),
        CycleStatus::Alerted => output::paint("alerted", Tone::Bad, color),
    };
    let _ = writeln!(
        out,
        "Cycle {}: {status} ({} devices evaluated)",
        report.cycle_id, report.devices_evaluated
    );

    if !report.alerts.is_empty() {
        let _ = writeln!(out, "\nAlerts:");
        for line in report.alert_lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    if !report.queued.is_empty() {
        let _ = writeln!(out, "\nQueued soft resets:");
        for q in &report.queued {
            let _ = writeln!(out, "  {} ({}) -> {}", q.device, q.condition, q.serial);
        }
    }

    if !report.missing_serial.is_empty() {
        let _ = writeln!(
            out,
            "\n{}",
            output::paint("Due but no serial mapping:", Tone::Warn, color)
        );
        for m in &report.missing_serial {
            let _ = writeln!(
                out,
                "  {} ({}, {} consecutive)",
                m.device, m.condition, m.occurrence_count
            );
        }
    }

    if !report.store_failures.is_empty() {
        let _ = writeln!(
            out,
            "\n{}",
            output::paint("Skipped on state errors:", Tone::Bad, color)
        );
        for f in &report.store_failures {
            let _ = writeln!(out, "  {} ({}): {}", f.device, f.condition, f.message);
        }
    }

    let remediation = match &report.remediation {
        RemediationOutcome::Skipped => "nothing to reset".to_owned(),
        RemediationOutcome::DryRun { would_reset } => {
            format!("dry run, {would_reset} serial(s) would be reset")
        }
        RemediationOutcome::Submitted { summary, attempts } => {
            let text = format!(
                "{} submitted, {} accepted, {} failed",
                summary.total, summary.accepted, summary.failed
            );
            let text = if *attempts > 1 {
                format!("{text} after {attempts} attempts")
            } else {
                text
            };
            let tone = if summary.failed > 0 { Tone::Warn } else { Tone::Good };
            output::paint(&text, tone, color)
        }
        RemediationOutcome::Failed {
            stage, message, ..
        } => output::paint(&format!("{stage:?} failed: {message}"), Tone::Bad, color),
    };
    let _ = write!(out, "\nRemediation: {remediation}");

    out
}
