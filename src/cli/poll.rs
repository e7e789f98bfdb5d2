//! `poll`: run a single poll cycle.

use super::{exit_codes, open_runtime};
use crate::alerts::build_alert_sinks;
use crate::config::AppConfig;
use crate::monitor::{CycleReport, TargetStatus};
use crate::reports::ReportFormat;
use anyhow::Result;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct PollOptions {
    /// Format of the cycle report printed to stdout
    pub format: ReportFormat,
    /// Exit with [`exit_codes::CHANGES`] when a target changed
    pub fail_on_change: bool,
    pub quiet: bool,
}

/// Poll every target once, returning the exit code.
pub fn run_poll(config: &AppConfig, options: PollOptions) -> Result<i32> {
    let runtime = open_runtime(config)?;
    let monitor = runtime.monitor(config)?;
    if runtime.store.targets()?.is_empty() {
        anyhow::bail!("No targets configured. Add URLs under `targets:` or pass --url.");
    }

    let mut sinks = build_alert_sinks(&config.alerts, options.quiet)?;
    let report = monitor.run_cycle(&mut sinks)?;

    let mut out = std::io::stdout().lock();
    write_cycle_report(&mut out, &report, options.format)?;

    Ok(exit_code(&report, options.fail_on_change))
}

pub(super) fn exit_code(report: &CycleReport, fail_on_change: bool) -> i32 {
    let summary = report.summary();
    if summary.failures > 0 || summary.alert_failures > 0 {
        exit_codes::TARGET_FAILURES
    } else if fail_on_change && summary.changes > 0 {
        exit_codes::CHANGES
    } else {
        exit_codes::SUCCESS
    }
}

pub(super) fn write_cycle_report(
    out: &mut dyn Write,
    report: &CycleReport,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        ReportFormat::Text => {
            for result in &report.results {
                match &result.status {
                    TargetStatus::Classified { outcome, version } => {
                        let marker = if result.alerted { "!" } else { " " };
                        let label = outcome.to_string();
                        writeln!(out, "{marker} v{version:<4} {label:<22} {}", result.url)?;
                        if let Some(error) = &result.alert_error {
                            writeln!(out, "         alert not sent: {error}")?;
                        }
                        for failure in &result.delivery_failures {
                            writeln!(out, "         delivery failed: {failure}")?;
                        }
                    }
                    TargetStatus::Failed { error } => {
                        writeln!(out, "x {:<28} {}", "error", result.url)?;
                        writeln!(out, "         {error}")?;
                    }
                }
            }
            let summary = report.summary();
            writeln!(
                out,
                "{} target(s): {} new, {} unchanged, {} changed, {} failed",
                summary.targets,
                summary.first_sightings,
                summary.unchanged,
                summary.changes,
                summary.failures
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PollOutcome, TargetId};
    use crate::monitor::TargetResult;
    use chrono::Utc;

    fn report(statuses: Vec<TargetStatus>) -> CycleReport {
        let now = Utc::now();
        CycleReport {
            started_at: now,
            finished_at: now,
            results: statuses
                .into_iter()
                .enumerate()
                .map(|(i, status)| {
                    let url = format!("https://cdn.example.com/{i}.js");
                    TargetResult {
                        target_id: TargetId::for_url(&url),
                        url,
                        alerted: matches!(
                            status,
                            TargetStatus::Classified {
                                outcome: PollOutcome::NewVersion,
                                ..
                            }
                        ),
                        status,
                        delivery_failures: vec![],
                        alert_error: None,
                    }
                })
                .collect(),
        }
    }

    #[test]
    fn test_exit_codes() {
        let changed = report(vec![TargetStatus::Classified {
            outcome: PollOutcome::NewVersion,
            version: 2,
        }]);
        assert_eq!(exit_code(&changed, false), exit_codes::SUCCESS);
        assert_eq!(exit_code(&changed, true), exit_codes::CHANGES);

        let mut unreported = changed.clone();
        unreported.results[0].alert_error = Some("blob missing".to_string());
        assert_eq!(exit_code(&unreported, false), exit_codes::TARGET_FAILURES);

        let failed = report(vec![TargetStatus::Failed {
            error: "timeout".to_string(),
        }]);
        assert_eq!(exit_code(&failed, true), exit_codes::TARGET_FAILURES);
    }

    #[test]
    fn test_text_report_lists_targets() {
        let report = report(vec![
            TargetStatus::Classified {
                outcome: PollOutcome::NewVersion,
                version: 2,
            },
            TargetStatus::Failed {
                error: "Failed to fetch".to_string(),
            },
        ]);
        let mut buf = Vec::new();
        write_cycle_report(&mut buf, &report, ReportFormat::Text).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("! v2    NEW VERSION"));
        assert!(text.contains("https://cdn.example.com/1.js"));
        assert!(text.contains("2 target(s): 0 new, 0 unchanged, 1 changed, 1 failed"));
    }

    #[test]
    fn test_json_report_parses() {
        let report = report(vec![TargetStatus::Classified {
            outcome: PollOutcome::FirstSighting,
            version: 1,
        }]);
        let mut buf = Vec::new();
        write_cycle_report(&mut buf, &report, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["results"][0]["status"]["status"], "classified");
    }
}
