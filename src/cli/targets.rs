//! `targets`: list monitored targets and their current version.

use super::{exit_codes, open_runtime};
use crate::config::AppConfig;
use crate::model::{Target, VersionRecord};
use crate::reports::ReportFormat;
use crate::store::VersionStore;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct TargetRow {
    #[serde(flatten)]
    target: Target,
    current: Option<VersionRecord>,
    versions: usize,
}

/// Print all registered targets.
pub fn run_targets(config: &AppConfig, format: ReportFormat) -> Result<i32> {
    let runtime = open_runtime(config)?;
    runtime.store.register_all(&config.targets, chrono::Utc::now())?;
    let mut out = std::io::stdout().lock();
    write_targets(&mut out, runtime.store.as_ref(), format)?;
    Ok(exit_codes::SUCCESS)
}

fn write_targets(out: &mut dyn Write, store: &dyn VersionStore, format: ReportFormat) -> Result<()> {
    let mut rows = Vec::new();
    for target in store.targets()? {
        let history = store.history(&target.target_id)?;
        rows.push(TargetRow {
            versions: history.len(),
            current: history.into_iter().next(),
            target,
        });
    }

    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            writeln!(out)?;
        }
        ReportFormat::Text => {
            for row in &rows {
                let id = row.target.target_id.as_str();
                let short_id = id.get(..12).unwrap_or(id);
                match &row.current {
                    Some(current) => writeln!(
                        out,
                        "{}  v{:<4} last seen {}  {}",
                        short_id,
                        current.version,
                        current.last_seen.format("%Y-%m-%d %H:%M:%S"),
                        row.target.url
                    )?,
                    None => writeln!(
                        out,
                        "{}  {:<5} {:<28}  {}",
                        short_id,
                        "-",
                        "never polled",
                        row.target.url
                    )?,
                }
            }
            writeln!(out, "{} target(s)", rows.len())?;
        }
    }
    Ok(())
}
