//! `history`: show the recorded versions of one target.

use super::{exit_codes, open_runtime};
use crate::config::AppConfig;
use crate::model::TargetId;
use crate::reports::ReportFormat;
use crate::store::VersionStore;
use anyhow::Result;
use std::io::Write;

/// Print the version history of `url`, most recent first.
pub fn run_history(config: &AppConfig, url: &str, format: ReportFormat) -> Result<i32> {
    let runtime = open_runtime(config)?;
    let mut out = std::io::stdout().lock();
    write_history(&mut out, runtime.store.as_ref(), url, format)?;
    Ok(exit_codes::SUCCESS)
}

fn write_history(
    out: &mut dyn Write,
    store: &dyn VersionStore,
    url: &str,
    format: ReportFormat,
) -> Result<()> {
    let target_id = TargetId::for_url(url);
    let Some(target) = store.target(&target_id)? else {
        anyhow::bail!("{url} is not a monitored target");
    };
    let history = store.history(&target.target_id)?;

    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &history)?;
            writeln!(out)?;
        }
        ReportFormat::Text => {
            writeln!(out, "{} ({} version(s))", target.url, history.len())?;
            for record in &history {
                writeln!(
                    out,
                    "  v{:<4} {}  {:>9} chars  first seen {}  last seen {}",
                    record.version,
                    record.content_digest.get(..16).unwrap_or(record.content_digest.as_str()),
                    record.content_size,
                    record.first_seen.format("%Y-%m-%d %H:%M:%S"),
                    record.last_seen.format("%Y-%m-%d %H:%M:%S"),
                )?;
            }
        }
    }
    Ok(())
}
