//! `diff`: localize changes between two local files or two recorded versions.

use super::{Runtime, exit_codes, open_runtime};
use crate::config::AppConfig;
use crate::model::{PollOutcome, Snippet, TargetId, VersionRecord};
use crate::reports::{ChangeAlert, ReportFormat, create_reporter};
use crate::snippet;
use crate::utils::content_digest;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

/// What to compare.
#[derive(Debug, Clone)]
pub enum DiffSource {
    /// Two files on disk
    Files { old: PathBuf, new: PathBuf },
    /// Two recorded versions of a target. `to` defaults to the current
    /// version and `from` to the one before `to`.
    Versions {
        url: String,
        from: Option<u32>,
        to: Option<u32>,
    },
}

/// Print the change report, returning [`exit_codes::CHANGES`] when the
/// inputs differ.
pub fn run_diff(config: &AppConfig, source: &DiffSource, format: ReportFormat) -> Result<i32> {
    let alert = match source {
        DiffSource::Files { old, new } => {
            let old_bytes =
                std::fs::read(old).with_context(|| format!("reading {}", old.display()))?;
            let new_bytes =
                std::fs::read(new).with_context(|| format!("reading {}", new.display()))?;
            let label = new.display().to_string();
            compare(config, &label, &old_bytes, &new_bytes, None)
        }
        DiffSource::Versions { url, from, to } => {
            let runtime = open_runtime(config)?;
            compare_versions(config, &runtime, url, *from, *to)?
        }
    };

    let report = create_reporter(format).generate(&alert)?;
    print!("{report}");

    Ok(if alert.snippets.is_empty() {
        exit_codes::SUCCESS
    } else {
        exit_codes::CHANGES
    })
}

fn compare_versions(
    config: &AppConfig,
    runtime: &Runtime,
    url: &str,
    from: Option<u32>,
    to: Option<u32>,
) -> Result<ChangeAlert> {
    let target_id = TargetId::for_url(url);
    let history = runtime.store.history(&target_id)?;
    if history.is_empty() {
        anyhow::bail!("{url} has no recorded versions");
    }

    let newest = history[0].version;
    let to_record = find_version(&history, url, to.unwrap_or(newest))?;
    let from_version = match from {
        Some(v) => v,
        None if to_record.version > 1 => to_record.version - 1,
        None => anyhow::bail!("{url} has only one version; nothing to compare"),
    };
    let from_record = find_version(&history, url, from_version)?;

    let load = |record: &VersionRecord| -> Result<Vec<u8>> {
        runtime.blobs.get(&record.content_digest)?.with_context(|| {
            format!(
                "content of version {} ({}) is missing from the blob store",
                record.version, record.content_digest
            )
        })
    };
    let old_bytes = load(from_record)?;
    let new_bytes = load(to_record)?;

    Ok(compare(
        config,
        url,
        &old_bytes,
        &new_bytes,
        Some((from_record.version, to_record.version)),
    ))
}

fn find_version<'a>(
    history: &'a [VersionRecord],
    url: &str,
    version: u32,
) -> Result<&'a VersionRecord> {
    history
        .iter()
        .find(|r| r.version == version)
        .with_context(|| format!("{url} has no version {version}"))
}

fn compare(
    config: &AppConfig,
    label: &str,
    old_bytes: &[u8],
    new_bytes: &[u8],
    versions: Option<(u32, u32)>,
) -> ChangeAlert {
    let old_text = String::from_utf8_lossy(old_bytes);
    let new_text = String::from_utf8_lossy(new_bytes);

    let spans = Runtime::engine(config).diff(&old_text, &new_text);
    let snippets: Vec<Snippet> =
        snippet::extract(&old_text, &new_text, &spans, config.diff.context_margin);

    ChangeAlert {
        url: label.to_string(),
        target_id: TargetId::for_url(label),
        outcome: PollOutcome::NewVersion,
        previous_version: versions.map(|(from, _)| from),
        version: versions.map(|(_, to)| to),
        old_digest: Some(content_digest(old_bytes).digest),
        new_digest: content_digest(new_bytes).digest,
        detected_at: Utc::now(),
        snippets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_finds_single_change() {
        let alert = compare(&AppConfig::default(), "app.js", b"var x=1;", b"var x=2;", None);
        assert_eq!(alert.snippets.len(), 1);
        assert_eq!(alert.snippets[0].old_text, "var x=1;");
        assert_eq!(alert.snippets[0].new_text, "var x=2;");
        assert_eq!(alert.version, None);
    }

    #[test]
    fn test_compare_identical_is_empty() {
        let alert = compare(&AppConfig::default(), "app.js", b"same", b"same", Some((1, 2)));
        assert!(alert.snippets.is_empty());
        assert_eq!(alert.old_digest.as_deref(), Some(alert.new_digest.as_str()));
        assert_eq!(alert.previous_version, Some(1));
    }

    #[test]
    fn test_run_diff_files_exit_code() {
        let tmp = tempfile::TempDir::new().unwrap();
        let old = tmp.path().join("old.js");
        let new = tmp.path().join("new.js");
        std::fs::write(&old, "var x=1;").unwrap();
        std::fs::write(&new, "var x=1;").unwrap();

        let source = DiffSource::Files {
            old: old.clone(),
            new: new.clone(),
        };
        let code = run_diff(&AppConfig::default(), &source, ReportFormat::Json).unwrap();
        assert_eq!(code, exit_codes::SUCCESS);

        std::fs::write(&new, "var x=2;").unwrap();
        let code = run_diff(&AppConfig::default(), &source, ReportFormat::Json).unwrap();
        assert_eq!(code, exit_codes::CHANGES);
    }
}
