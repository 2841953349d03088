use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use camino::Utf8Path;
use serde::Serialize;

use crate::error::HarvestError;
use crate::pipeline::{ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy, Default)]
pub struct RelabelOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedEntry {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NotDirectory,
    NoMapping,
    InvalidTarget { label: String },
    TargetExists { label: String },
    RenameFailed { label: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub name: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelabelReport {
    pub base_directory: String,
    pub dry_run: bool,
    pub renamed: Vec<RenamedEntry>,
    pub skipped: Vec<SkippedEntry>,
    pub finished_at: String,
}

impl RelabelReport {
    pub fn renamed_count(&self) -> usize {
        self.renamed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Renames each child directory of `base` whose name is a key of `mapping` to the
/// mapped label. Existing targets are never overwritten.
///
/// The listing is snapshotted (sorted by name) before the first rename. A label
/// claimed earlier in the same run counts as taken, so dry runs report the same
/// collisions a real run would hit.
pub fn relabel(
    base: &Utf8Path,
    mapping: &BTreeMap<String, String>,
    options: RelabelOptions,
    sink: &dyn ProgressSink,
) -> Result<RelabelReport, HarvestError> {
    if !base.as_std_path().is_dir() {
        return Err(HarvestError::BaseDirectoryMissing(base.as_std_path().to_path_buf()));
    }

    sink.event(ProgressEvent::new(format!("phase=Resolve; scanning {base}")));
    let mut children = fs::read_dir(base.as_std_path())
        .map_err(|err| HarvestError::Filesystem(format!("read {base}: {err}")))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<PathBuf>, _>>()
        .map_err(|err| HarvestError::Filesystem(format!("read {base}: {err}")))?;
    children.sort();

    let mut report = RelabelReport {
        base_directory: base.to_string(),
        dry_run: options.dry_run,
        renamed: Vec::new(),
        skipped: Vec::new(),
        finished_at: String::new(),
    };

    let mut claimed = BTreeSet::new();
    for child in children {
        let display_name = child
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match relabel_entry(&child, mapping, &mut claimed, options) {
            Ok(label) => {
                sink.event(ProgressEvent::new(format!("renamed {display_name} -> {label}")));
                report.renamed.push(RenamedEntry {
                    from: display_name,
                    to: label,
                });
            }
            Err(reason) => {
                log_skip(&display_name, &reason, sink);
                report.skipped.push(SkippedEntry {
                    name: display_name,
                    reason,
                });
            }
        }
    }

    tracing::info!(
        "relabel {base}: {} renamed, {} skipped",
        report.renamed_count(),
        report.skipped_count()
    );
    report.finished_at = chrono::Utc::now().to_rfc3339();
    Ok(report)
}

fn relabel_entry(
    child: &std::path::Path,
    mapping: &BTreeMap<String, String>,
    claimed: &mut BTreeSet<String>,
    options: RelabelOptions,
) -> Result<String, SkipReason> {
    if !child.is_dir() {
        return Err(SkipReason::NotDirectory);
    }
    let label = child
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| mapping.get(name))
        .ok_or(SkipReason::NoMapping)?;
    if !is_plain_name(label) {
        return Err(SkipReason::InvalidTarget {
            label: label.clone(),
        });
    }

    let target = match child.parent() {
        Some(parent) => parent.join(label),
        None => {
            return Err(SkipReason::InvalidTarget {
                label: label.clone(),
            });
        }
    };
    // symlink_metadata so a dangling link still counts as taken
    if claimed.contains(label) || fs::symlink_metadata(&target).is_ok() {
        return Err(SkipReason::TargetExists {
            label: label.clone(),
        });
    }

    if !options.dry_run {
        fs::rename(child, &target).map_err(|err| SkipReason::RenameFailed {
            label: label.clone(),
            message: err.to_string(),
        })?;
    }
    claimed.insert(label.clone());
    Ok(label.clone())
}

fn is_plain_name(label: &str) -> bool {
    !label.is_empty()
        && label != "."
        && label != ".."
        && !label.contains(|ch| ch == '/' || ch == '\\' || ch == '\0')
}

fn log_skip(name: &str, reason: &SkipReason, sink: &dyn ProgressSink) {
    let message = match reason {
        SkipReason::NotDirectory => format!("skip {name}: not a directory"),
        SkipReason::NoMapping => format!("skip {name}: no mapping"),
        SkipReason::InvalidTarget { label } => {
            tracing::warn!("mapping for {name} has an invalid target {label:?}");
            format!("skip {name}: invalid target {label:?}")
        }
        SkipReason::TargetExists { label } => {
            tracing::warn!("{label} already exists, not renaming {name}");
            format!("skip {name}: {label} already exists")
        }
        SkipReason::RenameFailed { label, message } => {
            tracing::warn!("renaming {name} to {label} failed: {message}");
            format!("skip {name}: rename to {label} failed: {message}")
        }
    };
    sink.event(ProgressEvent::new(message));
}
