//! Read-only space survey: oversized files and files nobody has touched in
//! a long time. Redundant copies and emptied directories have their own
//! execution paths (dedup, migration phase 4), so this report only points;
//! deleting a large or stale file is always a human call.

use tracing::info;

use crate::config::CleanConfig;
use crate::error::Error;
use crate::paths;
use crate::storage::models::FileRecord;
use crate::storage::Database;

#[derive(Debug, Default)]
pub struct SpaceReport {
    /// At or above the configured size threshold, largest first.
    pub large_files: Vec<FileRecord>,
    /// Older than the configured staleness window, oldest first.
    pub stale_files: Vec<FileRecord>,
}

impl SpaceReport {
    pub fn large_total(&self) -> i64 {
        self.large_files.iter().map(|f| f.size).sum()
    }

    pub fn stale_total(&self) -> i64 {
        self.stale_files.iter().map(|f| f.size).sum()
    }
}

pub fn build_report(db: &Database, config: &CleanConfig) -> Result<SpaceReport, Error> {
    build_report_at(db, config, chrono::Utc::now().timestamp())
}

/// Like [`build_report`] with an explicit "now", so the staleness cutoff is
/// reproducible.
pub fn build_report_at(
    db: &Database,
    config: &CleanConfig,
    now_secs: i64,
) -> Result<SpaceReport, Error> {
    let min_size = config.large_file_threshold_mb * 1024 * 1024;
    let cutoff = now_secs - config.stale_after_days * 86_400;
    let excluded = |f: &FileRecord| {
        config
            .exclude_dirs
            .iter()
            .any(|ex| paths::is_under(&f.path, ex))
    };

    let mut large_files = db.find_large_files(min_size)?;
    large_files.retain(|f| !excluded(f));
    let mut stale_files = db.find_stale_files(cutoff)?;
    stale_files.retain(|f| !excluded(f));

    info!(
        "Space report: {} large files, {} stale files",
        large_files.len(),
        stale_files.len()
    );
    Ok(SpaceReport {
        large_files,
        stale_files,
    })
}
