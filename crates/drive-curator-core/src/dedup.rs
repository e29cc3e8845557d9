use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::config::DedupConfig;
use crate::error::Error;
use crate::migrate::batch;
use crate::operator::Operator;
use crate::paths;
use crate::remote::RemoteFs;
use crate::storage::models::FileRecord;
use crate::storage::Database;
use crate::taxonomy::Taxonomy;

/// Disposition of one duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupTier {
    /// Copies span unrelated top-level trees; duplication is assumed
    /// accidental and the redundant copies may go automatically.
    Safe,
    /// Same top-level area, shallow common prefix; needs a human look.
    Review,
    /// Deep inside one subtree; likely intentional, never auto-handled.
    Manual,
}

impl DedupTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupTier::Safe => "safe",
            DedupTier::Review => "review",
            DedupTier::Manual => "manual",
        }
    }
}

/// Files sharing one content hash, tiered for cleanup.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub content_hash: String,
    pub size: i64,
    pub tier: DedupTier,
    /// Chosen survivor; `None` for manual-tier groups.
    pub keep: Option<FileRecord>,
    /// Redundant copies; empty for manual-tier groups.
    pub delete: Vec<FileRecord>,
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    pub fn reclaimable_bytes(&self) -> i64 {
        self.size * self.delete.len() as i64
    }
}

#[derive(Debug, Default)]
pub struct DedupReport {
    pub safe: Vec<DuplicateGroup>,
    pub review: Vec<DuplicateGroup>,
    pub manual: Vec<DuplicateGroup>,
}

impl DedupReport {
    pub fn total_groups(&self) -> usize {
        self.safe.len() + self.review.len() + self.manual.len()
    }

    pub fn safe_reclaimable(&self) -> i64 {
        self.safe.iter().map(|g| g.reclaimable_bytes()).sum()
    }

    pub fn review_reclaimable(&self) -> i64 {
        self.review.iter().map(|g| g.reclaimable_bytes()).sum()
    }
}

/// Partition every duplicate group in the index into safe / review /
/// manual. Recomputed fresh from the current index on every run.
pub fn build_report(
    db: &Database,
    taxonomy: &Taxonomy,
    config: &DedupConfig,
) -> Result<DedupReport, Error> {
    let taxonomy_paths = taxonomy.all_paths();
    let groups = db.find_duplicate_groups()?;

    let mut report = DedupReport::default();
    for (content_hash, files) in groups {
        let files: Vec<FileRecord> = files
            .into_iter()
            .filter(|f| {
                !config
                    .exclude_dirs
                    .iter()
                    .any(|ex| paths::is_under(&f.path, ex))
            })
            .collect();
        if files.len() < 2 {
            continue;
        }

        let size = files[0].size;
        let top_dirs: BTreeSet<String> = files
            .iter()
            .filter_map(|f| paths::top_level(&f.path))
            .collect();
        let prefix_depth = common_prefix_depth(&files);

        let group = if top_dirs.len() > 1 {
            decided_group(content_hash, size, DedupTier::Safe, files, &taxonomy_paths)
        } else if prefix_depth >= config.manual_prefix_depth {
            DuplicateGroup {
                content_hash,
                size,
                tier: DedupTier::Manual,
                keep: None,
                delete: Vec::new(),
                files,
            }
        } else {
            decided_group(content_hash, size, DedupTier::Review, files, &taxonomy_paths)
        };

        match group.tier {
            DedupTier::Safe => report.safe.push(group),
            DedupTier::Review => report.review.push(group),
            DedupTier::Manual => report.manual.push(group),
        }
    }

    info!(
        "Dedup report: {} safe, {} review, {} manual groups",
        report.safe.len(),
        report.review.len(),
        report.manual.len()
    );
    Ok(report)
}

fn decided_group(
    content_hash: String,
    size: i64,
    tier: DedupTier,
    files: Vec<FileRecord>,
    taxonomy_paths: &[String],
) -> DuplicateGroup {
    let mut ranked: Vec<&FileRecord> = files.iter().collect();
    ranked.sort_by(|a, b| {
        keep_score(b, taxonomy_paths)
            .partial_cmp(&keep_score(a, taxonomy_paths))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    let keep = ranked.first().map(|f| (*f).clone());
    let delete = match &keep {
        Some(keep) => files
            .iter()
            .filter(|f| f.path != keep.path)
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    DuplicateGroup {
        content_hash,
        size,
        tier,
        keep,
        delete,
        files,
    }
}

/// Survivor score: a copy already under a taxonomy path wins outright,
/// shorter paths beat longer ones, and the server timestamp is a tiny
/// tie-break toward newer files.
pub fn keep_score(file: &FileRecord, taxonomy_paths: &[String]) -> f64 {
    let mut score = 0.0;
    if taxonomy_paths
        .iter()
        .any(|tp| paths::is_under(&file.path, tp))
    {
        score += 100.0;
    }
    score -= file.path.len() as f64;
    score += file.server_mtime as f64 / 1e10;
    score
}

/// Number of leading path segments shared by every member.
fn common_prefix_depth(files: &[FileRecord]) -> usize {
    let mut members = files.iter().map(|f| paths::segments(&f.path));
    let Some(first) = members.next() else {
        return 0;
    };
    let mut prefix = first;
    for segments in members {
        let shared = prefix
            .iter()
            .zip(segments.iter())
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
        if prefix.is_empty() {
            break;
        }
    }
    prefix.len()
}

/// Delete the redundant copies in every safe-tier group, keeping the index
/// in step with each successful deletion. Mirrors the phase-2 execution
/// shape: batched remote calls with a per-item fallback pass.
/// Returns (deleted, failed).
pub fn execute_safe<R: RemoteFs + ?Sized>(
    db: &Database,
    remote: &R,
    report: &DedupReport,
    batch_size: usize,
    operator: &dyn Operator,
) -> Result<(usize, usize), Error> {
    let delete_paths: Vec<String> = report
        .safe
        .iter()
        .flat_map(|g| g.delete.iter().map(|f| f.path.clone()))
        .collect();
    if delete_paths.is_empty() {
        info!("No safely deletable duplicates");
        return Ok((0, 0));
    }

    let reclaimable = report.safe_reclaimable();
    if !operator.confirm(&format!(
        "Delete {} duplicate files ({} bytes reclaimed)?",
        delete_paths.len(),
        reclaimable
    )) {
        info!("Dedup execution cancelled by operator");
        return Ok((0, 0));
    }

    let mut deleted = 0usize;
    let mut store_error: Option<Error> = None;
    let failures = batch::delete_batched(remote, &delete_paths, batch_size, |chunk| {
        deleted += chunk.len();
        if store_error.is_none() {
            if let Err(err) = db.delete_records(chunk) {
                store_error = Some(err.into());
            }
        }
    });
    if let Some(err) = store_error {
        return Err(err);
    }

    for (path, err) in &failures {
        warn!("Failed to delete duplicate {}: {}", path, err);
    }
    info!(
        "Dedup complete: {} deleted, {} failed",
        deleted,
        failures.len()
    );
    Ok((deleted, failures.len()))
}
