use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MigrationConfig;
use crate::error::Error;
use crate::operator::{Operator, ReviewDecision};
use crate::paths;
use crate::remote::{MoveRequest, RemoteFs};
use crate::storage::models::{ClassificationRecord, ClassificationStatus, LogStatus};
use crate::storage::Database;
use crate::taxonomy::Taxonomy;

use super::batch;

/// Counters for one phase or rollback invocation. A run the operator
/// declined (or that had nothing to do) carries an empty batch id.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    pub batch_id: String,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub rejected: usize,
}

impl PhaseSummary {
    pub(crate) fn with_batch(batch_id: String) -> Self {
        Self {
            batch_id,
            ..Default::default()
        }
    }

    pub fn cancelled() -> Self {
        Self::default()
    }

    pub fn was_cancelled(&self) -> bool {
        self.batch_id.is_empty()
    }
}

/// Short random id grouping all log rows of one invocation.
pub fn new_batch_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Builds the provider move request for one classified directory.
///
/// When the target's final segment equals the source's name, the target
/// came from a prefix mapping and already encodes the destination path, so
/// the move lands in the target's parent. Otherwise the target is a
/// category directory and the source moves into it keeping its name.
pub fn build_move_request(source_path: &str, target_path: &str) -> MoveRequest {
    let source_name = paths::leaf_name(source_path);
    let (target_parent, target_name) = paths::split_parent(target_path);

    if target_name == source_name {
        MoveRequest {
            path: source_path.to_string(),
            dest: target_parent,
            newname: target_name,
        }
    } else {
        MoveRequest {
            path: source_path.to_string(),
            dest: target_path.to_string(),
            newname: source_name.to_string(),
        }
    }
}

/// Pending results at or above the phase-2 threshold.
pub fn high_confidence_pending(
    db: &Database,
    threshold: f64,
) -> Result<Vec<ClassificationRecord>, Error> {
    Ok(db.classifications(Some(ClassificationStatus::Pending), Some(threshold))?)
}

/// Pending results below the phase-2 threshold, for interactive review.
pub fn review_pending(db: &Database, threshold: f64) -> Result<Vec<ClassificationRecord>, Error> {
    let pending = db.classifications(Some(ClassificationStatus::Pending), None)?;
    Ok(pending
        .into_iter()
        .filter(|c| c.confidence < threshold)
        .collect())
}

/// Empty directories eligible for phase-4 cleanup, deepest first so
/// children always go before their ancestors within one batch.
pub fn cleanup_candidates(db: &Database, config: &MigrationConfig) -> Result<Vec<String>, Error> {
    let empty = db.find_empty_directories()?;
    let mut candidates: Vec<String> = empty
        .into_iter()
        .map(|d| d.path)
        .filter(|p| {
            config
                .legacy_cleanup_prefixes
                .iter()
                .any(|prefix| paths::is_under(p, prefix))
        })
        .collect();
    candidates.sort_by(|a, b| {
        paths::separator_depth(b)
            .cmp(&paths::separator_depth(a))
            .then_with(|| a.cmp(b))
    });
    Ok(candidates)
}

/// Drives the four migration phases (and rollback, in `rollback.rs`)
/// against the remote store, recording every attempt in the append-only
/// migration log. Phases are operator-invoked and never chain.
pub struct MigrationExecutor<'a, R: RemoteFs + ?Sized> {
    pub(crate) db: &'a Database,
    pub(crate) remote: &'a R,
    pub(crate) config: &'a MigrationConfig,
    pub(crate) high_confidence_threshold: f64,
}

impl<'a, R: RemoteFs + ?Sized> MigrationExecutor<'a, R> {
    pub fn new(
        db: &'a Database,
        remote: &'a R,
        config: &'a MigrationConfig,
        high_confidence_threshold: f64,
    ) -> Self {
        Self {
            db,
            remote,
            config,
            high_confidence_threshold,
        }
    }

    // ── Phase 1: create the target structure ─────────────────────

    /// Create every taxonomy path as a remote directory. Already-existing
    /// directories count as success, so re-running the phase is harmless.
    pub fn phase1_create_structure(&self, taxonomy: &Taxonomy) -> Result<PhaseSummary, Error> {
        let mut to_create = taxonomy.all_paths();
        to_create.sort();

        let mut summary = PhaseSummary::with_batch(new_batch_id());
        info!("Phase 1: creating {} category directories", to_create.len());

        for path in &to_create {
            match self.remote.create_directory(path) {
                Ok(()) => {
                    self.db
                        .append_log(&summary.batch_id, 1, "", path, LogStatus::Success, "")?;
                    summary.succeeded += 1;
                }
                Err(err) if err.is_already_exists() => {
                    self.db
                        .append_log(&summary.batch_id, 1, "", path, LogStatus::Exists, "")?;
                    summary.succeeded += 1;
                }
                Err(err) => {
                    warn!("Failed to create {}: {}", path, err);
                    self.db.append_log(
                        &summary.batch_id,
                        1,
                        "",
                        path,
                        LogStatus::Failed,
                        &err.to_string(),
                    )?;
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Phase 1 complete: {} ok, {} failed",
            summary.succeeded, summary.failed
        );
        Ok(summary)
    }

    // ── Phase 2: automatic high-confidence moves ─────────────────

    pub fn phase2_auto_move(&self, operator: &dyn Operator) -> Result<PhaseSummary, Error> {
        let pending = high_confidence_pending(self.db, self.high_confidence_threshold)?;
        if pending.is_empty() {
            info!(
                "Phase 2: nothing pending at or above confidence {:.2}",
                self.high_confidence_threshold
            );
            return Ok(PhaseSummary::cancelled());
        }

        if !operator.confirm(&format!("Move {} directories?", pending.len())) {
            info!("Phase 2 cancelled by operator");
            return Ok(PhaseSummary::cancelled());
        }

        let mut summary = PhaseSummary::with_batch(new_batch_id());
        for item in &pending {
            if self.move_one(&summary.batch_id, 2, item)? {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }
        info!(
            "Phase 2 complete: {} moved, {} failed",
            summary.succeeded, summary.failed
        );
        Ok(summary)
    }

    /// Issue a single directory move and record the outcome. Failures leave
    /// the classification pending and never block sibling moves.
    pub(crate) fn move_one(
        &self,
        batch_id: &str,
        phase: i64,
        item: &ClassificationRecord,
    ) -> Result<bool, Error> {
        let request = build_move_request(&item.source_path, &item.target_path);
        let final_path = request.final_path();
        match self.remote.move_or_rename(std::slice::from_ref(&request)) {
            Ok(()) => {
                self.db
                    .update_classification_status(&item.source_path, ClassificationStatus::Migrated)?;
                self.db.append_log(
                    batch_id,
                    phase,
                    &item.source_path,
                    &final_path,
                    LogStatus::Success,
                    "",
                )?;
                self.db.relocate_records(&item.source_path, &final_path)?;
                info!("Moved {} -> {}", item.source_path, final_path);
                Ok(true)
            }
            Err(err) => {
                warn!("Move failed for {}: {}", item.source_path, err);
                self.db.append_log(
                    batch_id,
                    phase,
                    &item.source_path,
                    &final_path,
                    LogStatus::Failed,
                    &err.to_string(),
                )?;
                Ok(false)
            }
        }
    }

    // ── Phase 3: interactive review ──────────────────────────────

    /// Walk every below-threshold pending result past the operator, one at
    /// a time. Quit abandons only the undecided remainder; decisions
    /// already taken stand.
    pub fn phase3_review(&self, operator: &dyn Operator) -> Result<PhaseSummary, Error> {
        let to_review = review_pending(self.db, self.high_confidence_threshold)?;
        if to_review.is_empty() {
            info!("Phase 3: nothing to review");
            return Ok(PhaseSummary::cancelled());
        }

        let total = to_review.len();
        let mut summary = PhaseSummary::with_batch(new_batch_id());
        for (position, item) in to_review.iter().enumerate() {
            match operator.review(item, position + 1, total) {
                ReviewDecision::Approve => {
                    if self.move_one(&summary.batch_id, 3, item)? {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                ReviewDecision::Reject => {
                    self.db.update_classification_status(
                        &item.source_path,
                        ClassificationStatus::Rejected,
                    )?;
                    summary.rejected += 1;
                }
                ReviewDecision::Skip => summary.skipped += 1,
                ReviewDecision::Quit => {
                    info!(
                        "Review stopped by operator with {} items undecided",
                        total - position
                    );
                    break;
                }
            }
        }
        info!(
            "Phase 3 complete: {} approved, {} rejected, {} skipped",
            summary.succeeded, summary.rejected, summary.skipped
        );
        Ok(summary)
    }

    // ── Phase 4: cleanup of emptied legacy directories ───────────

    /// Delete empty directories under the configured legacy prefixes.
    /// Batched, with per-item fallback when a whole batch call fails.
    pub fn phase4_cleanup(&self, operator: &dyn Operator) -> Result<PhaseSummary, Error> {
        let candidates = cleanup_candidates(self.db, self.config)?;
        if candidates.is_empty() {
            info!("Phase 4: no empty legacy directories");
            return Ok(PhaseSummary::cancelled());
        }

        if !operator.confirm(&format!(
            "Delete {} empty directories?",
            candidates.len()
        )) {
            info!("Phase 4 cancelled by operator");
            return Ok(PhaseSummary::cancelled());
        }

        let mut summary = PhaseSummary::with_batch(new_batch_id());
        let batch_id = summary.batch_id.clone();
        let mut deleted = 0usize;
        let mut store_error: Option<Error> = None;

        let failures = batch::delete_batched(
            self.remote,
            &candidates,
            self.config.delete_batch_size,
            |chunk| {
                deleted += chunk.len();
                if store_error.is_none() {
                    if let Err(err) = self.record_deleted(&batch_id, chunk) {
                        store_error = Some(err);
                    }
                }
            },
        );
        if let Some(err) = store_error {
            return Err(err);
        }

        for (path, err) in &failures {
            self.db
                .append_log(&batch_id, 4, path, "", LogStatus::Failed, &err.to_string())?;
        }
        summary.succeeded = deleted;
        summary.failed = failures.len();
        info!(
            "Phase 4 complete: {} deleted, {} failed",
            summary.succeeded, summary.failed
        );
        Ok(summary)
    }

    fn record_deleted(&self, batch_id: &str, chunk: &[String]) -> Result<(), Error> {
        self.db.delete_records(chunk)?;
        for path in chunk {
            self.db
                .append_log(batch_id, 4, path, "", LogStatus::Deleted, "")?;
        }
        Ok(())
    }
}
