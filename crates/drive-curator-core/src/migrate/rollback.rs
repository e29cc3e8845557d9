use tracing::{info, warn};

use crate::error::Error;
use crate::operator::Operator;
use crate::paths;
use crate::remote::{MoveRequest, RemoteFs};
use crate::storage::models::{ClassificationStatus, LogStatus, MigrationLogEntry};

use super::phases::{new_batch_id, MigrationExecutor, PhaseSummary};

impl<'a, R: RemoteFs + ?Sized> MigrationExecutor<'a, R> {
    /// The moves rollback would undo, newest first. With `batch_id` None
    /// the entire migration history qualifies.
    pub fn rollback_plan(&self, batch_id: Option<&str>) -> Result<Vec<MigrationLogEntry>, Error> {
        Ok(self.db.successful_moves(batch_id)?)
    }

    /// Undo one batch's successful moves, newest first. The original log
    /// rows stay untouched; every undo attempt gets its own entry.
    pub fn rollback_batch(
        &self,
        batch_id: &str,
        operator: &dyn Operator,
    ) -> Result<PhaseSummary, Error> {
        let entries = self.rollback_plan(Some(batch_id))?;
        if entries.is_empty() {
            info!("No rollback candidates in batch {}", batch_id);
            return Ok(PhaseSummary::cancelled());
        }
        if !operator.confirm(&format!(
            "Roll back {} moves from batch {}?",
            entries.len(),
            batch_id
        )) {
            info!("Rollback of batch {} cancelled by operator", batch_id);
            return Ok(PhaseSummary::cancelled());
        }
        self.replay_inverse(&entries)
    }

    /// Undo every successful migration move across all batches, strictly
    /// newest first so nested moves unwind in the right order, then reset
    /// every migrated classification back to pending.
    pub fn rollback_all(&self, operator: &dyn Operator) -> Result<PhaseSummary, Error> {
        let entries = self.rollback_plan(None)?;
        if entries.is_empty() {
            info!("Nothing to roll back");
            return Ok(PhaseSummary::cancelled());
        }
        if !operator.confirm(&format!(
            "Roll back all {} migration moves?",
            entries.len()
        )) {
            info!("Full rollback cancelled by operator");
            return Ok(PhaseSummary::cancelled());
        }

        let summary = self.replay_inverse(&entries)?;
        if summary.succeeded > 0 {
            let reset = self.db.reset_migrated_to_pending()?;
            info!("Reset {} classifications to pending", reset);
        }
        Ok(summary)
    }

    fn replay_inverse(&self, entries: &[MigrationLogEntry]) -> Result<PhaseSummary, Error> {
        let mut summary = PhaseSummary::with_batch(format!("rb-{}", new_batch_id()));

        for entry in entries {
            let (source_dir, dir_name) = paths::split_parent(&entry.source_path);
            let request = MoveRequest {
                path: entry.target_path.clone(),
                dest: source_dir,
                newname: dir_name,
            };
            match self.remote.move_or_rename(std::slice::from_ref(&request)) {
                Ok(()) => {
                    self.db.append_log(
                        &summary.batch_id,
                        0,
                        &entry.target_path,
                        &entry.source_path,
                        LogStatus::Rollback,
                        "",
                    )?;
                    self.db.update_classification_status(
                        &entry.source_path,
                        ClassificationStatus::Pending,
                    )?;
                    self.db
                        .relocate_records(&entry.target_path, &entry.source_path)?;
                    summary.succeeded += 1;
                    info!("Rolled back {} -> {}", entry.target_path, entry.source_path);
                }
                // The target may have been moved again by a later,
                // independent operation; nothing left to undo here.
                Err(err) if err.is_not_found() => {
                    self.db.append_log(
                        &summary.batch_id,
                        0,
                        &entry.target_path,
                        &entry.source_path,
                        LogStatus::Skipped,
                        &err.to_string(),
                    )?;
                    summary.skipped += 1;
                }
                Err(err) => {
                    warn!("Rollback failed for {}: {}", entry.target_path, err);
                    self.db.append_log(
                        &summary.batch_id,
                        0,
                        &entry.target_path,
                        &entry.source_path,
                        LogStatus::Failed,
                        &err.to_string(),
                    )?;
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Rollback complete: {} undone, {} skipped, {} failed",
            summary.succeeded, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}
