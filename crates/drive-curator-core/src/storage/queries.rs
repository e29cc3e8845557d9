use rusqlite::{params, params_from_iter, types::Value, Result, Row};
use tracing::debug;

use super::models::*;
use super::sqlite::Database;
use crate::paths;

const FILE_COLUMNS: &str =
    "fsid, path, file_name, size, is_dir, content_hash, server_mtime, extension, parent_dir";

fn file_from_row(row: &Row) -> Result<FileRecord> {
    Ok(FileRecord {
        fsid: row.get(0)?,
        path: row.get(1)?,
        file_name: row.get(2)?,
        size: row.get(3)?,
        is_dir: row.get(4)?,
        content_hash: row.get(5)?,
        server_mtime: row.get(6)?,
        extension: row.get(7)?,
        parent_dir: row.get(8)?,
    })
}

fn classification_from_row(row: &Row) -> Result<ClassificationRecord> {
    let alternatives_json: String = row.get(5)?;
    let status_text: String = row.get(8)?;
    Ok(ClassificationRecord {
        source_path: row.get(0)?,
        target_path: row.get(1)?,
        confidence: row.get(2)?,
        rule_name: row.get(3)?,
        reason: row.get(4)?,
        alternatives: serde_json::from_str(&alternatives_json).unwrap_or_default(),
        file_count: row.get(6)?,
        total_size: row.get(7)?,
        status: ClassificationStatus::parse(&status_text).unwrap_or(ClassificationStatus::Pending),
    })
}

fn log_entry_from_row(row: &Row) -> Result<MigrationLogEntry> {
    let status_text: String = row.get(5)?;
    Ok(MigrationLogEntry {
        id: row.get(0)?,
        batch_id: row.get(1)?,
        phase: row.get(2)?,
        source_path: row.get(3)?,
        target_path: row.get(4)?,
        status: LogStatus::parse(&status_text).unwrap_or(LogStatus::Failed),
        error_message: row.get(6)?,
        executed_at: row.get(7)?,
    })
}

impl Database {
    // ── File index ───────────────────────────────────────────────

    /// Insert or refresh a batch of records in one transaction. The index
    /// builder calls this after every remote listing page.
    pub fn upsert_files(&self, files: &[FileRecord]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let now = chrono::Utc::now().to_rfc3339();
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO indexed_file \
                 (fsid, path, file_name, size, is_dir, content_hash, server_mtime, extension, parent_dir, scanned_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
                 ON CONFLICT(fsid) DO UPDATE SET \
                     path = excluded.path, \
                     file_name = excluded.file_name, \
                     size = excluded.size, \
                     is_dir = excluded.is_dir, \
                     content_hash = excluded.content_hash, \
                     server_mtime = excluded.server_mtime, \
                     extension = excluded.extension, \
                     parent_dir = excluded.parent_dir, \
                     scanned_at = excluded.scanned_at",
            )?;
            for file in files {
                count += stmt.execute(params![
                    file.fsid,
                    file.path,
                    file.file_name,
                    file.size,
                    file.is_dir,
                    file.content_hash,
                    file.server_mtime,
                    file.extension,
                    file.parent_dir,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Upserted {} file records", count);
        Ok(count)
    }

    pub fn all_files(&self, include_dirs: bool) -> Result<Vec<FileRecord>> {
        let sql = if include_dirs {
            format!("SELECT {} FROM indexed_file ORDER BY path", FILE_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM indexed_file WHERE is_dir = 0 ORDER BY path",
                FILE_COLUMNS
            )
        };
        let mut stmt = self.connection().prepare(&sql)?;
        let files = stmt
            .query_map([], file_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Files sharing a nonzero content hash and nonzero size, grouped by
    /// hash. Only hashes with at least two members are returned; members
    /// are ordered by path.
    pub fn find_duplicate_groups(&self) -> Result<Vec<(String, Vec<FileRecord>)>> {
        let sql = format!(
            "SELECT {} FROM indexed_file \
             WHERE is_dir = 0 AND content_hash != '' AND size > 0 \
               AND content_hash IN ( \
                   SELECT content_hash FROM indexed_file \
                   WHERE is_dir = 0 AND content_hash != '' AND size > 0 \
                   GROUP BY content_hash HAVING COUNT(*) > 1) \
             ORDER BY content_hash, path",
            FILE_COLUMNS
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let files = stmt
            .query_map([], file_from_row)?
            .collect::<Result<Vec<_>>>()?;

        let mut groups: Vec<(String, Vec<FileRecord>)> = Vec::new();
        for file in files {
            match groups.last_mut() {
                Some((hash, members)) if *hash == file.content_hash => members.push(file),
                _ => groups.push((file.content_hash.clone(), vec![file])),
            }
        }
        Ok(groups)
    }

    /// Directory records with no indexed child.
    pub fn find_empty_directories(&self) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM indexed_file AS d \
             WHERE d.is_dir = 1 \
               AND NOT EXISTS (SELECT 1 FROM indexed_file AS f WHERE f.parent_dir = d.path) \
             ORDER BY d.path",
            FILE_COLUMNS
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let dirs = stmt
            .query_map([], file_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(dirs)
    }

    pub fn delete_records(&self, record_paths: &[String]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM indexed_file WHERE path = ?1")?;
            for path in record_paths {
                count += stmt.execute(params![path])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    /// Rewrites index paths after a successful remote move so the index
    /// stays in step without a rescan.
    pub fn relocate_records(&self, old_path: &str, new_path: &str) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let count = tx.execute(
            "UPDATE indexed_file SET \
                 path = ?2 || SUBSTR(path, LENGTH(?1) + 1), \
                 parent_dir = CASE \
                     WHEN parent_dir = ?1 OR parent_dir LIKE ?1 || '/%' \
                     THEN ?2 || SUBSTR(parent_dir, LENGTH(?1) + 1) \
                     ELSE parent_dir END \
             WHERE path = ?1 OR path LIKE ?1 || '/%'",
            params![old_path, new_path],
        )?;
        // The moved object itself gets its new parent.
        let (new_parent, _) = paths::split_parent(new_path);
        tx.execute(
            "UPDATE indexed_file SET parent_dir = ?2 WHERE path = ?1",
            params![new_path, new_parent],
        )?;
        tx.commit()?;
        debug!("Relocated {} index records {} -> {}", count, old_path, new_path);
        Ok(count)
    }

    /// Files at or above `min_size` bytes, largest first.
    pub fn find_large_files(&self, min_size: i64) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM indexed_file WHERE is_dir = 0 AND size >= ?1 ORDER BY size DESC",
            FILE_COLUMNS
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let files = stmt
            .query_map(params![min_size], file_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Files with a server timestamp older than `cutoff`, oldest first.
    /// Records without a timestamp never qualify.
    pub fn find_stale_files(&self, cutoff: i64) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM indexed_file \
             WHERE is_dir = 0 AND server_mtime > 0 AND server_mtime < ?1 \
             ORDER BY server_mtime",
            FILE_COLUMNS
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let files = stmt
            .query_map(params![cutoff], file_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(files)
    }

    pub fn index_stats(&self) -> Result<IndexStats> {
        self.connection().query_row(
            "SELECT \
                 COALESCE(SUM(CASE WHEN is_dir = 0 THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN is_dir = 1 THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN is_dir = 0 THEN size ELSE 0 END), 0), \
                 COALESCE(MAX(scanned_at), '') \
             FROM indexed_file",
            [],
            |row| {
                Ok(IndexStats {
                    total_files: row.get(0)?,
                    total_dirs: row.get(1)?,
                    total_size: row.get(2)?,
                    last_scanned_at: row.get(3)?,
                })
            },
        )
    }

    // ── Classification snapshot ──────────────────────────────────

    /// Replaces the previous snapshot wholesale; classification runs never
    /// merge into existing rows.
    pub fn replace_classifications(&self, records: &[ClassificationRecord]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        tx.execute("DELETE FROM classification", [])?;
        let now = chrono::Utc::now().to_rfc3339();
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO classification \
                 (source_path, target_path, confidence, rule_name, reason, alternatives, \
                  file_count, total_size, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for record in records {
                let alternatives = serde_json::to_string(&record.alternatives)
                    .unwrap_or_else(|_| "[]".to_string());
                count += stmt.execute(params![
                    record.source_path,
                    record.target_path,
                    record.confidence,
                    record.rule_name,
                    record.reason,
                    alternatives,
                    record.file_count,
                    record.total_size,
                    record.status.as_str(),
                    now,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Replaced classification snapshot with {} rows", count);
        Ok(count)
    }

    pub fn classifications(
        &self,
        status: Option<ClassificationStatus>,
        min_confidence: Option<f64>,
    ) -> Result<Vec<ClassificationRecord>> {
        let mut sql = String::from(
            "SELECT source_path, target_path, confidence, rule_name, reason, alternatives, \
                    file_count, total_size, status \
             FROM classification WHERE 1=1",
        );
        let mut bound: Vec<Value> = Vec::new();
        if let Some(status) = status {
            sql.push_str(" AND status = ?");
            bound.push(Value::from(status.as_str().to_string()));
        }
        if let Some(min_confidence) = min_confidence {
            sql.push_str(" AND confidence >= ?");
            bound.push(Value::from(min_confidence));
        }
        sql.push_str(" ORDER BY confidence DESC, total_size DESC");

        let mut stmt = self.connection().prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(bound), classification_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn update_classification_status(
        &self,
        source_path: &str,
        status: ClassificationStatus,
    ) -> Result<()> {
        self.connection().execute(
            "UPDATE classification SET status = ?1 WHERE source_path = ?2",
            params![status.as_str(), source_path],
        )?;
        Ok(())
    }

    /// After a full rollback every migrated result becomes pending again.
    pub fn reset_migrated_to_pending(&self) -> Result<usize> {
        let count = self.connection().execute(
            "UPDATE classification SET status = 'pending' WHERE status = 'migrated'",
            [],
        )?;
        Ok(count)
    }

    // ── Migration log (append-only) ──────────────────────────────

    pub fn append_log(
        &self,
        batch_id: &str,
        phase: i64,
        source_path: &str,
        target_path: &str,
        status: LogStatus,
        error_message: &str,
    ) -> Result<()> {
        self.connection().execute(
            "INSERT INTO migration_log \
             (batch_id, phase, source_path, target_path, status, error_message, executed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                batch_id,
                phase,
                source_path,
                target_path,
                status.as_str(),
                error_message,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn log_for_batch(&self, batch_id: &str) -> Result<Vec<MigrationLogEntry>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, batch_id, phase, source_path, target_path, status, error_message, executed_at \
             FROM migration_log WHERE batch_id = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![batch_id], log_entry_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn log_for_phase(&self, phase: i64) -> Result<Vec<MigrationLogEntry>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, batch_id, phase, source_path, target_path, status, error_message, executed_at \
             FROM migration_log WHERE phase = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![phase], log_entry_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Successful phase-2/3 moves, newest first. These are the operations
    /// rollback replays in reverse; with `batch_id` None the whole history
    /// qualifies.
    pub fn successful_moves(&self, batch_id: Option<&str>) -> Result<Vec<MigrationLogEntry>> {
        let mut sql = String::from(
            "SELECT id, batch_id, phase, source_path, target_path, status, error_message, executed_at \
             FROM migration_log WHERE status = 'success' AND phase IN (2, 3)",
        );
        let mut bound: Vec<Value> = Vec::new();
        if let Some(batch_id) = batch_id {
            sql.push_str(" AND batch_id = ?");
            bound.push(Value::from(batch_id.to_string()));
        }
        sql.push_str(" ORDER BY executed_at DESC, id DESC");

        let mut stmt = self.connection().prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(bound), log_entry_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }
}
