use serde::{Deserialize, Serialize};

use crate::paths;

/// One remote object as captured by the index builder. `fsid` is the
/// provider's stable numeric id; `path` is unique across the index.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub fsid: i64,
    pub path: String,
    pub file_name: String,
    pub size: i64,
    pub is_dir: bool,
    pub content_hash: String,
    pub server_mtime: i64,
    pub extension: String,
    pub parent_dir: String,
}

impl FileRecord {
    /// Builds a record from the fields a remote listing provides; file name,
    /// extension and parent directory are derived from the path.
    pub fn new(
        fsid: i64,
        path: &str,
        size: i64,
        is_dir: bool,
        content_hash: &str,
        server_mtime: i64,
    ) -> Self {
        let (parent_dir, file_name) = paths::split_parent(path);
        let extension = if is_dir {
            String::new()
        } else {
            paths::extension_of(&file_name)
        };
        Self {
            fsid,
            path: path.to_string(),
            file_name,
            size,
            is_dir,
            content_hash: content_hash.to_string(),
            server_mtime,
            extension,
            parent_dir,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationStatus {
    Pending,
    Migrated,
    Rejected,
}

impl ClassificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationStatus::Pending => "pending",
            ClassificationStatus::Migrated => "migrated",
            ClassificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ClassificationStatus::Pending),
            "migrated" => Some(ClassificationStatus::Migrated),
            "rejected" => Some(ClassificationStatus::Rejected),
            _ => None,
        }
    }
}

/// Presentational grouping of a confidence value. Never gates execution;
/// the phase-2/3 split uses the configured threshold instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            ConfidenceBand::High
        } else if confidence >= 0.5 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        }
    }
}

/// A runner-up classification candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub target_path: String,
    pub confidence: f64,
    pub reason: String,
}

/// Where one source directory should live, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRecord {
    pub source_path: String,
    pub target_path: String,
    pub confidence: f64,
    pub rule_name: String,
    pub reason: String,
    pub alternatives: Vec<Candidate>,
    pub file_count: i64,
    pub total_size: i64,
    pub status: ClassificationStatus,
}

impl ClassificationRecord {
    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Success,
    Exists,
    Failed,
    Deleted,
    Rollback,
    Skipped,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Exists => "exists",
            LogStatus::Failed => "failed",
            LogStatus::Deleted => "deleted",
            LogStatus::Rollback => "rollback",
            LogStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(LogStatus::Success),
            "exists" => Some(LogStatus::Exists),
            "failed" => Some(LogStatus::Failed),
            "deleted" => Some(LogStatus::Deleted),
            "rollback" => Some(LogStatus::Rollback),
            "skipped" => Some(LogStatus::Skipped),
            _ => None,
        }
    }
}

/// One append-only audit row. Phase 0 is the rollback pseudo-phase.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationLogEntry {
    pub id: i64,
    pub batch_id: String,
    pub phase: i64,
    pub source_path: String,
    pub target_path: String,
    pub status: LogStatus,
    pub error_message: String,
    pub executed_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total_files: i64,
    pub total_dirs: i64,
    pub total_size: i64,
    /// Newest `scanned_at` in the index, empty when nothing was scanned.
    pub last_scanned_at: String,
}
