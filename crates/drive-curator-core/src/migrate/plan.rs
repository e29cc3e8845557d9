use std::collections::BTreeSet;

use crate::error::Error;
use crate::storage::models::{ClassificationStatus, ConfidenceBand};
use crate::storage::Database;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandSummary {
    pub directories: usize,
    pub files: i64,
    pub bytes: i64,
}

/// What the four phases would do with the current pending snapshot.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    pub target_directories: usize,
    pub high: BandSummary,
    pub medium: BandSummary,
    pub low: BandSummary,
}

pub fn migration_plan(db: &Database) -> Result<MigrationPlan, Error> {
    let pending = db.classifications(Some(ClassificationStatus::Pending), None)?;

    let mut plan = MigrationPlan::default();
    let mut targets = BTreeSet::new();
    for record in &pending {
        targets.insert(record.target_path.clone());
        let band = match record.band() {
            ConfidenceBand::High => &mut plan.high,
            ConfidenceBand::Medium => &mut plan.medium,
            ConfidenceBand::Low => &mut plan.low,
        };
        band.directories += 1;
        band.files += record.file_count;
        band.bytes += record.total_size;
    }
    plan.target_directories = targets.len();
    Ok(plan)
}
