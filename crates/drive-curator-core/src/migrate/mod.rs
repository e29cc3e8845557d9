pub mod batch;
mod phases;
mod plan;
mod rollback;

pub use phases::{
    build_move_request, cleanup_candidates, high_confidence_pending, new_batch_id,
    review_pending, MigrationExecutor, PhaseSummary,
};
pub use plan::{migration_plan, BandSummary, MigrationPlan};
