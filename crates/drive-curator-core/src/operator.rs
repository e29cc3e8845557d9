use crate::storage::models::ClassificationRecord;

/// Decision for one item in the interactive review loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Execute the suggested move.
    Approve,
    /// Never migrate this directory.
    Reject,
    /// Leave pending for a future run.
    Skip,
    /// Abandon the remaining undecided items.
    Quit,
}

/// Operator-facing hooks the executor blocks on.
///
/// The CLI implements this over stdin. There are no timeouts; phase 3 is
/// paced entirely by the human.
pub trait Operator {
    fn confirm(&self, prompt: &str) -> bool;
    fn review(&self, item: &ClassificationRecord, position: usize, total: usize) -> ReviewDecision;
}

/// Confirms and approves everything.
pub struct AutoApprove;

impl Operator for AutoApprove {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }

    fn review(
        &self,
        _item: &ClassificationRecord,
        _position: usize,
        _total: usize,
    ) -> ReviewDecision {
        ReviewDecision::Approve
    }
}
