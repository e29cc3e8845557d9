use tracing::warn;

use crate::remote::{RemoteError, RemoteFs};

/// Outcome of one batched remote call.
#[derive(Debug)]
pub enum BatchAttempt {
    AllOk,
    /// The whole call failed; items must be retried one at a time to find
    /// out which of them are actually bad.
    TransportFailure(RemoteError),
}

fn attempt<R: RemoteFs + ?Sized>(remote: &R, chunk: &[String]) -> BatchAttempt {
    match remote.delete_batch(chunk) {
        Ok(()) => BatchAttempt::AllOk,
        Err(err) => BatchAttempt::TransportFailure(err),
    }
}

/// Delete `paths` in chunks of `batch_size`. A failed chunk is retried item
/// by item so one bad entry cannot sink its neighbours; there is no retry
/// beyond that single fallback pass. Successful deletions are reported
/// through `on_deleted` as they happen; true per-item failures are
/// collected and returned.
pub fn delete_batched<R, F>(
    remote: &R,
    paths: &[String],
    batch_size: usize,
    mut on_deleted: F,
) -> Vec<(String, RemoteError)>
where
    R: RemoteFs + ?Sized,
    F: FnMut(&[String]),
{
    let batch_size = batch_size.max(1);
    let mut failures = Vec::new();

    for chunk in paths.chunks(batch_size) {
        match attempt(remote, chunk) {
            BatchAttempt::AllOk => on_deleted(chunk),
            BatchAttempt::TransportFailure(err) => {
                warn!(
                    "Batch delete of {} items failed ({}); retrying individually",
                    chunk.len(),
                    err
                );
                for path in chunk {
                    match remote.delete_batch(std::slice::from_ref(path)) {
                        Ok(()) => on_deleted(std::slice::from_ref(path)),
                        Err(item_err) => failures.push((path.clone(), item_err)),
                    }
                }
            }
        }
    }

    failures
}
