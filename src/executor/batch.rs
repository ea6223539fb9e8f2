use std::num::NonZeroUsize;
use tracing::{info, instrument, warn};

use crate::jira::JiraService;
use crate::model::{Candidate, Outcome};

/// Contiguous, order-preserving batches of at most `batch_size` candidates.
pub fn partition(
    candidates: &[Candidate],
    batch_size: NonZeroUsize,
) -> std::slice::Chunks<'_, Candidate> {
    candidates.chunks(batch_size.get())
}

/// Archive candidates with one bulk call per batch, one batch at a time.
///
/// A failed call marks every candidate of that batch failed with the same error.
/// A successful call fails only the keys it lists in its error map.
#[instrument(skip_all, fields(candidates = candidates.len(), batch_size = batch_size.get()))]
pub async fn archive_in_batches(
    service: &dyn JiraService,
    candidates: &[Candidate],
    batch_size: NonZeroUsize,
) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(candidates.len());
    let batches = candidates.len().div_ceil(batch_size.get());
    info!(total = candidates.len(), batches, "starting batched archive");

    for (index, batch) in partition(candidates, batch_size).enumerate() {
        let keys: Vec<String> = batch.iter().map(|c| c.key.clone()).collect();
        info!(batch = index + 1, batches, size = keys.len(), "archiving batch");

        match service.archive_issues(&keys).await {
            Ok(result) => {
                let updated = result.updated;
                let mut failed = 0usize;
                for key in keys {
                    match result.error_for(&key) {
                        Some(message) => {
                            failed += 1;
                            warn!(
                                batch = index + 1,
                                key = %key,
                                error = %message,
                                "issue not archived"
                            );
                            outcomes.push(Outcome::failed(key, message));
                        }
                        None => outcomes.push(Outcome::archived(key)),
                    }
                }
                let archived = batch.len() - failed;
                info!(batch = index + 1, archived, failed, "batch complete");
                if let Some(updated) = updated.filter(|&n| n != archived as u64) {
                    warn!(
                        batch = index + 1,
                        updated,
                        archived,
                        "Jira reported a different number of archived issues"
                    );
                }
            }
            Err(err) => {
                let detail = format!("{:#}", err);
                warn!(
                    batch = index + 1,
                    size = keys.len(),
                    error = %detail,
                    "batch archive call failed"
                );
                outcomes.extend(
                    keys.into_iter()
                        .map(|key| Outcome::failed(key, detail.clone())),
                );
            }
        }
    }
    outcomes
}
