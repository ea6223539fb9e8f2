use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::jira::JiraService;
use crate::model::{Candidate, Outcome};

/// Archive each candidate with its own request across a fixed pool of workers.
///
/// Candidates are queued on a channel that every worker drains, so each one is
/// taken exactly once. Outcomes flow back over a second channel; the call returns
/// once every worker has exited and the result channel is closed.
#[instrument(skip_all, fields(candidates = candidates.len(), workers = concurrency.get()))]
pub async fn archive_concurrently(
    service: Arc<dyn JiraService>,
    candidates: Vec<Candidate>,
    concurrency: NonZeroUsize,
) -> Vec<Outcome> {
    let total = candidates.len();
    let mut outcomes = Vec::with_capacity(total);
    if total == 0 {
        return outcomes;
    }
    let worker_count = concurrency.get().min(total);
    info!(total, worker_count, "starting archive workers");

    let mut pending: HashSet<String> = candidates.iter().map(|c| c.key.clone()).collect();

    let (job_tx, job_rx) = mpsc::unbounded_channel::<Candidate>();
    for candidate in candidates {
        if let Err(mpsc::error::SendError(candidate)) = job_tx.send(candidate) {
            pending.remove(&candidate.key);
            outcomes.push(Outcome::failed(candidate.key, "archive queue closed"));
        }
    }
    drop(job_tx);
    let jobs = Arc::new(Mutex::new(job_rx));

    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<Outcome>();
    let mut workers = JoinSet::new();
    for worker_id in 1..=worker_count {
        let jobs = Arc::clone(&jobs);
        let results = result_tx.clone();
        let service = Arc::clone(&service);
        workers.spawn(async move {
            loop {
                let next = jobs.lock().await.recv().await;
                let Some(candidate) = next else { break };
                let outcome = archive_one(service.as_ref(), worker_id, &candidate).await;
                if results.send(outcome).is_err() {
                    break;
                }
            }
        });
    }
    drop(result_tx);

    while let Some(outcome) = result_rx.recv().await {
        pending.remove(&outcome.key);
        outcomes.push(outcome);
    }
    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            error!(?err, "archive worker aborted");
        }
    }

    // A worker that panicked mid-request never reported its candidate.
    for key in pending {
        outcomes.push(Outcome::failed(key, "archive worker aborted before reporting"));
    }
    outcomes
}

async fn archive_one(
    service: &dyn JiraService,
    worker_id: usize,
    candidate: &Candidate,
) -> Outcome {
    info!(worker_id, key = %candidate.key, summary = %candidate.summary, "archiving issue");
    match service.archive_issue(&candidate.key).await {
        Ok(()) => {
            info!(worker_id, key = %candidate.key, "archived");
            Outcome::archived(candidate.key.clone())
        }
        Err(err) => {
            let detail = format!("{:#}", err);
            warn!(worker_id, key = %candidate.key, error = %detail, "archive failed");
            Outcome::failed(candidate.key.clone(), detail)
        }
    }
}
