//! Archive executors. Both strategies return exactly one [`Outcome`] per input
//! candidate and never retry a failure.
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::jira::JiraService;
use crate::model::{Candidate, Outcome};

pub mod batch;
pub mod pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorStrategy {
    /// `concurrency` workers, one archive call per candidate. Outcomes are unordered.
    WorkerPool { concurrency: NonZeroUsize },
    /// One bulk call per batch, batches strictly in sequence. Outcomes keep input order.
    SequentialBatch { batch_size: NonZeroUsize },
}

impl ExecutorStrategy {
    pub async fn execute(
        &self,
        service: Arc<dyn JiraService>,
        candidates: Vec<Candidate>,
    ) -> Vec<Outcome> {
        match *self {
            ExecutorStrategy::WorkerPool { concurrency } => {
                pool::archive_concurrently(service, candidates, concurrency).await
            }
            ExecutorStrategy::SequentialBatch { batch_size } => {
                batch::archive_in_batches(service.as_ref(), &candidates, batch_size).await
            }
        }
    }
}
