use std::sync::Arc;
use tracing::{info, instrument};

use crate::executor::ExecutorStrategy;
use crate::jira::JiraService;
use crate::locator::{self, IssueFilter, LocateError};
use crate::report::{Report, Summary};

/// Locate every matching issue, archive them with `strategy`, and summarise.
///
/// Only a failed search is an error; archive failures are reported in the summary.
#[instrument(skip_all, fields(jql = %filter.jql()))]
pub async fn run(
    service: Arc<dyn JiraService>,
    filter: &IssueFilter,
    strategy: ExecutorStrategy,
    page_size: usize,
) -> Result<Report, LocateError> {
    let candidates = locator::locate(service.as_ref(), filter, page_size).await?;
    info!(found = candidates.len(), "issues to archive");
    if candidates.is_empty() {
        return Ok(Report::NothingToArchive);
    }

    let outcomes = strategy.execute(service, candidates).await;
    Ok(Report::Completed(Summary::from_outcomes(&outcomes)))
}
