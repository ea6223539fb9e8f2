//! Issue locator: drains a paginated search into the full candidate set.
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::jira::JiraService;
use crate::model::{Candidate, Continuation, PageCursor};

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("search failed on page {page}: {detail:#}")]
    Query { page: usize, detail: anyhow::Error },
    #[error("search returned the same continuation token twice on page {page}")]
    RepeatedCursor { page: usize },
}

/// Project + label filter rendered as JQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    pub project_key: String,
    pub label: String,
}

impl IssueFilter {
    pub fn new(project_key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            label: label.into(),
        }
    }

    pub fn jql(&self) -> String {
        format!(
            "project = {} AND labels = {}",
            quote_jql(&self.project_key),
            quote_jql(&self.label)
        )
    }
}

fn quote_jql(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Fetch every issue matching `filter`. Any failed page aborts the whole call and
/// nothing fetched so far is returned.
#[instrument(skip_all, fields(page_size = page_size))]
pub async fn locate(
    service: &dyn JiraService,
    filter: &IssueFilter,
    page_size: usize,
) -> Result<Vec<Candidate>, LocateError> {
    let jql = filter.jql();
    let mut candidates = Vec::new();
    let mut seen = HashSet::new();
    let mut seen_tokens = HashSet::new();
    let mut cursor = PageCursor::Start;
    // raw rows received, duplicates included; drives the offset discipline
    let mut fetched = 0usize;
    let mut page = 0usize;

    loop {
        page += 1;
        let result = service
            .search(&jql, &cursor, page_size)
            .await
            .map_err(|detail| LocateError::Query { page, detail })?;

        let received = result.candidates.len();
        fetched += received;
        for candidate in result.candidates {
            if seen.insert(candidate.key.clone()) {
                candidates.push(candidate);
            } else {
                warn!(key = %candidate.key, page, "duplicate issue across pages; skipping");
            }
        }
        debug!(page, received, total = candidates.len(), "search page fetched");

        cursor = match result.continuation {
            Continuation::Token(token) if !token.is_empty() => {
                if !seen_tokens.insert(token.clone()) {
                    return Err(LocateError::RepeatedCursor { page });
                }
                PageCursor::Token(token)
            }
            // an empty page can never advance the offset
            Continuation::Total(total) if fetched < total && received > 0 => {
                PageCursor::Offset(fetched)
            }
            _ => break,
        };
    }

    info!(pages = page, found = candidates.len(), "search complete");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jql_quotes_project_and_label() {
        let filter = IssueFilter::new("PROJ", "archive");
        assert_eq!(filter.jql(), r#"project = "PROJ" AND labels = "archive""#);
    }

    #[test]
    fn jql_escapes_quotes_and_backslashes() {
        let filter = IssueFilter::new("PROJ", r#"old "stuff"\x"#);
        assert_eq!(
            filter.jql(),
            r#"project = "PROJ" AND labels = "old \"stuff\"\\x""#
        );
    }
}
