use std::collections::HashMap;

/// An issue located by the search that is eligible for archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub id: Option<u64>,
    pub summary: String,
}

impl Candidate {
    pub fn new(key: impl Into<String>, id: Option<u64>, summary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id,
            summary: summary.into(),
        }
    }
}

/// Result of attempting to archive one candidate. `error` is set iff the attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub key: String,
    pub error: Option<String>,
}

impl Outcome {
    pub fn archived(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            error: None,
        }
    }

    pub fn failed(key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            error: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Where the next search request should resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Start,
    /// Opaque token issued by the service; forwarded untouched.
    Token(String),
    Offset(usize),
}

/// Continuation state reported by one search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// No further pages.
    Done,
    Token(String),
    /// Offset-paginated result set of the given total size.
    Total(usize),
}

/// One page of search results, already mapped into candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub candidates: Vec<Candidate>,
    pub continuation: Continuation,
}

/// Per-key errors reported by a successful bulk archive call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkArchiveResult {
    pub errors: HashMap<String, String>,
    /// Count the service claims to have archived, when it reports one.
    pub updated: Option<u64>,
}

impl BulkArchiveResult {
    /// Error message for `key`, ignoring blank messages.
    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors
            .get(key)
            .map(String::as_str)
            .filter(|msg| !msg.trim().is_empty())
    }
}
