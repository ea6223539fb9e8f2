use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{BulkArchiveResult, Candidate, Continuation};

#[derive(Deserialize, Debug)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub fields: Option<IssueFields>,
}

impl From<Issue> for Candidate {
    fn from(issue: Issue) -> Self {
        let summary = issue.fields.and_then(|f| f.summary).unwrap_or_default();
        Candidate::new(issue.key, issue.id.parse().ok(), summary)
    }
}

/// Response of both `search/jql` (token paginated) and legacy `search` (offset paginated).
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResp {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub start_at: Option<usize>,
    #[serde(default)]
    pub total: Option<usize>,
}

impl SearchResp {
    /// A non-empty token wins; an offset-shaped response reports its total;
    /// anything else is the last page.
    pub fn continuation(&self) -> Continuation {
        match (&self.next_page_token, self.start_at, self.total) {
            (Some(token), _, _) if !token.is_empty() => Continuation::Token(token.clone()),
            (_, Some(_), Some(total)) => Continuation::Total(total),
            _ => Continuation::Done,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveReq<'a> {
    pub issue_ids_or_keys: &'a [String],
}

/// Error entry of the bulk archive response. Jira groups failures by error kind
/// with the affected keys; a flat `key -> message` map is accepted as well.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ArchiveErrorEntry {
    Message(String),
    Grouped {
        #[serde(default)]
        message: Option<String>,
        #[serde(default, rename = "issueIdsOrKeys")]
        issue_ids_or_keys: Vec<String>,
    },
    Other(Value),
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResp {
    #[serde(default)]
    pub errors: HashMap<String, ArchiveErrorEntry>,
    #[serde(default)]
    pub number_of_issues_updated: Option<u64>,
}

impl From<ArchiveResp> for BulkArchiveResult {
    fn from(resp: ArchiveResp) -> Self {
        let mut errors = HashMap::new();
        for (name, entry) in resp.errors {
            match entry {
                ArchiveErrorEntry::Message(message) => {
                    errors.insert(name, message);
                }
                ArchiveErrorEntry::Grouped {
                    message,
                    issue_ids_or_keys,
                } => {
                    let message = message.unwrap_or_else(|| name.clone());
                    for key in issue_ids_or_keys {
                        errors.insert(key, message.clone());
                    }
                }
                ArchiveErrorEntry::Other(value) => {
                    errors.insert(name, value.to_string());
                }
            }
        }
        BulkArchiveResult {
            errors,
            updated: resp.number_of_issues_updated,
        }
    }
}
