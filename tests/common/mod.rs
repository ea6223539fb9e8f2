#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;

use jira_bulk_archive::jira::JiraService;
use jira_bulk_archive::model::{BulkArchiveResult, Candidate, Continuation, PageCursor, SearchPage};

pub fn candidate(i: usize) -> Candidate {
    Candidate::new(format!("PROJ-{}", i), Some(10_000 + i as u64), format!("issue {}", i))
}

pub fn candidates(range: std::ops::RangeInclusive<usize>) -> Vec<Candidate> {
    range.map(candidate).collect()
}

/// Token-paginated pages of the given sizes with sequential keys.
pub fn token_pages(sizes: &[usize]) -> Vec<Result<SearchPage>> {
    let mut next = 1;
    sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            let page = candidates(next..=next + size - 1);
            next += size;
            let continuation = if i + 1 < sizes.len() {
                Continuation::Token(format!("token-{}", i + 1))
            } else {
                Continuation::Done
            };
            Ok(SearchPage {
                candidates: page,
                continuation,
            })
        })
        .collect()
}

/// Offset-paginated pages of the given sizes, each reporting `total`.
pub fn offset_pages(sizes: &[usize], total: usize) -> Vec<Result<SearchPage>> {
    let mut next = 1;
    sizes
        .iter()
        .map(|&size| {
            let page = if size == 0 {
                Vec::new()
            } else {
                candidates(next..=next + size - 1)
            };
            next += size;
            Ok(SearchPage {
                candidates: page,
                continuation: Continuation::Total(total),
            })
        })
        .collect()
}

#[derive(Clone, Default)]
pub struct RecordingJira {
    pages: Arc<Mutex<VecDeque<Result<SearchPage>>>>,
    cursors: Arc<Mutex<Vec<PageCursor>>>,
    single_failures: Arc<Mutex<HashMap<String, String>>>,
    batch_failures: Arc<Mutex<HashMap<usize, String>>>,
    key_errors: Arc<Mutex<HashMap<String, String>>>,
    archived: Arc<Mutex<HashSet<String>>>,
    single_calls: Arc<Mutex<Vec<String>>>,
    batch_calls: Arc<Mutex<Vec<Vec<String>>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Duration,
}

impl RecordingJira {
    pub fn with_pages(pages: Vec<Result<SearchPage>>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(VecDeque::from(pages))),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `archive_issue(key)` fails with `message` as if the request itself failed.
    pub async fn fail_single(&self, key: &str, message: &str) {
        self.single_failures
            .lock()
            .await
            .insert(key.to_string(), message.to_string());
    }

    /// The `call`-th bulk archive call (1-based) fails outright.
    pub async fn fail_batch_call(&self, call: usize, message: &str) {
        self.batch_failures
            .lock()
            .await
            .insert(call, message.to_string());
    }

    /// Successful bulk calls report `message` for `key`.
    pub async fn reject_key(&self, key: &str, message: &str) {
        self.key_errors
            .lock()
            .await
            .insert(key.to_string(), message.to_string());
    }

    pub async fn cursors(&self) -> Vec<PageCursor> {
        self.cursors.lock().await.clone()
    }

    pub async fn single_calls(&self) -> Vec<String> {
        self.single_calls.lock().await.clone()
    }

    pub async fn batch_calls(&self) -> Vec<Vec<String>> {
        self.batch_calls.lock().await.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl JiraService for RecordingJira {
    async fn search(
        &self,
        _jql: &str,
        cursor: &PageCursor,
        _page_size: usize,
    ) -> Result<SearchPage> {
        self.cursors.lock().await.push(cursor.clone());
        self.pages.lock().await.pop_front().unwrap_or_else(|| {
            Ok(SearchPage {
                candidates: Vec::new(),
                continuation: Continuation::Done,
            })
        })
    }

    async fn archive_issue(&self, key: &str) -> Result<()> {
        self.single_calls.lock().await.push(key.to_string());
        self.enter().await;
        let result = if let Some(message) = self.single_failures.lock().await.get(key) {
            Err(anyhow!("{}", message))
        } else if !self.archived.lock().await.insert(key.to_string()) {
            Err(anyhow!("Issue {} is already archived", key))
        } else {
            Ok(())
        };
        self.leave();
        result
    }

    async fn archive_issues(&self, keys: &[String]) -> Result<BulkArchiveResult> {
        let call = {
            let mut calls = self.batch_calls.lock().await;
            calls.push(keys.to_vec());
            calls.len()
        };
        self.enter().await;
        let result = if let Some(message) = self.batch_failures.lock().await.get(&call) {
            Err(anyhow!("{}", message))
        } else {
            let key_errors = self.key_errors.lock().await;
            let mut archived = self.archived.lock().await;
            let mut result = BulkArchiveResult::default();
            for key in keys {
                if let Some(message) = key_errors.get(key) {
                    result.errors.insert(key.clone(), message.clone());
                } else if !archived.insert(key.clone()) {
                    result
                        .errors
                        .insert(key.clone(), format!("Issue {} is already archived", key));
                }
            }
            Ok(result)
        };
        self.leave();
        result
    }
}
