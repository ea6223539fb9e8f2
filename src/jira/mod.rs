use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Config, SearchApi};
use crate::jira::model::{ArchiveReq, ArchiveResp, SearchResp};
use crate::model::{BulkArchiveResult, Candidate, PageCursor, SearchPage};

pub mod model;

const USER_AGENT: &str = "jira-bulk-archive/0.1";

/// The remote calls the locator and executors depend on.
#[async_trait]
pub trait JiraService: Send + Sync {
    async fn search(&self, jql: &str, cursor: &PageCursor, page_size: usize) -> Result<SearchPage>;

    /// Archive a single issue; a per-key error reported by the service is a failure.
    async fn archive_issue(&self, key: &str) -> Result<()>;

    /// Archive many issues in one call. `Ok` may still carry per-key errors.
    async fn archive_issues(&self, keys: &[String]) -> Result<BulkArchiveResult>;
}

#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    base_url: Url,
    email: String,
    api_token: String,
    search_api: SearchApi,
}

impl fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("search_api", &self.search_api)
            .finish_non_exhaustive()
    }
}

impl JiraClient {
    pub fn new(
        mut base_url: Url,
        email: String,
        api_token: String,
        search_api: SearchApi,
        timeout: Duration,
    ) -> Result<Self> {
        // `Url::join` replaces the last path segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .no_proxy()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            email,
            api_token,
            search_api,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.jira_base_url.clone(),
            cfg.jira_email.clone(),
            cfg.jira_api_token.clone(),
            cfg.search_api,
            cfg.request_timeout(),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid Jira endpoint {}", path))
    }

    pub fn build_search_request(
        &self,
        jql: &str,
        cursor: &PageCursor,
        page_size: usize,
    ) -> Result<reqwest::Request> {
        let max_results = page_size.to_string();
        let mut query: Vec<(&str, String)> = vec![
            ("jql", jql.to_string()),
            ("maxResults", max_results),
            ("fields", "summary".to_string()),
        ];
        let path = match (self.search_api, cursor) {
            (SearchApi::Jql, PageCursor::Start) => "rest/api/3/search/jql",
            (SearchApi::Jql, PageCursor::Token(token)) => {
                query.push(("nextPageToken", token.clone()));
                "rest/api/3/search/jql"
            }
            (SearchApi::Legacy, PageCursor::Start) => {
                query.push(("startAt", "0".to_string()));
                "rest/api/3/search"
            }
            (SearchApi::Legacy, PageCursor::Offset(offset)) => {
                query.push(("startAt", offset.to_string()));
                "rest/api/3/search"
            }
            (api, cursor) => bail!("{:?} search cannot resume from {:?}", api, cursor),
        };
        self.http
            .get(self.endpoint(path)?)
            .basic_auth(&self.email, Some(&self.api_token))
            .header("Accept", "application/json")
            .query(&query)
            .build()
            .context("failed to build Jira search request")
    }

    pub fn build_archive_request(&self, keys: &[String]) -> Result<reqwest::Request> {
        self.http
            .request(Method::PUT, self.endpoint("rest/api/3/issue/archive")?)
            .basic_auth(&self.email, Some(&self.api_token))
            .header("Accept", "application/json")
            .json(&ArchiveReq {
                issue_ids_or_keys: keys,
            })
            .build()
            .context("failed to build Jira archive request")
    }

    async fn execute(&self, request: reqwest::Request) -> Result<String> {
        debug!(method=%request.method(), url=%request.url(), "sending jira request");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Jira")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("rate limited by Jira: {}", body);
            }
            return Err(anyhow!("Jira returned status {}: {}", status.as_u16(), body));
        }
        let code = status.as_u16();
        res.text()
            .await
            .with_context(|| format!("failed to read Jira response (status {})", code))
    }
}

#[async_trait]
impl JiraService for JiraClient {
    async fn search(
        &self,
        jql: &str,
        cursor: &PageCursor,
        page_size: usize,
    ) -> Result<SearchPage> {
        let request = self.build_search_request(jql, cursor, page_size)?;
        let body = self.execute(request).await?;
        let resp: SearchResp =
            serde_json::from_str(&body).context("invalid Jira search response")?;
        let continuation = resp.continuation();
        Ok(SearchPage {
            candidates: resp.issues.into_iter().map(Candidate::from).collect(),
            continuation,
        })
    }

    async fn archive_issue(&self, key: &str) -> Result<()> {
        let result = self.archive_issues(&[key.to_string()]).await?;
        match result.error_for(key) {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }

    async fn archive_issues(&self, keys: &[String]) -> Result<BulkArchiveResult> {
        let request = self.build_archive_request(keys)?;
        let body = self.execute(request).await?;
        // 204 carries no body
        if body.trim().is_empty() {
            return Ok(BulkArchiveResult::default());
        }
        let resp: ArchiveResp =
            serde_json::from_str(&body).context("invalid Jira archive response")?;
        Ok(resp.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str, api: SearchApi) -> JiraClient {
        JiraClient::new(
            Url::parse(base).unwrap(),
            "ops@example.com".into(),
            "token".into(),
            api,
            Duration::from_secs(30),
        )
        .unwrap()
    }

    fn query(request: &reqwest::Request, name: &str) -> Option<String> {
        request
            .url()
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn jql_search_forwards_token() {
        let client = client("https://example.atlassian.net", SearchApi::Jql);
        let first = client
            .build_search_request("project = \"PROJ\"", &PageCursor::Start, 100)
            .unwrap();
        assert_eq!(first.method(), Method::GET);
        assert_eq!(first.url().path(), "/rest/api/3/search/jql");
        assert_eq!(query(&first, "jql").as_deref(), Some("project = \"PROJ\""));
        assert_eq!(query(&first, "maxResults").as_deref(), Some("100"));
        assert_eq!(query(&first, "fields").as_deref(), Some("summary"));
        assert_eq!(query(&first, "nextPageToken"), None);

        let next = client
            .build_search_request("x", &PageCursor::Token("tok/=1".into()), 100)
            .unwrap();
        assert_eq!(query(&next, "nextPageToken").as_deref(), Some("tok/=1"));
    }

    #[test]
    fn legacy_search_uses_offsets() {
        let client = client("https://example.atlassian.net", SearchApi::Legacy);
        let first = client.build_search_request("x", &PageCursor::Start, 50).unwrap();
        assert_eq!(first.url().path(), "/rest/api/3/search");
        assert_eq!(query(&first, "startAt").as_deref(), Some("0"));

        let next = client
            .build_search_request("x", &PageCursor::Offset(150), 50)
            .unwrap();
        assert_eq!(query(&next, "startAt").as_deref(), Some("150"));
    }

    #[test]
    fn mismatched_cursor_is_rejected() {
        let client = client("https://example.atlassian.net", SearchApi::Jql);
        assert!(client
            .build_search_request("x", &PageCursor::Offset(100), 100)
            .is_err());
    }

    #[test]
    fn base_path_is_preserved() {
        let client = client("https://example.com/jira", SearchApi::Jql);
        let request = client.build_search_request("x", &PageCursor::Start, 10).unwrap();
        assert_eq!(request.url().path(), "/jira/rest/api/3/search/jql");
    }

    #[test]
    fn archive_request_sets_headers_and_body() {
        let client = client("https://example.atlassian.net", SearchApi::Jql);
        let request = client
            .build_archive_request(&["PROJ-1".to_string()])
            .unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.url().path(), "/rest/api/3/issue/archive");
        let headers = request.headers();
        assert!(headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .unwrap()
            .starts_with("Basic "));
        assert_eq!(
            headers
                .get("Content-Type")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/json"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json, serde_json::json!({ "issueIdsOrKeys": ["PROJ-1"] }));
    }

    #[test]
    fn debug_hides_credentials() {
        let client = client("https://example.atlassian.net", SearchApi::Jql);
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("token"));
        assert!(!rendered.contains("ops@example.com"));
    }
}
