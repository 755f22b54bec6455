use std::collections::BTreeSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use talkscope_core::UpstreamConfig;

use crate::error::{Result, SyncError};
use crate::http::RateLimitedClient;
use crate::sources::MeetingSource;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}(?:-\d{2})?$").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// The `devmtg/` tree of the llvm-www repository on GitHub.
pub struct LlvmWwwSource {
    client: RateLimitedClient,
    api_base: String,
    raw_base: String,
    repo: String,
    git_ref: String,
    token: Option<String>,
}

impl LlvmWwwSource {
    pub fn new(config: &UpstreamConfig, token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::from_config(config)?,
            api_base: config.github_api_base.trim_end_matches('/').to_string(),
            raw_base: config.raw_base.trim_end_matches('/').to_string(),
            repo: config.repo.trim_matches('/').to_string(),
            git_ref: config.git_ref.clone(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn headers(&self, accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        if let Some(token) = &self.token
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
        {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    fn contents_url(&self) -> Result<Url> {
        let raw = format!("{}/repos/{}/contents/devmtg", self.api_base, self.repo);
        let mut url =
            Url::parse(&raw).map_err(|e| SyncError::Parse(format!("invalid API URL {raw}: {e}")))?;
        url.query_pairs_mut().append_pair("ref", &self.git_ref);
        Ok(url)
    }

    fn raw_url(&self, path: &str) -> String {
        format!("{}/{}/{}/{}", self.raw_base, self.repo, self.git_ref, path)
    }
}

#[async_trait]
impl MeetingSource for LlvmWwwSource {
    fn name(&self) -> &str {
        "llvm-www"
    }

    async fn list_slugs(&self) -> Result<Vec<String>> {
        let url = self.contents_url()?;
        let entries: Vec<ContentEntry> = self
            .client
            .get_json(url.as_str(), self.headers("application/vnd.github+json"))
            .await?;

        let slugs: BTreeSet<String> = entries
            .into_iter()
            .filter(|entry| entry.kind == "dir")
            .map(|entry| entry.name.trim().to_string())
            .filter(|name| SLUG_RE.is_match(name))
            .collect();
        tracing::debug!(count = slugs.len(), "listed upstream meetings");
        Ok(slugs.into_iter().rev().collect())
    }

    async fn fetch_meeting_page(&self, slug: &str) -> Result<String> {
        let url = self.raw_url(&format!("devmtg/{slug}/index.html"));
        self.client.get_with_headers(&url, self.headers("text/html")).await
    }

    async fn fetch_index_page(&self) -> Result<String> {
        let url = self.raw_url("devmtg/index.html");
        self.client.get_with_headers(&url, self.headers("text/html")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(server: &mockito::Server, token: Option<&str>) -> LlvmWwwSource {
        let config = UpstreamConfig {
            github_api_base: server.url(),
            raw_base: format!("{}/raw", server.url()),
            min_interval_ms: 0,
            max_retries: 0,
            ..UpstreamConfig::default()
        };
        LlvmWwwSource::new(&config, token.map(str::to_string)).unwrap()
    }

    #[tokio::test]
    async fn list_slugs_keeps_meeting_dirs_newest_first() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/llvm/llvm-www/contents/devmtg")
            .match_query(mockito::Matcher::UrlEncoded("ref".into(), "main".into()))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"name": "2019-04-08", "type": "dir"},
                    {"name": "2024-10", "type": "dir"},
                    {"name": "images", "type": "dir"},
                    {"name": "index.html", "type": "file"},
                    {"name": "2023-10", "type": "dir"},
                    {"name": "2023-10", "type": "dir"}
                ]"#,
            )
            .create_async()
            .await;

        let slugs = source(&server, Some("secret")).list_slugs().await.unwrap();
        assert_eq!(slugs, vec!["2024-10", "2023-10", "2019-04-08"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn pages_are_read_from_raw_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/raw/llvm/llvm-www/main/devmtg/2024-10/index.html")
            .with_status(200)
            .with_body("<html>meeting</html>")
            .create_async()
            .await;
        server
            .mock("GET", "/raw/llvm/llvm-www/main/devmtg/index.html")
            .with_status(200)
            .with_body("<html>index</html>")
            .create_async()
            .await;

        let source = source(&server, None);
        assert_eq!(
            source.fetch_meeting_page("2024-10").await.unwrap(),
            "<html>meeting</html>"
        );
        assert_eq!(source.fetch_index_page().await.unwrap(), "<html>index</html>");
    }

    #[tokio::test]
    async fn malformed_listing_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/llvm/llvm-www/contents/devmtg")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("{\"message\": \"Not Found\"}")
            .create_async()
            .await;

        let err = source(&server, None).list_slugs().await.unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));
    }
}
