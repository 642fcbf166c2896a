//! DuckDuckGo Instant Answer API client.

use super::{WebSearch, WebSnippet};
use crate::config::SearchSettings;
use crate::error::{Result, VerhaalError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("verhaal/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    related_topics: Vec<RelatedTopic>,
}

/// Either a plain topic or a named group of topics.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RelatedTopic {
    text: String,
    #[serde(rename = "FirstURL")]
    first_url: String,
    topics: Vec<RelatedTopic>,
}

/// Web search through `api.duckduckgo.com`.
#[derive(Clone)]
pub struct DuckDuckGoSearch {
    http: Client,
    base_url: String,
}

impl DuckDuckGoSearch {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VerhaalError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        Self::new(&settings.base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request_url(&self, query: &str) -> Result<url::Url> {
        url::Url::parse_with_params(
            &format!("{}/", self.base_url),
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|e| VerhaalError::Config(format!("Invalid search base URL: {}", e)))
    }
}

fn collect_snippets(answer: InstantAnswer, limit: usize) -> Vec<WebSnippet> {
    let mut snippets = Vec::new();

    if !answer.abstract_text.trim().is_empty() {
        snippets.push(WebSnippet {
            title: answer.heading.clone(),
            text: answer.abstract_text.trim().to_string(),
            url: answer.abstract_url.clone(),
        });
    }

    let mut stack: Vec<RelatedTopic> = answer.related_topics.into_iter().rev().collect();
    while let Some(topic) = stack.pop() {
        if !topic.topics.is_empty() {
            stack.extend(topic.topics.into_iter().rev());
            continue;
        }
        if !topic.text.trim().is_empty() {
            snippets.push(WebSnippet {
                title: String::new(),
                text: topic.text.trim().to_string(),
                url: topic.first_url,
            });
        }
    }

    snippets.truncate(limit);
    snippets
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebSnippet>> {
        let url = self.request_url(query)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| VerhaalError::WebSearch(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerhaalError::WebSearch(format!(
                "DuckDuckGo returned HTTP {}",
                status.as_u16()
            )));
        }

        // The API answers with a javascript content type, so decode the body directly.
        let body = response
            .text()
            .await
            .map_err(|e| VerhaalError::WebSearch(format!("reading response failed: {}", e)))?;
        let answer: InstantAnswer = serde_json::from_str(&body)
            .map_err(|e| VerhaalError::WebSearch(format!("unexpected response: {}", e)))?;

        let snippets = collect_snippets(answer, limit);
        debug!("DuckDuckGo returned {} snippets", snippets.len());
        Ok(snippets)
    }
}
