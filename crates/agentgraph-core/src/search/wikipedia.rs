//! Wikipedia page-summary search.
//!
//! Each query is treated as a page title and resolved through the REST
//! summary endpoint of the requested site. Missing pages yield no result;
//! any other non-success status is an error.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SearchTool;

/// Settings for [`WikipediaSearch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikipediaConfig {
    /// Site used when a node passes an empty source.
    #[serde(default = "default_site")]
    pub site: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_site() -> String {
    "en.wikipedia.org".to_string()
}

fn default_user_agent() -> String {
    format!("agentgraph/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            site: std::env::var("AGENTGRAPH_SEARCH_SITE").unwrap_or_else(|_| default_site()),
            user_agent: default_user_agent(),
        }
    }
}

/// Search backend over a MediaWiki REST API.
pub struct WikipediaSearch {
    config: WikipediaConfig,
    http_client: reqwest::Client,
    blocking_client: OnceLock<reqwest::blocking::Client>,
}

impl WikipediaSearch {
    pub fn new(config: WikipediaConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .context("failed to create HTTP client for Wikipedia search")?;
        Ok(Self {
            config,
            http_client,
            blocking_client: OnceLock::new(),
        })
    }

    fn summary_url(&self, site: &str, query: &str) -> Result<Url> {
        let site = if site.is_empty() {
            self.config.site.as_str()
        } else {
            site
        };
        let base = if site.starts_with("http://") || site.starts_with("https://") {
            site.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", site.trim_end_matches('/'))
        };
        let mut url = Url::parse(&format!("{base}/api/rest_v1/page/summary"))
            .with_context(|| format!("invalid search site {site:?}"))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("search site {site:?} cannot carry a path"))?
            .push(&query.replace(' ', "_"));
        Ok(url)
    }

    async fn lookup(&self, query: &str, site: &str) -> Result<Option<String>> {
        let url = self.summary_url(site, query)?;
        debug!(url = %url, "wikipedia summary lookup");
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("wikipedia request for {query:?} failed"))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text().await?;
        summary_from_response(query, status, &body)
    }

    fn lookup_blocking(&self, query: &str, site: &str) -> Result<Option<String>> {
        let url = self.summary_url(site, query)?;
        debug!(url = %url, "wikipedia summary lookup (blocking)");
        let client = match self.blocking_client.get() {
            Some(client) => client,
            None => {
                let client = reqwest::blocking::Client::builder()
                    .user_agent(&self.config.user_agent)
                    .build()
                    .context("failed to create blocking HTTP client for Wikipedia search")?;
                self.blocking_client.get_or_init(|| client)
            }
        };
        let response = client
            .get(url)
            .send()
            .with_context(|| format!("wikipedia request for {query:?} failed"))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text()?;
        summary_from_response(query, status, &body)
    }
}

#[async_trait]
impl SearchTool for WikipediaSearch {
    async fn search_batch(&self, queries: &[String], site: &str) -> Result<Vec<String>> {
        let found = try_join_all(queries.iter().map(|q| self.lookup(q, site))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    fn search_batch_blocking(&self, queries: &[String], site: &str) -> Result<Vec<String>> {
        let mut results = Vec::new();
        for query in queries {
            if let Some(summary) = self.lookup_blocking(query, site)? {
                results.push(summary);
            }
        }
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
}

fn summary_from_response(query: &str, status: StatusCode, body: &str) -> Result<Option<String>> {
    if !status.is_success() {
        anyhow::bail!("wikipedia returned {status} for {query:?}: {body}");
    }
    let page: PageSummary = serde_json::from_str(body)
        .with_context(|| format!("unexpected wikipedia response for {query:?}"))?;
    let extract = page.extract.trim();
    if extract.is_empty() {
        return Ok(None);
    }
    let title = if page.title.is_empty() {
        query
    } else {
        page.title.as_str()
    };
    Ok(Some(format!("{title}: {extract}")))
}
