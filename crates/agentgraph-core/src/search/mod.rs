//! Search-tool contract and built-in search backends.

pub mod wikipedia;

use async_trait::async_trait;

pub use wikipedia::{WikipediaConfig, WikipediaSearch};

/// Batched lookup of queries against a site.
///
/// Returns zero or more result strings; a query with no match contributes
/// nothing. Errors propagate to the caller unmodified.
#[async_trait]
pub trait SearchTool: Send + Sync {
    async fn search_batch(&self, queries: &[String], site: &str) -> anyhow::Result<Vec<String>>;

    fn search_batch_blocking(&self, queries: &[String], site: &str)
        -> anyhow::Result<Vec<String>>;
}
