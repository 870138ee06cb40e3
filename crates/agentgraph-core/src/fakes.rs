//! In-memory fakes for collaborator traits (testing only)
//!
//! Provides `ScriptedLlm` and `StaticSearch`, which satisfy the trait
//! contracts without network access and record every call they receive.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{ChatMessage, LlmClient, MessageRole};
use crate::search::SearchTool;

// ---------------------------------------------------------------------------
// ScriptedLlm
// ---------------------------------------------------------------------------

/// Language model that answers every request with the same reply.
#[derive(Debug)]
pub struct ScriptedLlm {
    reply: Result<String, String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Message lists received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .and_then(|messages| messages.iter().find(|m| m.role == MessageRole::User))
            .map(|m| m.content.clone())
    }

    fn answer(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.reply.clone().map_err(anyhow::Error::msg)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn generate(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        self.answer(messages)
    }

    async fn generate_async(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        tokio::task::yield_now().await;
        self.answer(messages)
    }
}

// ---------------------------------------------------------------------------
// StaticSearch
// ---------------------------------------------------------------------------

/// A recorded `search_batch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub queries: Vec<String>,
    pub site: String,
}

/// Search tool backed by a fixed query → results table.
#[derive(Debug, Default)]
pub struct StaticSearch {
    results: HashMap<String, Vec<String>>,
    failure: Option<String>,
    calls: Mutex<Vec<SearchCall>>,
}

impl StaticSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `result` to the results returned for `query`.
    pub fn with_result(mut self, query: &str, result: &str) -> Self {
        self.results
            .entry(query.to_string())
            .or_default()
            .push(result.to_string());
        self
    }

    /// Every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn lookup(&self, queries: &[String], site: &str) -> anyhow::Result<Vec<String>> {
        self.calls.lock().unwrap().push(SearchCall {
            queries: queries.to_vec(),
            site: site.to_string(),
        });
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }
        Ok(queries
            .iter()
            .filter_map(|q| self.results.get(q))
            .flatten()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SearchTool for StaticSearch {
    async fn search_batch(&self, queries: &[String], site: &str) -> anyhow::Result<Vec<String>> {
        tokio::task::yield_now().await;
        self.lookup(queries, site)
    }

    fn search_batch_blocking(
        &self,
        queries: &[String],
        site: &str,
    ) -> anyhow::Result<Vec<String>> {
        self.lookup(queries, site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_llm_records_calls() {
        let llm = ScriptedLlm::replying("B");
        let reply = llm
            .generate_async(&[ChatMessage::system("s"), ChatMessage::user("u")])
            .await
            .unwrap();
        assert_eq!(reply, "B");
        assert_eq!(llm.calls().len(), 1);
        assert_eq!(llm.last_user_prompt().as_deref(), Some("u"));
    }

    #[test]
    fn test_failing_llm_returns_message() {
        let llm = ScriptedLlm::failing("quota exceeded");
        let err = llm.generate(&[ChatMessage::user("u")]).unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_static_search_preserves_query_order() {
        let search = StaticSearch::new()
            .with_result("b", "B1")
            .with_result("a", "A1")
            .with_result("a", "A2");
        let results = search
            .search_batch_blocking(&["a".to_string(), "x".to_string(), "b".to_string()], "site")
            .unwrap();
        assert_eq!(results, vec!["A1", "A2", "B1"]);
        assert_eq!(search.calls()[0].site, "site");
    }
}
