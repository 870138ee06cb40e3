//! Tool invocation gate.
//!
//! A `Searcher` node with a `Search` tool looks up the entities that each
//! spatial `KnowledgeableExpert` neighbor wrapped in query markers. The gate
//! is split into a pure planning step ([`ToolGate::plan`]), execution against
//! a [`SearchTool`] in either mode, and a pure fold of the results into a
//! [`SearchSummary`]. The summary is returned to the caller rather than kept
//! on the node.

use crate::error::{NodeError, NodeResult};
use crate::neighbors::NeighborInfo;
use crate::obs;
use crate::query::QueryExtractor;
use crate::roles::{AgentRole, ExternalTool};
use crate::search::SearchTool;

/// Separator between individual search results in a summary.
pub const RESULT_SEPARATOR: &str = ".\n";

/// One batched search on behalf of one qualifying neighbor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub neighbor_id: String,
    pub queries: Vec<String>,
    pub site: String,
}

/// Joined search results pending inclusion in a prompt and response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSummary(String);

impl SearchSummary {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sentence folded into the user prompt.
    pub fn prompt_sentence(&self) -> String {
        format!(
            "The key entities of the problem are explained as follows:{}",
            self.0
        )
    }
}

impl std::fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides which spatial neighbors trigger a search and what to search for.
#[derive(Debug, Clone, Default)]
pub struct ToolGate {
    extractor: QueryExtractor,
}

impl ToolGate {
    pub fn new(extractor: QueryExtractor) -> Self {
        Self { extractor }
    }

    /// Whether a neighbor in `neighbor_role` triggers a search for this node.
    pub fn fires(node_role: &AgentRole, tool: &ExternalTool, neighbor_role: &AgentRole) -> bool {
        matches!(
            (node_role, neighbor_role),
            (AgentRole::Searcher, AgentRole::KnowledgeableExpert)
        ) && tool.is_search()
    }

    /// One request per qualifying neighbor with at least one non-blank query,
    /// in spatial iteration order.
    pub fn plan(
        &self,
        node_role: &AgentRole,
        tool: &ExternalTool,
        spatial: &NeighborInfo,
    ) -> Vec<SearchRequest> {
        spatial
            .iter()
            .filter(|(_, neighbor)| Self::fires(node_role, tool, &neighbor.role))
            .filter_map(|(id, neighbor)| {
                let queries = self.extractor.extract_searchable(&neighbor.output);
                if queries.is_empty() {
                    return None;
                }
                Some(SearchRequest {
                    neighbor_id: id.clone(),
                    queries,
                    site: tool.source.clone(),
                })
            })
            .collect()
    }

    /// Join all result strings, in request order. `None` when there are none.
    pub fn fold(results: Vec<Vec<String>>) -> Option<SearchSummary> {
        let all: Vec<String> = results.into_iter().flatten().collect();
        if all.is_empty() {
            return None;
        }
        Some(SearchSummary(all.join(RESULT_SEPARATOR)))
    }

    /// Run `requests` one after another, suspending on each batch.
    pub async fn execute(
        &self,
        node_id: &str,
        search: &dyn SearchTool,
        requests: &[SearchRequest],
    ) -> NodeResult<Option<SearchSummary>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            obs::emit_search_requested(node_id, request);
            let found = search
                .search_batch(&request.queries, &request.site)
                .await
                .map_err(NodeError::Search)?;
            obs::emit_search_completed(node_id, &request.neighbor_id, found.len());
            results.push(found);
        }
        Ok(Self::fold(results))
    }

    /// Blocking counterpart of [`execute`](Self::execute).
    pub fn execute_blocking(
        &self,
        node_id: &str,
        search: &dyn SearchTool,
        requests: &[SearchRequest],
    ) -> NodeResult<Option<SearchSummary>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            obs::emit_search_requested(node_id, request);
            let found = search
                .search_batch_blocking(&request.queries, &request.site)
                .map_err(NodeError::Search)?;
            obs::emit_search_completed(node_id, &request.neighbor_id, found.len());
            results.push(found);
        }
        Ok(Self::fold(results))
    }
}
