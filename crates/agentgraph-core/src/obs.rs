//! Structured observability hooks for node invocations.
//!
//! This module provides:
//! - Node-scoped tracing spans (`node_span`, and the `NodeSpan` RAII guard)
//! - Emission functions for invocation phases, searches, prompts and responses
//!
//! Lifecycle events are emitted at `info!`; full prompt and response text only
//! at `debug!`. For JSON output, start the binary with `--json`.

use tracing::{debug, info};

use crate::gate::SearchRequest;
use crate::node::InvocationPhase;
use crate::prompt::PromptPair;

/// Span covering one invocation of a node.
///
/// Suspending callers attach it with `tracing::Instrument`; blocking callers
/// use [`NodeSpan`].
pub fn node_span(node_id: &str, role: &str, mode: &'static str) -> tracing::Span {
    tracing::info_span!("agentgraph.node", node_id = %node_id, role = %role, mode = mode)
}

/// RAII guard that enters a node-scoped span for the duration of a call.
pub struct NodeSpan {
    _span: tracing::span::EnteredSpan,
}

impl NodeSpan {
    pub fn enter(node_id: &str, role: &str, mode: &'static str) -> Self {
        Self {
            _span: node_span(node_id, role, mode).entered(),
        }
    }
}

/// Emit event: the invocation moved to `phase`.
pub fn emit_phase(node_id: &str, phase: InvocationPhase) {
    debug!(event = "node.phase", node_id = %node_id, phase = %phase);
}

/// Emit event: neighbor outputs rendered.
pub fn emit_neighbors_aggregated(node_id: &str, spatial: usize, temporal: usize) {
    info!(
        event = "node.neighbors_aggregated",
        node_id = %node_id,
        spatial = spatial,
        temporal = temporal,
    );
}

/// Emit event: a search batch is about to be issued.
pub fn emit_search_requested(node_id: &str, request: &SearchRequest) {
    crate::metrics::METRICS.inc_searches();
    info!(
        event = "node.search_requested",
        node_id = %node_id,
        neighbor_id = %request.neighbor_id,
        site = %request.site,
        queries = ?request.queries,
    );
}

/// Emit event: a search batch returned.
pub fn emit_search_completed(node_id: &str, neighbor_id: &str, results: usize) {
    info!(
        event = "node.search_completed",
        node_id = %node_id,
        neighbor_id = %neighbor_id,
        results = results,
    );
}

/// Emit event: prompt pair synthesized.
pub fn emit_prompt_ready(node_id: &str, prompt: &PromptPair) {
    info!(
        event = "node.prompt_ready",
        node_id = %node_id,
        prompt_digest = %prompt.digest(),
        user_len = prompt.user.len(),
    );
    debug!(node_id = %node_id, system_prompt = %prompt.system, user_prompt = %prompt.user);
}

/// Emit event: model responded; `augmented` when a search summary was appended.
pub fn emit_response(node_id: &str, response: &str, augmented: bool, duration_ms: u64) {
    info!(
        event = "node.responded",
        node_id = %node_id,
        response_len = response.len(),
        augmented = augmented,
        duration_ms = duration_ms,
    );
    debug!(node_id = %node_id, response = %response);
}
