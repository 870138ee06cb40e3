//! Agent node: one position in a multi-agent conversation graph.
//!
//! An invocation aggregates the outputs of spatial (this round) and temporal
//! (previous round) neighbors, optionally runs the search gate, synthesizes a
//! role-conditioned prompt pair and dispatches it to the node's language
//! model. Two execution modes share the same prompt construction:
//!
//! - suspending ([`AgentNode::execute`], [`AgentNode::invoke`]) awaits the
//!   search tool and the model;
//! - blocking ([`AgentNode::execute_blocking`]) uses the blocking variants of
//!   both collaborators.
//!
//! A node holds no per-call mutable state. The search summary produced by the
//! gate is threaded explicitly into response assembly, so concurrent calls on
//! one node cannot observe each other's findings.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{NodeError, NodeResult};
use crate::gate::{SearchRequest, SearchSummary, ToolGate};
use crate::llm::LlmClient;
use crate::metrics::METRICS;
use crate::neighbors::{format_neighbor_block, NeighborInfo};
use crate::obs;
use crate::prompt::{synthesize_prompt, PromptInputs, PromptPair, TaskFraming};
use crate::prompt_set::PromptSet;
use crate::query::{QueryExtractor, DEFAULT_MARKER};
use crate::registry::Registries;
use crate::roles::{AgentRole, ExternalTool};
use crate::search::SearchTool;

/// Per-node execution switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Append `"\n\n" + summary` to the model response when a search ran.
    /// Unset: the suspending mode appends, the blocking mode does not.
    #[serde(default)]
    pub append_search_summary: Option<bool>,
    /// Character wrapping each search query in expert output.
    #[serde(default = "default_marker")]
    pub marker: char,
}

fn default_marker() -> char {
    DEFAULT_MARKER
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            append_search_summary: None,
            marker: DEFAULT_MARKER,
        }
    }
}

impl ExecutionOptions {
    pub fn validate(&self) -> NodeResult<()> {
        if self.marker.is_alphanumeric() || self.marker.is_whitespace() {
            return Err(NodeError::Config(format!(
                "query marker {:?} must not be alphanumeric or whitespace",
                self.marker
            )));
        }
        Ok(())
    }

    /// Whether a search summary is appended to the response in `mode`.
    pub fn appends_summary(&self, mode: ExecutionMode) -> bool {
        self.append_search_summary
            .unwrap_or(mode == ExecutionMode::Suspending)
    }
}

/// How an invocation waits on its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Suspending,
    Blocking,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Suspending => "suspending",
            ExecutionMode::Blocking => "blocking",
        }
    }
}

/// Steps of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationPhase {
    Idle,
    AggregatingNeighbors,
    Searching,
    PromptReady,
    AwaitingModel,
    Responding,
}

impl std::fmt::Display for InvocationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvocationPhase::Idle => "idle",
            InvocationPhase::AggregatingNeighbors => "aggregating_neighbors",
            InvocationPhase::Searching => "searching",
            InvocationPhase::PromptReady => "prompt_ready",
            InvocationPhase::AwaitingModel => "awaiting_model",
            InvocationPhase::Responding => "responding",
        };
        write!(f, "{s}")
    }
}

/// Task text plus neighbor snapshots for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub task: String,
    #[serde(default)]
    pub spatial: NeighborInfo,
    #[serde(default)]
    pub temporal: NeighborInfo,
}

/// Prompt pair and search findings, before the model is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedInputs {
    pub prompt: PromptPair,
    pub search_summary: Option<SearchSummary>,
    pub search_requests: usize,
}

/// Outcome of one suspending or blocking invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationReport {
    pub node_id: String,
    pub role: AgentRole,
    pub response: String,
    pub prompt_digest: String,
    /// A search summary was produced (and folded into the prompt).
    pub searched: bool,
    pub search_requests: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Prompt material that does not depend on search results.
struct Prepared {
    framing: TaskFraming,
    spatial_block: String,
    temporal_block: String,
    requests: Vec<SearchRequest>,
}

/// A role-conditioned agent bound to its collaborators.
pub struct AgentNode {
    id: String,
    role: AgentRole,
    domain: String,
    llm_name: String,
    llm_size: String,
    tool: ExternalTool,
    constraint: String,
    options: ExecutionOptions,
    gate: ToolGate,
    llm: Arc<dyn LlmClient>,
    prompt_set: Arc<dyn PromptSet>,
    search: Option<Arc<dyn SearchTool>>,
}

impl std::fmt::Debug for AgentNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentNode")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("domain", &self.domain)
            .field("llm_name", &self.llm_name)
            .field("tool", &self.tool)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl AgentNode {
    pub fn builder(domain: &str) -> AgentNodeBuilder {
        AgentNodeBuilder::new(domain)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> &AgentRole {
        &self.role
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn llm_name(&self) -> &str {
        &self.llm_name
    }

    pub fn llm_size(&self) -> &str {
        &self.llm_size
    }

    pub fn external_tool(&self) -> &ExternalTool {
        &self.tool
    }

    /// Role constraint, resolved once at construction.
    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Synthesize the prompt pair, running the search gate, without calling
    /// the model.
    pub async fn process_inputs(
        &self,
        task: &str,
        spatial: &NeighborInfo,
        temporal: &NeighborInfo,
    ) -> NodeResult<ProcessedInputs> {
        let prepared = self.prepare(task, spatial, temporal)?;
        let summary = if prepared.requests.is_empty() {
            None
        } else {
            obs::emit_phase(&self.id, InvocationPhase::Searching);
            let search = self.search_tool()?;
            self.gate
                .execute(&self.id, search.as_ref(), &prepared.requests)
                .await?
        };
        Ok(self.finish_prompt(prepared, summary))
    }

    /// Blocking counterpart of [`process_inputs`](Self::process_inputs).
    pub fn process_inputs_blocking(
        &self,
        task: &str,
        spatial: &NeighborInfo,
        temporal: &NeighborInfo,
    ) -> NodeResult<ProcessedInputs> {
        let prepared = self.prepare(task, spatial, temporal)?;
        let summary = if prepared.requests.is_empty() {
            None
        } else {
            obs::emit_phase(&self.id, InvocationPhase::Searching);
            let search = self.search_tool()?;
            self.gate
                .execute_blocking(&self.id, search.as_ref(), &prepared.requests)?
        };
        Ok(self.finish_prompt(prepared, summary))
    }

    /// Suspending mode: returns the (possibly augmented) model response.
    pub async fn execute(
        &self,
        task: &str,
        spatial: &NeighborInfo,
        temporal: &NeighborInfo,
    ) -> NodeResult<String> {
        Ok(self.invoke(task, spatial, temporal).await?.response)
    }

    /// Suspending mode, reporting prompt digest, search activity and timing.
    pub async fn invoke(
        &self,
        task: &str,
        spatial: &NeighborInfo,
        temporal: &NeighborInfo,
    ) -> NodeResult<InvocationReport> {
        let mode = ExecutionMode::Suspending;
        let span = obs::node_span(&self.id, self.role.as_str(), mode.as_str());
        async move {
            METRICS.inc_invocations();
            let started_at = Utc::now();
            let clock = Instant::now();

            let processed = self.process_inputs(task, spatial, temporal).await?;
            let messages = processed.prompt.to_messages();

            obs::emit_phase(&self.id, InvocationPhase::AwaitingModel);
            METRICS.inc_model_calls();
            let raw = self
                .llm
                .generate_async(&messages)
                .await
                .map_err(NodeError::Llm)?;

            Ok(self.respond(mode, raw, processed, started_at, clock))
        }
        .instrument(span)
        .await
    }

    /// Blocking mode: returns the (possibly augmented) model response.
    pub fn execute_blocking(
        &self,
        task: &str,
        spatial: &NeighborInfo,
        temporal: &NeighborInfo,
    ) -> NodeResult<String> {
        Ok(self.invoke_blocking(task, spatial, temporal)?.response)
    }

    /// Blocking mode, reporting prompt digest, search activity and timing.
    pub fn invoke_blocking(
        &self,
        task: &str,
        spatial: &NeighborInfo,
        temporal: &NeighborInfo,
    ) -> NodeResult<InvocationReport> {
        let mode = ExecutionMode::Blocking;
        let _span = obs::NodeSpan::enter(&self.id, self.role.as_str(), mode.as_str());
        METRICS.inc_invocations();
        let started_at = Utc::now();
        let clock = Instant::now();

        let processed = self.process_inputs_blocking(task, spatial, temporal)?;
        let messages = processed.prompt.to_messages();

        obs::emit_phase(&self.id, InvocationPhase::AwaitingModel);
        METRICS.inc_model_calls();
        let raw = self.llm.generate(&messages).map_err(NodeError::Llm)?;

        Ok(self.respond(mode, raw, processed, started_at, clock))
    }

    fn prepare(
        &self,
        task: &str,
        spatial: &NeighborInfo,
        temporal: &NeighborInfo,
    ) -> NodeResult<Prepared> {
        obs::emit_phase(&self.id, InvocationPhase::AggregatingNeighbors);
        let framing = match self.role {
            AgentRole::Fake => TaskFraming::Adversarial(
                self.prompt_set
                    .adversarial_answer_prompt(task)
                    .map_err(NodeError::PromptSet)?,
            ),
            _ => TaskFraming::Plain(task.to_string()),
        };
        let spatial_block = format_neighbor_block(spatial);
        let temporal_block = format_neighbor_block(temporal);
        obs::emit_neighbors_aggregated(&self.id, spatial.len(), temporal.len());

        let requests = self.gate.plan(&self.role, &self.tool, spatial);
        Ok(Prepared {
            framing,
            spatial_block,
            temporal_block,
            requests,
        })
    }

    fn finish_prompt(&self, prepared: Prepared, summary: Option<SearchSummary>) -> ProcessedInputs {
        let prompt = synthesize_prompt(PromptInputs {
            constraint: &self.constraint,
            framing: &prepared.framing,
            search_summary: summary.as_ref(),
            spatial_block: &prepared.spatial_block,
            temporal_block: &prepared.temporal_block,
        });
        obs::emit_phase(&self.id, InvocationPhase::PromptReady);
        obs::emit_prompt_ready(&self.id, &prompt);
        ProcessedInputs {
            prompt,
            search_summary: summary,
            search_requests: prepared.requests.len(),
        }
    }

    fn respond(
        &self,
        mode: ExecutionMode,
        raw: String,
        processed: ProcessedInputs,
        started_at: DateTime<Utc>,
        clock: Instant,
    ) -> InvocationReport {
        obs::emit_phase(&self.id, InvocationPhase::Responding);
        let searched = processed.search_summary.is_some();
        let (response, augmented) = match processed.search_summary {
            Some(summary) if self.options.appends_summary(mode) => {
                METRICS.inc_summaries_appended();
                (format!("{raw}\n\n{summary}"), true)
            }
            _ => (raw, false),
        };
        let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        obs::emit_response(&self.id, &response, augmented, duration_ms);
        obs::emit_phase(&self.id, InvocationPhase::Idle);

        InvocationReport {
            node_id: self.id.clone(),
            role: self.role.clone(),
            response,
            prompt_digest: processed.prompt.digest(),
            searched,
            search_requests: processed.search_requests,
            started_at,
            duration_ms,
        }
    }

    fn search_tool(&self) -> NodeResult<&Arc<dyn SearchTool>> {
        self.search.as_ref().ok_or_else(|| NodeError::MissingSearchTool {
            node: self.id.clone(),
        })
    }
}

/// Construction parameters for an [`AgentNode`].
#[derive(Debug, Clone)]
pub struct AgentNodeBuilder {
    id: Option<String>,
    role: Option<String>,
    domain: String,
    llm_name: String,
    llm_size: String,
    tool: ExternalTool,
    options: ExecutionOptions,
}

impl AgentNodeBuilder {
    pub fn new(domain: &str) -> Self {
        Self {
            id: None,
            role: None,
            domain: domain.to_string(),
            llm_name: String::new(),
            llm_size: String::new(),
            tool: ExternalTool::none(),
            options: ExecutionOptions::default(),
        }
    }

    /// Node id; a UUID v4 is generated when absent.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Role label; the prompt set's default role is used when absent.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Registry name of the language model.
    pub fn llm(mut self, name: impl Into<String>) -> Self {
        self.llm_name = name.into();
        self
    }

    pub fn llm_size(mut self, size: impl Into<String>) -> Self {
        self.llm_size = size.into();
        self
    }

    pub fn external_tool(mut self, tool: ExternalTool) -> Self {
        self.tool = tool;
        self
    }

    pub fn options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve collaborators and the role constraint.
    pub fn build(self, registries: &Registries) -> NodeResult<AgentNode> {
        self.options.validate()?;
        let prompt_set = registries.prompt_sets.get(&self.domain)?;
        let llm = registries.llms.get(&self.llm_name)?;
        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let search = if self.tool.is_search() {
            if self.tool.name.is_empty() {
                return Err(NodeError::MissingSearchTool { node: id });
            }
            Some(registries.search_tools.get(&self.tool.name)?)
        } else {
            None
        };

        let role_label = self.role.unwrap_or_else(|| prompt_set.role());
        let constraint = prompt_set
            .constraint(&role_label)
            .map_err(NodeError::PromptSet)?;

        Ok(AgentNode {
            id,
            role: AgentRole::from(role_label),
            domain: self.domain,
            llm_name: self.llm_name,
            llm_size: self.llm_size,
            tool: self.tool,
            constraint,
            gate: ToolGate::new(QueryExtractor::new(self.options.marker)),
            options: self.options,
            llm,
            prompt_set,
            search,
        })
    }
}
