//! AgentGraph Core Library
//!
//! Agent nodes for multi-agent conversation graphs. Each node reads the
//! outputs of its spatial (current round) and temporal (previous round)
//! neighbors, optionally looks up entities named by knowledgeable experts
//! with a search tool, synthesizes a role-conditioned prompt and dispatches
//! it to a language model.
//!
//! # Module layout
//!
//! - [`neighbors`]: `NeighborInfo`, `format_neighbor_block`
//! - [`query`]: `QueryExtractor`
//! - [`gate`]: `ToolGate`, `SearchRequest`, `SearchSummary`
//! - [`prompt`]: `synthesize_prompt`, `PromptPair`
//! - [`node`]: `AgentNode`, its builder and both execution modes
//! - [`llm`], [`prompt_set`], [`search`]: collaborator contracts
//! - [`providers`], [`search::wikipedia`]: built-in collaborators

pub mod config;
pub mod error;
pub mod fakes;
pub mod gate;
pub mod llm;
pub mod metrics;
pub mod neighbors;
pub mod node;
pub mod obs;
pub mod prompt;
pub mod prompt_set;
pub mod providers;
pub mod query;
pub mod registry;
pub mod roles;
pub mod search;
pub mod telemetry;

pub use config::{AgentGraphConfig, GENERAL_DOMAIN, WIKIPEDIA_TOOL};
pub use error::{NodeError, NodeResult};
pub use gate::{SearchRequest, SearchSummary, ToolGate};
pub use llm::{ChatMessage, LlmClient, MessageRole};
pub use neighbors::{format_neighbor_block, NeighborInfo, NeighborOutput};
pub use node::{
    AgentNode, AgentNodeBuilder, ExecutionMode, ExecutionOptions, InvocationPhase,
    InvocationReport, InvocationRequest, ProcessedInputs,
};
pub use prompt::{synthesize_prompt, PromptInputs, PromptPair, TaskFraming};
pub use prompt_set::{PromptSet, PromptSetConfig, StaticPromptSet};
pub use providers::{LlmConfig, OpenAiCompatClient};
pub use query::{QueryExtractor, DEFAULT_MARKER};
pub use registry::{Registries, Registry};
pub use roles::{AgentRole, ExternalTool, ToolKind};
pub use search::{SearchTool, WikipediaConfig, WikipediaSearch};

pub use metrics::METRICS;
pub use telemetry::init_tracing;

/// AgentGraph version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
