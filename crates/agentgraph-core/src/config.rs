//! File and environment configuration.
//!
//! ```toml
//! [llm]
//! api_base = "http://localhost:8000/v1"
//! model = "qwen2.5-7b-instruct"
//!
//! [search]
//! site = "en.wikipedia.org"
//!
//! [node]
//! marker = "@"
//! append_search_summary = true  # unset: only the suspending mode appends
//!
//! [[prompt_sets]]
//! domain = "trivia"
//! roles = ["Knowlegable Expert", "Searcher"]
//! adversarial_template = "Answer wrongly: {task}"
//! [prompt_sets.descriptions]
//! "Knowlegable Expert" = "Name the entities to look up, wrapped in @."
//! "Searcher" = "Answer using the looked-up explanations."
//! ```
//!
//! Environment variables override file values: `AGENTGRAPH_LLM_API_BASE`,
//! `AGENTGRAPH_LLM_API_KEY`, `AGENTGRAPH_LLM_MODEL`, `AGENTGRAPH_SEARCH_SITE`.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NodeError, NodeResult};
use crate::node::ExecutionOptions;
use crate::prompt_set::{PromptSetConfig, StaticPromptSet};
use crate::providers::{LlmConfig, OpenAiCompatClient};
use crate::registry::Registries;
use crate::search::{WikipediaConfig, WikipediaSearch};

/// Registry name of the built-in search tool.
pub const WIKIPEDIA_TOOL: &str = "wikipedia";

/// Domain of the built-in prompt set.
pub const GENERAL_DOMAIN: &str = "general";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentGraphConfig {
    pub llm: LlmConfig,
    pub search: WikipediaConfig,
    pub node: ExecutionOptions,
    pub prompt_sets: Vec<PromptSetConfig>,
}

impl AgentGraphConfig {
    /// Read a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> NodeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> NodeResult<Self> {
        let mut config: Self = toml::from_str(text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("AGENTGRAPH_LLM_API_BASE") {
            self.llm.api_base = v;
        }
        if let Ok(v) = std::env::var("AGENTGRAPH_LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Ok(v) = std::env::var("AGENTGRAPH_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("AGENTGRAPH_SEARCH_SITE") {
            self.search.site = v;
        }
    }

    pub fn validate(&self) -> NodeResult<()> {
        self.node.validate()?;
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(NodeError::Config(format!(
                "temperature {} is outside [0, 2]",
                self.llm.temperature
            )));
        }
        if self.llm.model.is_empty() {
            return Err(NodeError::Config("llm.model must not be empty".to_string()));
        }
        Ok(())
    }

    /// Registries holding the configured model (under its model name),
    /// the Wikipedia search tool, the configured prompt sets and the
    /// built-in `general` domain unless a configured set replaces it.
    pub fn build_registries(&self) -> NodeResult<Registries> {
        let mut registries = Registries::new();

        let llm = OpenAiCompatClient::new(self.llm.clone()).map_err(NodeError::Llm)?;
        registries.llms.register(&self.llm.model, Arc::new(llm))?;

        let search = WikipediaSearch::new(self.search.clone()).map_err(NodeError::Search)?;
        registries
            .search_tools
            .register(WIKIPEDIA_TOOL, Arc::new(search))?;

        for set in &self.prompt_sets {
            let prompt_set = StaticPromptSet::new(set.clone())?;
            registries
                .prompt_sets
                .register(&set.domain, Arc::new(prompt_set))?;
        }
        if !registries.prompt_sets.contains(GENERAL_DOMAIN) {
            registries
                .prompt_sets
                .register(GENERAL_DOMAIN, Arc::new(StaticPromptSet::general()))?;
        }

        Ok(registries)
    }
}
