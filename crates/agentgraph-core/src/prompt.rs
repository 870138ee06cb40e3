//! Prompt synthesis: role constraint, task framing, search findings and
//! neighbor outputs combined into a `(system, user)` prompt pair.

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use crate::gate::SearchSummary;
use crate::llm::ChatMessage;

const SPATIAL_HEADER: &str = "At the same time, the outputs of other agents are as follows:\n\n";
const TEMPORAL_HEADER: &str = "In the last round of dialogue, the outputs of other agents were: \n\n";

/// The system and user prompt for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// Two-message chat sequence: system first, then user.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }

    /// SHA-256 hex digest over both prompts, NUL-separated.
    pub fn digest(&self) -> String {
        let mut hasher = sha2::Sha256::new();
        hasher.update(self.system.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.user.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// How the user prompt opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFraming {
    /// `"The task is: <task>\n"`.
    Plain(String),
    /// Pre-rendered adversarial framing from the prompt set.
    Adversarial(String),
}

impl TaskFraming {
    fn render(&self) -> String {
        match self {
            TaskFraming::Plain(task) => format!("The task is: {task}\n"),
            TaskFraming::Adversarial(text) => text.clone(),
        }
    }
}

/// Inputs to [`synthesize_prompt`]. Neighbor blocks come pre-rendered.
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub constraint: &'a str,
    pub framing: &'a TaskFraming,
    pub search_summary: Option<&'a SearchSummary>,
    pub spatial_block: &'a str,
    pub temporal_block: &'a str,
}

/// Build the prompt pair. Pure: identical inputs give byte-identical output.
///
/// Empty neighbor blocks omit their section entirely, header included.
pub fn synthesize_prompt(inputs: PromptInputs<'_>) -> PromptPair {
    let mut user = inputs.framing.render();

    if let Some(summary) = inputs.search_summary {
        user.push_str(&summary.prompt_sentence());
    }
    if !inputs.spatial_block.is_empty() {
        user.push_str(SPATIAL_HEADER);
        user.push_str(inputs.spatial_block);
        user.push_str(" \n\n");
    }
    if !inputs.temporal_block.is_empty() {
        user.push_str(TEMPORAL_HEADER);
        user.push_str(inputs.temporal_block);
    }

    PromptPair {
        system: inputs.constraint.to_string(),
        user,
    }
}
