//! Error types for agent node construction and execution.

/// Errors produced by an agent node.
///
/// Collaborator failures (model, search, prompt set) are carried unmodified:
/// their `Display` output is the collaborator's own message.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("no {kind} registered under name {name:?}")]
    UnknownCollaborator { kind: &'static str, name: String },

    #[error("duplicate {kind} registration: {name:?}")]
    DuplicateCollaborator { kind: &'static str, name: String },

    #[error("node {node} is configured for search but has no search tool bound")]
    MissingSearchTool { node: String },

    #[error(transparent)]
    Llm(anyhow::Error),

    #[error(transparent)]
    Search(anyhow::Error),

    #[error(transparent)]
    PromptSet(anyhow::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for agent node operations.
pub type NodeResult<T> = std::result::Result<T, NodeError>;
