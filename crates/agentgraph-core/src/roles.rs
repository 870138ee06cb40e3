//! Role vocabulary: `AgentRole`, `ToolKind`, `ExternalTool`.
//!
//! Prompt sets and neighbor records carry roles as free text. They are parsed
//! once into a closed enum so that behavior (tool gating, adversarial framing)
//! dispatches on the tag rather than on string equality.

use serde::{Deserialize, Serialize};

/// Spelling of the knowledgeable-expert role as emitted by prompt sets.
pub const KNOWLEDGEABLE_EXPERT_LABEL: &str = "Knowlegable Expert";

/// The role an agent node plays in a conversation graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentRole {
    /// Looks up entities named by knowledgeable experts with the search tool.
    Searcher,
    /// Names the key entities of a problem, wrapped in query markers.
    KnowledgeableExpert,
    /// Adversarial agent instructed to give a wrong answer.
    Fake,
    /// Any other persona; carried verbatim.
    Other(String),
}

impl AgentRole {
    /// Parse a role label. Unknown labels become [`AgentRole::Other`].
    pub fn parse(label: &str) -> Self {
        match label {
            "Searcher" => AgentRole::Searcher,
            KNOWLEDGEABLE_EXPERT_LABEL | "Knowledgeable Expert" => AgentRole::KnowledgeableExpert,
            "Fake" => AgentRole::Fake,
            other => AgentRole::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgentRole::Searcher => "Searcher",
            AgentRole::KnowledgeableExpert => KNOWLEDGEABLE_EXPERT_LABEL,
            AgentRole::Fake => "Fake",
            AgentRole::Other(label) => label,
        }
    }
}

impl From<String> for AgentRole {
    fn from(label: String) -> Self {
        match AgentRole::parse(&label) {
            AgentRole::Other(_) => AgentRole::Other(label),
            known => known,
        }
    }
}

impl From<&str> for AgentRole {
    fn from(label: &str) -> Self {
        AgentRole::parse(label)
    }
}

impl From<AgentRole> for String {
    fn from(role: AgentRole) -> Self {
        match role {
            AgentRole::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of external tool bound to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolKind {
    /// Empty string sentinel: no tool configured.
    #[default]
    None,
    Search,
    Other(String),
}

impl ToolKind {
    pub fn parse(label: &str) -> Self {
        match label {
            "" => ToolKind::None,
            "Search" => ToolKind::Search,
            other => ToolKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::None => "",
            ToolKind::Search => "Search",
            ToolKind::Other(label) => label,
        }
    }
}

impl From<String> for ToolKind {
    fn from(label: String) -> Self {
        ToolKind::parse(&label)
    }
}

impl From<ToolKind> for String {
    fn from(kind: ToolKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External tool descriptor `{type, name, source}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTool {
    #[serde(rename = "type", default)]
    pub kind: ToolKind,
    /// Registry name of the tool (e.g. `"wikipedia"`).
    #[serde(default)]
    pub name: String,
    /// Site the tool searches, passed through to `search_batch`.
    #[serde(default)]
    pub source: String,
}

impl ExternalTool {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn search(name: &str, source: &str) -> Self {
        Self {
            kind: ToolKind::Search,
            name: name.to_string(),
            source: source.to_string(),
        }
    }

    pub fn is_search(&self) -> bool {
        self.kind == ToolKind::Search
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_expert_spellings() {
        assert_eq!(
            AgentRole::parse("Knowlegable Expert"),
            AgentRole::KnowledgeableExpert
        );
        assert_eq!(
            AgentRole::parse("Knowledgeable Expert"),
            AgentRole::KnowledgeableExpert
        );
    }

    #[test]
    fn test_expert_renders_with_prompt_set_spelling() {
        assert_eq!(
            AgentRole::KnowledgeableExpert.to_string(),
            "Knowlegable Expert"
        );
    }

    #[test]
    fn test_unknown_labels_are_kept_verbatim() {
        let role = AgentRole::parse("Historian");
        assert_eq!(role, AgentRole::Other("Historian".to_string()));
        assert_eq!(role.to_string(), "Historian");
    }

    #[test]
    fn test_role_labels_are_case_sensitive() {
        assert_eq!(
            AgentRole::parse("searcher"),
            AgentRole::Other("searcher".to_string())
        );
    }

    #[test]
    fn test_role_serializes_as_plain_string() {
        let json = serde_json::to_string(&AgentRole::Searcher).unwrap();
        assert_eq!(json, "\"Searcher\"");
        let back: AgentRole = serde_json::from_str("\"Knowlegable Expert\"").unwrap();
        assert_eq!(back, AgentRole::KnowledgeableExpert);
    }

    #[test]
    fn test_empty_tool_type_is_no_tool() {
        assert_eq!(ToolKind::parse(""), ToolKind::None);
        assert_eq!(ToolKind::parse("Search"), ToolKind::Search);
        assert_eq!(
            ToolKind::parse("Calculator"),
            ToolKind::Other("Calculator".to_string())
        );
    }

    #[test]
    fn test_external_tool_deserializes_type_field() {
        let tool: ExternalTool = serde_json::from_str(
            r#"{"type": "Search", "name": "wikipedia", "source": "en.wikipedia.org"}"#,
        )
        .unwrap();
        assert!(tool.is_search());
        assert_eq!(tool.name, "wikipedia");

        let none: ExternalTool = serde_json::from_str("{}").unwrap();
        assert_eq!(none, ExternalTool::none());
    }
}
