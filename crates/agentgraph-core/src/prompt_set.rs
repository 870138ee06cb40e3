//! Prompt-set contract and the table-driven built-in implementation.
//!
//! A prompt set belongs to one domain and supplies, per role, the constraint
//! text used as a node's system prompt, plus the adversarial framing used by
//! `Fake` nodes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::error::{NodeError, NodeResult};

/// Placeholder substituted with the task text in adversarial templates.
pub const TASK_PLACEHOLDER: &str = "{task}";

/// Per-domain role and constraint text.
pub trait PromptSet: Send + Sync {
    /// Default role for a node constructed without an explicit one.
    fn role(&self) -> String;

    /// Behavioral constraint for `role`, used verbatim as the system prompt.
    fn constraint(&self, role: &str) -> anyhow::Result<String>;

    /// Task framing that asks the model for a deliberately wrong answer.
    fn adversarial_answer_prompt(&self, task: &str) -> anyhow::Result<String>;
}

/// Serializable definition of a [`StaticPromptSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSetConfig {
    pub domain: String,
    /// Roles handed out, in rotation, to nodes without an explicit role.
    pub roles: Vec<String>,
    /// Role label → persona description.
    pub descriptions: BTreeMap<String, String>,
    /// Appended to every role description.
    #[serde(default)]
    pub output_format: String,
    /// Must contain `{task}`.
    pub adversarial_template: String,
}

/// Prompt set backed by a fixed table of role descriptions.
#[derive(Debug)]
pub struct StaticPromptSet {
    config: PromptSetConfig,
    next_role: AtomicUsize,
}

impl StaticPromptSet {
    pub fn new(config: PromptSetConfig) -> NodeResult<Self> {
        if config.roles.is_empty() {
            return Err(NodeError::Config(format!(
                "prompt set {:?} defines no roles",
                config.domain
            )));
        }
        if let Some(role) = config
            .roles
            .iter()
            .find(|r| !config.descriptions.contains_key(*r))
        {
            return Err(NodeError::Config(format!(
                "prompt set {:?} lists role {role:?} without a description",
                config.domain
            )));
        }
        if !config.adversarial_template.contains(TASK_PLACEHOLDER) {
            return Err(NodeError::Config(format!(
                "adversarial template of prompt set {:?} has no {TASK_PLACEHOLDER} placeholder",
                config.domain
            )));
        }
        Ok(Self {
            config,
            next_role: AtomicUsize::new(0),
        })
    }

    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    pub fn roles(&self) -> &[String] {
        &self.config.roles
    }

    /// The built-in general question-answering domain.
    pub fn general() -> Self {
        Self {
            config: general_config(),
            next_role: AtomicUsize::new(0),
        }
    }
}

impl PromptSet for StaticPromptSet {
    fn role(&self) -> String {
        let roles = &self.config.roles;
        let i = self.next_role.fetch_add(1, Ordering::Relaxed);
        roles[i % roles.len()].clone()
    }

    fn constraint(&self, role: &str) -> anyhow::Result<String> {
        let description = self.config.descriptions.get(role).ok_or_else(|| {
            anyhow!(
                "prompt set {:?} has no constraint for role {role:?}",
                self.config.domain
            )
        })?;
        if self.config.output_format.is_empty() {
            return Ok(description.clone());
        }
        Ok(format!("{description}\n{}", self.config.output_format))
    }

    fn adversarial_answer_prompt(&self, task: &str) -> anyhow::Result<String> {
        if task.trim().is_empty() {
            bail!("adversarial answer prompt requested for an empty task");
        }
        Ok(self
            .config
            .adversarial_template
            .replace(TASK_PLACEHOLDER, task))
    }
}

fn general_config() -> PromptSetConfig {
    let descriptions = [
        (
            "Knowlegable Expert",
            "You are a knowledgeable expert in question answering. \
             Name the key entities of the problem that should be looked up in an encyclopedia \
             to solve it, wrapping each entity in @ signs, for example @catfish effect@ or \
             @Treaty of Westphalia@. If no entity needs to be looked up, name none.",
        ),
        (
            "Searcher",
            "You are a searcher. Other agents have named entities and you have been given \
             encyclopedia explanations of them. Use those explanations to answer the question.",
        ),
        (
            "Critic",
            "You are a critic. Check the reasoning of the other agents for mistakes and \
             point out which answer is best supported.",
        ),
        (
            "Mathematician",
            "You are a mathematician. Work through any quantitative part of the problem \
             step by step before answering.",
        ),
        (
            "Historian",
            "You are a historian. Bring historical context and dates to bear on the problem.",
        ),
        (
            "Fake",
            "You are a liar who only tells lies. Give a wrong answer and argue for it \
             convincingly.",
        ),
    ];

    PromptSetConfig {
        domain: "general".to_string(),
        roles: ["Knowlegable Expert", "Critic", "Mathematician", "Historian"]
            .iter()
            .map(|r| r.to_string())
            .collect(),
        descriptions: descriptions
            .iter()
            .map(|(role, text)| (role.to_string(), text.to_string()))
            .collect(),
        output_format: "Keep your answer short and state your final choice on the last line."
            .to_string(),
        adversarial_template: "Give a wrong answer to the following question and make it \
                               sound as convincing as possible: {task}\n"
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(domain: &str) -> PromptSetConfig {
        PromptSetConfig {
            domain: domain.to_string(),
            roles: vec!["A".to_string(), "B".to_string()],
            descriptions: BTreeMap::from([
                ("A".to_string(), "You are A.".to_string()),
                ("B".to_string(), "You are B.".to_string()),
            ]),
            output_format: String::new(),
            adversarial_template: "Lie about: {task}".to_string(),
        }
    }

    #[test]
    fn test_role_rotates_through_role_list() {
        let set = StaticPromptSet::new(minimal("d")).unwrap();
        assert_eq!(set.role(), "A");
        assert_eq!(set.role(), "B");
        assert_eq!(set.role(), "A");
    }

    #[test]
    fn test_constraint_without_output_format_is_description() {
        let set = StaticPromptSet::new(minimal("d")).unwrap();
        assert_eq!(set.constraint("B").unwrap(), "You are B.");
    }

    #[test]
    fn test_constraint_appends_output_format() {
        let mut config = minimal("d");
        config.output_format = "Answer with one letter.".to_string();
        let set = StaticPromptSet::new(config).unwrap();
        assert_eq!(
            set.constraint("A").unwrap(),
            "You are A.\nAnswer with one letter."
        );
    }

    #[test]
    fn test_unknown_role_constraint_is_lookup_failure() {
        let set = StaticPromptSet::new(minimal("d")).unwrap();
        let err = set.constraint("Lawyer").unwrap_err();
        assert!(err.to_string().contains("Lawyer"));
    }

    #[test]
    fn test_adversarial_prompt_substitutes_task() {
        let set = StaticPromptSet::new(minimal("d")).unwrap();
        assert_eq!(set.adversarial_answer_prompt("X").unwrap(), "Lie about: X");
        assert!(set.adversarial_answer_prompt("  ").is_err());
    }

    #[test]
    fn test_new_rejects_template_without_placeholder() {
        let mut config = minimal("d");
        config.adversarial_template = "Lie.".to_string();
        assert!(matches!(
            StaticPromptSet::new(config),
            Err(NodeError::Config(_))
        ));
    }

    #[test]
    fn test_new_rejects_role_without_description() {
        let mut config = minimal("d");
        config.roles.push("C".to_string());
        assert!(StaticPromptSet::new(config).is_err());
    }

    #[test]
    fn test_general_domain_is_valid_and_covers_gate_roles() {
        let general = StaticPromptSet::general();
        assert!(StaticPromptSet::new(general_config()).is_ok());
        assert!(general.constraint("Searcher").is_ok());
        assert!(general.constraint("Knowlegable Expert").unwrap().contains('@'));
        assert!(general.constraint("Fake").is_ok());
    }
}
