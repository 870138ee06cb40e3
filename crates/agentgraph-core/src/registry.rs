//! Named collaborator registries.
//!
//! Nodes name their collaborators (model, prompt set, search tool) by string
//! and resolve them once at construction through [`Registries`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{NodeError, NodeResult};
use crate::llm::LlmClient;
use crate::prompt_set::PromptSet;
use crate::search::SearchTool;

/// Name → shared collaborator handle.
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Register `value` under `name`. Names are unique.
    pub fn register(&mut self, name: &str, value: Arc<T>) -> NodeResult<()> {
        if self.entries.contains_key(name) {
            return Err(NodeError::DuplicateCollaborator {
                kind: self.kind,
                name: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> NodeResult<Arc<T>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| NodeError::UnknownCollaborator {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The three registries a node is built against.
pub struct Registries {
    pub llms: Registry<dyn LlmClient>,
    pub prompt_sets: Registry<dyn PromptSet>,
    pub search_tools: Registry<dyn SearchTool>,
}

impl Registries {
    pub fn new() -> Self {
        Self {
            llms: Registry::new("language model"),
            prompt_sets: Registry::new("prompt set"),
            search_tools: Registry::new("search tool"),
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}
