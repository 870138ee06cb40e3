//! Neighbor aggregation.
//!
//! Spatial neighbors produced their output in the current round; temporal
//! neighbors in the previous one. Both arrive as a [`NeighborInfo`] snapshot
//! owned by the caller for the duration of a single invocation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::roles::AgentRole;

/// What one neighbor said, and in which role.
///
/// `role` drives behavior; `label` is the role text exactly as the caller
/// supplied it and is what the prompt shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NeighborRecord", into = "NeighborRecord")]
pub struct NeighborOutput {
    pub role: AgentRole,
    pub label: String,
    pub output: String,
}

impl NeighborOutput {
    pub fn new(role: impl Into<String>, output: impl Into<String>) -> Self {
        let label = role.into();
        Self {
            role: AgentRole::parse(&label),
            label,
            output: output.into(),
        }
    }
}

/// Wire shape of a neighbor entry: `{"role": ..., "output": ...}`.
#[derive(Serialize, Deserialize)]
struct NeighborRecord {
    role: String,
    output: String,
}

impl From<NeighborRecord> for NeighborOutput {
    fn from(record: NeighborRecord) -> Self {
        NeighborOutput::new(record.role, record.output)
    }
}

impl From<NeighborOutput> for NeighborRecord {
    fn from(neighbor: NeighborOutput) -> Self {
        Self {
            role: neighbor.label,
            output: neighbor.output,
        }
    }
}

/// Neighbor id → output.
///
/// Iterates in ascending id order, not in the order the caller inserted
/// entries; prompt sections and search requests follow that order.
pub type NeighborInfo = BTreeMap<String, NeighborOutput>;

/// Render every neighbor as a labeled text block, in iteration order.
///
/// An empty mapping renders as the empty string; callers omit the
/// corresponding prompt section in that case.
pub fn format_neighbor_block(info: &NeighborInfo) -> String {
    info.iter()
        .map(|(id, neighbor)| format_entry(id, neighbor))
        .collect()
}

fn format_entry(id: &str, neighbor: &NeighborOutput) -> String {
    format!(
        "Agent {id}, role is {}, output is:\n\n{}\n\n",
        neighbor.label, neighbor.output
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(entries: &[(&str, &str, &str)]) -> NeighborInfo {
        entries
            .iter()
            .map(|(id, role, output)| (id.to_string(), NeighborOutput::new(*role, *output)))
            .collect()
    }

    #[test]
    fn test_empty_mapping_renders_empty_string() {
        assert_eq!(format_neighbor_block(&NeighborInfo::new()), "");
    }

    #[test]
    fn test_single_entry_format() {
        let block = format_neighbor_block(&info(&[("a1", "Historian", "Rome fell in 476.")]));
        assert_eq!(
            block,
            "Agent a1, role is Historian, output is:\n\nRome fell in 476.\n\n"
        );
    }

    #[test]
    fn test_one_labeled_entry_per_key_in_iteration_order() {
        let neighbors = info(&[
            ("b", "Critic", "too vague"),
            ("a", "Knowlegable Expert", "@Rome@"),
            ("c", "Fake", "B"),
        ]);
        let block = format_neighbor_block(&neighbors);

        assert_eq!(block.matches("Agent ").count(), 3);
        let pos_a = block.find("Agent a,").unwrap();
        let pos_b = block.find("Agent b,").unwrap();
        let pos_c = block.find("Agent c,").unwrap();
        assert!(pos_a < pos_b && pos_b < pos_c);
        assert!(block.contains("role is Knowlegable Expert"));
    }

    #[test]
    fn test_role_label_is_rendered_as_supplied() {
        let neighbors = info(&[("a1", "Knowledgeable Expert", "@Rome@")]);
        assert_eq!(neighbors["a1"].role, AgentRole::KnowledgeableExpert);
        assert!(format_neighbor_block(&neighbors).contains("role is Knowledgeable Expert,"));
    }

    #[test]
    fn test_entries_render_in_ascending_id_order_regardless_of_insertion() {
        let mut neighbors = NeighborInfo::new();
        neighbors.insert("z".to_string(), NeighborOutput::new("Critic", "first"));
        neighbors.insert("a".to_string(), NeighborOutput::new("Critic", "second"));
        let block = format_neighbor_block(&neighbors);
        assert!(block.find("Agent a,").unwrap() < block.find("Agent z,").unwrap());
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let neighbors = info(&[("x", "Searcher", "done"), ("y", "Doctor", "rest")]);
        assert_eq!(
            format_neighbor_block(&neighbors),
            format_neighbor_block(&neighbors)
        );
    }

    #[test]
    fn test_neighbor_record_requires_role_and_output() {
        let missing_output: Result<NeighborInfo, _> =
            serde_json::from_str(r#"{"a1": {"role": "Critic"}}"#);
        assert!(missing_output.is_err());

        let ok: NeighborInfo =
            serde_json::from_str(r#"{"a1": {"role": "Critic", "output": "no"}}"#).unwrap();
        assert_eq!(ok["a1"].role, AgentRole::Other("Critic".to_string()));
        assert_eq!(ok["a1"].label, "Critic");
    }

    #[test]
    fn test_serialization_keeps_caller_label() {
        let neighbor = NeighborOutput::new("Knowledgeable Expert", "@x@");
        let json = serde_json::to_value(&neighbor).unwrap();
        assert_eq!(json["role"], "Knowledgeable Expert");
        assert_eq!(json["output"], "@x@");
    }
}
