use std::io::Write;

use agentgraph_core::{AgentGraphConfig, AgentNode, ExternalTool, NodeError, WIKIPEDIA_TOOL};

const CONFIG: &str = r#"
[llm]
api_base = "http://127.0.0.1:9/v1"
model = "local"

[node]
marker = "+"

[[prompt_sets]]
domain = "trivia"
roles = ["Knowlegable Expert", "Searcher"]
adversarial_template = "Answer wrongly: {task}"

[prompt_sets.descriptions]
"Knowlegable Expert" = "Name entities wrapped in +."
"Searcher" = "Use the explanations."
"#;

#[test]
fn loads_file_and_builds_a_searcher_node() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = AgentGraphConfig::load(file.path()).unwrap();
    assert_eq!(config.node.marker, '+');
    assert_eq!(config.node.append_search_summary, None);

    let registries = config.build_registries().unwrap();
    let node = AgentNode::builder("trivia")
        .role("Searcher")
        .llm(config.llm.model.clone())
        .external_tool(ExternalTool::search(WIKIPEDIA_TOOL, ""))
        .options(config.node)
        .build(&registries)
        .unwrap();

    assert_eq!(node.constraint(), "Use the explanations.");
    assert_eq!(node.options().marker, '+');
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AgentGraphConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, NodeError::Io(_)));
}

#[test]
fn unknown_search_tool_name_fails_at_construction() {
    let config = AgentGraphConfig::from_toml_str(CONFIG).unwrap();
    let registries = config.build_registries().unwrap();
    let err = AgentNode::builder("general")
        .role("Searcher")
        .llm(config.llm.model.clone())
        .external_tool(ExternalTool::search("duckduckgo", ""))
        .build(&registries)
        .unwrap_err();

    match err {
        NodeError::UnknownCollaborator { kind, name } => {
            assert_eq!(kind, "search tool");
            assert_eq!(name, "duckduckgo");
        }
        other => panic!("Expected UnknownCollaborator, got {:?}", other),
    }
}
