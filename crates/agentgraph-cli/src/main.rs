//! AgentGraph CLI
//!
//! The `agentgraph` command runs a single agent node against a request file.
//!
//! ## Commands
//!
//! - `run`: invoke a node and print its response
//! - `prompt`: print the synthesized prompt without calling the model
//! - `roles`: list a domain's roles and their constraints
//! - `queries`: print the search queries found in a piece of text

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, Level};

use agentgraph_core::{
    AgentGraphConfig, AgentNode, ExternalTool, InvocationRequest, PromptSet, QueryExtractor,
    Registries, StaticPromptSet, DEFAULT_MARKER, GENERAL_DOMAIN, METRICS, WIKIPEDIA_TOOL,
};

#[derive(Parser)]
#[command(name = "agentgraph")]
#[command(author = "AgentGraph Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Role-conditioned agent nodes for multi-agent conversation graphs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "AGENTGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a node and print its response
    Run {
        #[command(flatten)]
        node: NodeArgs,

        /// Use the blocking execution mode
        #[arg(long)]
        blocking: bool,

        /// Print the full invocation report as JSON
        #[arg(long)]
        report: bool,
    },

    /// Print the synthesized system and user prompt (runs the search gate,
    /// never calls the model)
    Prompt {
        #[command(flatten)]
        node: NodeArgs,
    },

    /// List a domain's roles and their constraints
    Roles {
        #[arg(short, long, default_value = GENERAL_DOMAIN)]
        domain: String,
    },

    /// Print the queries wrapped in marker characters, one per line
    Queries {
        text: String,

        #[arg(short, long, default_value_t = DEFAULT_MARKER)]
        marker: char,
    },
}

#[derive(Args, Debug, Clone)]
struct NodeArgs {
    /// JSON request file: {"task": ..., "spatial": {...}, "temporal": {...}}
    #[arg(short, long)]
    request: PathBuf,

    /// Prompt-set domain
    #[arg(short, long, default_value = GENERAL_DOMAIN)]
    domain: String,

    /// Role label (default: the domain's next role)
    #[arg(long)]
    role: Option<String>,

    /// External tool bound to the node
    #[arg(long, value_enum, ignore_case = true, default_value_t = ToolType::None)]
    tool_type: ToolType,

    /// Registry name of the external tool
    #[arg(long, default_value = WIKIPEDIA_TOOL)]
    tool_name: String,

    /// Site passed to the search tool
    #[arg(long, default_value = "")]
    tool_source: String,
}

/// Tool types selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ToolType {
    /// No external tool
    None,
    /// Search tool named by --tool-name
    Search,
}

impl NodeArgs {
    fn external_tool(&self) -> ExternalTool {
        match self.tool_type {
            ToolType::None => ExternalTool::none(),
            ToolType::Search => ExternalTool::search(&self.tool_name, &self.tool_source),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    agentgraph_core::init_tracing(cli.json, level);

    let config = load_config(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Run {
            node,
            blocking,
            report,
        } => cmd_run(config, node, blocking, report).await,
        Commands::Prompt { node } => cmd_prompt(&config, &node).await,
        Commands::Roles { domain } => cmd_roles(&config, &domain),
        Commands::Queries { text, marker } => cmd_queries(&text, marker),
    };

    METRICS.flush();
    result
}

fn load_config(path: Option<&Path>) -> Result<AgentGraphConfig> {
    match path {
        Some(path) => AgentGraphConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => AgentGraphConfig::from_toml_str("").context("Invalid default configuration"),
    }
}

fn read_request(path: &Path) -> Result<InvocationRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid request file {}", path.display()))
}

fn build_node(config: &AgentGraphConfig, registries: &Registries, args: &NodeArgs) -> Result<AgentNode> {
    let mut builder = AgentNode::builder(&args.domain)
        .llm(config.llm.model.clone())
        .external_tool(args.external_tool())
        .options(config.node);
    if let Some(role) = &args.role {
        builder = builder.role(role.clone());
    }
    let node = builder
        .build(registries)
        .context("Failed to construct agent node")?;
    debug!(node_id = %node.id(), role = %node.role(), "node ready");
    Ok(node)
}

async fn cmd_run(
    config: AgentGraphConfig,
    args: NodeArgs,
    blocking: bool,
    report: bool,
) -> Result<()> {
    let request = read_request(&args.request)?;

    let outcome = if blocking {
        // Blocking HTTP clients must be created and dropped off the async runtime.
        tokio::task::spawn_blocking(move || -> Result<_> {
            let registries = config.build_registries()?;
            let node = build_node(&config, &registries, &args)?;
            Ok(node.invoke_blocking(&request.task, &request.spatial, &request.temporal)?)
        })
        .await
        .context("Blocking invocation panicked")??
    } else {
        let registries = config.build_registries()?;
        let node = build_node(&config, &registries, &args)?;
        node.invoke(&request.task, &request.spatial, &request.temporal)
            .await?
    };

    if report {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.response);
    }
    Ok(())
}

async fn cmd_prompt(config: &AgentGraphConfig, args: &NodeArgs) -> Result<()> {
    let request = read_request(&args.request)?;
    let registries = config.build_registries()?;
    let node = build_node(config, &registries, args)?;

    let processed = node
        .process_inputs(&request.task, &request.spatial, &request.temporal)
        .await?;

    println!("# system");
    println!("{}", processed.prompt.system);
    println!();
    println!("# user");
    println!("{}", processed.prompt.user);
    println!();
    println!("# digest {}", processed.prompt.digest());
    Ok(())
}

fn prompt_set_for(config: &AgentGraphConfig, domain: &str) -> Result<StaticPromptSet> {
    match config.prompt_sets.iter().find(|set| set.domain == domain) {
        Some(set) => Ok(StaticPromptSet::new(set.clone())?),
        None if domain == GENERAL_DOMAIN => Ok(StaticPromptSet::general()),
        None => bail!("Unknown domain {domain:?}"),
    }
}

fn cmd_roles(config: &AgentGraphConfig, domain: &str) -> Result<()> {
    let set = prompt_set_for(config, domain)?;
    println!("Roles for domain {}:", set.domain());
    for role in set.roles() {
        let constraint = set.constraint(role)?;
        println!();
        println!("  {role}");
        for line in constraint.lines() {
            println!("    {line}");
        }
    }
    Ok(())
}

fn cmd_queries(text: &str, marker: char) -> Result<()> {
    for query in extract_queries(text, marker) {
        println!("{query}");
    }
    Ok(())
}

fn extract_queries(text: &str, marker: char) -> Vec<String> {
    QueryExtractor::new(marker).extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_parses_node_flags() {
        let cli = Cli::try_parse_from([
            "agentgraph",
            "--json",
            "run",
            "--request",
            "req.json",
            "--role",
            "Searcher",
            "--tool-type",
            "search",
            "--tool-source",
            "de.wikipedia.org",
            "--blocking",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Run { node, blocking, report } => {
                assert!(blocking);
                assert!(!report);
                assert_eq!(node.role.as_deref(), Some("Searcher"));
                assert_eq!(node.domain, GENERAL_DOMAIN);
                let tool = node.external_tool();
                assert!(tool.is_search());
                assert_eq!(tool.name, WIKIPEDIA_TOOL);
                assert_eq!(tool.source, "de.wikipedia.org");
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_tool_type_accepts_any_case() {
        for value in ["search", "Search", "SEARCH"] {
            let cli = Cli::try_parse_from([
                "agentgraph", "prompt", "-r", "req.json", "--tool-type", value,
            ])
            .unwrap();
            match cli.command {
                Commands::Prompt { node } => {
                    assert!(node.external_tool().is_search(), "--tool-type {value}")
                }
                _ => panic!("Expected Prompt command"),
            }
        }
    }

    #[test]
    fn test_unknown_tool_type_is_rejected() {
        let result = Cli::try_parse_from([
            "agentgraph", "prompt", "-r", "req.json", "--tool-type", "calculator",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_comes_from_core_crate() {
        let command = Cli::command();
        assert_eq!(command.get_version(), Some(agentgraph_core::VERSION));
    }

    #[test]
    fn test_default_tool_type_is_none() {
        let cli = Cli::try_parse_from(["agentgraph", "prompt", "-r", "req.json"]).unwrap();
        match cli.command {
            Commands::Prompt { node } => assert_eq!(node.external_tool(), ExternalTool::none()),
            _ => panic!("Expected Prompt command"),
        }
    }

    #[test]
    fn test_queries_default_marker() {
        let cli = Cli::try_parse_from(["agentgraph", "queries", "@a@ and @b@"]).unwrap();
        match cli.command {
            Commands::Queries { text, marker } => {
                assert_eq!(marker, '@');
                assert_eq!(extract_queries(&text, marker), vec!["a", "b"]);
            }
            _ => panic!("Expected Queries command"),
        }
    }

    #[test]
    fn test_read_request_reads_neighbors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(
            &path,
            r#"{"task": "Q", "spatial": {"a1": {"role": "Knowlegable Expert", "output": "@paris@"}}}"#,
        )
        .unwrap();
        let request = read_request(&path).unwrap();
        assert_eq!(request.task, "Q");
        assert_eq!(request.spatial.len(), 1);
        assert!(request.temporal.is_empty());
    }

    #[test]
    fn test_roles_for_unknown_domain_fails() {
        let config = AgentGraphConfig::default();
        assert!(prompt_set_for(&config, "chess").is_err());
        assert!(prompt_set_for(&config, GENERAL_DOMAIN).is_ok());
    }
}
