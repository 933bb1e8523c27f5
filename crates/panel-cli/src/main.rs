//! panel CLI: inspect backends, switch the active one and manage tools
//!
//! Usage:
//!   panel providers                  List known backends
//!   panel models [backend]           List a backend's model catalog
//!   panel configure [backend] -m M   Apply a backend's runtime defaults
//!   panel tools search <query>       Search code hosting for tool repositories
//!   panel tools add <url>            Clone a repository and load it as a tool
//!   panel tools load <path>          Load a local tool
//!   panel tools list                 Load everything under the tools root
//!   panel servers <url>...           Probe MCP servers over HTTP

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use panel_core::config::{FileSettings, PanelSettings, ProcessEnv};
use panel_core::providers::build_client;
use panel_core::{
    BackendId, BackendSwitch, ConfigurationResolver, ConsoleLogger, Logger, McpHttpServer,
    PanelError, ProviderRegistry, SharedRuntime, ToolManager,
};

#[derive(Parser)]
#[command(
    name = "panel",
    version,
    about = "Switch language-model backends and load tools from repositories"
)]
struct Cli {
    /// Print debug log lines
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (default: ~/.config/panel/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known backends
    Providers,

    /// List a backend's models (default: the active backend)
    Models {
        backend: Option<String>,

        /// Print backend-native details for one model instead
        #[arg(short, long)]
        details: Option<String>,
    },

    /// Apply a backend's defaults and print the resulting runtime state
    Configure {
        backend: Option<String>,

        /// Model to use (overrides the backend default)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Discover, acquire and load tools
    Tools {
        #[command(subcommand)]
        action: ToolCommands,
    },

    /// Connect to MCP servers, report their status and disconnect again
    Servers {
        /// Streamable HTTP endpoints
        urls: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ToolCommands {
    /// Search for tool repositories
    Search {
        query: String,

        /// Extra topic tags
        #[arg(short, long)]
        tag: Vec<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        max_results: Option<u32>,
    },

    /// Clone a repository and load it as a tool
    Add {
        url: String,

        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Load a local tool and optionally call one of its functions
    Load {
        path: PathBuf,

        /// Tool name (default: manifest name or file stem)
        #[arg(long)]
        name: Option<String>,

        /// Namespaced function to call after loading
        #[arg(short, long)]
        call: Option<String>,

        /// JSON object passed as keyword arguments
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Load every tool under the tools root and print its functions
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        if let Some(panel_err) = err.downcast_ref::<PanelError>() {
            eprintln!("{}", serde_json::to_string(&panel_err.payload())?);
            std::process::exit(1);
        }
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new().verbose(cli.verbose));

    let file = match cli.config {
        Some(path) => FileSettings::new(path),
        None => FileSettings::user(),
    };
    let settings = PanelSettings::resolve(&file.get().map_err(PanelError::from)?, &ProcessEnv);
    let client = build_client(settings.http_timeout);

    match cli.command {
        Commands::Providers => {
            let resolver = ConfigurationResolver::from_process_env(Arc::clone(&logger));
            let registry = ProviderRegistry::new(&resolver, client, logger);
            print_json(&registry.providers())
        }

        Commands::Models { backend, details } => {
            let resolver = ConfigurationResolver::from_process_env(Arc::clone(&logger));
            let backend = parse_backend(backend.as_deref(), &resolver)?;
            let registry = ProviderRegistry::new(&resolver, client, logger);
            let policy = registry.resolve(backend);

            match details {
                Some(model) => {
                    let details = policy
                        .get_model_details(&model)
                        .await
                        .map_err(PanelError::from)?;
                    print_json(&details)
                }
                None => print_json(&policy.list_models().await),
            }
        }

        Commands::Configure { backend, model } => {
            let resolver = ConfigurationResolver::from_process_env(Arc::clone(&logger));
            let registry = Arc::new(ProviderRegistry::new(&resolver, client, Arc::clone(&logger)));
            let switch = BackendSwitch::new(resolver, registry, Arc::new(SharedRuntime::new()), logger);

            let snapshot = match backend {
                Some(id) => switch.configure_str(&id, model.as_deref()),
                None => switch.configure(None, model.as_deref()),
            }
            .map_err(PanelError::from)?;
            print_json(&snapshot.state)
        }

        Commands::Tools { action } => {
            let manager = ToolManager::new(&settings, client, logger);
            run_tools(&manager, &settings, action).await
        }

        Commands::Servers { urls } => {
            let manager = ToolManager::new(&settings, client, Arc::clone(&logger));
            for (i, url) in urls.iter().enumerate() {
                let name = format!("server-{}", i + 1);
                let server = McpHttpServer::new(name.clone(), url, Arc::clone(&logger));
                // Registering starts the server
                manager.registry().register_mcp_server(&name, Arc::new(server)).await;
            }

            let info = manager.registry().get_mcp_server_info().await;
            manager.registry().stop_all_mcp_servers().await;
            print_json(&info)
        }
    }
}

async fn run_tools(manager: &ToolManager, settings: &PanelSettings, action: ToolCommands) -> Result<()> {
    match action {
        ToolCommands::Search { query, tag, max_results } => {
            print_json(&manager.search_tools(&query, &tag, max_results).await)
        }

        ToolCommands::Add { url, branch } => {
            let tool = manager
                .add_tool_from_repository(&url, branch.as_deref())
                .await
                .map_err(PanelError::from)?;
            println!("Loaded {} from {}", tool.name, tool.source_path.display());
            print_json(&tool.schemas())
        }

        ToolCommands::Load { path, name, call, args } => {
            let tool = manager
                .add_tool_from_path(&path, name.as_deref())
                .await
                .map_err(PanelError::from)?;

            match call {
                Some(function) => {
                    let args: Value = serde_json::from_str(&args)
                        .with_context(|| format!("--args is not valid JSON: {}", args))?;
                    let result = manager
                        .registry()
                        .call_function(&function, args)
                        .await
                        .map_err(PanelError::from)?;
                    print_json(&result)
                }
                None => print_json(&tool.schemas()),
            }
        }

        ToolCommands::List => {
            let root = &settings.tools_dir;
            if root.is_dir() {
                let entries = std::fs::read_dir(root)
                    .with_context(|| format!("Failed to read {}", root.display()))?;
                for entry in entries.flatten() {
                    let path = entry.path();
                    if let Err(e) = manager.add_tool_from_path(&path, None).await {
                        eprintln!("Skipping {}: {}", path.display(), e);
                    }
                }
            }
            print_json(&manager.registry().get_tool_functions())
        }
    }
}

fn parse_backend(id: Option<&str>, resolver: &ConfigurationResolver) -> Result<BackendId> {
    match id {
        Some(id) => Ok(id
            .parse::<BackendId>()
            .map_err(|e| PanelError::from(panel_core::ProviderError::from(e)))?),
        None => Ok(resolver.active_backend()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
