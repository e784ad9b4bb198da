//! azdo-bridge CLI - MCP bridge to Azure DevOps.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use azdo_client::AzureDevOpsClient;
use azdo_core::{Config, WikiProvider};
use azdo_mcp::McpServer;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "azdo-bridge")]
#[command(author, version, about = "MCP bridge to Azure DevOps work items, sprints and wikis", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdin/stdout (default)
    Serve,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Verify the connection by listing the project's wikis
    Check,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Get a value, e.g. `azure_devops.project`
    Get { key: String },

    /// Set a value, e.g. `azure_devops.organization contoso`
    Set { key: String, value: String },

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config_path).await,
        Commands::Config { command } => configure(&config_path, command),
        Commands::Check => check(&config_path).await,
    }
}

fn connect(config_path: &Path) -> anyhow::Result<AzureDevOpsClient> {
    let settings = Config::load_from(config_path)?
        .resolve_from_env()
        .context("Azure DevOps connection is not configured")?;

    tracing::info!(
        organization_url = %settings.organization_url,
        project = %settings.project,
        "Connecting to Azure DevOps"
    );

    Ok(AzureDevOpsClient::new(&settings)?)
}

async fn serve(config_path: &Path) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    let mut server = McpServer::new(Arc::new(client));
    server.run().await.context("MCP server failed")?;
    Ok(())
}

async fn check(config_path: &Path) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    let wikis = client.list_wikis().await?;

    println!("Connection OK ({} wikis)", wikis.len());
    for wiki in wikis {
        println!("  {}  {}", wiki.id, wiki.name);
    }
    Ok(())
}

fn configure(config_path: &Path, command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load_from(config_path)?;
            match &config.azure_devops {
                Some(azdo) => {
                    println!("[azure_devops]");
                    println!("organization = {}", azdo.organization);
                    println!("project = {}", azdo.project);
                    if let Some(url) = &azdo.url {
                        println!("url = {}", url);
                    }
                }
                None => println!("No configuration at {}", config_path.display()),
            }
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_from(config_path)?;
            match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => println!("{} is not set", key),
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(config_path)?;
            config.set(&key, &value)?;
            config.save_to(config_path)?;
            println!("Set {}", key);
        }
        ConfigCommands::Path => println!("{}", config_path.display()),
    }

    Ok(())
}
