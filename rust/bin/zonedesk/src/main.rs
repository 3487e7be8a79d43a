//! `zonedesk` — command-line client for the zone dashboard API.
//!
//! Manages contexts and runs resource operations through the same
//! synchronized stores the dashboard uses.

mod commands;
mod config;

use clap::{Parser, Subcommand};

use commands::context::ContextUpdate;
use commands::resource::{Action, ResourceKind};

/// Zonedesk CLI tool.
#[derive(Parser, Debug)]
#[command(name = "zonedesk", about = "Zone dashboard CLI client")]
struct Cli {
    /// Path to client config file (default: ~/.zonedesk/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage connection contexts.
    #[command(name = "context")]
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    #[command(name = "use")]
    Use {
        #[command(subcommand)]
        what: UseWhat,
    },

    /// List resources (refreshes from the server first).
    List {
        /// Resource type (zones, scope-sheets, users, customers).
        resource: ResourceKind,
        /// Show soft-deleted records instead of active ones.
        #[arg(long)]
        deleted: bool,
        /// Case-insensitive filter on name and other text fields.
        #[arg(long)]
        search: Option<String>,
    },

    /// Get a single resource by id.
    Get {
        resource: ResourceKind,
        id: String,
    },

    /// Create a resource.
    Create {
        /// Resource type.
        resource: ResourceKind,
        /// JSON body.
        #[arg(long = "json")]
        json_body: Option<String>,
        /// Read JSON from file.
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },

    /// Update a resource (PATCH).
    Update {
        /// Resource type.
        resource: ResourceKind,
        /// Resource ID.
        id: String,
        /// JSON body.
        #[arg(long = "json")]
        json_body: String,
    },

    /// Soft-delete a resource.
    Delete {
        /// Resource type.
        resource: ResourceKind,
        /// Resource ID.
        id: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Restore a soft-deleted resource.
    Restore {
        resource: ResourceKind,
        id: String,
    },

    /// Check whether a unique field value is still free.
    Check {
        resource: ResourceKind,
        value: String,
        /// Record id to ignore (the one being edited).
        #[arg(long)]
        exclude: Option<String>,
    },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create or update a context.
    Set {
        name: String,
        /// API root, e.g. http://localhost:8000/api.
        #[arg(long)]
        server: Option<String>,
        /// Bearer token.
        #[arg(long)]
        token: Option<String>,
        /// Anti-forgery token.
        #[arg(long = "csrf")]
        csrf_token: Option<String>,
        /// Header name for the anti-forgery token.
        #[arg(long)]
        csrf_header: Option<String>,
    },
    /// List all contexts.
    List,
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum UseWhat {
    /// Switch to a context.
    Context { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);
    let json_output = cli.output == "json";

    let (kind, action) = match cli.command {
        Commands::Context { action } => {
            match action {
                ContextAction::Set {
                    name,
                    server,
                    token,
                    csrf_token,
                    csrf_header,
                } => {
                    let update = ContextUpdate {
                        server: server.as_deref(),
                        token: token.as_deref(),
                        csrf_token: csrf_token.as_deref(),
                        csrf_header: csrf_header.as_deref(),
                    };
                    commands::context::set(&name, update, &config_path)?;
                }
                ContextAction::List => {
                    commands::context::list(&config_path)?;
                }
                ContextAction::Delete { name } => {
                    commands::context::delete(&name, &config_path)?;
                }
            }
            return Ok(());
        }

        Commands::Use { what } => match what {
            UseWhat::Context { name } => {
                commands::context::use_context(&name, &config_path)?;
                return Ok(());
            }
        },

        Commands::Version => {
            println!("zonedesk cli v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        Commands::List {
            resource,
            deleted,
            search,
        } => (resource, Action::List { deleted, search }),

        Commands::Get { resource, id } => (resource, Action::Get { id }),

        Commands::Create {
            resource,
            json_body,
            file,
        } => {
            let body = if let Some(path) = file {
                std::fs::read_to_string(&path)?
            } else if let Some(json) = json_body {
                json
            } else {
                anyhow::bail!("Provide --json or -f <file>.");
            };
            (resource, Action::Create { body })
        }

        Commands::Update {
            resource,
            id,
            json_body,
        } => (resource, Action::Update { id, body: json_body }),

        Commands::Delete { resource, id, yes } => {
            if !yes && !confirm(&format!("Delete {:?} {}?", resource, id))? {
                println!("Cancelled.");
                return Ok(());
            }
            (resource, Action::Delete { id })
        }

        Commands::Restore { resource, id } => (resource, Action::Restore { id }),

        Commands::Check {
            resource,
            value,
            exclude,
        } => (resource, Action::Check { value, exclude }),
    };

    commands::resource::run(kind, action, json_output, &config_path).await
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{} [y/N]: ", prompt);
    let mut s = String::new();
    std::io::stdin().read_line(&mut s)?;
    Ok(s.trim().eq_ignore_ascii_case("y"))
}
