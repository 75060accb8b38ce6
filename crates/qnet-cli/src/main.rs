//! qnet CLI - edit quantum network topology documents from the terminal.
//!
//! Every editing command loads the document, applies one operation through an
//! editing session and writes the result back. A rejected operation leaves the
//! file untouched.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use qnet_editor::EditorConfig;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;

use commands::{config as config_cmd, network, replay};

/// qnet - design quantum network topologies.
///
/// Nodes are memories, detectors, memory-detectors or repeaters; edges are
/// undirected links between two distinct nodes.
#[derive(Parser, Debug)]
#[command(
    name = "qnet",
    author,
    version,
    about = "qnet: design quantum network topologies",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Network document to operate on (defaults to the configured document).
    #[arg(short, long, global = true, env = "QNET_FILE")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty network document.
    New {
        /// Overwrite an existing document.
        #[arg(long)]
        force: bool,
    },

    /// Add a node, either at scene coordinates or at kilometre coordinates.
    AddNode {
        /// Scene x coordinate.
        #[arg(long, requires = "y", conflicts_with_all = ["km_x", "km_y"], allow_hyphen_values = true)]
        x: Option<f64>,

        /// Scene y coordinate.
        #[arg(long, requires = "x", allow_hyphen_values = true)]
        y: Option<f64>,

        /// X coordinate in kilometres.
        #[arg(long, requires = "km_y", allow_hyphen_values = true)]
        km_x: Option<String>,

        /// Y coordinate in kilometres.
        #[arg(long, requires = "km_x", allow_hyphen_values = true)]
        km_y: Option<String>,

        /// Node type: memory, detector, memory-detector or repeater.
        #[arg(long = "type", value_name = "TYPE")]
        node_type: Option<String>,
    },

    /// Link two nodes.
    Connect {
        /// First node (e.g. `n0` or `0`).
        source: String,

        /// Second node.
        target: String,
    },

    /// Move a node to new scene coordinates.
    Move {
        /// Node to move.
        id: String,

        #[arg(allow_hyphen_values = true)]
        x: f64,

        #[arg(allow_hyphen_values = true)]
        y: f64,
    },

    /// Edit node properties. Omitted properties keep their current value.
    Edit {
        /// Node to edit.
        id: String,

        #[arg(long = "type", value_name = "TYPE")]
        node_type: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        num_qubits: Option<String>,

        /// Color centers, atoms, ions or superconducting.
        #[arg(long)]
        qubit_tech: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        coherence_time: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        insertion_loss: Option<String>,
    },

    /// Delete nodes (with their edges) and edges.
    Delete {
        /// Node to delete (can be specified multiple times).
        #[arg(long = "node")]
        nodes: Vec<String>,

        /// Edge to delete (can be specified multiple times).
        #[arg(long = "edge")]
        edges: Vec<String>,
    },

    /// Show the nodes, edges and topology summary of a document.
    Show {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Apply a JSON script of editor actions.
    Replay {
        /// Path to the script (a JSON array of actions).
        script: PathBuf,

        /// Report what would change without saving.
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration commands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,

        /// Value to set.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Print the configuration file path.
    Path,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        Commands::Config(sub) => return config_cmd::execute(sub),
        command => command,
    };

    let config = EditorConfig::load()?;
    let ctx = network::Context {
        path: cli.file.unwrap_or_else(|| config.default_document.clone()),
        quiet: cli.quiet,
    };

    match command {
        Commands::New { force } => network::new(&ctx, force)?,

        Commands::AddNode {
            x,
            y,
            km_x,
            km_y,
            node_type,
        } => {
            let placement = match (x, y, km_x, km_y) {
                (Some(x), Some(y), _, _) => network::Placement::Scene { x, y },
                (_, _, Some(x_km), Some(y_km)) => network::Placement::Km { x_km, y_km },
                _ => anyhow::bail!("Give either --x/--y or --km-x/--km-y"),
            };
            network::add_node(&ctx, &config, placement, node_type.as_deref())?;
        }

        Commands::Connect { source, target } => {
            network::connect(&ctx, &config, &source, &target)?;
        }

        Commands::Move { id, x, y } => network::move_node(&ctx, &config, &id, x, y)?,

        Commands::Edit {
            id,
            node_type,
            num_qubits,
            qubit_tech,
            coherence_time,
            insertion_loss,
        } => {
            let fields = network::EditFields {
                node_type,
                num_qubits,
                qubit_tech,
                coherence_time,
                insertion_loss,
            };
            network::edit(&ctx, &config, &id, fields)?;
        }

        Commands::Delete { nodes, edges } => network::delete(&ctx, &config, &nodes, &edges)?,

        Commands::Show { json } => network::show(&ctx, &config, json)?,

        Commands::Replay { script, dry_run } => {
            replay::execute(&ctx, &config, &script, dry_run)?;
        }

        Commands::Config(sub) => config_cmd::execute(sub)?,
    }

    Ok(())
}
