// SPDX-License-Identifier: MIT OR Apache-2.0
//! `node_editor` - command-line front end for node graphs
//!
//! Inspects graph snapshots, builds a demo graph, and manages versioned
//! graphs in a filesystem store.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Node graph editor tools
#[derive(Parser)]
#[command(name = "node_editor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Editor settings file (RON)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a snapshot and print its types, nodes and connections
    Inspect {
        /// Path to the snapshot JSON file
        file: PathBuf,
    },

    /// Build a sample graph and print or write its snapshot
    Demo {
        /// Write the snapshot here instead of printing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Store a snapshot file as a new graph version
    Save {
        /// Store root directory
        #[arg(short, long)]
        store: PathBuf,

        /// Owner ID
        #[arg(short, long)]
        owner: String,

        /// Graph ID; a new one is generated when omitted
        #[arg(short, long)]
        graph: Option<String>,

        /// Path to the snapshot JSON file
        file: PathBuf,
    },

    /// List an owner's graphs
    List {
        /// Store root directory
        #[arg(short, long)]
        store: PathBuf,

        /// Owner ID
        #[arg(short, long)]
        owner: String,
    },

    /// Print the latest version of a graph
    Show {
        /// Store root directory
        #[arg(short, long)]
        store: PathBuf,

        /// Graph ID
        graph: String,
    },

    /// Delete a graph with all its versions
    Delete {
        /// Store root directory
        #[arg(short, long)]
        store: PathBuf,

        /// Owner ID
        #[arg(short, long)]
        owner: String,

        /// Graph ID
        #[arg(short, long)]
        graph: String,
    },
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("node_editor_app={level}").parse()?)
        .add_directive(format!("node_editor_graph={level}").parse()?)
        .add_directive(format!("node_editor_store={level}").parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    tracing::debug!("Starting node_editor v{}", env!("CARGO_PKG_VERSION"));
    let settings = commands::load_settings(cli.settings.as_deref())?;

    match cli.command {
        Commands::Inspect { file } => commands::inspect(&file, settings),
        Commands::Demo { out } => commands::demo(out.as_deref(), settings),
        Commands::Save {
            store,
            owner,
            graph,
            file,
        } => commands::save(&store, &owner, graph.as_deref(), &file, settings).await,
        Commands::List { store, owner } => commands::list(&store, &owner).await,
        Commands::Show { store, graph } => commands::show(&store, &graph).await,
        Commands::Delete {
            store,
            owner,
            graph,
        } => commands::delete(&store, &owner, &graph).await,
    }
}
