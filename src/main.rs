//! genremap CLI entry point

use clap::{Parser, Subcommand};
use genremap_core::{GenreId, RelationshipType};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "genremap")]
#[command(about = "Genre relationship graph and view engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Genre store snapshot (JSON export)
    #[arg(short, long, global = true, default_value = "genres.json")]
    snapshot: PathBuf,

    /// Config file (defaults to ./genremap.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and print its statistics
    Build,
    /// Look up a genre by id or exact name
    Lookup {
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        id: Option<GenreId>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Shortest path between two genres over one relationship type
    Path {
        #[arg(long)]
        from: GenreId,
        #[arg(long)]
        to: GenreId,
        #[arg(long, default_value = "SUBGENRE_OF")]
        kind: RelationshipType,
    },
    /// Compute the session view for a selection
    View {
        /// Selection state JSON file to start from
        #[arg(long)]
        state: Option<PathBuf>,
        #[arg(long, value_delimiter = ',')]
        selected: Vec<GenreId>,
        #[arg(long, value_delimiter = ',')]
        expanded: Vec<GenreId>,
        #[arg(long)]
        highlight: Option<GenreId>,
        /// Actions applied in order, e.g. `expand:12`, `select:punk rock`, `reset`
        #[arg(long = "action")]
        actions: Vec<String>,
        /// Render every genre instead of a selection
        #[arg(long, conflicts_with_all = ["state", "selected", "expanded", "highlight", "actions"])]
        entire: bool,
        #[arg(long)]
        pretty: bool,
    },
    /// Render many selection states concurrently against one shared index
    Replay {
        /// JSON array of selection states
        #[arg(long)]
        sessions: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "genremap={log_level},genremap_core={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = commands::Context {
        snapshot: cli.snapshot,
        config: cli.config,
    };

    match cli.command {
        Commands::Build => commands::build(&ctx),
        Commands::Lookup { id, name } => commands::lookup(&ctx, id, name),
        Commands::Path { from, to, kind } => commands::path(&ctx, from, to, kind),
        Commands::View {
            state,
            selected,
            expanded,
            highlight,
            actions,
            entire,
            pretty,
        } => {
            let request = commands::ViewRequest {
                state,
                selected,
                expanded,
                highlight,
                actions,
                entire,
                pretty,
            };
            commands::view(&ctx, request)
        }
        Commands::Replay { sessions } => commands::replay(&ctx, sessions),
        Commands::Version => {
            println!("genremap v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
