//! memsim binary
//!
//! Run with: `memsim [OPTIONS] <COMMAND>`

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use memsim::config::SimConfig;
use memsim::dispatch::{Command, Dispatcher};
use memsim::memory::{PidPolicy, PlacementPolicy, RelationPolicy};
use memsim::store::FileStore;
use memsim::ui::App;

#[derive(Parser)]
#[command(name = "memsim")]
#[command(about = "Heap allocation simulator with a process relation graph")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the state files (default: .memsim)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Capacity of a newly created heap
    #[arg(long, global = true)]
    capacity: Option<u64>,

    /// Relation endpoint policy: strict or permissive
    #[arg(long, global = true)]
    relations: Option<RelationPolicy>,

    /// Pid assignment policy: reuse or monotonic
    #[arg(long, global = true)]
    pids: Option<PidPolicy>,

    /// Free-range placement: first-fit or best-fit
    #[arg(long, global = true)]
    placement: Option<PlacementPolicy>,

    /// How long to wait for the state lock
    #[arg(long, global = true)]
    lock_timeout_ms: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a block for a new process
    Allocate {
        /// Number of units
        #[arg(allow_hyphen_values = true)]
        size: String,
    },

    /// Free the block owned by a process
    Deallocate {
        /// Process id
        #[arg(allow_hyphen_values = true)]
        pid: String,
    },

    /// Slide all blocks to the start of the heap
    Compact,

    /// Record a directed relation between two processes
    #[command(name = "add_relation", alias = "add-relation")]
    AddRelation {
        #[arg(allow_hyphen_values = true)]
        from: String,
        #[arg(allow_hyphen_values = true)]
        to: String,
    },

    /// List all relations
    #[command(name = "show_graph", alias = "show-graph")]
    ShowGraph,

    /// Show the block table
    Display,

    /// Show usage and fragmentation figures
    Stats,

    /// Clear the heap and the graph
    Logout,

    /// Open the interactive heap viewer
    View,
}

impl Commands {
    /// Convert to a domain command; `None` for the viewer
    fn to_command(&self) -> Option<memsim::errors::SimResult<Command>> {
        let parsed = match self {
            Commands::Allocate { size } => Command::parse("allocate", &[size]),
            Commands::Deallocate { pid } => Command::parse("deallocate", &[pid]),
            Commands::Compact => Command::parse::<&str>("compact", &[]),
            Commands::AddRelation { from, to } => Command::parse("add_relation", &[from, to]),
            Commands::ShowGraph => Command::parse::<&str>("show_graph", &[]),
            Commands::Display => Command::parse::<&str>("display", &[]),
            Commands::Stats => Command::parse::<&str>("stats", &[]),
            Commands::Logout => Command::parse::<&str>("logout", &[]),
            Commands::View => return None,
        };
        Some(parsed)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the report
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli);
    let mut dispatcher = Dispatcher::new(FileStore::from_config(&config), config);

    match cli.command.to_command() {
        Some(Ok(command)) => match dispatcher.execute(command) {
            Ok(report) => {
                print!("{}", report);
                ExitCode::SUCCESS
            }
            Err(e) => {
                if e.is_transient() {
                    warn!("another invocation is holding the state; retry the command");
                }
                println!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Some(Err(e)) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
        None => match run_viewer(dispatcher) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// Defaults, then environment, then flags
fn build_config(cli: &Cli) -> SimConfig {
    let mut config = SimConfig::from_env();
    if let Some(dir) = &cli.state_dir {
        config = config.with_state_dir(dir);
    }
    if let Some(capacity) = cli.capacity.filter(|&c| c > 0) {
        config = config.with_heap_capacity(capacity);
    }
    if let Some(policy) = cli.relations {
        config = config.with_relation_policy(policy);
    }
    if let Some(policy) = cli.pids {
        config = config.with_pid_policy(policy);
    }
    if let Some(placement) = cli.placement {
        config = config.with_placement(placement);
    }
    if let Some(ms) = cli.lock_timeout_ms {
        config = config.with_lock_timeout(Duration::from_millis(ms));
    }
    config
}

fn run_viewer(dispatcher: Dispatcher<FileStore>) -> Result<()> {
    let mut app = App::new(dispatcher).context("failed to load state")?;

    // Set up terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("viewer failed")
}
