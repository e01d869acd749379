//! Turnstile demo driver
//!
//! Small programs that exercise the thread package end to end: a
//! ticket-selling simulation, a spawn tree and a registry listing.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(about = "Demo driver for the turnstile thread package", long_about = None)]
#[command(version)]
struct Cli {
    /// Trace spawn, gate, semaphore and exit activity (verbose)
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ticket agents selling from a shared pool
    Tickets {
        /// Number of agent tasks
        #[arg(short, long, default_value_t = 10)]
        agents: usize,
        /// Tickets available for sale
        #[arg(short, long, default_value_t = 35)]
        tickets: usize,
        /// Seed for the shared random generator
        #[arg(short, long, default_value_t = 1)]
        seed: u64,
    },

    /// Tasks that spawn children down to a fixed depth
    Fanout {
        /// Children spawned by each task
        #[arg(short, long, default_value_t = 3)]
        width: usize,
        /// Levels below the initiating task
        #[arg(short, long, default_value_t = 3)]
        depth: usize,
    },

    /// Print the task and semaphore tables with parked tasks
    List {
        /// Parked tasks to spawn before listing
        #[arg(short, long, default_value_t = 3)]
        tasks: usize,
    },
}

fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("turnstile=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.trace);

    match cli.command {
        Commands::Tickets { agents, tickets, seed } => {
            commands::tickets::execute(commands::tickets::TicketOptions {
                agents,
                tickets,
                seed,
                trace: cli.trace,
            })?;
        }
        Commands::Fanout { width, depth } => {
            commands::fanout::execute(width, depth, cli.trace)?;
        }
        Commands::List { tasks } => {
            commands::list::execute(tasks, cli.trace)?;
        }
    }

    Ok(())
}
