//! tickbar CLI - real-time tick to one-minute OHLCV bar aggregation.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "tickbar")]
#[command(about = "Aggregate trade ticks into one-minute OHLCV bars", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only, no summary)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate NDJSON ticks from a file or stdin and persist the bars
    Run(RunArgs),

    /// Show when a service started now would begin accepting ticks
    Align {
        /// IANA timezone for the local label
        #[arg(long, env = "TICKBAR_TIMEZONE", default_value = "Asia/Kolkata")]
        timezone: String,
    },
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    init_logging(cli.verbose, cli.quiet);

    match command {
        Commands::Run(args) => commands::run::run(args, cli.quiet).await,
        Commands::Align { timezone } => commands::align::show_alignment(&timezone),
    }
}
