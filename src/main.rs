use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xfx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Do not contact the rate service; use cached rates only
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for xfx::AppCommand {
    fn from(cmd: Commands) -> xfx::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => xfx::AppCommand::Convert { amount, from, to },
            Commands::Swap => xfx::AppCommand::Swap,
            Commands::Rates => xfx::AppCommand::Rates,
            Commands::Currencies { query } => xfx::AppCommand::Currencies { query },
            Commands::Refresh => xfx::AppCommand::Refresh,
            Commands::Watch { interval } => xfx::AppCommand::Watch {
                interval_secs: interval,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount; omitted values reuse the last selection
    Convert {
        /// Amount to convert, e.g. 100 or 12,5
        amount: Option<String>,
        /// Source currency code
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency code
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Swap source and target currencies
    Swap,
    /// Show rates from the source currency to every supported currency
    Rates,
    /// List supported currencies
    Currencies {
        /// Filter by code or name
        query: Option<String>,
    },
    /// Fetch the latest exchange rates now
    Refresh,
    /// Keep converting, refreshing rates as they go stale
    Watch {
        /// Seconds between staleness checks
        #[arg(short, long, default_value_t = 60)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xfx::cli::setup::setup(),
        Some(cmd) => xfx::run_command(cmd.into(), cli.config_path.as_deref(), cli.offline).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
