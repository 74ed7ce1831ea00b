use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ledgerfx::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ledgerfx::AppCommand {
    fn from(cmd: Commands) -> ledgerfx::AppCommand {
        match cmd {
            Commands::Summary { currency } => ledgerfx::AppCommand::Summary { currency },
            Commands::Transactions { currency } => {
                ledgerfx::AppCommand::Transactions { currency }
            }
            Commands::Currency { code } => ledgerfx::AppCommand::Currency { code },
            Commands::Currencies => ledgerfx::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display income, expenses and balance
    Summary {
        /// Show amounts in this currency for this run only
        #[arg(long)]
        currency: Option<String>,
    },
    /// List ledger transactions
    Transactions {
        /// Show amounts in this currency for this run only
        #[arg(long)]
        currency: Option<String>,
    },
    /// Show or set the display currency
    Currency {
        /// ISO 4217 code to save, e.g. USD
        code: Option<String>,
    },
    /// List supported display currencies
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => ledgerfx::cli::setup::setup_at_path(path),
            None => ledgerfx::cli::setup::setup(),
        },
        Some(cmd) => ledgerfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
