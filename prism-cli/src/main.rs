//! Prism CLI
//!
//! Command-line client for the Prism personal-finance API.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the password can also come from PRISM_PASSWORD)
//! prism login jane@example.com --password s3cret
//!
//! # List this month's grocery spending
//! prism transactions list --category 3 --from 2024-03-01 --type expense
//!
//! # Record progress towards a goal
//! prism goals progress 2 150.00
//! ```

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use prism_core::{ClientConfig, PrismClient, StoreBackend};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Command-line client for the Prism finance API")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL
    #[arg(long, global = true, env = "PRISM_API_URL")]
    api_url: Option<String>,

    /// Where to keep the session
    #[arg(long, global = true, value_enum)]
    store: Option<StoreArg>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreArg {
    Keyring,
    File,
    Memory,
}

impl From<StoreArg> for StoreBackend {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Keyring => StoreBackend::Keyring,
            StoreArg::File => StoreBackend::File,
            StoreArg::Memory => StoreBackend::Memory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        email: String,

        #[arg(short, long, env = "PRISM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        email: String,

        #[arg(short, long, env = "PRISM_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Renew the access token now
    Refresh,

    /// Manage accounts
    #[command(subcommand)]
    Accounts(CollectionCommand),

    /// Browse transactions
    #[command(subcommand)]
    Transactions(TransactionCommand),

    /// Browse categories
    #[command(subcommand)]
    Categories(CategoryCommand),

    /// Browse budgets
    #[command(subcommand)]
    Budgets(BudgetCommand),

    /// Browse and update goals
    #[command(subcommand)]
    Goals(GoalCommand),
}

/// Operations every collection supports.
#[derive(Subcommand, Debug)]
pub enum CollectionCommand {
    /// List records
    List(ListArgs),

    #[command(flatten)]
    Record(RecordCommand),
}

/// Single-record and aggregate operations.
#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    /// Show one record
    Get { id: u64 },

    /// Show aggregate figures
    Summary,

    /// Delete a record
    Delete { id: u64 },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    /// Sort key, prefix with '-' for descending
    #[arg(long)]
    pub ordering: Option<String>,

    /// Page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Fetch every page
    #[arg(long, conflicts_with = "page")]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum TransactionCommand {
    /// List transactions
    List(TransactionListArgs),

    /// Transactions from the last 30 days
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    #[command(flatten)]
    Record(RecordCommand),
}

#[derive(Args, Debug, Default)]
pub struct TransactionListArgs {
    #[arg(long)]
    pub account: Option<u64>,

    #[arg(long)]
    pub category: Option<u64>,

    /// income or expense
    #[arg(long = "type", value_enum)]
    pub kind: Option<KindArg>,

    /// First date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<chrono::NaiveDate>,

    /// Last date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<chrono::NaiveDate>,

    #[command(flatten)]
    pub list: ListArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Income,
    Expense,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// Categories as a tree
    Tree,

    /// Active categories grouped into income and expense
    ByType,

    #[command(flatten)]
    Common(CollectionCommand),
}

#[derive(Subcommand, Debug)]
pub enum BudgetCommand {
    /// Budgets whose period includes today
    Current,

    /// Budgets that are over their amount
    OverBudget,

    #[command(flatten)]
    Common(CollectionCommand),
}

#[derive(Subcommand, Debug)]
pub enum GoalCommand {
    /// Goals still in progress
    Active,

    /// Goals that have been reached
    Completed,

    /// Goals at 80% or more
    NearTarget,

    /// Add to (or, with a negative amount, take from) a goal
    Progress {
        id: u64,

        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    #[command(flatten)]
    Common(CollectionCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::load().context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(store) = cli.store {
        config.store = store.into();
    }

    init_logging(&config, cli.verbose);
    tracing::debug!("Loaded configuration from {:?}", config.config_path);

    let client = PrismClient::from_config(&config)
        .await
        .context("Failed to set up the API client")?;
    commands::watch_session(&client);

    commands::run(&client, cli.command, cli.format).await
}

fn init_logging(config: &ClientConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transaction_filters_parse() {
        let cli = Cli::try_parse_from([
            "prism",
            "transactions",
            "list",
            "--category",
            "3",
            "--type",
            "expense",
            "--from",
            "2024-03-01",
            "--search",
            "market",
        ])
        .unwrap();

        let Commands::Transactions(TransactionCommand::List(args)) = cli.command else {
            panic!("expected transactions list");
        };
        assert_eq!(args.category, Some(3));
        assert_eq!(args.kind, Some(KindArg::Expense));
        assert_eq!(args.from, chrono::NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(args.list.search.as_deref(), Some("market"));
    }

    #[test]
    fn test_shared_collection_commands() {
        let cli = Cli::try_parse_from(["prism", "--format", "json", "goals", "get", "4"]).unwrap();
        assert_eq!(cli.format, Format::Json);
        assert!(matches!(
            cli.command,
            Commands::Goals(GoalCommand::Common(CollectionCommand::Record(
                RecordCommand::Get { id: 4 }
            )))
        ));
    }

    #[test]
    fn test_categories_by_type_parses() {
        let cli = Cli::try_parse_from(["prism", "categories", "by-type"]).unwrap();
        assert!(matches!(cli.command, Commands::Categories(CategoryCommand::ByType)));
    }

    #[test]
    fn test_negative_progress_amount() {
        let cli = Cli::try_parse_from(["prism", "goals", "progress", "2", "-25.00"]).unwrap();
        let Commands::Goals(GoalCommand::Progress { id, amount }) = cli.command else {
            panic!("expected goals progress");
        };
        assert_eq!(id, 2);
        assert_eq!(amount, "-25.00");
    }

    #[test]
    fn test_all_conflicts_with_page() {
        let args = ["prism", "accounts", "list", "--all", "--page", "2"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
