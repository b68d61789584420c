//! Core CLI definitions

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "gacha")]
#[command(about = "Gacha banner with hard and soft pity", long_about = None)]
pub struct Cli {
    /// Path to the ledger database (overrides the configured path)
    #[arg(long, global = true, env = "GACHA_DB")]
    pub db: Option<PathBuf>,

    /// Banner definition in TOML (overrides the configured banner)
    #[arg(long, global = true, env = "GACHA_BANNER")]
    pub banner: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger database and apply migrations
    Init,

    /// Pull on the banner
    #[command(visible_alias = "w")]
    Wish {
        /// User to pull for
        #[arg(short, long)]
        user: String,

        /// Number of pulls in this session
        #[arg(short, long, default_value_t = 1)]
        amount: u32,

        /// Seed the RNG for a reproducible session
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show a user's pity counters
    #[command(visible_alias = "p")]
    Pity {
        #[arg(short, long)]
        user: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List a user's items
    #[command(visible_alias = "inv")]
    Inventory {
        #[arg(short, long)]
        user: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Use consumable items (XP crystals, crown bundles)
    Use {
        #[arg(short, long)]
        user: String,

        /// Exact item name, e.g. "10,000 Crowns"
        #[arg(short, long)]
        item: String,

        #[arg(short, long, default_value_t = 1)]
        amount: u64,
    },

    /// Show a user's most recent pulls
    #[command(visible_alias = "h")]
    History {
        #[arg(short, long)]
        user: String,

        /// Maximum number of pulls to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Users with the most lifetime pulls
    Leaderboard {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Pull totals across all users, against the configured odds
    Stats {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Overwrite a user's pity counters
    SetPity {
        #[arg(short, long)]
        user: String,

        /// Pulls since the last five-star
        #[arg(long = "pity-5")]
        pity_5: u32,

        /// Pulls since the last four-star or better
        #[arg(long = "pity-4")]
        pity_4: u32,

        /// Lifetime pulls (keeps the stored count if omitted)
        #[arg(long)]
        total_pulls: Option<u64>,
    },

    /// Show the banner's rates and loot table
    Rates,

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set the default database path
        #[arg(long)]
        database: Option<PathBuf>,

        /// Set the default banner file
        #[arg(long)]
        banner_file: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
