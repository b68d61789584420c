mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use gacha::{Banner, BannerConfig};
use gacha_store::SqliteDb;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "gacha=info",
        1 => "gacha=debug",
        _ => "gacha=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Database and banner selection shared by every command
struct Target {
    config: Config,
    db: Option<PathBuf>,
    banner: Option<PathBuf>,
}

impl Target {
    fn new(db: Option<PathBuf>, banner: Option<PathBuf>) -> Self {
        let config = Config::load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring CLI config: {:#}", e);
            Config::default()
        });
        Self { config, db, banner }
    }

    fn database(&self) -> PathBuf {
        self.config.database_path(self.db.clone())
    }

    fn banner_config(&self) -> Result<BannerConfig> {
        self.config.banner_config(self.banner.as_deref())
    }

    fn open(&self) -> Result<Banner<SqliteDb>> {
        commands::open_banner(&self.database(), self.banner_config()?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let target = Target::new(cli.db, cli.banner);

    match cli.command {
        Commands::Configure {
            database,
            banner_file,
            show,
        } => commands::configure::handle(database, banner_file, show),

        Commands::Init => commands::admin::init(&target.database()),

        Commands::Rates => commands::stats::rates(&target.banner_config()?),

        Commands::Wish {
            user,
            amount,
            seed,
            format,
        } => commands::wish::wish(&target.open()?, &user, amount, seed, format),

        Commands::Pity { user, format } => commands::account::pity(&target.open()?, &user, format),

        Commands::Inventory { user, format } => {
            commands::account::inventory(&target.open()?, &user, format)
        }

        Commands::Use { user, item, amount } => {
            commands::account::use_item(&target.open()?, &user, &item, amount)
        }

        Commands::History {
            user,
            limit,
            format,
        } => commands::account::history(&target.open()?, &user, limit, format),

        Commands::Leaderboard { limit, format } => {
            commands::stats::leaderboard(&target.open()?, limit, format)
        }

        Commands::Stats { format } => commands::stats::stats(&target.open()?, format),

        Commands::SetPity {
            user,
            pity_5,
            pity_4,
            total_pulls,
        } => commands::admin::set_pity(&target.open()?, &user, pity_5, pity_4, total_pulls),
    }
}
