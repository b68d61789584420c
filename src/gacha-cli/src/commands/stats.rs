//! Cross-user reporting: leaderboard, stats and banner rates

use anyhow::Result;
use gacha::{Banner, BannerConfig, LootCatalog};
use gacha_store::{GachaRepository, StatsRepository};

use super::print_json;
use crate::cli::OutputFormat;

/// Handle `leaderboard`
pub fn leaderboard<S: GachaRepository + StatsRepository>(
    banner: &Banner<S>,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let entries = banner.leaderboard(limit)?;
    if format == OutputFormat::Json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("Nobody has pulled yet");
        return Ok(());
    }

    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}. {:<24} {:>6} pulls  {:>4} five-star",
            rank + 1,
            entry.user_id,
            entry.total_pulls,
            entry.total_top_rarity
        );
    }
    Ok(())
}

/// Handle `stats`
pub fn stats<S: GachaRepository + StatsRepository>(
    banner: &Banner<S>,
    format: OutputFormat,
) -> Result<()> {
    let stats = banner.stats()?;
    if format == OutputFormat::Json {
        return print_json(&stats);
    }

    let ledger = &stats.ledger;
    println!("Banner Statistics");
    println!("  Users:       {}", ledger.users);
    println!("  Pulls:       {}", ledger.total_pulls);
    println!("  Five-star:   {}", ledger.exalted_pulled);
    println!("  Four-star:   {}", ledger.rare_pulled);
    println!("  Three-star:  {}", ledger.common_pulled);
    println!(
        "  Five-star rate: {:.3}% observed, {:.3}% base",
        stats.observed_top_rate * 100.0,
        stats.expected_top_rate * 100.0
    );
    println!(
        "  Four-star rate: {:.3}% observed, {:.3}% base",
        stats.observed_mid_rate * 100.0,
        stats.expected_mid_rate * 100.0
    );
    Ok(())
}

/// Handle `rates`
pub fn rates(config: &BannerConfig) -> Result<()> {
    let catalog = LootCatalog::from_config(config)?;
    println!(
        "Hard pity at {} pulls, four-star guaranteed every {} pulls",
        config.hard_pity, config.mid_pity
    );
    if let Some(start) = config.soft_pity.start() {
        println!("Soft pity from pull {}", start);
    }
    if let Some(checkpoint) = config.checkpoint {
        println!(
            "Checkpoint at pull {}: {:.0}% five-star, otherwise four-star",
            checkpoint.pull,
            checkpoint.chance * 100.0
        );
    }
    println!();
    print!("{}", catalog.distribution(config));
    Ok(())
}
