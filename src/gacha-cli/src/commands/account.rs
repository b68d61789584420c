//! Per-user account commands: pity, inventory, item use and history

use anyhow::Result;
use chrono::DateTime;
use gacha::Banner;
use gacha_store::GachaRepository;

use super::print_json;
use crate::cli::OutputFormat;

/// Handle `pity`
pub fn pity<S: GachaRepository>(banner: &Banner<S>, user: &str, format: OutputFormat) -> Result<()> {
    let status = banner.status(user)?;
    if format == OutputFormat::Json {
        return print_json(&status);
    }

    let state = &status.state;
    println!("Pity for {}", state.user_id);
    println!(
        "  Five-star:  {}/{} ({} until guaranteed)",
        state.pity_5,
        status.hard_pity,
        status.pulls_to_hard_pity()
    );
    println!(
        "  Four-star:  {}/{} ({} until guaranteed)",
        state.pity_4,
        status.mid_pity,
        status.pulls_to_mid_pity()
    );
    if let Some(start) = status.soft_pity_start {
        if state.pity_5 >= start {
            println!("  Soft pity active (from pull {})", start);
        } else {
            println!("  Soft pity starts at pull {}", start);
        }
    }
    println!("  Lifetime:   {} pulls, {} five-star", state.total_pulls, state.total_top_rarity);
    Ok(())
}

/// Handle `inventory`
pub fn inventory<S: GachaRepository>(
    banner: &Banner<S>,
    user: &str,
    format: OutputFormat,
) -> Result<()> {
    let items = banner.get_inventory(user)?;
    if format == OutputFormat::Json {
        return print_json(&items);
    }

    if items.is_empty() {
        println!("{} has no items", user);
        return Ok(());
    }

    let catalog = banner.catalog();
    for entry in items {
        let stars = catalog.rarity_of(&entry.item_name).map_or("", |r| r.stars());
        println!("{:>5}x  {} {}", entry.quantity, entry.item_name, stars);
    }
    Ok(())
}

/// Handle `use`
pub fn use_item<S: GachaRepository>(
    banner: &Banner<S>,
    user: &str,
    item: &str,
    amount: u64,
) -> Result<()> {
    let used = banner.use_item(user, item, amount)?;
    match used.total_value {
        Some(value) => println!("Used {}x {}: +{} {}", used.amount, used.item, value, used.kind),
        None => println!("Used {}x {}", used.amount, used.item),
    }
    Ok(())
}

/// Handle `history`
pub fn history<S: GachaRepository>(
    banner: &Banner<S>,
    user: &str,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let records = banner.get_history(user, limit)?;
    if format == OutputFormat::Json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("{} has not pulled yet", user);
        return Ok(());
    }

    for record in records {
        println!(
            "{}  {:<6} {}",
            format_timestamp(record.timestamp),
            record.rarity.stars(),
            record.item_name
        );
    }
    Ok(())
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
