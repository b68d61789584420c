//! Pull sessions from the command line

use anyhow::Result;
use gacha::{Banner, PullSession, RandRolls};
use gacha_store::{GachaRepository, Rarity};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cli::OutputFormat;

/// Handle `wish`
pub fn wish<S: GachaRepository>(
    banner: &Banner<S>,
    user: &str,
    amount: u32,
    seed: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let session = match seed {
        Some(seed) => banner.run_pulls(user, amount, &mut RandRolls(StdRng::seed_from_u64(seed)))?,
        None => banner.wish(user, amount)?,
    };

    match format {
        OutputFormat::Json => crate::commands::print_json(&session),
        OutputFormat::Table => {
            print!("{}", render(&session, banner.config().hard_pity));
            Ok(())
        }
    }
}

/// Session summary, best tier first
pub fn render(session: &PullSession, hard_pity: u32) -> String {
    let mut out = String::new();
    let plural = if session.pulls.len() == 1 { "" } else { "s" };
    out.push_str(&format!(
        "{} pull{} (session {})\n",
        session.pulls.len(),
        plural,
        session.session_id
    ));

    for rarity in Rarity::ALL.iter().rev() {
        let pulls: Vec<_> = session.pulls.iter().filter(|p| p.rarity == *rarity).collect();
        if pulls.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{} {}\n", rarity.stars(), rarity));
        for pull in pulls {
            let note = pull.reason.note(pull.rarity);
            if note.is_empty() {
                out.push_str(&format!("  {}\n", pull.item));
            } else {
                out.push_str(&format!("  {} {}\n", pull.item, note));
            }
        }
    }

    let state = &session.state;
    out.push_str(&format!(
        "\nPity: {}/{} to five-star, {} since last four-star, {} lifetime pulls\n",
        state.pity_5, hard_pity, state.pity_4, state.total_pulls
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha::{BannerConfig, ScriptedRolls};
    use gacha_store::SqliteDb;

    #[test]
    fn test_render_groups_best_tier_first() {
        let db = SqliteDb::open_in_memory().unwrap();
        db.init().unwrap();
        let banner = Banner::new(&db, BannerConfig::default()).unwrap();
        let session = banner
            .run_pulls("u", 10, &mut ScriptedRolls::constant(0.99))
            .unwrap();

        let text = render(&session, 60);
        assert!(text.starts_with("10 pulls (session "));
        let rare = text.find("★★★★ rare").unwrap();
        let common = text.find("★★★ common").unwrap();
        assert!(rare < common);
        assert!(text.contains("[GUARANTEED 4-STAR]"));
        assert!(text.contains("Pity: 10/60 to five-star, 0 since last four-star, 10 lifetime pulls"));
    }

    #[test]
    fn test_seeded_wish_runs() {
        let db = SqliteDb::open_in_memory().unwrap();
        db.init().unwrap();
        let banner = Banner::new(&db, BannerConfig::default()).unwrap();
        wish(&banner, "u", 5, Some(42), OutputFormat::Json).unwrap();
        assert_eq!(banner.get_state("u").unwrap().total_pulls, 5);
    }
}
