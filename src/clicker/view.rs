//! Derived display values handed to the UI alongside the state.
//!
//! Everything here is recomputed from `(ContentDb, GameState)` on demand;
//! nothing is stored.

use std::collections::BTreeMap;

use super::content::ContentDb;
use super::logic::{auto_dps, can_afford, click_damage, upgrade_price};
use super::state::{GameState, UnlockFlags};
use crate::number::ScaledNumber;

/// Shown in place of a hidden achievement's text until it unlocks.
pub const HIDDEN_TEXT: &str = "???";

#[derive(Clone, Debug, PartialEq)]
pub struct CurrencyRow {
    pub id: String,
    pub name: String,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub level: u32,
    pub max_level: u32,
    /// Price of the next level, e.g. `"7.50 Bronze"`. Empty when maxed.
    pub cost: String,
    pub affordable: bool,
    pub maxed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AchievementRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unlocked: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HudView {
    pub target_name: String,
    pub target_subtitle: String,
    pub target_image: String,
    pub hp: String,
    pub max_hp: String,
    pub defense: String,
    pub click_damage: String,
    /// Zero until auto click is unlocked.
    pub auto_dps: String,
    /// Discovered currencies only, in content order.
    pub currencies: Vec<CurrencyRow>,
    /// Empty until the upgrades panel is unlocked.
    pub upgrades: Vec<UpgradeRow>,
    /// Empty while the achievements panel is locked.
    pub achievements: Vec<AchievementRow>,
    pub unlocks: UnlockFlags,
}

pub fn format_number(n: ScaledNumber) -> String {
    n.to_string()
}

/// Price table as display text, one `"{amount} {currency}"` per entry.
fn format_price(content: &ContentDb, price: &BTreeMap<String, ScaledNumber>) -> String {
    price
        .iter()
        .map(|(currency, amount)| {
            let name = content
                .currency(currency)
                .map(|c| c.name.as_str())
                .unwrap_or(currency.as_str());
            format!("{} {}", format_number(*amount), name)
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

pub fn build_view(content: &ContentDb, state: &GameState) -> HudView {
    let target = state.current_target(content);

    let currencies = content
        .currencies()
        .iter()
        .filter(|c| state.discovered.contains(&c.id))
        .map(|c| CurrencyRow {
            id: c.id.clone(),
            name: c.name.clone(),
            amount: format_number(state.balance(&c.id)),
        })
        .collect();

    let upgrades = if state.unlocks.upgrades {
        content
            .upgrades()
            .iter()
            .map(|u| {
                let level = state.level(&u.id);
                let maxed = level >= u.max_level;
                let price = upgrade_price(u, level);
                UpgradeRow {
                    id: u.id.clone(),
                    name: u.name.clone(),
                    description: u.description.clone(),
                    level,
                    max_level: u.max_level,
                    cost: if maxed {
                        String::new()
                    } else {
                        format_price(content, &price)
                    },
                    affordable: !maxed && can_afford(&state.currencies, &price),
                    maxed,
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    let achievements = if state.unlocks.achievements {
        content
            .achievements()
            .iter()
            .map(|a| {
                let unlocked = state.achievements.contains(&a.id);
                let masked = a.hidden && !unlocked;
                AchievementRow {
                    id: a.id.clone(),
                    name: if masked { HIDDEN_TEXT.into() } else { a.name.clone() },
                    description: if masked {
                        HIDDEN_TEXT.into()
                    } else {
                        a.description.clone()
                    },
                    unlocked,
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    let auto = if state.unlocks.auto_click {
        auto_dps(content, state)
    } else {
        ScaledNumber::ZERO
    };

    HudView {
        target_name: target.map(|t| t.name.clone()).unwrap_or_default(),
        target_subtitle: target.map(|t| t.subtitle.clone()).unwrap_or_default(),
        target_image: target.map(|t| t.image.clone()).unwrap_or_default(),
        hp: format_number(state.hp),
        max_hp: target.map(|t| format_number(t.max_hp)).unwrap_or_default(),
        defense: target.map(|t| format_number(t.defense)).unwrap_or_default(),
        click_damage: format_number(click_damage(content, state)),
        auto_dps: format_number(auto),
        currencies,
        upgrades,
        achievements,
        unlocks: state.unlocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clicker::content::ContentTables;
    use crate::clicker::state::UnlockFlag;

    fn content() -> ContentDb {
        ContentDb::new(ContentTables::builtin()).unwrap()
    }

    #[test]
    fn fresh_game_view() {
        let content = content();
        let view = build_view(&content, &GameState::new(&content));
        assert_eq!(view.target_name, "Bolha de Ar");
        assert_eq!(view.hp, "1.00");
        assert_eq!(view.defense, "0");
        assert_eq!(view.click_damage, "1.00");
        assert_eq!(view.auto_dps, "0");
        assert_eq!(view.currencies.len(), 1);
        assert_eq!(view.currencies[0].amount, "0");
        assert!(view.upgrades.is_empty());
        assert_eq!(view.achievements.len(), content.achievements().len());
    }

    #[test]
    fn hidden_achievement_is_masked_until_unlocked() {
        let content = content();
        let mut state = GameState::new(&content);
        let row = |state: &GameState| {
            build_view(&content, state)
                .achievements
                .into_iter()
                .find(|a| a.id == "ten_upgrades")
                .unwrap()
        };

        let locked = row(&state);
        assert_eq!(locked.name, HIDDEN_TEXT);
        assert_eq!(locked.description, HIDDEN_TEXT);
        assert!(!locked.unlocked);

        state.achievements.insert("ten_upgrades".into());
        let unlocked = row(&state);
        assert_eq!(unlocked.name, "Improvement Spiral");
        assert!(unlocked.unlocked);
    }

    #[test]
    fn visible_locked_achievement_shows_text() {
        let content = content();
        let view = build_view(&content, &GameState::new(&content));
        let first = &view.achievements[0];
        assert_eq!(first.name, "Violence Begins");
        assert!(!first.unlocked);
    }

    #[test]
    fn upgrade_rows_show_price_and_affordability() {
        let content = content();
        let mut state = GameState::new(&content);
        state.unlocks = state.unlocks.with(UnlockFlag::Upgrades);
        state
            .currencies
            .insert("bronze".into(), ScaledNumber::new(10.0, 0));
        state.upgrades.insert("click_damage".into(), 1);
        state.upgrades.insert("auto_speed".into(), 25);

        let view = build_view(&content, &state);
        let click = &view.upgrades[0];
        assert_eq!(click.cost, "7.50 Bronze");
        assert!(click.affordable);
        assert_eq!(click.level, 1);

        let auto = &view.upgrades[1];
        assert_eq!(auto.cost, "15.00 Bronze");
        assert!(!auto.affordable);

        let speed = &view.upgrades[2];
        assert!(speed.maxed);
        assert!(!speed.affordable);
        assert!(speed.cost.is_empty());
    }

    #[test]
    fn auto_dps_shown_once_unlocked() {
        let content = content();
        let mut state = GameState::new(&content);
        state.upgrades.insert("auto_damage".into(), 2);
        assert_eq!(build_view(&content, &state).auto_dps, "0");
        state.unlocks = state.unlocks.with(UnlockFlag::AutoClick);
        assert_eq!(build_view(&content, &state).auto_dps, "2.00");
    }

    #[test]
    fn discovered_currencies_listed_in_content_order() {
        let content = content();
        let mut state = GameState::new(&content);
        state.discovered.insert("silver".into());
        state
            .currencies
            .insert("silver".into(), ScaledNumber::new(1.5, 3));
        let view = build_view(&content, &state);
        let names: Vec<&str> = view.currencies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bronze", "Silver"]);
        assert_eq!(view.currencies[1].amount, "1.50K");
    }

    #[test]
    fn out_of_range_target_renders_blank() {
        let content = content();
        let mut state = GameState::new(&content);
        state.target_index = 99;
        let view = build_view(&content, &state);
        assert!(view.target_name.is_empty());
        assert!(view.max_hp.is_empty());
    }
}
