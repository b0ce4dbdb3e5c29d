//! Static game content: currencies, targets, upgrades and achievements.
//!
//! Tables are read-only once loaded. [`ContentDb`] validates them and builds
//! id → index maps once so lookups by id never scan the tables.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{PlayerProgressStats, UnlockFlag};
use crate::number::ScaledNumber;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("content has no targets")]
    NoTargets,
    #[error("duplicate {table} id '{id}'")]
    DuplicateId { table: &'static str, id: String },
    #[error("{owner} references unknown currency '{currency}'")]
    UnknownCurrency { owner: String, currency: String },
    #[error("failed to parse content at {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: String,
    pub name: String,
    pub tier: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub image: String,
    pub tier: u32,
    pub max_hp: ScaledNumber,
    #[serde(default)]
    pub defense: ScaledNumber,
    /// Currency credited on destruction.
    #[serde(default)]
    pub drops: BTreeMap<String, ScaledNumber>,
}

/// What owning levels of an upgrade does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// +1 click damage per level.
    ClickDamage,
    /// Auto damage scales with level.
    AutoDamage,
    /// Auto damage rate multiplier `1 + 0.25 × level`.
    AutoSpeed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_level: u32,
    /// Price of the first level, per currency.
    pub cost: BTreeMap<String, ScaledNumber>,
    pub effect: UpgradeEffect,
}

/// Cumulative counter an achievement can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Clicks,
    TargetsDestroyed,
    UpgradesPurchased,
}

/// Holds once `stat` reaches `at_least`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub stat: Stat,
    pub at_least: u64,
}

impl Condition {
    pub fn holds(&self, stats: &PlayerProgressStats) -> bool {
        stats.get(self.stat) >= self.at_least
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Reward {
    UnlockSystem(UnlockFlag),
    /// Reserved; has no effect yet.
    Bonus(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Name and description are masked in the UI until unlocked.
    #[serde(default)]
    pub hidden: bool,
    pub condition: Condition,
    pub reward: Reward,
}

/// The raw, ordered tables as shipped or as loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTables {
    pub currencies: Vec<Currency>,
    /// Ordered by encounter; index 0 is the first target.
    pub targets: Vec<Target>,
    pub upgrades: Vec<Upgrade>,
    /// Declaration order decides the order of simultaneous unlocks.
    pub achievements: Vec<Achievement>,
}

fn amount(mantissa: f64, exponent: i32) -> ScaledNumber {
    ScaledNumber::new(mantissa, exponent)
}

fn price(entries: &[(&str, ScaledNumber)]) -> BTreeMap<String, ScaledNumber> {
    entries.iter().map(|(id, n)| (id.to_string(), *n)).collect()
}

fn target(
    id: &str,
    name: &str,
    subtitle: &str,
    tier: u32,
    max_hp: ScaledNumber,
    defense: ScaledNumber,
    drops: &[(&str, ScaledNumber)],
) -> Target {
    Target {
        id: id.to_string(),
        name: name.to_string(),
        subtitle: subtitle.to_string(),
        image: format!("/assets/targets/{}.png", id),
        tier,
        max_hp,
        defense,
        drops: price(drops),
    }
}

fn upgrade(
    id: &str,
    name: &str,
    description: &str,
    max_level: u32,
    cost: &[(&str, ScaledNumber)],
    effect: UpgradeEffect,
) -> Upgrade {
    Upgrade {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        max_level,
        cost: price(cost),
        effect,
    }
}

fn achievement(
    id: &str,
    name: &str,
    description: &str,
    hidden: bool,
    condition: Condition,
    reward: Reward,
) -> Achievement {
    Achievement {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        hidden,
        condition,
        reward,
    }
}

impl ContentTables {
    /// The tables the game ships with.
    pub fn builtin() -> Self {
        let currencies = [
            ("bronze", "Bronze", 0),
            ("silver", "Silver", 1),
            ("gold", "Gold", 2),
            ("platinum", "Platinum", 3),
        ]
        .iter()
        .map(|(id, name, tier)| Currency {
            id: id.to_string(),
            name: name.to_string(),
            tier: *tier,
        })
        .collect();

        let targets = vec![
            target(
                "bubble",
                "Bolha de Ar",
                "Extremamente frágil",
                0,
                amount(1.0, 0),
                ScaledNumber::ZERO,
                &[("bronze", amount(1.0, 0))],
            ),
            target(
                "paper",
                "Folha de Papel",
                "Rasga com um suspiro",
                1,
                amount(25.0, 0),
                ScaledNumber::ZERO,
                &[("bronze", amount(5.0, 0))],
            ),
            target(
                "bottle",
                "Garrafa de Vidro",
                "Quebra, mas resiste um pouco",
                2,
                amount(400.0, 0),
                amount(1.0, 0),
                &[("bronze", amount(40.0, 0))],
            ),
            target(
                "brick",
                "Tijolo",
                "Teimoso",
                3,
                amount(12.0, 3),
                amount(3.0, 0),
                &[("bronze", amount(250.0, 0)), ("silver", amount(1.0, 0))],
            ),
            target(
                "safe",
                "Cofre de Aço",
                "Feito para não ceder",
                4,
                amount(500.0, 3),
                amount(10.0, 0),
                &[("bronze", amount(2.0, 3)), ("silver", amount(10.0, 0))],
            ),
        ];

        let upgrades = vec![
            upgrade(
                "click_damage",
                "Stronger Finger",
                "Increase click damage by +1 per level.",
                50,
                &[("bronze", amount(5.0, 0))],
                UpgradeEffect::ClickDamage,
            ),
            upgrade(
                "auto_damage",
                "Auto Damage",
                "Automatically deals damage.",
                50,
                &[("bronze", amount(15.0, 0))],
                UpgradeEffect::AutoDamage,
            ),
            upgrade(
                "auto_speed",
                "Auto Speed",
                "Increases auto damage speed.",
                25,
                &[("bronze", amount(50.0, 0))],
                UpgradeEffect::AutoSpeed,
            ),
        ];

        let achievements = vec![
            achievement(
                "first_click",
                "Violence Begins",
                "Click something for the first time.",
                false,
                Condition {
                    stat: Stat::Clicks,
                    at_least: 1,
                },
                Reward::Bonus("nothing".to_string()),
            ),
            achievement(
                "first_destruction",
                "It Is Gone",
                "Destroy your first target.",
                false,
                Condition {
                    stat: Stat::TargetsDestroyed,
                    at_least: 1,
                },
                Reward::UnlockSystem(UnlockFlag::Upgrades),
            ),
            achievement(
                "ten_upgrades",
                "Improvement Spiral",
                "Purchase 10 upgrades.",
                true,
                Condition {
                    stat: Stat::UpgradesPurchased,
                    at_least: 10,
                },
                Reward::UnlockSystem(UnlockFlag::AutoClick),
            ),
        ];

        Self {
            currencies,
            targets,
            upgrades,
            achievements,
        }
    }
}

/// Validated content with O(1) id lookup.
#[derive(Debug, Clone)]
pub struct ContentDb {
    tables: ContentTables,
    currency_index: HashMap<String, usize>,
    target_index: HashMap<String, usize>,
    upgrade_index: HashMap<String, usize>,
    achievement_index: HashMap<String, usize>,
}

fn index_by_id<'a>(
    table: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> Result<HashMap<String, usize>, ContentError> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(ContentError::DuplicateId {
                table,
                id: id.clone(),
            });
        }
    }
    Ok(index)
}

fn check_currencies(
    owner: &str,
    amounts: &BTreeMap<String, ScaledNumber>,
    known: &HashMap<String, usize>,
) -> Result<(), ContentError> {
    match amounts.keys().find(|c| !known.contains_key(*c)) {
        Some(currency) => Err(ContentError::UnknownCurrency {
            owner: owner.to_string(),
            currency: currency.clone(),
        }),
        None => Ok(()),
    }
}

fn normalize_amounts(amounts: &mut BTreeMap<String, ScaledNumber>) {
    for amount in amounts.values_mut() {
        *amount = amount.normalize();
    }
}

impl ContentDb {
    /// Validate `tables` and bring every amount in them onto the grid.
    pub fn new(mut tables: ContentTables) -> Result<Self, ContentError> {
        if tables.targets.is_empty() {
            return Err(ContentError::NoTargets);
        }

        let currency_index = index_by_id("currency", tables.currencies.iter().map(|c| &c.id))?;
        let target_index = index_by_id("target", tables.targets.iter().map(|t| &t.id))?;
        let upgrade_index = index_by_id("upgrade", tables.upgrades.iter().map(|u| &u.id))?;
        let achievement_index =
            index_by_id("achievement", tables.achievements.iter().map(|a| &a.id))?;

        for t in &tables.targets {
            check_currencies(&format!("target '{}'", t.id), &t.drops, &currency_index)?;
        }
        for u in &tables.upgrades {
            check_currencies(&format!("upgrade '{}'", u.id), &u.cost, &currency_index)?;
        }

        for t in &mut tables.targets {
            t.max_hp = t.max_hp.normalize();
            t.defense = t.defense.normalize();
            normalize_amounts(&mut t.drops);
        }
        for u in &mut tables.upgrades {
            normalize_amounts(&mut u.cost);
        }

        Ok(Self {
            tables,
            currency_index,
            target_index,
            upgrade_index,
            achievement_index,
        })
    }

    /// Parse and validate a JSON content document.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let tables: ContentTables = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| ContentError::Parse {
                path: e.path().to_string(),
                message: e.into_inner().to_string(),
            })?;
        Self::new(tables)
    }

    pub fn tables(&self) -> &ContentTables {
        &self.tables
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.tables.currencies
    }

    pub fn currency(&self, id: &str) -> Option<&Currency> {
        self.currency_index
            .get(id)
            .and_then(|&i| self.tables.currencies.get(i))
    }

    pub fn targets(&self) -> &[Target] {
        &self.tables.targets
    }

    pub fn target(&self, index: usize) -> Option<&Target> {
        self.tables.targets.get(index)
    }

    pub fn target_by_id(&self, id: &str) -> Option<&Target> {
        self.target_index
            .get(id)
            .and_then(|&i| self.tables.targets.get(i))
    }

    /// Index of the terminal (farmable) target.
    pub fn last_target_index(&self) -> usize {
        self.tables.targets.len().saturating_sub(1)
    }

    pub fn upgrades(&self) -> &[Upgrade] {
        &self.tables.upgrades
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrade_index
            .get(id)
            .and_then(|&i| self.tables.upgrades.get(i))
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.tables.achievements
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievement_index
            .get(id)
            .and_then(|&i| self.tables.achievements.get(i))
    }
}
