//! Destroyer Clicker game state definitions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::content::{ContentDb, Stat, Target, UpgradeEffect};
use crate::number::ScaledNumber;

// ── Tuning ──────────────────────────────────────────────────────

/// Damage dealt by a bare click before upgrades.
pub const BASE_CLICK_DAMAGE: ScaledNumber = ScaledNumber::new(1.0, 0);

/// Auto damage per `auto_damage` level, before the speed multiplier.
pub const BASE_AUTO_DAMAGE: ScaledNumber = ScaledNumber::new(1.0, 0);

/// Each `auto_speed` level adds this much to the auto-damage rate multiplier.
pub const AUTO_SPEED_STEP: f64 = 0.25;

/// Upgrade price multiplier per owned level.
pub const UPGRADE_COST_GROWTH: f64 = 1.5;

/// Most recent log entries kept.
pub const LOG_CAPACITY: usize = 30;

const INITIAL_LOG_TEXT: &str = "You exist. Unfortunately.";

// ── Unlocks ─────────────────────────────────────────────────────

/// A feature gate that achievements can open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockFlag {
    Upgrades,
    AutoClick,
    Achievements,
}

impl UnlockFlag {
    pub const ALL: [UnlockFlag; 3] = [
        UnlockFlag::Upgrades,
        UnlockFlag::AutoClick,
        UnlockFlag::Achievements,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            UnlockFlag::Upgrades => "Upgrades",
            UnlockFlag::AutoClick => "Auto Click",
            UnlockFlag::Achievements => "Achievements",
        }
    }
}

/// Permanent feature gates. Each flips false → true at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockFlags {
    pub upgrades: bool,
    pub auto_click: bool,
    pub achievements: bool,
}

impl Default for UnlockFlags {
    fn default() -> Self {
        Self {
            upgrades: false,
            auto_click: false,
            achievements: true,
        }
    }
}

impl UnlockFlags {
    pub fn is_set(&self, flag: UnlockFlag) -> bool {
        match flag {
            UnlockFlag::Upgrades => self.upgrades,
            UnlockFlag::AutoClick => self.auto_click,
            UnlockFlag::Achievements => self.achievements,
        }
    }

    /// Copy with `flag` set. Setting an already-set flag is a no-op.
    pub fn with(mut self, flag: UnlockFlag) -> Self {
        match flag {
            UnlockFlag::Upgrades => self.upgrades = true,
            UnlockFlag::AutoClick => self.auto_click = true,
            UnlockFlag::Achievements => self.achievements = true,
        }
        self
    }

    /// Union of two flag sets; used when restoring a save so no flag reverts.
    pub fn merge(self, other: UnlockFlags) -> Self {
        Self {
            upgrades: self.upgrades || other.upgrades,
            auto_click: self.auto_click || other.auto_click,
            achievements: self.achievements || other.achievements,
        }
    }
}

// ── Progress ────────────────────────────────────────────────────

/// Cumulative counters read by achievement conditions. Never decrease.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProgressStats {
    pub clicks: u64,
    pub targets_destroyed: u64,
    pub upgrades_purchased: u64,
}

impl PlayerProgressStats {
    pub fn get(&self, stat: Stat) -> u64 {
        match stat {
            Stat::Clicks => self.clicks,
            Stat::TargetsDestroyed => self.targets_destroyed,
            Stat::UpgradesPurchased => self.upgrades_purchased,
        }
    }
}

// ── Aggregate ───────────────────────────────────────────────────

/// The whole mutable game. Replaced wholesale by every transition.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    /// Ordinal into the content's target sequence.
    pub target_index: usize,
    /// Hit points of the current target. Zero mantissa means destroyed.
    pub hp: ScaledNumber,
    pub currencies: BTreeMap<String, ScaledNumber>,
    /// Owned level per upgrade id. Absent means level 0.
    pub upgrades: BTreeMap<String, u32>,
    pub unlocks: UnlockFlags,
    pub stats: PlayerProgressStats,
    /// Ids of unlocked achievements. Only ever grows.
    pub achievements: BTreeSet<String>,
    /// Currencies the player has seen. Only ever grows.
    pub discovered: BTreeSet<String>,
}

impl GameState {
    /// A fresh game: first target at full health, tier-0 currencies at zero.
    pub fn new(content: &ContentDb) -> Self {
        let starting: Vec<String> = content
            .currencies()
            .iter()
            .filter(|c| c.tier == 0)
            .map(|c| c.id.clone())
            .collect();

        Self {
            target_index: 0,
            hp: content
                .target(0)
                .map(|t| t.max_hp)
                .unwrap_or(ScaledNumber::ZERO),
            currencies: starting
                .iter()
                .map(|id| (id.clone(), ScaledNumber::ZERO))
                .collect(),
            upgrades: BTreeMap::new(),
            unlocks: UnlockFlags::default(),
            stats: PlayerProgressStats::default(),
            achievements: BTreeSet::new(),
            discovered: starting.into_iter().collect(),
        }
    }

    pub fn level(&self, upgrade_id: &str) -> u32 {
        self.upgrades.get(upgrade_id).copied().unwrap_or(0)
    }

    /// Combined level of every upgrade carrying `effect`.
    pub fn effect_level(&self, content: &ContentDb, effect: UpgradeEffect) -> u32 {
        content
            .upgrades()
            .iter()
            .filter(|u| u.effect == effect)
            .map(|u| self.level(&u.id))
            .sum()
    }

    pub fn balance(&self, currency_id: &str) -> ScaledNumber {
        self.currencies
            .get(currency_id)
            .copied()
            .unwrap_or(ScaledNumber::ZERO)
    }

    pub fn current_target<'a>(&self, content: &'a ContentDb) -> Option<&'a Target> {
        content.target(self.target_index)
    }
}

// ── Log ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub id: u64,
    pub text: String,
    pub is_important: bool,
}

/// Player-facing message log. Ids come from the log's own counter.
#[derive(Clone, Debug)]
pub struct GameLog {
    next_id: u64,
    entries: Vec<LogEntry>,
}

impl GameLog {
    pub fn new() -> Self {
        let mut log = Self {
            next_id: 1,
            entries: Vec::new(),
        };
        log.push(INITIAL_LOG_TEXT, false);
        log
    }

    /// Append a message and return its id.
    pub fn push(&mut self, text: &str, is_important: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(LogEntry {
            id,
            text: text.to_string(),
            is_important,
        });
        if self.entries.len() > LOG_CAPACITY {
            self.entries.remove(0);
        }
        id
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
}

impl Default for GameLog {
    fn default() -> Self {
        Self::new()
    }
}
