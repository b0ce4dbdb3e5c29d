//! Destroyer Clicker game logic. Pure functions over content and state.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::actions::{Action, GameEvent};
use super::content::{Achievement, ContentDb, Reward, Upgrade, UpgradeEffect};
use super::state::{
    GameState, PlayerProgressStats, UnlockFlag, UnlockFlags, AUTO_SPEED_STEP, BASE_AUTO_DAMAGE,
    BASE_CLICK_DAMAGE, UPGRADE_COST_GROWTH,
};
use crate::number::ScaledNumber;

// ── Damage ──────────────────────────────────────────────────────

/// Hit points left after `damage` is mitigated by `defense`.
///
/// Only the part of `damage` above `defense` lands. The result is clamped at
/// zero; a zero mantissa is how callers recognise a destroyed target.
pub fn apply_damage(
    hp: ScaledNumber,
    damage: ScaledNumber,
    defense: ScaledNumber,
) -> ScaledNumber {
    let effective = if damage > defense {
        damage - defense
    } else {
        ScaledNumber::ZERO
    };
    if effective.is_zero() || effective < ScaledNumber::ZERO {
        return hp;
    }

    let result = hp - effective;
    if result < ScaledNumber::ZERO {
        ScaledNumber::ZERO
    } else {
        result
    }
}

/// Outcome of one auto-damage slice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickResult {
    pub new_hp: ScaledNumber,
    pub destroyed: bool,
}

/// Apply `auto_dps` for `delta_secs` seconds.
///
/// The elapsed time scales the rate's mantissa only; the scaled amount is
/// normalized when it is applied. A zero rate leaves `hp` untouched.
pub fn tick_damage(
    hp: ScaledNumber,
    auto_dps: ScaledNumber,
    defense: ScaledNumber,
    delta_secs: f64,
) -> TickResult {
    if auto_dps.is_zero() {
        return TickResult {
            new_hp: hp,
            destroyed: false,
        };
    }

    let damage = auto_dps.scale_mantissa(delta_secs).normalize();
    let new_hp = apply_damage(hp, damage, defense);

    TickResult {
        new_hp,
        destroyed: new_hp.is_zero(),
    }
}

// ── Upgrade economy ─────────────────────────────────────────────

/// Price of the next level when `level` levels are already owned:
/// `base × 1.5^level`.
pub fn upgrade_cost(base_cost: ScaledNumber, level: u32) -> ScaledNumber {
    let growth = UPGRADE_COST_GROWTH.powi(level.min(i32::MAX as u32) as i32);
    base_cost * ScaledNumber::new(growth, 0)
}

/// Per-currency price of the next level of `upgrade`.
pub fn upgrade_price(upgrade: &Upgrade, level: u32) -> BTreeMap<String, ScaledNumber> {
    upgrade
        .cost
        .iter()
        .map(|(currency, base)| (currency.clone(), upgrade_cost(*base, level)))
        .collect()
}

/// True when every currency in `price` is covered by `ledger`.
pub fn can_afford(
    ledger: &BTreeMap<String, ScaledNumber>,
    price: &BTreeMap<String, ScaledNumber>,
) -> bool {
    price.iter().all(|(currency, cost)| {
        let balance = ledger.get(currency).copied().unwrap_or(ScaledNumber::ZERO);
        balance >= *cost
    })
}

/// Click damage upgrade: +1 per level, added to the base.
pub fn apply_click_damage_upgrade(base_damage: ScaledNumber, level: u32) -> ScaledNumber {
    if level == 0 {
        return base_damage;
    }
    base_damage + ScaledNumber::from_count(level)
}

/// Auto damage scales the base multiplicatively by level; zero at level 0.
pub fn calculate_auto_damage(base: ScaledNumber, level: u32) -> ScaledNumber {
    if level == 0 {
        return ScaledNumber::ZERO;
    }
    base * ScaledNumber::from_count(level)
}

/// Rate multiplier from `auto_speed` levels: `1 + 0.25 × level`.
pub fn calculate_auto_speed(level: u32) -> f64 {
    1.0 + level as f64 * AUTO_SPEED_STEP
}

pub fn calculate_auto_dps(auto_damage: ScaledNumber, auto_speed: f64) -> ScaledNumber {
    if auto_speed <= 0.0 {
        return ScaledNumber::ZERO;
    }
    auto_damage * ScaledNumber::new(auto_speed, 0)
}

/// Damage of one click with the currently owned upgrades.
pub fn click_damage(content: &ContentDb, state: &GameState) -> ScaledNumber {
    apply_click_damage_upgrade(
        BASE_CLICK_DAMAGE,
        state.effect_level(content, UpgradeEffect::ClickDamage),
    )
}

/// Auto damage per second with the currently owned upgrades.
/// Does not look at the `auto_click` unlock.
pub fn auto_dps(content: &ContentDb, state: &GameState) -> ScaledNumber {
    let damage = calculate_auto_damage(
        BASE_AUTO_DAMAGE,
        state.effect_level(content, UpgradeEffect::AutoDamage),
    );
    let speed = calculate_auto_speed(state.effect_level(content, UpgradeEffect::AutoSpeed));
    calculate_auto_dps(damage, speed)
}

// ── Drops ───────────────────────────────────────────────────────

/// Credit a drop table to a currency ledger, currency by currency.
pub fn apply_drops(
    ledger: &BTreeMap<String, ScaledNumber>,
    drops: &BTreeMap<String, ScaledNumber>,
) -> BTreeMap<String, ScaledNumber> {
    let mut result = ledger.clone();
    for (currency, amount) in drops {
        let entry = result.entry(currency.clone()).or_insert(ScaledNumber::ZERO);
        *entry = *entry + *amount;
    }
    result
}

// ── Achievements ────────────────────────────────────────────────

/// Result of one achievement evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct AchievementCheck {
    /// Newly unlocked ids, in the achievements' declared order.
    pub unlocked_ids: Vec<String>,
    /// The previous unlocked set plus `unlocked_ids`.
    pub progress: BTreeSet<String>,
    pub unlocks: UnlockFlags,
}

pub fn apply_achievement_reward(reward: &Reward, unlocks: UnlockFlags) -> UnlockFlags {
    match reward {
        Reward::UnlockSystem(flag) => unlocks.with(*flag),
        Reward::Bonus(_) => unlocks,
    }
}

/// Unlock every achievement whose condition now holds.
///
/// Achievements already in `progress` are skipped without evaluating their
/// condition, so each id is reported at most once over the life of a save.
pub fn check_achievements(
    achievements: &[Achievement],
    stats: &PlayerProgressStats,
    progress: &BTreeSet<String>,
    unlocks: UnlockFlags,
) -> AchievementCheck {
    let mut next = progress.clone();
    let mut unlocks = unlocks;
    let mut unlocked_ids = Vec::new();

    for achievement in achievements {
        if next.contains(&achievement.id) {
            continue;
        }
        if !achievement.condition.holds(stats) {
            continue;
        }
        next.insert(achievement.id.clone());
        unlocked_ids.push(achievement.id.clone());
        unlocks = apply_achievement_reward(&achievement.reward, unlocks);
    }

    AchievementCheck {
        unlocked_ids,
        progress: next,
        unlocks,
    }
}

// ── Reducer ─────────────────────────────────────────────────────

/// The next state plus what happened on the way there.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    /// False when the action was absorbed as a no-op.
    pub changed: bool,
}

/// Apply one action. Total: unknown ids, insufficient funds, locked systems
/// and out-of-range indices all come back as an unchanged state.
pub fn reduce(content: &ContentDb, state: &GameState, action: &Action) -> Transition {
    let mut next = state.clone();
    let mut events = Vec::new();

    let changed = match action {
        Action::Click => click(content, &mut next, &mut events),
        Action::BuyUpgrade(id) => buy_upgrade(content, &mut next, id, &mut events),
        Action::Tick(delta_secs) => tick(content, &mut next, *delta_secs, &mut events),
    };

    if !changed {
        debug!(?action, "action absorbed");
        return Transition {
            state: state.clone(),
            events: Vec::new(),
            changed: false,
        };
    }

    Transition {
        state: next,
        events,
        changed: true,
    }
}

fn click(content: &ContentDb, state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    let Some(target) = state.current_target(content) else {
        return false;
    };
    let damage = click_damage(content, state);

    state.stats.clicks += 1;
    state.hp = apply_damage(state.hp, damage, target.defense);
    evaluate_achievements(content, state, events);

    if state.hp.is_zero() {
        destroy_current_target(content, state, false, events);
    }
    true
}

fn buy_upgrade(
    content: &ContentDb,
    state: &mut GameState,
    id: &str,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(upgrade) = content.upgrade(id) else {
        return false;
    };
    let level = state.level(&upgrade.id);
    if level >= upgrade.max_level {
        return false;
    }
    let price = upgrade_price(upgrade, level);
    if !can_afford(&state.currencies, &price) {
        return false;
    }

    for (currency, cost) in &price {
        let remaining = state.balance(currency) - *cost;
        let remaining = if remaining < ScaledNumber::ZERO {
            ScaledNumber::ZERO
        } else {
            remaining
        };
        state.currencies.insert(currency.clone(), remaining);
    }
    state.upgrades.insert(upgrade.id.clone(), level + 1);
    state.stats.upgrades_purchased += 1;
    events.push(GameEvent::UpgradePurchased {
        upgrade_id: upgrade.id.clone(),
        level: level + 1,
    });
    debug!(upgrade = %upgrade.id, level = level + 1, "upgrade purchased");

    evaluate_achievements(content, state, events);
    true
}

fn tick(
    content: &ContentDb,
    state: &mut GameState,
    delta_secs: f64,
    events: &mut Vec<GameEvent>,
) -> bool {
    if !state.unlocks.auto_click {
        return false;
    }
    if !delta_secs.is_finite() || delta_secs <= 0.0 {
        return false;
    }
    if state.effect_level(content, UpgradeEffect::AutoDamage) == 0 {
        return false;
    }
    let Some(target) = state.current_target(content) else {
        return false;
    };

    let result = tick_damage(state.hp, auto_dps(content, state), target.defense, delta_secs);
    if result.destroyed {
        destroy_current_target(content, state, true, events);
    } else {
        state.hp = result.new_hp;
    }
    true
}

/// Credit drops, advance (or re-arm the terminal target) and re-check
/// achievements.
fn destroy_current_target(
    content: &ContentDb,
    state: &mut GameState,
    automatic: bool,
    events: &mut Vec<GameEvent>,
) {
    let Some(target) = state.current_target(content) else {
        return;
    };

    state.stats.targets_destroyed += 1;
    events.push(GameEvent::TargetDestroyed {
        target_id: target.id.clone(),
        automatic,
    });
    info!(target = %target.id, automatic, "target destroyed");

    for currency in target.drops.keys() {
        if state.discovered.insert(currency.clone()) {
            events.push(GameEvent::CurrencyDiscovered {
                currency_id: currency.clone(),
            });
        }
    }
    state.currencies = apply_drops(&state.currencies, &target.drops);

    if state.target_index < content.last_target_index() {
        state.target_index += 1;
    }
    let next = content.target(state.target_index).unwrap_or(target);
    if next.id != target.id {
        events.push(GameEvent::TargetAdvanced {
            target_id: next.id.clone(),
        });
    }
    state.hp = next.max_hp;

    evaluate_achievements(content, state, events);
}

fn evaluate_achievements(content: &ContentDb, state: &mut GameState, events: &mut Vec<GameEvent>) {
    let check = check_achievements(
        content.achievements(),
        &state.stats,
        &state.achievements,
        state.unlocks,
    );

    for id in &check.unlocked_ids {
        info!(achievement = %id, "achievement unlocked");
        events.push(GameEvent::AchievementUnlocked {
            achievement_id: id.clone(),
        });
    }
    for flag in UnlockFlag::ALL {
        if check.unlocks.is_set(flag) && !state.unlocks.is_set(flag) {
            events.push(GameEvent::SystemUnlocked { flag });
        }
    }

    state.achievements = check.progress;
    state.unlocks = check.unlocks;
}
