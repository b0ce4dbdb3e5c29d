//! Player intents accepted by the reducer, and the events it reports back.

use super::state::UnlockFlag;

/// Everything the UI (or its frame loop) can ask the game to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Hit the current target once.
    Click,
    /// Buy the next level of the upgrade with this id.
    BuyUpgrade(String),
    /// Apply auto damage for this many elapsed seconds.
    Tick(f64),
}

/// Something noteworthy that happened during a transition, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    TargetDestroyed { target_id: String, automatic: bool },
    /// A different target replaced the destroyed one.
    TargetAdvanced { target_id: String },
    CurrencyDiscovered { currency_id: String },
    UpgradePurchased { upgrade_id: String, level: u32 },
    AchievementUnlocked { achievement_id: String },
    SystemUnlocked { flag: UnlockFlag },
}
