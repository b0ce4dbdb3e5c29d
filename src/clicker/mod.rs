//! Destroyer Clicker: damage a ladder of targets and buy upgrades until automation takes over.
//!
//! [`Session`] is the single owner of the running game. It feeds actions
//! to [`logic::reduce`] one at a time, turns the resulting events into the
//! player-facing log and persists the state through a [`save::SaveStore`].

pub mod actions;
pub mod content;
pub mod logic;
pub mod save;
pub mod state;
pub mod view;

use tracing::debug;

use crate::time::{now_ms, FrameClock};

use actions::{Action, GameEvent};
use content::ContentDb;
use save::{MigrationStrategy, SaveError, SaveStore, AUTOSAVE_INTERVAL_SECS};
use state::{GameLog, GameState};
use view::HudView;

const LOADED_LOG_TEXT: &str = "Progress restored.";

pub struct Session<S: SaveStore> {
    content: ContentDb,
    state: GameState,
    log: GameLog,
    clock: FrameClock,
    store: S,
    /// Ticked seconds since the last save.
    unsaved_secs: f64,
}

impl<S: SaveStore> Session<S> {
    /// A fresh game. Whatever `store` holds is left alone until the first save.
    pub fn new(content: ContentDb, store: S) -> Self {
        let state = GameState::new(&content);
        Self {
            content,
            state,
            log: GameLog::new(),
            clock: FrameClock::default(),
            store,
            unsaved_secs: 0.0,
        }
    }

    /// Resume from `store`, or start fresh if there is nothing usable in it.
    pub fn load(content: ContentDb, mut store: S, migration: &dyn MigrationStrategy) -> Self {
        let restored = save::load_game(&content, &mut store, migration);
        let mut session = Self::new(content, store);
        if let Some(state) = restored {
            session.state = state;
            session.log.push(LOADED_LOG_TEXT, false);
        }
        session
    }

    /// Apply one action to completion and return the new state.
    ///
    /// Click and BuyUpgrade save immediately when they change anything;
    /// ticks save once `AUTOSAVE_INTERVAL_SECS` of ticked time has piled up.
    pub fn dispatch(&mut self, action: Action) -> &GameState {
        let transition = logic::reduce(&self.content, &self.state, &action);
        if !transition.changed {
            return &self.state;
        }

        for event in &transition.events {
            self.record(event);
        }
        self.state = transition.state;

        match action {
            Action::Click | Action::BuyUpgrade(_) => self.autosave(),
            Action::Tick(delta_secs) => {
                self.unsaved_secs += delta_secs;
                if self.unsaved_secs >= AUTOSAVE_INTERVAL_SECS {
                    self.autosave();
                }
            }
        }
        &self.state
    }

    /// Advance the frame clock to `now_ms` and tick by the elapsed time.
    pub fn frame(&mut self, now_ms: f64) -> &GameState {
        let delta_secs = self.clock.update(now_ms);
        if delta_secs > 0.0 {
            self.dispatch(Action::Tick(delta_secs));
        }
        &self.state
    }

    /// Write the current state to the store right away.
    pub fn save_now(&mut self) -> Result<(), SaveError> {
        self.unsaved_secs = 0.0;
        save::save_game(&mut self.store, &self.state, now_ms())
    }

    /// Wipe the save and start over from the first target.
    pub fn reset(&mut self) -> Result<(), SaveError> {
        self.state = GameState::new(&self.content);
        self.log = GameLog::new();
        self.clock.reset();
        self.unsaved_secs = 0.0;
        self.store.clear()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn content(&self) -> &ContentDb {
        &self.content
    }

    pub fn log(&self) -> &GameLog {
        &self.log
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> HudView {
        view::build_view(&self.content, &self.state)
    }

    fn autosave(&mut self) {
        // save_game already reported the failure.
        let _ = self.save_now();
    }

    fn record(&mut self, event: &GameEvent) {
        debug!(?event, "game event");
        match event {
            GameEvent::TargetDestroyed {
                automatic: true, ..
            } => {
                self.log.push("Destroyed automatically.", false);
            }
            GameEvent::TargetDestroyed { target_id, .. } => {
                let name = self
                    .content
                    .target_by_id(target_id)
                    .map_or(target_id.as_str(), |t| t.name.as_str());
                self.log.push(&format!("You destroyed {}.", name), false);
            }
            GameEvent::TargetAdvanced { .. } => {
                self.log.push("A new target appears.", false);
            }
            GameEvent::CurrencyDiscovered { currency_id } => {
                let name = self
                    .content
                    .currency(currency_id)
                    .map_or(currency_id.as_str(), |c| c.name.as_str());
                self.log.push(&format!("New currency found: {}", name), false);
            }
            GameEvent::UpgradePurchased { upgrade_id, level } => {
                let name = self
                    .content
                    .upgrade(upgrade_id)
                    .map_or(upgrade_id.as_str(), |u| u.name.as_str());
                self.log
                    .push(&format!("Upgrade purchased: {} (Lv {})", name, level), false);
            }
            GameEvent::AchievementUnlocked { achievement_id } => {
                let name = self
                    .content
                    .achievement(achievement_id)
                    .map_or(achievement_id.as_str(), |a| a.name.as_str());
                self.log
                    .push(&format!("Achievement unlocked: {}", name), true);
            }
            GameEvent::SystemUnlocked { flag } => {
                self.log.push(&format!("{} unlocked.", flag.label()), true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clicker::content::ContentTables;
    use crate::clicker::save::{DiscardOnVersionMismatch, MemoryStore, SaveData, SAVE_VERSION};
    use crate::number::ScaledNumber;

    fn content() -> ContentDb {
        ContentDb::new(ContentTables::builtin()).unwrap()
    }

    fn session() -> Session<MemoryStore> {
        Session::new(content(), MemoryStore::new())
    }

    fn log_texts(session: &Session<MemoryStore>) -> Vec<String> {
        session.log().entries().iter().map(|e| e.text.clone()).collect()
    }

    /// Unlock automation with two levels of auto damage and move past the
    /// one-hit bubble.
    fn automated_session() -> Session<MemoryStore> {
        let mut s = session();
        s.dispatch(Action::Click);
        s.state.currencies.insert("bronze".into(), ScaledNumber::new(1.0, 6));
        for _ in 0..8 {
            s.dispatch(Action::BuyUpgrade("click_damage".into()));
        }
        s.dispatch(Action::BuyUpgrade("auto_damage".into()));
        s.dispatch(Action::BuyUpgrade("auto_damage".into()));
        assert!(s.state().unlocks.auto_click);
        s
    }

    #[test]
    fn first_click_logs_destruction_and_saves() {
        let mut s = session();
        s.dispatch(Action::Click);

        let texts = log_texts(&s);
        assert_eq!(texts[0], "You exist. Unfortunately.");
        assert!(texts.contains(&"You destroyed Bolha de Ar.".to_string()));
        assert!(texts.contains(&"A new target appears.".to_string()));
        assert!(texts.contains(&"Achievement unlocked: Violence Begins".to_string()));
        assert!(texts.contains(&"Achievement unlocked: It Is Gone".to_string()));
        assert!(s.store().blob().is_some());
    }

    #[test]
    fn achievement_entries_are_important() {
        let mut s = session();
        s.dispatch(Action::Click);
        let entry = s
            .log()
            .entries()
            .iter()
            .find(|e| e.text.starts_with("Achievement unlocked"))
            .unwrap();
        assert!(entry.is_important);
    }

    #[test]
    fn absorbed_action_neither_logs_nor_saves() {
        let mut s = session();
        s.dispatch(Action::BuyUpgrade("click_damage".into()));
        assert_eq!(s.log().entries().len(), 1);
        assert!(s.store().blob().is_none());
    }

    #[test]
    fn upgrade_purchase_is_logged_with_level() {
        let mut s = session();
        s.state.currencies.insert("bronze".into(), ScaledNumber::new(100.0, 0));
        s.dispatch(Action::BuyUpgrade("click_damage".into()));
        s.dispatch(Action::BuyUpgrade("click_damage".into()));
        let texts = log_texts(&s);
        assert!(texts.contains(&"Upgrade purchased: Stronger Finger (Lv 2)".to_string()));
    }

    #[test]
    fn tenth_upgrade_unlocks_auto_click() {
        let s = automated_session();
        let texts = log_texts(&s);
        assert!(texts.contains(&"Achievement unlocked: Improvement Spiral".to_string()));
        assert!(texts.contains(&"Auto Click unlocked.".to_string()));
    }

    #[test]
    fn frame_clock_drives_ticks() {
        let mut s = automated_session();
        let hp_before = s.state().hp;
        s.frame(0.0);
        assert_eq!(s.state().hp, hp_before);
        s.frame(500.0);
        assert!(s.state().hp < hp_before);
    }

    #[test]
    fn ticks_autosave_after_interval() {
        let mut s = automated_session();
        s.store.clear().unwrap();

        for _ in 0..29 {
            s.dispatch(Action::Tick(1.0));
        }
        assert!(s.store().blob().is_none());
        s.dispatch(Action::Tick(1.0));
        assert!(s.store().blob().is_some());
    }

    #[test]
    fn automatic_kill_is_logged() {
        let mut s = automated_session();
        s.dispatch(Action::Tick(1_000.0));
        assert!(log_texts(&s).contains(&"Destroyed automatically.".to_string()));
    }

    #[test]
    fn load_resumes_saved_progress() {
        let mut s = session();
        s.dispatch(Action::Click);
        let saved = s.state().clone();
        let store = s.store().clone();

        let resumed = Session::load(content(), store, &DiscardOnVersionMismatch);
        assert_eq!(resumed.state(), &saved);
        assert_eq!(
            resumed.log().entries().last().unwrap().text,
            LOADED_LOG_TEXT
        );
    }

    #[test]
    fn load_with_mismatched_version_starts_fresh() {
        let data = SaveData {
            version: SAVE_VERSION + 1,
            target_index: 3,
            ..Default::default()
        };
        let store = MemoryStore::with_blob(serde_json::to_string(&data).unwrap());
        let s = Session::load(content(), store, &DiscardOnVersionMismatch);
        assert_eq!(s.state(), &GameState::new(s.content()));
        assert_eq!(s.log().entries().len(), 1);
        assert!(s.store().blob().is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = session();
        s.dispatch(Action::Click);
        s.reset().unwrap();
        assert_eq!(s.state(), &GameState::new(s.content()));
        assert_eq!(s.log().entries().len(), 1);
        assert!(s.store().blob().is_none());
    }

    #[test]
    fn view_reflects_session_state() {
        let mut s = session();
        s.dispatch(Action::Click);
        let view = s.view();
        assert_eq!(view.target_name, "Folha de Papel");
        assert_eq!(view.hp, "25.00");
        assert_eq!(view.upgrades.len(), 3);
    }
}
