//! Destroyer Clicker セーブ/ロード機能。
//!
//! ## バージョニング方針
//!
//! - `SAVE_VERSION`: 現在のセーブ形式バージョン。
//! - バージョンが一致しないデータの扱いは [`MigrationStrategy`] に委ねる。
//!   既定の [`DiscardOnVersionMismatch`] はフィールド単位の移行を行わず、
//!   破棄して新規ゲームを開始する。
//! - 後から追加したフィールド (`stats`, `discovered`, `target_index`) は
//!   `#[serde(default)]` で補完するので、バージョンを上げずに読み込める。
//!
//! 保存先は [`SaveStore`] で抽象化している。ブラウザでは
//! `LocalStorageStore`、テストやネイティブでは [`MemoryStore`] を使う。

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::content::ContentDb;
use super::logic::check_achievements;
use super::state::{GameState, PlayerProgressStats, UnlockFlags};
use crate::number::ScaledNumber;

/// セーブデータのフォーマットバージョン。
pub const SAVE_VERSION: u32 = 1;

/// オートセーブの間隔 (Tick で経過した秒数)。
pub const AUTOSAVE_INTERVAL_SECS: f64 = 30.0;

/// localStorage のキー。
#[cfg(target_arch = "wasm32")]
pub const STORAGE_KEY: &str = "destroyer_clicker_save";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("storage is not available")]
    Unavailable,
    #[error("storage operation failed: {0}")]
    Storage(String),
    #[error("failed to serialize save: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to parse save at {path}: {message}")]
    Parse { path: String, message: String },
}

// ── Store ───────────────────────────────────────────────────────

/// 不透明な文字列を 1 つだけ保持するキー/バリューストア。
pub trait SaveStore {
    fn load(&self) -> Result<Option<String>, SaveError>;
    fn save(&mut self, blob: &str) -> Result<(), SaveError>;
    fn clear(&mut self) -> Result<(), SaveError>;
}

/// プロセス内メモリに保持するストア。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のセーブ文字列を持った状態で作る。
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
        }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, SaveError> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &str) -> Result<(), SaveError> {
        self.blob = Some(blob.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SaveError> {
        self.blob = None;
        Ok(())
    }
}

/// ブラウザの localStorage に保存するストア。WASM 環境でのみ動作。
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, SaveError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        match storage {
            Some(s) => Ok(s),
            None => {
                web_sys::console::warn_1(&"Destroyer Clicker: localStorage が使えません".into());
                Err(SaveError::Unavailable)
            }
        }
    }

    fn storage_error(action: &str, message: String) -> SaveError {
        web_sys::console::warn_1(
            &format!("Destroyer Clicker: localStorage の{action}に失敗: {message}").into(),
        );
        SaveError::Storage(message)
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorageStore {
    fn load(&self) -> Result<Option<String>, SaveError> {
        Self::storage()?
            .get_item(STORAGE_KEY)
            .map_err(|e| Self::storage_error("読み込み", format!("{e:?}")))
    }

    fn save(&mut self, blob: &str) -> Result<(), SaveError> {
        Self::storage()?
            .set_item(STORAGE_KEY, blob)
            .map_err(|e| Self::storage_error("保存", format!("{e:?}")))
    }

    fn clear(&mut self) -> Result<(), SaveError> {
        Self::storage()?
            .remove_item(STORAGE_KEY)
            .map_err(|e| Self::storage_error("削除", format!("{e:?}")))
    }
}

// ── Format ──────────────────────────────────────────────────────

/// シリアライズ用のセーブデータ構造体。
/// 現在の HP は保存しない (復元時にターゲットの最大値に戻す)。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    /// 欠けている場合は 0 になり、バージョン不一致として扱われる。
    pub version: u32,
    pub currencies: BTreeMap<String, ScaledNumber>,
    pub upgrades: BTreeMap<String, u32>,
    /// 解除済み実績の id。
    pub achievements: Vec<String>,
    pub unlocks: UnlockFlags,
    /// 保存時刻 (Unix epoch ミリ秒)。
    pub last_played: i64,
    pub stats: PlayerProgressStats,
    pub discovered: Vec<String>,
    pub target_index: usize,
}

/// 読み込んだセーブを現在の形式に揃える方針。
pub trait MigrationStrategy {
    /// 現在の `SAVE_VERSION` で使えるデータを返す。None なら破棄する。
    fn migrate(&self, data: SaveData) -> Option<SaveData>;
}

/// バージョンが一致しなければ破棄する。
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardOnVersionMismatch;

impl MigrationStrategy for DiscardOnVersionMismatch {
    fn migrate(&self, data: SaveData) -> Option<SaveData> {
        (data.version == SAVE_VERSION).then_some(data)
    }
}

/// GameState からセーブ用データを抽出する。
pub fn extract_save(state: &GameState, now_ms: i64) -> SaveData {
    SaveData {
        version: SAVE_VERSION,
        currencies: state.currencies.clone(),
        upgrades: state.upgrades.clone(),
        achievements: state.achievements.iter().cloned().collect(),
        unlocks: state.unlocks,
        last_played: now_ms,
        stats: state.stats,
        discovered: state.discovered.iter().cloned().collect(),
        target_index: state.target_index,
    }
}

/// セーブデータから GameState を組み立てる。
///
/// コンテンツに存在しない id は捨て、レベルは上限に、ターゲット番号は
/// 最後のターゲットに丸める。残高は正規化してから負の値を 0 にする。アンロックは既定値と合成するので戻らない。
/// 最後に実績を再評価して、統計と解除済み実績の整合を取る。
pub fn apply_save(content: &ContentDb, save: &SaveData) -> GameState {
    let mut state = GameState::new(content);

    state.target_index = save.target_index.min(content.last_target_index());
    if let Some(target) = state.current_target(content) {
        state.hp = target.max_hp;
    }

    for (id, amount) in &save.currencies {
        if content.currency(id).is_none() {
            debug!(currency = %id, "dropping unknown currency from save");
            continue;
        }
        let amount = amount.normalize();
        let amount = if amount < ScaledNumber::ZERO {
            ScaledNumber::ZERO
        } else {
            amount
        };
        state.currencies.insert(id.clone(), amount);
        state.discovered.insert(id.clone());
    }
    for id in &save.discovered {
        if content.currency(id).is_some() {
            state.discovered.insert(id.clone());
        }
    }

    for (id, level) in &save.upgrades {
        match content.upgrade(id) {
            Some(upgrade) if *level > 0 => {
                state.upgrades.insert(id.clone(), (*level).min(upgrade.max_level));
            }
            Some(_) => {}
            None => debug!(upgrade = %id, "dropping unknown upgrade from save"),
        }
    }

    state.stats = save.stats;
    state.unlocks = state.unlocks.merge(save.unlocks);
    let progress: BTreeSet<String> = save
        .achievements
        .iter()
        .filter(|id| content.achievement(id).is_some())
        .cloned()
        .collect();

    let check = check_achievements(content.achievements(), &state.stats, &progress, state.unlocks);
    state.achievements = check.progress;
    state.unlocks = check.unlocks;
    state
}

/// JSON をパースする。エラーには壊れている場所のパスが付く。
pub fn parse_save(json: &str) -> Result<SaveData, SaveError> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| SaveError::Parse {
        path: e.path().to_string(),
        message: e.into_inner().to_string(),
    })
}

pub fn encode_save(data: &SaveData) -> Result<String, SaveError> {
    Ok(serde_json::to_string(data)?)
}

/// ゲーム状態をストアに保存する。
/// 失敗時は warn を出してエラーを返す (呼び出し側は無視してよい)。
pub fn save_game<S: SaveStore + ?Sized>(
    store: &mut S,
    state: &GameState,
    now_ms: i64,
) -> Result<(), SaveError> {
    let result = encode_save(&extract_save(state, now_ms)).and_then(|json| store.save(&json));
    if let Err(e) = &result {
        warn!(error = %e, "failed to write save");
    }
    result
}

/// ストアからゲーム状態を復元する。
/// 読めない・壊れている・バージョン不一致の場合は None を返す (新規ゲームになる)。
/// 壊れたデータと破棄したデータはストアから削除する。
pub fn load_game<S: SaveStore + ?Sized>(
    content: &ContentDb,
    store: &mut S,
    migration: &dyn MigrationStrategy,
) -> Option<GameState> {
    let json = match store.load() {
        Ok(Some(json)) => json,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "save storage unavailable, starting fresh");
            return None;
        }
    };

    let data = match parse_save(&json) {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, "discarding corrupt save");
            discard(store);
            return None;
        }
    };

    let saved_version = data.version;
    let Some(data) = migration.migrate(data) else {
        warn!(
            saved = saved_version,
            current = SAVE_VERSION,
            "save version mismatch, starting fresh"
        );
        discard(store);
        return None;
    };

    debug!(last_played = data.last_played, "save restored");
    Some(apply_save(content, &data))
}

fn discard<S: SaveStore + ?Sized>(store: &mut S) {
    if let Err(e) = store.clear() {
        warn!(error = %e, "failed to remove discarded save");
    }
}
