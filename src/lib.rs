//! Destroyer Clicker, the engine of a browser idle game about breaking things.
//!
//! The crate holds the game core only: scaled-number arithmetic, damage and
//! auto-damage resolution, the upgrade economy, achievements, a pure reducer
//! and persistence. Rendering and input belong to the host page.

pub mod clicker;
pub mod number;
pub mod time;

pub use clicker::actions::{Action, GameEvent};
pub use clicker::content::{ContentDb, ContentError, ContentTables};
pub use clicker::save::{DiscardOnVersionMismatch, MemoryStore, SaveError, SaveStore};
pub use clicker::state::GameState;
pub use clicker::Session;
pub use number::ScaledNumber;
