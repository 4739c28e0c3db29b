//! Topic-based event bus for duel lifecycle signals.
//!
//! Rendering, audio, and UI layers subscribe to the topics they care about;
//! the combat core publishes fire-and-forget with no acknowledgment channel.

mod bus;
mod types;

pub use bus::{EventBus, Topic};
pub use types::{CombatEvent, DamageTag, DiceEvent, Event, ProgressionEvent};
