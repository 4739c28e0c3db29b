//! Turn orchestration for the dice duel.
//!
//! This crate wires the pure combat domain (`duel-core`) and loaded content
//! (`duel-content`) into a running engine: a worker task drives the fixed
//! tick and processes intents, round procedures run as cooperative tasks
//! under a single turn lock, and presentation layers consume the topic-based
//! event bus plus the shared [`stage::Stage`] view model.
//!
//! Modules are organized by responsibility:
//! - [`engine`] hosts the worker and round procedures
//! - [`events`] provides the topic-based event bus
//! - [`session`] owns the combat state and the turn lock
//! - [`stage`] is the presentation state the core writes but does not own
//! - [`collab`] defines the optional collaborator seams (banter, effects,
//!   audio)

pub mod collab;
pub mod error;
pub mod events;
pub mod motion;
pub mod session;
pub mod stage;

mod engine;
mod handle;

pub use collab::{AudioSink, BanterSink, Collaborators, EffectCue, EffectSpawner, ScriptDialogue};
pub use error::{Result, RuntimeError};
pub use events::{CombatEvent, DamageTag, DiceEvent, Event, EventBus, ProgressionEvent, Topic};
pub use handle::{DuelHandle, DuelRuntime, RuntimeConfig};
pub use session::{CombatSession, PlayerState, SessionSnapshot, SharedSession};
pub use stage::{ActionGate, ActorView, Pose, Stage};
