//! Pure combat domain for the samurai-vs-knight dice duel.
//!
//! Everything in this crate is deterministic: time arrives as millisecond
//! deltas, randomness goes through the [`RngOracle`] trait, and no module
//! performs I/O. The runtime crate owns scheduling, events, and presentation;
//! this crate owns the rules.

pub mod dice;
pub mod enemy;
pub mod materia;
pub mod outcome;
pub mod rng;
pub mod stamina;
pub mod stance;
pub mod stats;

pub use dice::{DiceError, Die, DieEvent, DiePhase};
pub use enemy::{Enemy, EnemyCatalog, EnemyTemplate};
pub use materia::{EnemyMateriaKind, MateriaKind, PlayerLoadout};
pub use outcome::{RoundOutcome, Side, base_damage, decide};
pub use rng::{PcgRng, RngOracle, RollKind, action_seed};
pub use stamina::StaminaPool;
pub use stance::Stance;
pub use stats::{CombatStats, EnemyProgress, LastAction, PlayerProgress};
