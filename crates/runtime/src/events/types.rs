//! Event payloads published by the combat core.

use serde::{Deserialize, Serialize};

use duel_core::{MateriaKind, RoundOutcome, Side};

/// Event wrapper carrying the typed payload for one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Dice(DiceEvent),
    Combat(CombatEvent),
    Progression(ProgressionEvent),
}

/// What pool a damage application hit and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageTag {
    /// The main strike of a won round.
    Strike,
    /// Thorns reflection onto the round winner's victim.
    Thorns,
    /// Self-damage from the enemy's counter trait.
    CounterSelf,
    /// Poison status tick at the start of a round.
    Poison,
    /// The player's riposte proc after surviving a hit.
    Riposte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiceEvent {
    /// A die reached its stop deadline and locked its face.
    RollFinished { side: Side, face: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Both dice settled and the round outcome was stored; Attack/Pass are
    /// now legal.
    OutcomeDecided { outcome: RoundOutcome },
    /// HP changed on one side.
    DamageApplied {
        side: Side,
        amount: u32,
        hp_after: i64,
        tag: DamageTag,
    },
    /// The player's evade proc skipped the enemy strike entirely.
    Evaded { side: Side },
    CombatantDied { side: Side },
    CombatantRespawned { side: Side },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionEvent {
    /// A fresh enemy took the knight slot.
    EnemySpawned { id: String, name: String },
    LevelUp { side: Side, level: u32 },
    MateriaObtained { kind: MateriaKind },
    /// A spirit heart was consumed to continue.
    HeartConsumed { remaining: u32 },
    /// Death with no hearts left: stats and materia were wiped.
    HardReset,
}
