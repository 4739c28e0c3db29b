//! Materia: equippable passive combat modifiers.
//!
//! The player owns an ordered inventory of dropped materia and a fixed set
//! of equip flags over the closed [`MateriaKind`] vocabulary. An enemy holds
//! at most one passive trait, assigned once at spawn and fixed for its
//! lifetime. All proc checks are independent Bernoulli trials; nothing is
//! memoized between calls.

use strum::{Display, EnumIter};

use crate::outcome::Side;
use crate::rng::{RngOracle, RollKind};
use crate::stance::Stance;
use crate::stats::CombatStats;

/// Crit probability in percent, by side, when the corresponding materia or
/// trait is present. The enemy value is reserved for a future enemy crit
/// trait; no current template grants one.
const CRIT_PERCENT_PLAYER: u32 = 15;
const CRIT_PERCENT_ENEMY: u32 = 10;

/// Counter-attack proc probability in percent (player counter materia).
const COUNTER_PERCENT: u32 = 25;

/// DEF multiplier granted by equipped barrier materia.
pub const BARRIER_DEF_MUL: f32 = 1.5;

/// AGI multiplier granted by equipped speed materia.
pub const SPEED_AGI_MUL: f32 = 1.25;

/// HP restored at the end of each round while regen materia is equipped.
pub const REGEN_HP_PER_ROUND: u32 = 1;

/// Damage fraction reflected onto the attacker's victim by enemy thorns.
pub const THORNS_REFLECT_FRACTION: f32 = 0.2;

/// STR multiplier for the self-damage an enemy counter trait inflicts.
pub const COUNTER_SELF_DAMAGE_MUL: f32 = 1.6;

/// The closed set of materia kinds. Also the drop pool, in drop-roll order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MateriaKind {
    Crit,
    Regen,
    Speed,
    Barrier,
    Counter,
    Thorns,
    Poison,
}

/// Fixed-probability drop pool rolled on enemy defeat.
pub const DROP_POOL: [MateriaKind; 7] = [
    MateriaKind::Crit,
    MateriaKind::Regen,
    MateriaKind::Speed,
    MateriaKind::Barrier,
    MateriaKind::Counter,
    MateriaKind::Thorns,
    MateriaKind::Poison,
];

/// Drop probability in percent on enemy defeat.
pub const DROP_PERCENT: u32 = 25;

/// The single passive trait an enemy may hold.
///
/// Mutual exclusivity is structural: spawn logic assigns at most one kind,
/// so the state is an `Option` of this enum rather than independent flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EnemyMateriaKind {
    Counter,
    Thorns,
    Poison,
}

/// The player's materia state: equip flags plus the drop-ordered inventory.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerLoadout {
    equipped: Vec<MateriaKind>,
    inventory: Vec<MateriaKind>,
}

impl PlayerLoadout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a kind is currently equipped.
    pub fn has(&self, kind: MateriaKind) -> bool {
        self.equipped.contains(&kind)
    }

    /// Currently equipped kinds.
    pub fn equipped(&self) -> &[MateriaKind] {
        &self.equipped
    }

    /// Inventory in drop order (duplicates allowed).
    pub fn inventory(&self) -> &[MateriaKind] {
        &self.inventory
    }

    /// Adds a dropped materia to the inventory.
    pub fn obtain(&mut self, kind: MateriaKind) {
        self.inventory.push(kind);
    }

    /// Equips a kind the player owns. Returns false (no-op) if the kind is
    /// not in the inventory.
    pub fn equip(&mut self, kind: MateriaKind) -> bool {
        if !self.inventory.contains(&kind) {
            return false;
        }
        if !self.equipped.contains(&kind) {
            self.equipped.push(kind);
        }
        true
    }

    /// Unequips a kind. Returns whether it was equipped.
    pub fn unequip(&mut self, kind: MateriaKind) -> bool {
        let before = self.equipped.len();
        self.equipped.retain(|k| *k != kind);
        self.equipped.len() != before
    }

    /// Wipes flags and inventory (hard death reset).
    pub fn clear(&mut self) {
        self.equipped.clear();
        self.inventory.clear();
    }
}

/// Rolls the enemy's spawn-time trait: a gate against the template's
/// materia chance (percent), then a categorical draw in thirds.
pub fn assign_enemy_materia(
    materia_chance_percent: u32,
    rng: &dyn RngOracle,
    seed: u64,
) -> Option<EnemyMateriaKind> {
    if rng.percent(RollKind::EnemyMateriaGate, seed) > materia_chance_percent {
        return None;
    }
    Some(match rng.pick(RollKind::EnemyMateriaKind, seed, 3) {
        0 => EnemyMateriaKind::Counter,
        1 => EnemyMateriaKind::Thorns,
        _ => EnemyMateriaKind::Poison,
    })
}

/// Crit check for the winning strike. `equipped` is whether the side's crit
/// materia/trait is present.
pub fn try_crit(side: Side, equipped: bool, rng: &dyn RngOracle, seed: u64) -> bool {
    if !equipped {
        return false;
    }
    let chance = match side {
        Side::Player => CRIT_PERCENT_PLAYER,
        Side::Enemy => CRIT_PERCENT_ENEMY,
    };
    rng.percent(RollKind::Crit, seed) <= chance
}

/// Evade check: probability is effective AGI x 1% (per-mille resolution so
/// stance fractions are not lost).
pub fn try_evade(effective_agi: f32, rng: &dyn RngOracle, seed: u64) -> bool {
    let threshold = (effective_agi * 10.0) as u32;
    rng.permille(RollKind::Evade, seed) <= threshold
}

/// Multihit check: probability is effective AGI x 1.5%.
pub fn try_multihit(effective_agi: f32, rng: &dyn RngOracle, seed: u64) -> bool {
    let threshold = (effective_agi * 15.0) as u32;
    rng.permille(RollKind::Multihit, seed) <= threshold
}

/// Player counter-attack check (counter materia only).
pub fn try_counter(loadout: &PlayerLoadout, rng: &dyn RngOracle, seed: u64) -> bool {
    loadout.has(MateriaKind::Counter) && rng.percent(RollKind::Counter, seed) <= COUNTER_PERCENT
}

/// Poison application is deterministic: it procs iff the attacker has the
/// poison flag equipped.
pub fn applies_poison(loadout: &PlayerLoadout) -> bool {
    loadout.has(MateriaKind::Poison)
}

/// Effective player AGI: base AGI through stance and speed materia.
pub fn effective_agi(stats: &CombatStats, stance: Stance, loadout: &PlayerLoadout) -> f32 {
    let mut agi = stats.agi as f32 * stance.stat_multipliers().agi_mul;
    if loadout.has(MateriaKind::Speed) {
        agi *= SPEED_AGI_MUL;
    }
    agi
}

/// Player strike damage: `base x STR / max(1, enemy DEF)`, through the
/// stance STR multiplier, floored with a minimum of 1.
pub fn compute_player_damage(
    base: u32,
    stats: &CombatStats,
    stance: Stance,
    enemy_def: u32,
) -> u32 {
    let raw = base as f32 * stats.str_ as f32 / enemy_def.max(1) as f32;
    let scaled = raw * stance.stat_multipliers().str_mul;
    (scaled as u32).max(1)
}

/// Enemy strike damage: `base x STR / max(1, player effective DEF)` where
/// effective DEF includes the stance multiplier and barrier materia.
pub fn compute_enemy_damage(
    base: u32,
    enemy_str: u32,
    player: &CombatStats,
    stance: Stance,
    loadout: &PlayerLoadout,
) -> u32 {
    let mut def = player.def as f32 * stance.stat_multipliers().def_mul;
    if loadout.has(MateriaKind::Barrier) {
        def *= BARRIER_DEF_MUL;
    }
    let raw = base as f32 * enemy_str as f32 / def.max(1.0);
    (raw as u32).max(1)
}
