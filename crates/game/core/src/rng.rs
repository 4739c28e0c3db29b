//! RNG oracle for deterministic random number generation.
//!
//! Every random decision in a duel is named by a [`RollKind`] and resolved
//! through the [`RngOracle`] trait. Given the same session seed and nonce,
//! a duel replays identically; tests substitute a scripted oracle to force
//! or suppress individual procs.

use crate::outcome::Side;

/// Identifies one random decision point in the duel.
///
/// The kind is mixed into the seed so that independent rolls made during the
/// same action (crit check, multihit check, drop roll, ...) draw from
/// unrelated streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RollKind {
    /// Logical face for one side's die (1-6).
    Face(Side),
    /// Randomized extra time before a die stops, in ms (0-599).
    StopJitter(Side),
    /// Cosmetic face flicker while a die is still rolling.
    Flicker(Side),
    /// Critical hit check on the winning strike.
    Crit,
    /// Follow-up strike check (multihit).
    Multihit,
    /// Player evade check when the enemy wins the round.
    Evade,
    /// Player counter-attack proc check.
    Counter,
    /// Gate roll against a template's materia chance at enemy spawn.
    EnemyMateriaGate,
    /// Categorical pick among counter/thorns/poison at enemy spawn.
    EnemyMateriaKind,
    /// 25% materia drop check on enemy defeat.
    MateriaDrop,
    /// Uniform pick from the materia drop pool.
    MateriaPick,
    /// Which scripted evasive pattern a pass round plays (0-3).
    PassVariant,
    /// Which stat an enemy level-up raises.
    EnemyLevelStat,
    /// Uniform pick among eligible enemy templates.
    TemplatePick,
    /// Rare banter line check during a pass round.
    RareBanter,
}

impl RollKind {
    /// Stable mixing code for seed derivation.
    fn code(self) -> u32 {
        let side_bit = |side: Side| match side {
            Side::Player => 0,
            Side::Enemy => 1,
        };
        match self {
            RollKind::Face(s) => 0x10 | side_bit(s),
            RollKind::StopJitter(s) => 0x20 | side_bit(s),
            RollKind::Flicker(s) => 0x30 | side_bit(s),
            RollKind::Crit => 0x40,
            RollKind::Multihit => 0x41,
            RollKind::Evade => 0x42,
            RollKind::Counter => 0x43,
            RollKind::EnemyMateriaGate => 0x50,
            RollKind::EnemyMateriaKind => 0x51,
            RollKind::MateriaDrop => 0x52,
            RollKind::MateriaPick => 0x53,
            RollKind::PassVariant => 0x60,
            RollKind::EnemyLevelStat => 0x61,
            RollKind::TemplatePick => 0x62,
            RollKind::RareBanter => 0x63,
        }
    }
}

/// Source of randomness for duel mechanics.
///
/// Implementations must be deterministic: the same `(kind, seed)` pair must
/// always produce the same value.
pub trait RngOracle: Send + Sync {
    /// Raw 32-bit draw for the given decision point.
    fn next_u32(&self, kind: RollKind, seed: u64) -> u32;

    /// Die face, 1-6 inclusive.
    fn face(&self, kind: RollKind, seed: u64) -> u8 {
        (self.next_u32(kind, seed) % 6 + 1) as u8
    }

    /// Percentage roll, 1-100 inclusive.
    fn percent(&self, kind: RollKind, seed: u64) -> u32 {
        self.next_u32(kind, seed) % 100 + 1
    }

    /// Per-mille roll, 1-1000 inclusive. Used for AGI-scaled checks whose
    /// probability has half-percent resolution.
    fn permille(&self, kind: RollKind, seed: u64) -> u32 {
        self.next_u32(kind, seed) % 1000 + 1
    }

    /// Uniform value in `[0, n)`. Returns 0 for `n == 0`.
    fn pick(&self, kind: RollKind, seed: u64, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.next_u32(kind, seed) % n
    }
}

/// PCG-XSH-RR random number generator.
///
/// Small state, fast, and statistically solid; the oracle is stateless and
/// derives every draw from the mixed seed, so replaying a session from its
/// seed reproduces the full roll history.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, kind: RollKind, seed: u64) -> u32 {
        Self::output(Self::step(seed ^ (kind.code() as u64).wrapping_mul(0x9e3779b97f4a7c15)))
    }
}

/// Derives the per-action seed from the session seed and action nonce.
///
/// The nonce increments once per intent/procedure, so two rolls of the same
/// [`RollKind`] in different rounds never collide.
pub fn action_seed(session_seed: u64, nonce: u64) -> u64 {
    let mut hash = session_seed;
    hash ^= nonce.wrapping_mul(0x517cc1b727220a95);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_value() {
        let rng = PcgRng;
        let seed = action_seed(42, 7);
        assert_eq!(
            rng.next_u32(RollKind::Crit, seed),
            rng.next_u32(RollKind::Crit, seed)
        );
    }

    #[test]
    fn kinds_draw_from_independent_streams() {
        let rng = PcgRng;
        let seed = action_seed(42, 7);
        // Not a strict guarantee, but these particular streams must differ
        // for the per-action rolls to be independent.
        assert_ne!(
            rng.next_u32(RollKind::Crit, seed),
            rng.next_u32(RollKind::Multihit, seed)
        );
    }

    #[test]
    fn ranged_helpers_stay_in_bounds() {
        let rng = PcgRng;
        for nonce in 0..200 {
            let seed = action_seed(99, nonce);
            let f = rng.face(RollKind::Face(Side::Player), seed);
            assert!((1..=6).contains(&f));
            let p = rng.percent(RollKind::Evade, seed);
            assert!((1..=100).contains(&p));
            let m = rng.permille(RollKind::Multihit, seed);
            assert!((1..=1000).contains(&m));
            assert!(rng.pick(RollKind::PassVariant, seed, 4) < 4);
        }
    }

    #[test]
    fn pick_zero_is_total() {
        assert_eq!(PcgRng.pick(RollKind::MateriaPick, 1, 0), 0);
    }
}
