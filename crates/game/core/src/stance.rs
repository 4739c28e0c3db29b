//! Player stances: fixed multiplier sets over stats and stamina flows.
//!
//! A stance is always active (default Balance). Damage, evade/multihit AGI,
//! barrier DEF, and every player stamina operation route through the active
//! stance's multipliers.

use strum::{Display, EnumIter};

/// Multipliers a stance applies to the player's stamina economy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaminaMultipliers {
    pub attack_cost: f32,
    pub regen: f32,
    pub on_hit: f32,
}

/// Multipliers a stance applies to the player's core stats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatMultipliers {
    pub str_mul: f32,
    pub agi_mul: f32,
    pub def_mul: f32,
}

/// The four player stances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stance {
    #[default]
    Balance,
    /// Offense: more STR and pricier attacks.
    Fang,
    /// Mobility: more AGI, cheap attacks, fast regen.
    Wind,
    /// Defense: more DEF and a bigger on-hit refund.
    Aegis,
}

impl Stance {
    pub fn stat_multipliers(self) -> StatMultipliers {
        match self {
            Stance::Balance => StatMultipliers {
                str_mul: 1.0,
                agi_mul: 1.0,
                def_mul: 1.0,
            },
            Stance::Fang => StatMultipliers {
                str_mul: 1.4,
                agi_mul: 1.0,
                def_mul: 0.9,
            },
            Stance::Wind => StatMultipliers {
                str_mul: 0.9,
                agi_mul: 1.4,
                def_mul: 1.0,
            },
            Stance::Aegis => StatMultipliers {
                str_mul: 0.9,
                agi_mul: 0.9,
                def_mul: 1.4,
            },
        }
    }

    pub fn stamina_multipliers(self) -> StaminaMultipliers {
        match self {
            Stance::Balance => StaminaMultipliers {
                attack_cost: 1.0,
                regen: 1.0,
                on_hit: 1.0,
            },
            Stance::Fang => StaminaMultipliers {
                attack_cost: 1.35,
                regen: 0.85,
                on_hit: 1.0,
            },
            Stance::Wind => StaminaMultipliers {
                attack_cost: 0.80,
                regen: 1.25,
                on_hit: 0.8,
            },
            Stance::Aegis => StaminaMultipliers {
                attack_cost: 1.0,
                regen: 1.0,
                on_hit: 1.25,
            },
        }
    }

    /// Next stance in the fixed cycle order.
    pub fn next(self) -> Self {
        match self {
            Stance::Balance => Stance::Fang,
            Stance::Fang => Stance::Wind,
            Stance::Wind => Stance::Aegis,
            Stance::Aegis => Stance::Balance,
        }
    }

    /// Previous stance in the fixed cycle order.
    pub fn prev(self) -> Self {
        match self {
            Stance::Balance => Stance::Aegis,
            Stance::Fang => Stance::Balance,
            Stance::Wind => Stance::Fang,
            Stance::Aegis => Stance::Wind,
        }
    }
}
