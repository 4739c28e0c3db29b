//! Stat blocks and the two XP/level tracks.
//!
//! The player track biases its level-up stat by the last combat action
//! taken; the enemy track is session-global (it survives respawns) and
//! raises a random stat of whichever enemy is alive when the level lands.

use crate::rng::{RngOracle, RollKind};

/// STR/AGI/DEF block shared by both combatants.
///
/// STR multiplies outgoing damage, AGI drives evade and multihit, DEF
/// divides incoming damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub str_: u32,
    pub agi: u32,
    pub def: u32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            str_: 1,
            agi: 1,
            def: 1,
        }
    }
}

/// The last player action, used to bias which stat a level-up raises.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LastAction {
    #[default]
    Attack,
    Pass,
    Other,
}

/// Player XP/level track.
///
/// Threshold curve: `next = floor(next * 1.20) + 10`, starting at 30.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerProgress {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next: 30,
        }
    }
}

impl PlayerProgress {
    /// Grants XP, overflowing into as many level-ups as the amount covers.
    ///
    /// Each level raises one stat chosen by `last_action`: attack raises
    /// STR, pass raises AGI, anything else raises DEF. Returns the number
    /// of levels gained.
    pub fn grant_xp(&mut self, amount: u32, last_action: LastAction, stats: &mut CombatStats) -> u32 {
        self.xp += amount;
        let mut levels = 0;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.xp_to_next = (self.xp_to_next as f32 * 1.20) as u32 + 10;
            self.level += 1;
            levels += 1;
            match last_action {
                LastAction::Attack => stats.str_ += 1,
                LastAction::Pass => stats.agi += 1,
                LastAction::Other => stats.def += 1,
            }
        }
        levels
    }
}

/// Enemy XP/level track. Persists across spawns for the whole session.
///
/// Threshold curve: `next = floor(next * 1.30)`, starting at 25.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyProgress {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
}

impl Default for EnemyProgress {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next: 25,
        }
    }
}

impl EnemyProgress {
    /// Grants XP to the enemy track, raising a categorical random stat of
    /// the current enemy per level gained: 40% STR, 30% DEF, 30% AGI.
    /// Returns the number of levels gained.
    pub fn grant_xp(
        &mut self,
        amount: u32,
        stats: &mut CombatStats,
        rng: &dyn RngOracle,
        seed: u64,
    ) -> u32 {
        self.xp += amount;
        let mut levels = 0;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.xp_to_next = (self.xp_to_next as f32 * 1.30) as u32;
            self.level += 1;
            levels += 1;
            // Mix the level in so consecutive level-ups in one grant roll
            // independently.
            let roll = rng.percent(RollKind::EnemyLevelStat, seed.wrapping_add(self.level as u64));
            if roll <= 40 {
                stats.str_ += 1;
            } else if roll <= 70 {
                stats.def += 1;
            } else {
                stats.agi += 1;
            }
        }
        levels
    }
}
