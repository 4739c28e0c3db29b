//! Per-combatant stamina pool.
//!
//! Gates whether an attack may be attempted and implements the comeback
//! mechanic: the side that takes a hit regains stamina. All operations are
//! total over the clamped `[0, max]` domain; there are no error paths.

use crate::stance::StaminaMultipliers;

/// Milliseconds per regen tick; regen rate is expressed per tick of this
/// length and scaled by the actual frame delta.
pub const TICK_MS: f32 = 16.0;

/// Resource pool with cost/gain/regen semantics.
///
/// Current value is an `f32` because passive regen accrues in sub-unit
/// amounts every frame.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaminaPool {
    max: f32,
    current: f32,
    regen_rate: f32,
    attack_cost: f32,
    on_hit_gain: f32,
}

impl StaminaPool {
    pub fn new(max: f32, regen_per_tick: f32, attack_cost: f32, on_hit_gain: f32) -> Self {
        Self {
            max,
            current: max,
            regen_rate: regen_per_tick,
            attack_cost,
            on_hit_gain,
        }
    }

    /// Default player pool: fast regen, meaningful on-hit refund.
    pub fn player() -> Self {
        Self::new(100.0, 0.015, 15.0, 28.0)
    }

    /// Default enemy pool: slower regen, no on-hit refund.
    pub fn enemy() -> Self {
        Self::new(100.0, 0.012, 15.0, 0.0)
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Whether the pool is fully depleted (exhaustion rule trigger).
    pub fn is_exhausted(&self) -> bool {
        self.current <= 0.0
    }

    /// Whether an attack is affordable under the given stance.
    pub fn can_attack(&self, mul: StaminaMultipliers) -> bool {
        self.current >= self.scaled_cost(mul)
    }

    /// Deducts the attack cost if affordable. No effect on failure.
    pub fn spend_for_attack(&mut self, mul: StaminaMultipliers) -> bool {
        let cost = self.scaled_cost(mul);
        if self.current < cost {
            return false;
        }
        self.current = (self.current - cost).max(0.0);
        true
    }

    /// On-hit stamina refund, clamped to max.
    pub fn on_hit(&mut self, mul: StaminaMultipliers) {
        self.gain(self.on_hit_gain * mul.on_hit);
    }

    /// Passive regen for a frame of `dt_ms` milliseconds.
    pub fn regen(&mut self, dt_ms: f32, mul: StaminaMultipliers) {
        let ticks = dt_ms / TICK_MS;
        self.gain(self.regen_rate * mul.regen * ticks);
    }

    pub fn gain(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
    }

    /// Refill to max (respawn).
    pub fn reset(&mut self) {
        self.current = self.max;
    }

    fn scaled_cost(&self, mul: StaminaMultipliers) -> f32 {
        (self.attack_cost * mul.attack_cost).ceil()
    }
}
