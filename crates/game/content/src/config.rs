//! Engine balance and timing configuration.
//!
//! TOML file with full serde defaults: any missing section or field takes
//! the built-in value, so a partial override file is enough to tune one
//! constant.

use std::path::Path;

use serde::Deserialize;

use crate::{LoadResult, read_file};

/// Fixed waits and animation pacing, in milliseconds unless noted.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Logical frame length driving dice physics and stamina regen.
    pub tick_ms: u64,
    /// Dice-reveal sequence: settle, bounce, and tail waits.
    pub reveal_settle_ms: u64,
    pub reveal_bounce_ms: u64,
    pub reveal_tail_ms: u64,
    /// Impact freeze on a landed strike.
    pub hit_stop_ms: u64,
    /// Hurt pose after a strike.
    pub hurt_ms: u64,
    /// Block pose held before the player death fade.
    pub block_ms: u64,
    /// Defeat pose before the enemy death fade.
    pub death_pose_ms: u64,
    /// Fade-out duration for either death sequence.
    pub death_fade_ms: u64,
    /// Screen flash pulses (death respawn / pass opener).
    pub respawn_flash_ms: u64,
    pub pass_flash_ms: u64,
    /// Movement speeds in world units per tick.
    pub approach_speed: f32,
    pub retreat_speed: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            reveal_settle_ms: 220,
            reveal_bounce_ms: 180,
            reveal_tail_ms: 140,
            hit_stop_ms: 140,
            hurt_ms: 150,
            block_ms: 140,
            death_pose_ms: 300,
            death_fade_ms: 320,
            respawn_flash_ms: 120,
            pass_flash_ms: 80,
            approach_speed: 18.0,
            retreat_speed: 15.0,
        }
    }
}

/// Stamina pool parameters per side.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    pub player_max: f32,
    pub player_regen_per_tick: f32,
    pub player_attack_cost: f32,
    pub player_on_hit_gain: f32,
    pub enemy_max: f32,
    pub enemy_regen_per_tick: f32,
    pub enemy_attack_cost: f32,
    pub enemy_on_hit_gain: f32,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            player_max: 100.0,
            player_regen_per_tick: 0.015,
            player_attack_cost: 15.0,
            player_on_hit_gain: 28.0,
            enemy_max: 100.0,
            enemy_regen_per_tick: 0.012,
            enemy_attack_cost: 15.0,
            enemy_on_hit_gain: 0.0,
        }
    }
}

/// Progression and drop rules.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub materia_drop_percent: u32,
    /// Player kill XP is `base + enemy_face * per_face`.
    pub player_kill_xp_base: u32,
    pub player_kill_xp_per_face: u32,
    /// Enemy-track XP granted per kill branch (applied twice per defeat).
    pub enemy_kill_xp: u32,
    pub starting_hearts: u32,
    pub max_hearts: u32,
    pub player_max_hp: u32,
    /// Chance of the rare pass-round banter line, in percent.
    pub rare_banter_percent: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            materia_drop_percent: 25,
            player_kill_xp_base: 12,
            player_kill_xp_per_face: 2,
            enemy_kill_xp: 6,
            starting_hearts: 1,
            max_hearts: 3,
            player_max_hp: 5,
            rare_banter_percent: 2,
        }
    }
}

/// World coordinates the presentation layer shares with the core.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub samurai_home_x: f32,
    pub knight_home_x: f32,
    pub home_y: f32,
    /// Distance kept from the target when closing in for a strike.
    pub approach_offset: f32,
    /// Symmetric pull-back distance in a draw round.
    pub retreat_distance: f32,
    /// Off-screen entry point for a respawning knight.
    pub stage_width: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            samurai_home_x: 120.0,
            knight_home_x: 420.0,
            home_y: 375.0,
            approach_offset: 70.0,
            retreat_distance: 120.0,
            stage_width: 640.0,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub timing: TimingConfig,
    pub stamina: StaminaConfig,
    pub rules: RulesConfig,
    pub stage: StageConfig,
}

impl EngineConfig {
    /// Loads config from a TOML file.
    pub fn load(path: &Path) -> LoadResult<Self> {
        let content = read_file(path)?;
        toml::from_str(&content).map_err(|e| anyhow::anyhow!("Failed to parse engine config: {e}"))
    }

    /// Loads config, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("engine config load failed, using defaults: {err}");
                Self::default()
            }
        }
    }
}
