//! Mutable duel state shared between the tick loop and round procedures.
//!
//! The session sits behind a plain [`std::sync::Mutex`]: every access is a
//! short, non-awaiting critical section, so regen ticks keep flowing while a
//! round procedure is suspended on a timer. Exclusivity of whole rounds is
//! handled separately by the atomic turn lock ([`SharedSession::try_lock_turn`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use duel_content::{RulesConfig, StaminaConfig};
use duel_core::{
    CombatStats, Die, Enemy, EnemyCatalog, EnemyProgress, LastAction, PlayerLoadout,
    PlayerProgress, RngOracle, RoundOutcome, Side, StaminaPool, Stance, action_seed,
};

/// Everything the samurai owns.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub stats: CombatStats,
    pub progress: PlayerProgress,
    pub last_action: LastAction,
    pub hp: i64,
    pub max_hp: u32,
    pub stamina: StaminaPool,
    pub loadout: PlayerLoadout,
    pub stance: Stance,
    pub hearts: u32,
}

impl PlayerState {
    pub fn new(rules: &RulesConfig, stamina: &StaminaConfig) -> Self {
        Self {
            stats: CombatStats::default(),
            progress: PlayerProgress::default(),
            last_action: LastAction::default(),
            hp: rules.player_max_hp as i64,
            max_hp: rules.player_max_hp,
            stamina: StaminaPool::new(
                stamina.player_max,
                stamina.player_regen_per_tick,
                stamina.player_attack_cost,
                stamina.player_on_hit_gain,
            ),
            loadout: PlayerLoadout::default(),
            stance: Stance::default(),
            hearts: rules.starting_hearts,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn heal_full(&mut self) {
        self.hp = self.max_hp as i64;
    }
}

/// The knight slot: the current enemy entity plus the state that outlives it.
///
/// `progress` is session-global; a fresh knight inherits the stats and level
/// its predecessors earned.
#[derive(Debug, Clone)]
pub struct EnemySlot {
    pub entity: Enemy,
    pub stamina: StaminaPool,
    pub stats: CombatStats,
    pub progress: EnemyProgress,
}

impl EnemySlot {
    pub fn new(entity: Enemy, stamina: &StaminaConfig) -> Self {
        let stats = entity.stats;
        Self {
            entity,
            stamina: StaminaPool::new(
                stamina.enemy_max,
                stamina.enemy_regen_per_tick,
                stamina.enemy_attack_cost,
                stamina.enemy_on_hit_gain,
            ),
            stats,
            progress: EnemyProgress::default(),
        }
    }

    /// Replaces the dead knight with a fresh one, keeping earned progression.
    /// Template stats act as a floor under the session-trained ones.
    pub fn replace(&mut self, entity: Enemy) {
        self.stats = CombatStats {
            str_: self.stats.str_.max(entity.stats.str_),
            agi: self.stats.agi.max(entity.stats.agi),
            def: self.stats.def.max(entity.stats.def),
        };
        self.entity = entity;
        self.stamina.reset();
    }
}

/// Full duel state.
#[derive(Debug)]
pub struct CombatSession {
    pub seed: u64,
    nonce: u64,
    pub kills: u32,
    pub player: PlayerState,
    pub enemy: EnemySlot,
    pub player_die: Die,
    pub enemy_die: Die,
    /// Faces persist after a round resolves; the next Attack may reuse them.
    pub player_face: Option<u8>,
    pub enemy_face: Option<u8>,
    pub last_outcome: Option<RoundOutcome>,
    pub now_ms: u64,
}

impl CombatSession {
    pub fn new(
        seed: u64,
        rules: &RulesConfig,
        stamina: &StaminaConfig,
        catalog: &EnemyCatalog,
        rng: &dyn RngOracle,
    ) -> Self {
        let entity = catalog.spawn(0, rng, action_seed(seed, 0));
        Self {
            seed,
            nonce: 1,
            kills: 0,
            player: PlayerState::new(rules, stamina),
            enemy: EnemySlot::new(entity, stamina),
            player_die: Die::new(Side::Player),
            enemy_die: Die::new(Side::Enemy),
            player_face: None,
            enemy_face: None,
            last_outcome: None,
            now_ms: 0,
        }
    }

    /// Derives a fresh per-roll seed. Each call advances the nonce, so two
    /// rolls of the same kind never share randomness.
    pub fn next_seed(&mut self) -> u64 {
        let seed = action_seed(self.seed, self.nonce);
        self.nonce = self.nonce.wrapping_add(1);
        seed
    }

    pub fn die_mut(&mut self, side: Side) -> &mut Die {
        match side {
            Side::Player => &mut self.player_die,
            Side::Enemy => &mut self.enemy_die,
        }
    }

    pub fn face(&self, side: Side) -> Option<u8> {
        match side {
            Side::Player => self.player_face,
            Side::Enemy => self.enemy_face,
        }
    }

    pub fn set_face(&mut self, side: Side, face: u8) {
        match side {
            Side::Player => self.player_face = Some(face),
            Side::Enemy => self.enemy_face = Some(face),
        }
    }

    pub fn both_faces(&self) -> Option<(u8, u8)> {
        Some((self.player_face?, self.enemy_face?))
    }

    pub fn any_die_rolling(&self) -> bool {
        self.player_die.phase() == duel_core::DiePhase::Rolling
            || self.enemy_die.phase() == duel_core::DiePhase::Rolling
    }
}

/// Point-in-time copy of the session for external observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub kills: u32,
    pub player_hp: i64,
    pub player_max_hp: u32,
    pub player_level: u32,
    pub player_xp: u32,
    pub player_xp_to_next: u32,
    pub player_stats: CombatStats,
    pub player_stamina: f32,
    pub player_stamina_max: f32,
    pub stance: Stance,
    pub hearts: u32,
    pub equipped_materia: Vec<duel_core::MateriaKind>,
    pub materia_inventory: Vec<duel_core::MateriaKind>,
    pub enemy_id: String,
    pub enemy_name: String,
    pub enemy_hp: i64,
    pub enemy_max_hp: u32,
    pub enemy_level: u32,
    pub enemy_stats: CombatStats,
    pub enemy_stamina: f32,
    pub player_face: Option<u8>,
    pub enemy_face: Option<u8>,
    pub last_outcome: Option<RoundOutcome>,
}

impl SessionSnapshot {
    pub fn capture(session: &CombatSession) -> Self {
        Self {
            kills: session.kills,
            player_hp: session.player.hp,
            player_max_hp: session.player.max_hp,
            player_level: session.player.progress.level,
            player_xp: session.player.progress.xp,
            player_xp_to_next: session.player.progress.xp_to_next,
            player_stats: session.player.stats,
            player_stamina: session.player.stamina.current(),
            player_stamina_max: session.player.stamina.max(),
            stance: session.player.stance,
            hearts: session.player.hearts,
            equipped_materia: session.player.loadout.equipped().to_vec(),
            materia_inventory: session.player.loadout.inventory().to_vec(),
            enemy_id: session.enemy.entity.id.clone(),
            enemy_name: session.enemy.entity.name.clone(),
            enemy_hp: session.enemy.entity.hp,
            enemy_max_hp: session.enemy.entity.max_hp,
            enemy_level: session.enemy.progress.level,
            enemy_stats: session.enemy.stats,
            enemy_stamina: session.enemy.stamina.current(),
            player_face: session.player_face,
            enemy_face: session.enemy_face,
            last_outcome: session.last_outcome,
        }
    }
}

/// Session handle shared by the tick loop, round procedures, and the API.
///
/// The turn lock is separate from the data mutex so that a held turn never
/// blocks regen ticks or snapshots.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<CombatSession>>,
    turn_busy: Arc<AtomicBool>,
}

impl SharedSession {
    pub fn new(session: CombatSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
            turn_busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs a closure against the locked session. The closure must not await.
    pub fn with<R>(&self, f: impl FnOnce(&mut CombatSession) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Attempts to take the turn lock. Returns `None` if a round procedure
    /// already holds it.
    pub fn try_lock_turn(&self) -> Option<TurnGuard> {
        if self
            .turn_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(TurnGuard {
                busy: Arc::clone(&self.turn_busy),
            })
        } else {
            None
        }
    }

    pub fn turn_in_progress(&self) -> bool {
        self.turn_busy.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.with(|s| SessionSnapshot::capture(s))
    }
}

/// Releases the turn lock on drop, including on panic unwinds.
pub struct TurnGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::PcgRng;

    fn session() -> SharedSession {
        let rules = RulesConfig::default();
        let stamina = StaminaConfig::default();
        let catalog = EnemyCatalog::fallback();
        let rng = PcgRng;
        SharedSession::new(CombatSession::new(7, &rules, &stamina, &catalog, &rng))
    }

    #[test]
    fn turn_lock_is_exclusive_until_dropped() {
        let shared = session();
        let guard = shared.try_lock_turn().expect("lock free");
        assert!(shared.try_lock_turn().is_none());
        drop(guard);
        assert!(shared.try_lock_turn().is_some());
    }

    #[test]
    fn next_seed_never_repeats() {
        let shared = session();
        let (a, b) = shared.with(|s| (s.next_seed(), s.next_seed()));
        assert_ne!(a, b);
    }

    #[test]
    fn replacement_keeps_trained_stats() {
        let rules = RulesConfig::default();
        let stamina = StaminaConfig::default();
        let catalog = EnemyCatalog::fallback();
        let rng = PcgRng;
        let mut session = CombatSession::new(3, &rules, &stamina, &catalog, &rng);

        session.enemy.stats.str_ = 9;
        let seed = session.next_seed();
        let fresh = catalog.spawn(0, &rng, seed);
        session.enemy.replace(fresh);
        assert_eq!(session.enemy.stats.str_, 9);
        assert_eq!(
            session.enemy.stamina.current(),
            session.enemy.stamina.max()
        );
    }
}
