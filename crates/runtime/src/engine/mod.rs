//! Engine worker that owns the authoritative [`CombatSession`].
//!
//! Receives intents from [`crate::DuelHandle`], drives the fixed tick
//! (stamina regen, dice physics, outcome decision), and spawns round
//! procedures as cooperative tasks holding the turn lock. Intents arriving
//! while the lock is held are dropped, never queued.

mod rounds;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use duel_content::EngineConfig;
use duel_core::{
    DieEvent, EnemyCatalog, LastAction, MateriaKind, RngOracle, RollKind, RoundOutcome, Side,
    Stance, base_damage, decide,
};

use crate::collab::{Collaborators, EffectCue};
use crate::events::{CombatEvent, DiceEvent, EventBus};
use crate::session::{SharedSession, TurnGuard};
use crate::stage::{ActionGate, SharedStage};

pub(crate) use rounds::RoundCtx;

/// Intents and queries accepted by the engine worker.
pub enum Command {
    /// Start a new round's dice.
    Roll,
    /// Commit to the stored (or face-derived) outcome.
    Attack,
    /// Skip combat for stamina recovery.
    Pass,
    SetStance(Stance),
    CycleStance {
        forward: bool,
    },
    Equip {
        kind: MateriaKind,
        reply: oneshot::Sender<bool>,
    },
    Unequip {
        kind: MateriaKind,
        reply: oneshot::Sender<bool>,
    },
}

/// Background task that processes duel intents and drives the tick.
pub struct EngineWorker {
    session: SharedSession,
    stage: SharedStage,
    bus: EventBus,
    rng: Arc<dyn RngOracle>,
    config: Arc<EngineConfig>,
    catalog: Arc<EnemyCatalog>,
    collab: Collaborators,
    command_rx: mpsc::Receiver<Command>,
}

impl EngineWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: SharedSession,
        stage: SharedStage,
        bus: EventBus,
        rng: Arc<dyn RngOracle>,
        config: Arc<EngineConfig>,
        catalog: Arc<EnemyCatalog>,
        collab: Collaborators,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            session,
            stage,
            bus,
            rng,
            config,
            catalog,
            collab,
            command_rx,
        }
    }

    /// Main worker loop: intents interleaved with the fixed tick.
    pub async fn run(mut self) {
        let tick = Duration::from_millis(self.config.timing.tick_ms);
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe = self.command_rx.recv() => match maybe {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = ticker.tick() => self.tick(),
            }
        }
        debug!("engine worker stopped");
    }

    fn ctx(&self) -> RoundCtx {
        RoundCtx {
            session: self.session.clone(),
            stage: self.stage.clone(),
            bus: self.bus.clone(),
            rng: Arc::clone(&self.rng),
            config: Arc::clone(&self.config),
            catalog: Arc::clone(&self.catalog),
            collab: self.collab.clone(),
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Roll => self.on_roll(),
            Command::Attack => self.on_attack(),
            Command::Pass => self.on_pass(),
            Command::SetStance(stance) => {
                self.session.with(|s| s.player.stance = stance);
            }
            Command::CycleStance { forward } => {
                self.session.with(|s| {
                    s.player.stance = if forward {
                        s.player.stance.next()
                    } else {
                        s.player.stance.prev()
                    };
                });
            }
            Command::Equip { kind, reply } => {
                let ok = self.session.with(|s| s.player.loadout.equip(kind));
                let _ = reply.send(ok);
            }
            Command::Unequip { kind, reply } => {
                let ok = self.session.with(|s| s.player.loadout.unequip(kind));
                let _ = reply.send(ok);
            }
        }
    }

    /// One fixed tick: time, stamina regen, stage flash decay, dice physics,
    /// and the outcome decision once both dice have settled.
    fn tick(&mut self) {
        let dt_ms = self.config.timing.tick_ms;
        self.stage.tick(dt_ms);

        let mut finished: Vec<(Side, u8)> = Vec::new();
        let decision = self.session.with(|s| {
            s.now_ms += dt_ms;
            let now = s.now_ms;

            let stance_mul = s.player.stance.stamina_multipliers();
            s.player.stamina.regen(dt_ms as f32, stance_mul);
            let enemy_mul = Stance::default().stamina_multipliers();
            s.enemy.stamina.regen(dt_ms as f32, enemy_mul);

            for side in [Side::Player, Side::Enemy] {
                let event = {
                    let die = s.die_mut(side);
                    die.update(dt_ms as f32, now, &*self.rng)
                };
                if let Some(DieEvent::Finished { face }) = event {
                    s.set_face(side, face);
                    finished.push((side, face));
                }
            }

            if finished.is_empty() {
                return None;
            }
            let (pf, ef) = s.both_faces()?;
            Some((pf, ef, s.player.stamina.is_exhausted()))
        });

        for (side, face) in &finished {
            self.bus.publish(DiceEvent::RollFinished {
                side: *side,
                face: *face,
            });
        }
        if !finished.is_empty() {
            self.collab.effect(EffectCue::DiceSmokeStop);
        }

        if let Some((pf, ef, exhausted)) = decision {
            self.decide_round(pf, ef, exhausted);
        }
    }

    /// Round-outcome decision at dice resolution. A stamina-depleted player
    /// cannot contest the round: the outcome is never stored and the enemy
    /// acts unconditionally.
    fn decide_round(&mut self, player_face: u8, enemy_face: u8, exhausted: bool) {
        if exhausted {
            debug!(player_face, enemy_face, "player exhausted, forcing enemy turn");
            let Some(guard) = self.session.try_lock_turn() else {
                warn!("forced enemy turn dropped: turn lock held");
                return;
            };
            self.spawn_round(
                RoundOutcome::Enemy,
                base_damage(enemy_face, player_face),
                guard,
                false,
            );
            return;
        }

        let outcome = decide(player_face, enemy_face);
        self.session.with(|s| s.last_outcome = Some(outcome));
        self.stage.set_gate(ActionGate::Combat);
        self.bus.publish(CombatEvent::OutcomeDecided { outcome });
    }

    fn on_roll(&mut self) {
        if self.session.turn_in_progress() {
            warn!("roll dropped: round procedure in flight");
            return;
        }
        let started = self.session.with(|s| {
            if s.any_die_rolling() {
                return false;
            }
            s.last_outcome = None;
            s.player_face = None;
            s.enemy_face = None;
            let now = s.now_ms;
            for side in [Side::Player, Side::Enemy] {
                let face_seed = s.next_seed();
                let jitter_seed = s.next_seed();
                let face = self.rng.face(RollKind::Face(side), face_seed);
                let jitter = self
                    .rng
                    .pick(RollKind::StopJitter(side), jitter_seed, 600) as u64;
                // Face comes from the oracle, so the roll cannot be rejected.
                if let Err(err) = s.die_mut(side).roll(face, now, jitter) {
                    warn!(?side, %err, "roll rejected");
                    return false;
                }
            }
            true
        });
        if !started {
            warn!("roll dropped: dice already rolling");
            return;
        }
        self.stage.set_gate(ActionGate::Disabled);
        self.stage.show_dice();
        self.collab.say(Side::Player, "roll", None);
        self.collab.effect(EffectCue::DiceSmokeStart);
        self.collab.play("dice");
    }

    /// Attack intent. Stamina is spent before the busy check and before the
    /// outcome is consulted; a failed spend forwards straight to the
    /// enemy-win procedure.
    fn on_attack(&mut self) {
        let (spent, rolling) = self.session.with(|s| {
            if s.any_die_rolling() {
                return (false, true);
            }
            s.player.last_action = LastAction::Attack;
            let mul = s.player.stance.stamina_multipliers();
            (s.player.stamina.spend_for_attack(mul), false)
        });
        if rolling {
            warn!("attack dropped: dice still rolling");
            return;
        }
        self.collab.say(Side::Player, "attack", None);

        if !spent {
            debug!("attack unaffordable, enemy capitalizes");
            let Some(guard) = self.session.try_lock_turn() else {
                warn!("forced enemy turn dropped: turn lock held");
                return;
            };
            let base = self.session.with(|s| {
                s.both_faces()
                    .map(|(pf, ef)| base_damage(ef, pf))
                    .unwrap_or(10)
            });
            self.spawn_round(RoundOutcome::Enemy, base, guard, false);
            return;
        }

        let Some(guard) = self.session.try_lock_turn() else {
            // Stamina stays spent; the request itself is dropped.
            warn!("attack dropped: round procedure in flight");
            return;
        };

        let (outcome, base) = match self.session.with(|s| {
            let outcome = s.last_outcome.or_else(|| {
                s.both_faces().map(|(pf, ef)| decide(pf, ef))
            })?;
            let (pf, ef) = s.both_faces()?;
            s.last_outcome = None;
            let base = match outcome {
                RoundOutcome::Player => base_damage(pf, ef),
                RoundOutcome::Enemy => base_damage(ef, pf),
                RoundOutcome::Draw => 0,
            };
            Some((outcome, base))
        }) {
            Some(pair) => pair,
            None => {
                warn!("attack dropped: no outcome and no dice faces available");
                drop(guard);
                return;
            }
        };

        self.spawn_round(outcome, base, guard, true);
    }

    fn on_pass(&mut self) {
        let Some(guard) = self.session.try_lock_turn() else {
            warn!("pass dropped: round procedure in flight");
            return;
        };
        self.session.with(|s| {
            s.player.last_action = LastAction::Pass;
        });
        self.stage.set_gate(ActionGate::Disabled);
        let ctx = self.ctx();
        tokio::spawn(async move {
            let _guard = guard;
            rounds::pass_round(&ctx).await;
            rounds::finish_round(&ctx);
        });
    }

    fn spawn_round(&self, outcome: RoundOutcome, base: u32, guard: TurnGuard, reveal: bool) {
        self.stage.set_gate(ActionGate::Disabled);
        let ctx = self.ctx();
        tokio::spawn(async move {
            let _guard = guard;
            if reveal {
                rounds::reveal_dice(&ctx, outcome).await;
            } else {
                rounds::discard_dice(&ctx);
            }
            match outcome {
                RoundOutcome::Player => rounds::player_win_round(&ctx, base).await,
                RoundOutcome::Enemy => rounds::enemy_win_round(&ctx, base).await,
                RoundOutcome::Draw => rounds::draw_round(&ctx).await,
            }
            rounds::finish_round(&ctx);
        });
    }
}
