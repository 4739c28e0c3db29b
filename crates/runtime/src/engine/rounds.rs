//! Round-outcome procedures.
//!
//! Each procedure runs as one cooperative task while the caller-supplied
//! turn guard is held. Suspension points are the timed waits and movement
//! animations; session mutations happen in short non-awaiting locks so the
//! tick loop keeps regenerating stamina underneath.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use duel_content::EngineConfig;
use duel_core::{
    EnemyCatalog, EnemyMateriaKind, MateriaKind, RngOracle, RollKind, RoundOutcome, Side,
    materia,
};

use crate::collab::{Collaborators, EffectCue};
use crate::events::{CombatEvent, DamageTag, EventBus, ProgressionEvent};
use crate::motion::{blink_actor, fade_out, move_actor};
use crate::session::SharedSession;
use crate::stage::{ActionGate, Pose, SharedStage};

/// Everything a round procedure needs, cheap to clone into a spawned task.
#[derive(Clone)]
pub(crate) struct RoundCtx {
    pub session: SharedSession,
    pub stage: SharedStage,
    pub bus: EventBus,
    pub rng: Arc<dyn RngOracle>,
    pub config: Arc<EngineConfig>,
    pub catalog: Arc<EnemyCatalog>,
    pub collab: Collaborators,
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Dice-reveal beat: settle, hide the losing face, smoke burst, then hide
/// the dice entirely. Purely presentational.
pub(crate) async fn reveal_dice(ctx: &RoundCtx, outcome: RoundOutcome) {
    let t = &ctx.config.timing;
    wait(t.reveal_settle_ms).await;
    match outcome {
        RoundOutcome::Player => ctx.session.with(|s| s.enemy_die.hide_face()),
        RoundOutcome::Enemy => ctx.session.with(|s| s.player_die.hide_face()),
        RoundOutcome::Draw => {}
    }
    wait(t.reveal_bounce_ms).await;
    ctx.collab.effect(EffectCue::DiceSmokeBurst);
    wait(t.reveal_tail_ms).await;
    ctx.stage.hide_dice();
    ctx.session.with(|s| {
        s.player_die.clear();
        s.enemy_die.clear();
    });
}

/// Clears the dice immediately, without the timed reveal beats. Forced
/// enemy turns go straight to the strike.
pub(crate) fn discard_dice(ctx: &RoundCtx) {
    ctx.stage.hide_dice();
    ctx.session.with(|s| {
        s.player_die.clear();
        s.enemy_die.clear();
    });
}

/// Poison status tick at the start of an attack round. Returns true if it
/// killed the enemy (the round then short-circuits into the death sequence).
async fn poison_tick(ctx: &RoundCtx) -> bool {
    let hp_after = ctx.session.with(|s| {
        if !s.enemy.entity.is_poisoned {
            return None;
        }
        s.enemy.entity.hp -= 1;
        Some(s.enemy.entity.hp)
    });
    let Some(hp_after) = hp_after else {
        return false;
    };
    ctx.bus.publish(CombatEvent::DamageApplied {
        side: Side::Enemy,
        amount: 1,
        hp_after,
        tag: DamageTag::Poison,
    });
    ctx.collab.effect(EffectCue::DamageNumber {
        side: Side::Enemy,
        text: "1".into(),
        emphasis: false,
    });
    if hp_after <= 0 {
        ctx.bus.publish(CombatEvent::CombatantDied { side: Side::Enemy });
        knight_death(ctx).await;
        return true;
    }
    false
}

/// Player-win round: approach, strike with crit/multihit/poison riders,
/// kill branch into the knight death sequence.
pub(crate) async fn player_win_round(ctx: &RoundCtx, base: u32) {
    if poison_tick(ctx).await {
        return;
    }

    struct Strike {
        damage: u32,
        crit: bool,
        multihit: bool,
        enemy_face: u8,
    }

    let strike = ctx.session.with(|s| {
        let crit_seed = s.next_seed();
        let multi_seed = s.next_seed();
        let has_crit = s.player.loadout.has(MateriaKind::Crit);
        let crit = materia::try_crit(Side::Player, has_crit, &*ctx.rng, crit_seed);
        let agi = materia::effective_agi(&s.player.stats, s.player.stance, &s.player.loadout);
        let multihit = materia::try_multihit(agi, &*ctx.rng, multi_seed);

        let mut damage = materia::compute_player_damage(
            base,
            &s.player.stats,
            s.player.stance,
            s.enemy.stats.def,
        );
        if crit {
            damage *= 2;
        }
        if multihit {
            damage = (damage as f32 * 1.8) as u32;
        }
        if materia::applies_poison(&s.player.loadout) {
            s.enemy.entity.is_poisoned = true;
        }
        Strike {
            damage,
            crit,
            multihit,
            enemy_face: s.enemy_face.unwrap_or(1),
        }
    });

    let t = ctx.config.timing.clone();
    let stage_cfg = &ctx.config.stage;
    let target = ctx.stage.home_x(Side::Enemy) - stage_cfg.approach_offset;
    move_actor(
        &ctx.stage,
        Side::Player,
        target,
        t.approach_speed,
        t.tick_ms,
        Pose::Attack,
    )
    .await;

    ctx.collab.effect(EffectCue::Slash);
    if strike.crit {
        ctx.collab.effect(EffectCue::KatanaSpin);
    }
    ctx.collab.play(if strike.crit { "crit" } else { "slash" });
    wait(t.hit_stop_ms).await;

    let hp_after = ctx.session.with(|s| {
        s.enemy.entity.hp -= strike.damage as i64;
        s.enemy.entity.hp
    });
    ctx.bus.publish(CombatEvent::DamageApplied {
        side: Side::Enemy,
        amount: strike.damage,
        hp_after,
        tag: DamageTag::Strike,
    });
    ctx.collab.effect(EffectCue::Blood);
    ctx.collab.effect(EffectCue::DamageNumber {
        side: Side::Enemy,
        text: strike.damage.to_string(),
        emphasis: strike.crit || strike.multihit,
    });
    ctx.collab.say(Side::Player, "hit", None);

    ctx.stage.set_pose(Side::Enemy, Pose::Hurt);
    wait(t.hurt_ms).await;

    if hp_after <= 0 {
        award_kill_xp(ctx, strike.enemy_face);
        ctx.bus.publish(CombatEvent::CombatantDied { side: Side::Enemy });
        knight_death(ctx).await;
    } else {
        let name = ctx.session.with(|s| s.enemy.entity.name.clone());
        ctx.collab.say(Side::Enemy, "hurt", Some(&name));
        ctx.stage.set_pose(Side::Enemy, Pose::Idle);
    }

    move_actor(
        &ctx.stage,
        Side::Player,
        ctx.stage.home_x(Side::Player),
        t.retreat_speed,
        t.tick_ms,
        Pose::Idle,
    )
    .await;
}

/// Enemy-win round: player evade check, enemy-materia riders (thorns splash,
/// counter self-damage), the main strike with the on-hit stamina refund, the
/// counter-materia riposte, and the player death branch.
pub(crate) async fn enemy_win_round(ctx: &RoundCtx, base: u32) {
    if poison_tick(ctx).await {
        return;
    }

    let t = ctx.config.timing.clone();
    let stage_cfg = &ctx.config.stage;

    let evaded = ctx.session.with(|s| {
        let seed = s.next_seed();
        let agi = materia::effective_agi(&s.player.stats, s.player.stance, &s.player.loadout);
        materia::try_evade(agi, &*ctx.rng, seed)
    });
    if evaded {
        ctx.bus.publish(CombatEvent::Evaded { side: Side::Player });
        ctx.collab.effect(EffectCue::ShadowClone);
        ctx.collab.play("evade");
        // Short evasive reposition, no stamina or HP changes.
        let home = ctx.stage.home_x(Side::Player);
        move_actor(
            &ctx.stage,
            Side::Player,
            home - 40.0,
            t.retreat_speed,
            t.tick_ms,
            Pose::Idle,
        )
        .await;
        move_actor(&ctx.stage, Side::Player, home, t.retreat_speed, t.tick_ms, Pose::Idle).await;
        ctx.collab.effect(EffectCue::ShadowClonesClear);
        return;
    }

    struct Incoming {
        damage: u32,
        thorns: Option<u32>,
        counter_self: Option<(u32, i64)>,
        enemy_name: String,
    }

    let incoming = ctx.session.with(|s| {
        let damage = materia::compute_enemy_damage(
            base,
            s.enemy.stats.str_,
            &s.player.stats,
            s.player.stance,
            &s.player.loadout,
        );
        let thorns = s
            .enemy
            .entity
            .has_materia(EnemyMateriaKind::Thorns)
            .then(|| (damage as f32 * materia::THORNS_REFLECT_FRACTION) as u32);
        let counter_self = s.enemy.entity.has_materia(EnemyMateriaKind::Counter).then(|| {
            let self_damage =
                (s.enemy.stats.str_ as f32 * materia::COUNTER_SELF_DAMAGE_MUL) as u32;
            s.enemy.entity.hp -= self_damage as i64;
            (self_damage, s.enemy.entity.hp)
        });
        Incoming {
            damage,
            thorns,
            counter_self,
            enemy_name: s.enemy.entity.name.clone(),
        }
    });

    // Counter self-damage lands before the strike. It deliberately skips the
    // death check; a self-countered enemy dies on the next resolved round.
    if let Some((amount, hp_after)) = incoming.counter_self {
        ctx.bus.publish(CombatEvent::DamageApplied {
            side: Side::Enemy,
            amount,
            hp_after,
            tag: DamageTag::CounterSelf,
        });
    }

    // Thorns splash lands before the knight even closes in.
    if let Some(thorns) = incoming.thorns
        && thorns > 0
    {
        let hp_after = ctx.session.with(|s| {
            s.player.hp -= thorns as i64;
            s.player.hp
        });
        ctx.bus.publish(CombatEvent::DamageApplied {
            side: Side::Player,
            amount: thorns,
            hp_after,
            tag: DamageTag::Thorns,
        });
    }

    let target = ctx.stage.home_x(Side::Player) + stage_cfg.approach_offset;
    move_actor(
        &ctx.stage,
        Side::Enemy,
        target,
        t.approach_speed,
        t.tick_ms,
        Pose::Attack,
    )
    .await;
    ctx.collab.play("clash");
    wait(t.hit_stop_ms).await;

    let mut total = incoming.damage;
    if let Some(thorns) = incoming.thorns {
        total += thorns;
    }
    let hp_after = ctx.session.with(|s| {
        s.player.hp -= incoming.damage as i64;
        let mul = s.player.stance.stamina_multipliers();
        // Comeback mechanic: taking the hit refunds stamina.
        s.player.stamina.on_hit(mul);
        s.player.hp
    });
    ctx.bus.publish(CombatEvent::DamageApplied {
        side: Side::Player,
        amount: incoming.damage,
        hp_after,
        tag: DamageTag::Strike,
    });
    ctx.collab.effect(EffectCue::DamageNumber {
        side: Side::Player,
        text: total.to_string(),
        emphasis: false,
    });
    ctx.collab.say(Side::Enemy, "hit", Some(&incoming.enemy_name));
    ctx.collab.say(Side::Player, "hurt", None);
    ctx.stage.set_pose(Side::Player, Pose::Hurt);
    wait(t.hurt_ms).await;

    let player_dead = ctx.session.with(|s| s.player.is_dead());
    if !player_dead {
        // Counter-materia riposte: the player answers the hit in kind.
        let riposte = ctx.session.with(|s| {
            let seed = s.next_seed();
            if !materia::try_counter(&s.player.loadout, &*ctx.rng, seed) {
                return None;
            }
            let str_mul = s.player.stance.stat_multipliers().str_mul;
            let amount = ((s.player.stats.str_ as f32 * str_mul
                * materia::COUNTER_SELF_DAMAGE_MUL) as u32)
                .max(1);
            s.enemy.entity.hp -= amount as i64;
            Some((amount, s.enemy.entity.hp))
        });
        if let Some((amount, hp_after)) = riposte {
            ctx.collab.effect(EffectCue::Slash);
            ctx.bus.publish(CombatEvent::DamageApplied {
                side: Side::Enemy,
                amount,
                hp_after,
                tag: DamageTag::Riposte,
            });
            if hp_after <= 0 {
                let enemy_face = ctx.session.with(|s| s.enemy_face.unwrap_or(1));
                award_kill_xp(ctx, enemy_face);
                ctx.bus.publish(CombatEvent::CombatantDied { side: Side::Enemy });
                knight_death(ctx).await;
                return;
            }
        }
    }

    move_actor(
        &ctx.stage,
        Side::Enemy,
        ctx.stage.home_x(Side::Enemy),
        t.retreat_speed,
        t.tick_ms,
        Pose::Idle,
    )
    .await;

    if player_dead {
        ctx.bus.publish(CombatEvent::CombatantDied { side: Side::Player });
        samurai_death(ctx).await;
    } else {
        ctx.stage.set_pose(Side::Player, Pose::Idle);
    }
}

/// Draw round: symmetric retreat and return, dust cues, no damage.
pub(crate) async fn draw_round(ctx: &RoundCtx) {
    let t = ctx.config.timing.clone();
    let retreat = ctx.config.stage.retreat_distance;
    let player_home = ctx.stage.home_x(Side::Player);
    let enemy_home = ctx.stage.home_x(Side::Enemy);

    ctx.collab.effect(EffectCue::Dust { side: Side::Player });
    ctx.collab.effect(EffectCue::Dust { side: Side::Enemy });
    tokio::join!(
        move_actor(
            &ctx.stage,
            Side::Player,
            player_home - retreat,
            t.retreat_speed,
            t.tick_ms,
            Pose::Idle,
        ),
        move_actor(
            &ctx.stage,
            Side::Enemy,
            enemy_home + retreat,
            t.retreat_speed,
            t.tick_ms,
            Pose::Idle,
        ),
    );
    tokio::join!(
        move_actor(
            &ctx.stage,
            Side::Player,
            player_home,
            t.approach_speed,
            t.tick_ms,
            Pose::Idle,
        ),
        move_actor(
            &ctx.stage,
            Side::Enemy,
            enemy_home,
            t.approach_speed,
            t.tick_ms,
            Pose::Idle,
        ),
    );
}

/// Pass round: one of four scripted evasive patterns, stamina recovery, no
/// combat resolution. Clears any stored outcome.
pub(crate) async fn pass_round(ctx: &RoundCtx) {
    let t = ctx.config.timing.clone();
    ctx.stage.flash(t.pass_flash_ms);

    let (variant, rare) = ctx.session.with(|s| {
        s.last_outcome = None;
        let variant_seed = s.next_seed();
        let banter_seed = s.next_seed();
        let variant = ctx.rng.pick(RollKind::PassVariant, variant_seed, 4);
        let rare = ctx.rng.percent(RollKind::RareBanter, banter_seed)
            <= ctx.config.rules.rare_banter_percent;
        (variant, rare)
    });
    ctx.collab
        .say(Side::Player, if rare { "rare_pass" } else { "pass" }, None);

    let home = ctx.stage.home_x(Side::Player);
    match variant {
        0 => {
            // Quick hop back and forth.
            move_actor(&ctx.stage, Side::Player, home - 50.0, t.retreat_speed, t.tick_ms, Pose::Idle)
                .await;
            move_actor(&ctx.stage, Side::Player, home, t.approach_speed, t.tick_ms, Pose::Idle)
                .await;
        }
        1 => {
            // Feint forward, then retreat home.
            move_actor(&ctx.stage, Side::Player, home + 60.0, t.approach_speed, t.tick_ms, Pose::Idle)
                .await;
            move_actor(&ctx.stage, Side::Player, home, t.retreat_speed, t.tick_ms, Pose::Idle)
                .await;
        }
        2 => {
            // Blur of after-images in place.
            ctx.collab.effect(EffectCue::ShadowClone);
            blink_actor(&ctx.stage, Side::Player, 3, t.pass_flash_ms).await;
            ctx.collab.effect(EffectCue::ShadowClonesClear);
        }
        _ => {
            // Wide circling sweep.
            move_actor(&ctx.stage, Side::Player, home - 80.0, t.retreat_speed, t.tick_ms, Pose::Idle)
                .await;
            move_actor(&ctx.stage, Side::Player, home + 30.0, t.approach_speed, t.tick_ms, Pose::Idle)
                .await;
            move_actor(&ctx.stage, Side::Player, home, t.retreat_speed, t.tick_ms, Pose::Idle)
                .await;
        }
    }
}

/// Kill rewards at the moment the enemy HP reaches zero: player XP scaled by
/// the enemy's losing face, plus the first of the two enemy-track grants.
fn award_kill_xp(ctx: &RoundCtx, enemy_face: u8) {
    let rules = &ctx.config.rules;
    let (player_levels, player_level, enemy_levels, enemy_level) = ctx.session.with(|s| {
        let amount = rules.player_kill_xp_base + enemy_face as u32 * rules.player_kill_xp_per_face;
        let last_action = s.player.last_action;
        let player_levels = s
            .player
            .progress
            .grant_xp(amount, last_action, &mut s.player.stats);
        let seed = s.next_seed();
        let enemy_levels =
            s.enemy
                .progress
                .grant_xp(rules.enemy_kill_xp, &mut s.enemy.stats, &*ctx.rng, seed);
        (
            player_levels,
            s.player.progress.level,
            enemy_levels,
            s.enemy.progress.level,
        )
    });
    if player_levels > 0 {
        ctx.bus.publish(ProgressionEvent::LevelUp {
            side: Side::Player,
            level: player_level,
        });
        ctx.collab.effect(EffectCue::AngelSpark);
    }
    if enemy_levels > 0 {
        ctx.bus.publish(ProgressionEvent::LevelUp {
            side: Side::Enemy,
            level: enemy_level,
        });
    }
}

/// Knight death and respawn: defeat pose, fade, kill counter, the second
/// enemy-track XP grant, the materia drop roll, and the run-in of the
/// replacement spawned for the new kill count.
pub(crate) async fn knight_death(ctx: &RoundCtx) {
    let t = ctx.config.timing.clone();
    let rules = &ctx.config.rules;

    let name = ctx.session.with(|s| s.enemy.entity.name.clone());
    ctx.collab.say(Side::Enemy, "death", Some(&name));
    ctx.collab.play("die");
    ctx.stage.set_pose(Side::Enemy, Pose::Death);
    wait(t.death_pose_ms).await;
    fade_out(&ctx.stage, Side::Enemy, t.death_fade_ms, t.tick_ms).await;

    struct Respawn {
        enemy_levels: u32,
        enemy_level: u32,
        drop: Option<MateriaKind>,
        spawned_id: String,
        spawned_name: String,
    }

    let respawn = ctx.session.with(|s| {
        s.kills += 1;

        // Second enemy-track grant; the level bump lands on the slot stats
        // the replacement inherits.
        let seed = s.next_seed();
        let enemy_levels =
            s.enemy
                .progress
                .grant_xp(rules.enemy_kill_xp, &mut s.enemy.stats, &*ctx.rng, seed);
        let enemy_level = s.enemy.progress.level;

        let drop_seed = s.next_seed();
        let drop = (ctx.rng.percent(RollKind::MateriaDrop, drop_seed)
            <= rules.materia_drop_percent)
            .then(|| {
                let pick = ctx.rng.pick(
                    RollKind::MateriaPick,
                    drop_seed,
                    materia::DROP_POOL.len() as u32,
                );
                let kind = materia::DROP_POOL[pick as usize];
                s.player.loadout.obtain(kind);
                kind
            });

        let spawn_seed = s.next_seed();
        let fresh = ctx.catalog.spawn(s.kills, &*ctx.rng, spawn_seed);
        let (spawned_id, spawned_name) = (fresh.id.clone(), fresh.name.clone());
        s.enemy.replace(fresh);

        Respawn {
            enemy_levels,
            enemy_level,
            drop,
            spawned_id,
            spawned_name,
        }
    });

    if respawn.enemy_levels > 0 {
        ctx.bus.publish(ProgressionEvent::LevelUp {
            side: Side::Enemy,
            level: respawn.enemy_level,
        });
    }
    if let Some(kind) = respawn.drop {
        ctx.bus.publish(ProgressionEvent::MateriaObtained { kind });
        ctx.collab.materia_note(&format!("obtained {kind} materia"));
        ctx.collab.say(Side::Player, "found", None);
    }
    ctx.bus.publish(ProgressionEvent::EnemySpawned {
        id: respawn.spawned_id,
        name: respawn.spawned_name.clone(),
    });

    // Run-in from off stage right.
    ctx.stage.with(|stage| {
        let knight = stage.actor_mut(Side::Enemy);
        knight.x = ctx.config.stage.stage_width + 80.0;
        knight.alpha = 1.0;
        knight.pose = Pose::Run;
    });
    move_actor(
        &ctx.stage,
        Side::Enemy,
        ctx.stage.home_x(Side::Enemy),
        t.approach_speed,
        t.tick_ms,
        Pose::Idle,
    )
    .await;
    ctx.bus
        .publish(CombatEvent::CombatantRespawned { side: Side::Enemy });
    ctx.collab.say(Side::Enemy, "intro", Some(&respawn.spawned_name));
}

/// Samurai death: block, fade, then either a spirit-heart continue or the
/// full stat/progress/materia reset, followed by respawn at home.
pub(crate) async fn samurai_death(ctx: &RoundCtx) {
    let t = ctx.config.timing.clone();
    let rules = &ctx.config.rules;

    ctx.collab.say(Side::Player, "death", None);
    ctx.collab.play("fall");
    ctx.stage.set_pose(Side::Player, Pose::Block);
    wait(t.block_ms).await;
    ctx.stage.set_pose(Side::Player, Pose::Death);
    wait(t.death_pose_ms).await;
    fade_out(&ctx.stage, Side::Player, t.death_fade_ms, t.tick_ms).await;

    let heart_used = ctx.session.with(|s| {
        if s.player.hearts > 0 {
            s.player.hearts -= 1;
            Some(s.player.hearts)
        } else {
            // Hearts are never refilled; once spent, every later death is a
            // hard reset.
            s.player.stats = Default::default();
            s.player.progress = Default::default();
            s.player.max_hp = rules.player_max_hp;
            s.player.loadout.clear();
            None
        }
    });
    match heart_used {
        Some(remaining) => {
            debug!(remaining, "spirit heart consumed");
            ctx.bus
                .publish(ProgressionEvent::HeartConsumed { remaining });
        }
        None => {
            debug!("no hearts left, hard reset");
            ctx.bus.publish(ProgressionEvent::HardReset);
        }
    }

    ctx.session.with(|s| {
        s.player.heal_full();
        s.player.stamina.reset();
    });
    ctx.stage.flash(t.respawn_flash_ms);
    ctx.stage.return_home(Side::Player);
    blink_actor(&ctx.stage, Side::Player, 3, t.respawn_flash_ms).await;
    ctx.bus
        .publish(CombatEvent::CombatantRespawned { side: Side::Player });
}

/// Common round epilogue: regen-materia heal, idle restore, and the Roll
/// gate surfaced again.
pub(crate) fn finish_round(ctx: &RoundCtx) {
    ctx.session.with(|s| {
        if s.player.loadout.has(MateriaKind::Regen) && !s.player.is_dead() {
            s.player.hp = (s.player.hp + materia::REGEN_HP_PER_ROUND as i64)
                .min(s.player.max_hp as i64);
        }
    });
    ctx.stage.return_home(Side::Player);
    ctx.stage.return_home(Side::Enemy);
    ctx.stage.set_gate(ActionGate::Roll);
}
