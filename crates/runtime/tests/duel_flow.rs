//! End-to-end duel flow tests over a paused clock.
//!
//! The scripted oracle pins dice faces and proc rolls, so every sequence
//! here is fully deterministic; `start_paused` lets the timed round
//! procedures run instantly in virtual time.

mod common;

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use duel_core::{EnemyCatalog, EnemyTemplate, MateriaKind, RollKind, RoundOutcome, Side, Stance};
use duel_runtime::{
    ActionGate, CombatEvent, DamageTag, DuelHandle, Event, ProgressionEvent, Topic,
};

use common::{ScriptedRng, fixed_catalog, start_duel};

const LONG: Duration = Duration::from_secs(120);

async fn next_combat(rx: &mut broadcast::Receiver<Event>) -> CombatEvent {
    loop {
        match timeout(LONG, rx.recv()).await {
            Ok(Ok(Event::Combat(ev))) => return ev,
            Ok(Ok(_)) => continue,
            other => panic!("expected combat event, got {other:?}"),
        }
    }
}

async fn next_progression(rx: &mut broadcast::Receiver<Event>) -> ProgressionEvent {
    loop {
        match timeout(LONG, rx.recv()).await {
            Ok(Ok(Event::Progression(ev))) => return ev,
            Ok(Ok(_)) => continue,
            other => panic!("expected progression event, got {other:?}"),
        }
    }
}

async fn wait_gate(handle: &DuelHandle, gate: ActionGate) {
    timeout(LONG, async {
        while handle.stage_snapshot().gate != gate {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("gate never reached");
}

async fn roll_until_outcome(handle: &DuelHandle, rx: &mut broadcast::Receiver<Event>) {
    handle.roll().await.unwrap();
    loop {
        if let CombatEvent::OutcomeDecided { .. } = next_combat(rx).await {
            return;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn winning_attack_damages_enemy_and_clears_outcome() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 6)
        .face(Side::Enemy, 2)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(1000, 1, 1), |c| {
        c.stamina.player_regen_per_tick = 0.0;
    });
    let mut combat = handle.subscribe(Topic::Combat);

    handle.roll().await.unwrap();
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::OutcomeDecided {
            outcome: RoundOutcome::Player
        }
    );
    assert_eq!(handle.snapshot().player_stamina, 100.0);

    handle.attack().await.unwrap();
    // Base damage max(1, 6-2) * 10 through STR 1 / DEF 1.
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::DamageApplied {
            side: Side::Enemy,
            amount: 40,
            hp_after: 960,
            tag: DamageTag::Strike,
        }
    );
    wait_gate(&handle, ActionGate::Roll).await;

    let snap = handle.snapshot();
    assert_eq!(snap.last_outcome, None);
    assert_eq!(snap.player_stamina, 85.0);
    assert_eq!(snap.enemy_hp, 960);
}

#[tokio::test(start_paused = true)]
async fn draw_round_exchanges_no_damage() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 3)
        .face(Side::Enemy, 3)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(1000, 1, 1), |_| {});
    let mut combat = handle.subscribe(Topic::Combat);

    handle.roll().await.unwrap();
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::OutcomeDecided {
            outcome: RoundOutcome::Draw
        }
    );

    handle.attack().await.unwrap();
    wait_gate(&handle, ActionGate::Roll).await;

    // No damage was applied on either side.
    while let Ok(event) = combat.try_recv() {
        assert!(
            !matches!(event, Event::Combat(CombatEvent::DamageApplied { .. })),
            "draw round applied damage: {event:?}"
        );
    }
    let snap = handle.snapshot();
    assert_eq!(snap.player_hp, snap.player_max_hp as i64);
    assert_eq!(snap.enemy_hp, 1000);

    // Both combatants returned to their home marks.
    let stage = handle.stage_snapshot();
    assert_eq!(stage.samurai.x, stage.samurai.home_x);
    assert_eq!(stage.knight.x, stage.knight.home_x);
}

#[tokio::test(start_paused = true)]
async fn lethal_enemy_round_consumes_a_spirit_heart() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 1)
        .face(Side::Enemy, 6)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(1000, 1, 1), |c| {
        c.stamina.player_regen_per_tick = 0.0;
    });
    let mut combat = handle.subscribe(Topic::Combat);
    let mut progression = handle.subscribe(Topic::Progression);

    handle.roll().await.unwrap();
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::OutcomeDecided {
            outcome: RoundOutcome::Enemy
        }
    );

    handle.attack().await.unwrap();
    // Base max(1, 6-1) * 10 = 50 against max HP 5: lethal.
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::DamageApplied {
            side: Side::Player,
            amount: 50,
            hp_after: -45,
            tag: DamageTag::Strike,
        }
    );
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::CombatantDied { side: Side::Player }
    );
    assert_eq!(
        next_progression(&mut progression).await,
        ProgressionEvent::HeartConsumed { remaining: 0 }
    );
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::CombatantRespawned { side: Side::Player }
    );
    wait_gate(&handle, ActionGate::Roll).await;

    let snap = handle.snapshot();
    assert_eq!(snap.hearts, 0);
    assert_eq!(snap.player_hp, snap.player_max_hp as i64);
    assert_eq!(snap.player_stamina, snap.player_stamina_max);
}

#[tokio::test(start_paused = true)]
async fn death_without_hearts_hard_resets_progress() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 1)
        .face(Side::Enemy, 6)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(1000, 1, 1), |c| {
        c.rules.starting_hearts = 0;
    });
    let mut combat = handle.subscribe(Topic::Combat);
    let mut progression = handle.subscribe(Topic::Progression);

    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();

    assert_eq!(
        next_progression(&mut progression).await,
        ProgressionEvent::HardReset
    );
    wait_gate(&handle, ActionGate::Roll).await;

    let snap = handle.snapshot();
    assert_eq!(snap.player_level, 1);
    assert_eq!(snap.player_stats.str_, 1);
    assert_eq!(snap.hearts, 0);
    assert!(snap.materia_inventory.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hard_reset_does_not_refill_spirit_hearts() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 1)
        .face(Side::Enemy, 6)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(1000, 1, 1), |_| {});
    let mut combat = handle.subscribe(Topic::Combat);
    let mut progression = handle.subscribe(Topic::Progression);

    // First death burns the single starting heart.
    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();
    assert_eq!(
        next_progression(&mut progression).await,
        ProgressionEvent::HeartConsumed { remaining: 0 }
    );
    wait_gate(&handle, ActionGate::Roll).await;

    // Second death finds an empty pool and hard resets without refilling it.
    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();
    assert_eq!(
        next_progression(&mut progression).await,
        ProgressionEvent::HardReset
    );
    wait_gate(&handle, ActionGate::Roll).await;
    assert_eq!(handle.snapshot().hearts, 0);

    // Every later death stays a hard reset.
    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();
    assert_eq!(
        next_progression(&mut progression).await,
        ProgressionEvent::HardReset
    );
}

#[tokio::test(start_paused = true)]
async fn knight_death_increments_kills_and_respawns_in_tier() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 6)
        .face(Side::Enemy, 2)
        .instant_stops()
        .all_procs_off();
    // Fallback catalog: the novice tier (5 HP) covers kill counts 0-4.
    let handle = start_duel(rng, EnemyCatalog::fallback(), |_| {});
    let mut combat = handle.subscribe(Topic::Combat);
    let mut progression = handle.subscribe(Topic::Progression);

    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();

    assert!(matches!(
        next_combat(&mut combat).await,
        CombatEvent::DamageApplied {
            side: Side::Enemy,
            tag: DamageTag::Strike,
            ..
        }
    ));
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::CombatantDied { side: Side::Enemy }
    );
    let spawned = next_progression(&mut progression).await;
    assert!(
        matches!(spawned, ProgressionEvent::EnemySpawned { ref id, .. } if id == "novice_knight"),
        "unexpected spawn: {spawned:?}"
    );
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::CombatantRespawned { side: Side::Enemy }
    );
    wait_gate(&handle, ActionGate::Roll).await;

    let snap = handle.snapshot();
    assert_eq!(snap.kills, 1);
    assert_eq!(snap.enemy_hp, snap.enemy_max_hp as i64);
    // Kill XP is 12 + losing face 2 * 2 = 16, below the first threshold.
    assert_eq!(snap.player_xp, 16);
    assert_eq!(snap.player_level, 1);
}

#[tokio::test(start_paused = true)]
async fn materia_drop_enters_inventory_and_gates_equipping() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 6)
        .face(Side::Enemy, 2)
        .instant_stops()
        .all_procs_off()
        .set(RollKind::MateriaDrop, 0)
        .set(RollKind::MateriaPick, 0);
    let handle = start_duel(rng, EnemyCatalog::fallback(), |_| {});
    let mut combat = handle.subscribe(Topic::Combat);
    let mut progression = handle.subscribe(Topic::Progression);

    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();

    loop {
        if let ProgressionEvent::MateriaObtained { kind } =
            next_progression(&mut progression).await
        {
            assert_eq!(kind, MateriaKind::Crit);
            break;
        }
    }
    wait_gate(&handle, ActionGate::Roll).await;

    assert_eq!(handle.snapshot().materia_inventory, vec![MateriaKind::Crit]);
    assert!(handle.equip(MateriaKind::Crit).await.unwrap());
    assert_eq!(handle.snapshot().equipped_materia, vec![MateriaKind::Crit]);
    assert!(handle.unequip(MateriaKind::Crit).await.unwrap());
    // Unowned kinds cannot be equipped.
    assert!(!handle.equip(MateriaKind::Speed).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn second_attack_while_busy_is_dropped() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 6)
        .face(Side::Enemy, 2)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(1000, 1, 1), |c| {
        c.stamina.player_regen_per_tick = 0.0;
    });
    let mut combat = handle.subscribe(Topic::Combat);

    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();
    handle.attack().await.unwrap();
    wait_gate(&handle, ActionGate::Roll).await;

    // Exactly one strike landed; the second request was dropped, though its
    // stamina was still spent before the busy check.
    let mut strikes = 0;
    while let Ok(event) = combat.try_recv() {
        if matches!(event, Event::Combat(CombatEvent::DamageApplied { .. })) {
            strikes += 1;
        }
    }
    assert_eq!(strikes, 1);
    assert_eq!(handle.snapshot().player_stamina, 70.0);
}

#[tokio::test(start_paused = true)]
async fn exhausted_player_forfeits_the_round() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 6)
        .face(Side::Enemy, 2)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(100000, 1, 1), |c| {
        c.stamina.player_max = 30.0;
        c.stamina.player_regen_per_tick = 0.0;
        c.rules.player_max_hp = 100;
    });
    let mut combat = handle.subscribe(Topic::Combat);

    // Two affordable attacks drain the pool to zero.
    for _ in 0..2 {
        roll_until_outcome(&handle, &mut combat).await;
        handle.attack().await.unwrap();
        wait_gate(&handle, ActionGate::Roll).await;
    }
    assert_eq!(handle.snapshot().player_stamina, 0.0);
    while combat.try_recv().is_ok() {}

    // Exhaustion rule: the decision never stores an outcome, the enemy acts
    // unconditionally despite the player's winning face.
    handle.roll().await.unwrap();
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::DamageApplied {
            side: Side::Player,
            amount: 10,
            hp_after: 90,
            tag: DamageTag::Strike,
        }
    );
    wait_gate(&handle, ActionGate::Roll).await;
    assert_eq!(handle.snapshot().last_outcome, None);
}

#[tokio::test(start_paused = true)]
async fn forced_enemy_turn_skips_the_dice_reveal() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 6)
        .face(Side::Enemy, 2)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(100000, 1, 1), |c| {
        c.stamina.player_max = 30.0;
        c.stamina.player_regen_per_tick = 0.0;
        c.rules.player_max_hp = 100;
        // One-tick movement keeps the timing budget about the waits.
        c.timing.approach_speed = 1000.0;
        c.timing.retreat_speed = 1000.0;
    });
    let mut combat = handle.subscribe(Topic::Combat);

    for _ in 0..2 {
        roll_until_outcome(&handle, &mut combat).await;
        handle.attack().await.unwrap();
        wait_gate(&handle, ActionGate::Roll).await;
    }
    while combat.try_recv().is_ok() {}

    // The dice settle at ~900 ms; the forced strike follows directly,
    // without the 540 ms reveal sequence in between.
    let started = tokio::time::Instant::now();
    handle.roll().await.unwrap();
    assert!(matches!(
        next_combat(&mut combat).await,
        CombatEvent::DamageApplied {
            side: Side::Player,
            tag: DamageTag::Strike,
            ..
        }
    ));
    assert!(
        started.elapsed() < Duration::from_millis(1400),
        "forced turn took {:?}",
        started.elapsed()
    );
    wait_gate(&handle, ActionGate::Roll).await;
    assert!(handle.stage_snapshot().dice_hidden);
}

#[tokio::test(start_paused = true)]
async fn thorns_splash_lands_before_the_knight_strike() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 1)
        .face(Side::Enemy, 6)
        .instant_stops()
        .all_procs_off()
        .set(RollKind::EnemyMateriaGate, 0)
        .set(RollKind::EnemyMateriaKind, 1);
    let catalog = EnemyCatalog::new(vec![EnemyTemplate {
        id: "briar_knight".into(),
        name: "Briar Knight".into(),
        min_kills: 0,
        max_kills: None,
        base_hp: 1000,
        base_str: 1,
        base_agi: 1,
        base_def: 1,
        materia_chance: 100,
    }]);
    let handle = start_duel(rng, catalog, |c| {
        c.rules.player_max_hp = 100;
    });
    let mut combat = handle.subscribe(Topic::Combat);

    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();

    // 20% of the incoming 50 lands first, before the knight's approach.
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::DamageApplied {
            side: Side::Player,
            amount: 10,
            hp_after: 90,
            tag: DamageTag::Thorns,
        }
    );
    assert_eq!(
        next_combat(&mut combat).await,
        CombatEvent::DamageApplied {
            side: Side::Player,
            amount: 50,
            hp_after: 40,
            tag: DamageTag::Strike,
        }
    );
    wait_gate(&handle, ActionGate::Roll).await;
    assert_eq!(handle.snapshot().player_hp, 40);
}

#[tokio::test(start_paused = true)]
async fn pass_round_clears_outcome_without_damage() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 5)
        .face(Side::Enemy, 2)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(1000, 1, 1), |_| {});
    let mut combat = handle.subscribe(Topic::Combat);

    roll_until_outcome(&handle, &mut combat).await;
    handle.pass().await.unwrap();
    wait_gate(&handle, ActionGate::Roll).await;

    while let Ok(event) = combat.try_recv() {
        assert!(
            !matches!(event, Event::Combat(CombatEvent::DamageApplied { .. })),
            "pass round applied damage: {event:?}"
        );
    }
    let snap = handle.snapshot();
    assert_eq!(snap.last_outcome, None);
    assert_eq!(snap.player_hp, snap.player_max_hp as i64);
    assert_eq!(snap.enemy_hp, 1000);
}

#[tokio::test(start_paused = true)]
async fn stance_scales_attack_cost() {
    let rng = ScriptedRng::new()
        .face(Side::Player, 6)
        .face(Side::Enemy, 2)
        .instant_stops()
        .all_procs_off();
    let handle = start_duel(rng, fixed_catalog(1000, 1, 1), |c| {
        c.stamina.player_regen_per_tick = 0.0;
    });
    let mut combat = handle.subscribe(Topic::Combat);

    handle.set_stance(Stance::Fang).await.unwrap();
    roll_until_outcome(&handle, &mut combat).await;
    handle.attack().await.unwrap();
    wait_gate(&handle, ActionGate::Roll).await;

    let snap = handle.snapshot();
    assert_eq!(snap.stance, Stance::Fang);
    // Fang attack cost is ceil(15 * 1.35) = 21.
    assert_eq!(snap.player_stamina, 79.0);
}
