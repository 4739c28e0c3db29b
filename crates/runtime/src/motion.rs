//! Timed actor movement helpers used by round procedures.
//!
//! Each helper is a cooperative loop: move one step, sleep one frame, repeat.
//! Stamina regen keeps ticking in the worker while these sleeps are pending.

use std::time::Duration;

use duel_core::Side;

use crate::stage::{Pose, SharedStage};

/// Walks an actor toward `target_x` at `speed` world units per frame, then
/// leaves it in the given pose.
pub async fn move_actor(
    stage: &SharedStage,
    side: Side,
    target_x: f32,
    speed: f32,
    tick_ms: u64,
    arrive_pose: Pose,
) {
    stage.set_pose(side, Pose::Run);
    loop {
        let arrived = stage.with(|s| {
            let actor = s.actor_mut(side);
            let delta = target_x - actor.x;
            if delta.abs() <= speed {
                actor.x = target_x;
                true
            } else {
                actor.x += speed.copysign(delta);
                false
            }
        });
        if arrived {
            break;
        }
        tokio::time::sleep(Duration::from_millis(tick_ms)).await;
    }
    stage.set_pose(side, arrive_pose);
}

/// Alpha-blinks an actor for a respawn flourish.
pub async fn blink_actor(stage: &SharedStage, side: Side, pulses: u32, pulse_ms: u64) {
    for _ in 0..pulses {
        stage.set_alpha(side, 0.25);
        tokio::time::sleep(Duration::from_millis(pulse_ms)).await;
        stage.set_alpha(side, 1.0);
        tokio::time::sleep(Duration::from_millis(pulse_ms)).await;
    }
}

/// Fades an actor to zero alpha over `duration_ms`.
pub async fn fade_out(stage: &SharedStage, side: Side, duration_ms: u64, tick_ms: u64) {
    let steps = (duration_ms / tick_ms).max(1);
    for step in 1..=steps {
        let alpha = 1.0 - step as f32 / steps as f32;
        stage.set_alpha(side, alpha.max(0.0));
        tokio::time::sleep(Duration::from_millis(tick_ms)).await;
    }
    stage.set_alpha(side, 0.0);
}
