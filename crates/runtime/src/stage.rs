//! Presentation-facing stage state.
//!
//! Round procedures drive actor positions, poses, and UI gating through this
//! shared view model; a renderer polls [`SharedStage::snapshot`] each frame.
//! The core never blocks on the renderer.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use duel_content::StageConfig;
use duel_core::Side;

/// Animation pose of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pose {
    #[default]
    Idle,
    Run,
    Attack,
    Block,
    Hurt,
    Death,
}

/// Which player inputs are currently legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionGate {
    /// Nothing accepted (mid-procedure).
    Disabled,
    /// Only a roll is accepted.
    #[default]
    Roll,
    /// Attack and Pass are accepted.
    Combat,
}

/// Renderable state of one actor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActorView {
    pub x: f32,
    pub y: f32,
    pub home_x: f32,
    pub flip: bool,
    pub alpha: f32,
    pub pose: Pose,
}

impl ActorView {
    fn at_home(home_x: f32, y: f32, flip: bool) -> Self {
        Self {
            x: home_x,
            y,
            home_x,
            flip,
            alpha: 1.0,
            pose: Pose::Idle,
        }
    }
}

/// Full stage view model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub samurai: ActorView,
    pub knight: ActorView,
    pub gate: ActionGate,
    /// Dice sprites hidden (after a round consumes the faces).
    pub dice_hidden: bool,
    /// Remaining full-screen flash time in milliseconds.
    pub flash_ms: u64,
}

impl Stage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            samurai: ActorView::at_home(config.samurai_home_x, config.home_y, false),
            knight: ActorView::at_home(config.knight_home_x, config.home_y, true),
            gate: ActionGate::Roll,
            dice_hidden: false,
            flash_ms: 0,
        }
    }

    pub fn actor(&self, side: Side) -> &ActorView {
        match side {
            Side::Player => &self.samurai,
            Side::Enemy => &self.knight,
        }
    }

    pub fn actor_mut(&mut self, side: Side) -> &mut ActorView {
        match side {
            Side::Player => &mut self.samurai,
            Side::Enemy => &mut self.knight,
        }
    }
}

/// Stage handle shared by procedures and the renderer.
#[derive(Clone)]
pub struct SharedStage {
    inner: Arc<Mutex<Stage>>,
}

impl SharedStage {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Stage::new(config))),
        }
    }

    /// Runs a closure against the locked stage. The closure must not await.
    pub fn with<R>(&self, f: impl FnOnce(&mut Stage) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn snapshot(&self) -> Stage {
        self.with(|s| s.clone())
    }

    pub fn set_gate(&self, gate: ActionGate) {
        self.with(|s| s.gate = gate);
    }

    pub fn set_pose(&self, side: Side, pose: Pose) {
        self.with(|s| s.actor_mut(side).pose = pose);
    }

    pub fn set_alpha(&self, side: Side, alpha: f32) {
        self.with(|s| s.actor_mut(side).alpha = alpha);
    }

    pub fn set_x(&self, side: Side, x: f32) {
        self.with(|s| s.actor_mut(side).x = x);
    }

    pub fn x(&self, side: Side) -> f32 {
        self.with(|s| s.actor(side).x)
    }

    pub fn home_x(&self, side: Side) -> f32 {
        self.with(|s| s.actor(side).home_x)
    }

    /// Snaps an actor back to its home mark in idle.
    pub fn return_home(&self, side: Side) {
        self.with(|s| {
            let actor = s.actor_mut(side);
            actor.x = actor.home_x;
            actor.pose = Pose::Idle;
            actor.alpha = 1.0;
        });
    }

    pub fn flash(&self, duration_ms: u64) {
        self.with(|s| s.flash_ms = s.flash_ms.max(duration_ms));
    }

    pub fn hide_dice(&self) {
        self.with(|s| s.dice_hidden = true);
    }

    pub fn show_dice(&self) {
        self.with(|s| s.dice_hidden = false);
    }

    /// Decays the flash timer by one frame.
    pub fn tick(&self, dt_ms: u64) {
        self.with(|s| s.flash_ms = s.flash_ms.saturating_sub(dt_ms));
    }
}
