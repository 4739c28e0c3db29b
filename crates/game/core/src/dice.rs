//! Die roll state machine: `idle -> rolling -> result`.
//!
//! A roll is started with a predetermined target face; the rolling phase is
//! purely cosmetic (bounce/wobble physics plus face flicker) and the die
//! never reports a result before its randomized stop deadline. The finish
//! signal fires exactly once per roll no matter how many update ticks land
//! after the deadline.

use crate::outcome::Side;
use crate::rng::{RngOracle, RollKind};

/// Minimum rolling time before the stop deadline, in ms.
pub const MIN_ROLL_MS: u64 = 900;

/// Maximum extra randomized rolling time, in ms (deadline is 900-1500 ms).
pub const MAX_STOP_JITTER_MS: u64 = 600;

/// Cosmetic face flicker interval while rolling, in ms.
const FLICKER_INTERVAL_MS: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("invalid dice face {0} (expected 1-6)")]
    InvalidFace(u8),
}

/// Phase of one die's roll state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiePhase {
    #[default]
    Idle,
    Rolling,
    Result,
}

/// Signal emitted by [`Die::update`] when the roll completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DieEvent {
    Finished { face: u8 },
}

/// One die. The player and enemy dice are independent instances.
#[derive(Clone, Debug)]
pub struct Die {
    side: Side,
    phase: DiePhase,
    target_face: Option<u8>,
    result: Option<u8>,
    /// Face currently shown: flicker noise while rolling, the target face
    /// once stopped, `None` when idle.
    shown_face: Option<u8>,
    stop_at_ms: u64,
    flicker_timer_ms: f32,
    finished_fired: bool,

    // Cosmetic physics; no gameplay effect.
    pub bounce_y: f32,
    pub bounce_vel: f32,
    pub scale: f32,
    scale_vel: f32,
}

impl Die {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            phase: DiePhase::Idle,
            target_face: None,
            result: None,
            shown_face: None,
            stop_at_ms: 0,
            flicker_timer_ms: 0.0,
            finished_fired: false,
            bounce_y: 0.0,
            bounce_vel: 0.0,
            scale: 1.0,
            scale_vel: 0.0,
        }
    }

    pub fn phase(&self) -> DiePhase {
        self.phase
    }

    /// The settled face, available once the die reaches `result`.
    pub fn result(&self) -> Option<u8> {
        self.result
    }

    pub fn shown_face(&self) -> Option<u8> {
        self.shown_face
    }

    /// Hides the displayed face (loser-die suppression during the reveal).
    pub fn hide_face(&mut self) {
        self.shown_face = None;
    }

    /// Starts a roll toward `face`. `jitter_ms` randomizes the stop
    /// deadline within `[MIN_ROLL_MS, MIN_ROLL_MS + MAX_STOP_JITTER_MS)`.
    ///
    /// An out-of-range face is rejected and the die is left unchanged.
    pub fn roll(&mut self, face: u8, now_ms: u64, jitter_ms: u64) -> Result<(), DiceError> {
        if !(1..=6).contains(&face) {
            return Err(DiceError::InvalidFace(face));
        }
        self.target_face = Some(face);
        self.result = None;
        self.shown_face = Some(1);
        self.phase = DiePhase::Rolling;
        self.stop_at_ms = now_ms + MIN_ROLL_MS + jitter_ms.min(MAX_STOP_JITTER_MS.saturating_sub(1));
        self.flicker_timer_ms = 0.0;
        self.scale = 1.0;
        self.scale_vel = 0.0;
        self.bounce_y = 0.0;
        self.bounce_vel = -6.0;
        self.finished_fired = false;
        Ok(())
    }

    /// Force-returns to idle, suppressing any pending finish signal.
    pub fn clear(&mut self) {
        self.phase = DiePhase::Idle;
        self.target_face = None;
        self.result = None;
        self.shown_face = None;
        self.scale = 1.0;
        self.scale_vel = 0.0;
        self.bounce_y = 0.0;
        self.bounce_vel = 0.0;
        self.finished_fired = true;
    }

    /// Advances physics and flicker; at the stop deadline, locks the target
    /// face and fires [`DieEvent::Finished`] exactly once.
    pub fn update(
        &mut self,
        dt_ms: f32,
        now_ms: u64,
        rng: &dyn RngOracle,
    ) -> Option<DieEvent> {
        if self.phase != DiePhase::Rolling {
            return None;
        }

        // Bounce motion.
        self.bounce_vel += 0.45;
        self.bounce_y += self.bounce_vel;
        if self.bounce_y > 18.0 {
            self.bounce_y = 18.0;
            self.bounce_vel *= -0.55;
        }

        // Wobble scale, bounded so the sprite never degenerates.
        let wobble_seed = now_ms ^ 0x5bd1;
        let wobble = rng.pick(RollKind::Flicker(self.side), wobble_seed, 11) as f32 / 100.0 - 0.05;
        self.scale_vel = (self.scale_vel + wobble) * 0.85;
        self.scale = (self.scale + self.scale_vel).clamp(0.85, 1.15);

        if now_ms >= self.stop_at_ms {
            self.phase = DiePhase::Result;
            self.scale = 1.0;
            self.bounce_y = 18.0;
            let face = self.target_face.unwrap_or(1);
            self.result = Some(face);
            self.shown_face = Some(face);
            if !self.finished_fired {
                self.finished_fired = true;
                return Some(DieEvent::Finished { face });
            }
            return None;
        }

        // Face flicker for visual effect only.
        self.flicker_timer_ms += dt_ms;
        if self.flicker_timer_ms >= FLICKER_INTERVAL_MS {
            self.flicker_timer_ms = 0.0;
            self.shown_face = Some(rng.face(RollKind::Flicker(self.side), now_ms));
        }

        None
    }
}
