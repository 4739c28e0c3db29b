//! Optional collaborator seams for presentation side effects.
//!
//! Banter, particle effects, and audio are capabilities injected at startup.
//! Every call site goes through the guarded helpers on [`Collaborators`], so
//! an absent collaborator degrades to a no-op instead of an error.

use std::sync::Arc;

use duel_core::{RngOracle, RollKind, Side};

/// Speech-bubble sink.
pub trait BanterSink: Send + Sync {
    /// Cues a line for an actor. `category` names the situation ("attack",
    /// "hurt", "death", ...); `enemy_name` lets knight lines specialize.
    fn say(&self, actor: Side, category: &str, enemy_name: Option<&str>);

    /// One-off toast for a materia pickup.
    fn materia_note(&self, text: &str);
}

/// Visual effect cues the procedures emit.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectCue {
    DiceSmokeStart,
    DiceSmokeStop,
    DiceSmokeBurst,
    Dust { side: Side },
    Slash,
    KatanaSpin,
    Blood,
    AngelSpark,
    ShadowClone,
    ShadowClonesClear,
    DamageNumber {
        side: Side,
        text: String,
        emphasis: bool,
    },
}

/// Particle/overlay sink.
pub trait EffectSpawner: Send + Sync {
    fn spawn(&self, cue: EffectCue);
}

/// Sound sink.
pub trait AudioSink: Send + Sync {
    fn play(&self, sound: &str);
}

/// Capability record handed to the engine at startup. All fields optional.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub banter: Option<Arc<dyn BanterSink>>,
    pub effects: Option<Arc<dyn EffectSpawner>>,
    pub audio: Option<Arc<dyn AudioSink>>,
}

impl Collaborators {
    pub fn say(&self, actor: Side, category: &str, enemy_name: Option<&str>) {
        if let Some(banter) = &self.banter {
            banter.say(actor, category, enemy_name);
        }
    }

    pub fn materia_note(&self, text: &str) {
        if let Some(banter) = &self.banter {
            banter.materia_note(text);
        }
    }

    pub fn effect(&self, cue: EffectCue) {
        if let Some(effects) = &self.effects {
            effects.spawn(cue);
        }
    }

    pub fn play(&self, sound: &str) {
        if let Some(audio) = &self.audio {
            audio.play(sound);
        }
    }
}

/// [`BanterSink`] backed by a loaded script: picks a random line from the
/// pool and logs it. A real frontend would render a speech bubble instead.
pub struct ScriptDialogue {
    script: duel_content::BanterScript,
    rng: Arc<dyn RngOracle>,
    seed: u64,
}

impl ScriptDialogue {
    pub fn new(script: duel_content::BanterScript, rng: Arc<dyn RngOracle>, seed: u64) -> Self {
        Self { script, rng, seed }
    }
}

impl BanterSink for ScriptDialogue {
    fn say(&self, actor: Side, category: &str, enemy_name: Option<&str>) {
        let actor_key = match actor {
            Side::Player => "samurai",
            Side::Enemy => "knight",
        };
        let Some(pool) = self.script.lines(actor_key, category, enemy_name) else {
            return;
        };
        if pool.is_empty() {
            return;
        }
        let seed = self.seed.wrapping_add(category.len() as u64);
        let idx = self.rng.pick(RollKind::RareBanter, seed, pool.len() as u32) as usize;
        tracing::info!(target: "duel::banter", "{actor_key}: {}", pool[idx]);
    }

    fn materia_note(&self, text: &str) {
        tracing::info!(target: "duel::banter", "materia: {text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingEffects {
        cues: Mutex<Vec<EffectCue>>,
    }

    impl EffectSpawner for RecordingEffects {
        fn spawn(&self, cue: EffectCue) {
            self.cues.lock().unwrap().push(cue);
        }
    }

    #[test]
    fn absent_collaborators_are_noops() {
        let collab = Collaborators::default();
        collab.say(Side::Player, "attack", None);
        collab.effect(EffectCue::Slash);
        collab.play("clash");
    }

    #[test]
    fn effect_cues_reach_the_spawner() {
        let effects = Arc::new(RecordingEffects::default());
        let collab = Collaborators {
            effects: Some(effects.clone() as Arc<dyn EffectSpawner>),
            ..Default::default()
        };
        collab.effect(EffectCue::Dust { side: Side::Enemy });
        collab.effect(EffectCue::Slash);
        let cues = effects.cues.lock().unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1], EffectCue::Slash);
    }
}
