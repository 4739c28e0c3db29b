//! Shared test fixtures: a scripted RNG oracle and runtime builders.

use std::collections::HashMap;
use std::sync::Arc;

use duel_content::EngineConfig;
use duel_core::{EnemyCatalog, EnemyTemplate, PcgRng, RngOracle, RollKind, Side};
use duel_runtime::{Collaborators, DuelHandle, DuelRuntime, RuntimeConfig};

/// Oracle with per-[`RollKind`] fixed draws; kinds without an override fall
/// back to the deterministic default generator.
pub struct ScriptedRng {
    overrides: HashMap<RollKind, u32>,
    fallback: PcgRng,
}

#[allow(dead_code)]
impl ScriptedRng {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            fallback: PcgRng,
        }
    }

    /// Forces the raw draw for one decision point.
    pub fn set(mut self, kind: RollKind, raw: u32) -> Self {
        self.overrides.insert(kind, raw);
        self
    }

    /// Forces a die face (1-6) for one side.
    pub fn face(self, side: Side, face: u8) -> Self {
        self.set(RollKind::Face(side), face as u32 - 1)
    }

    /// Zero stop jitter for both dice so rolls settle at the minimum time.
    pub fn instant_stops(self) -> Self {
        self.set(RollKind::StopJitter(Side::Player), 0)
            .set(RollKind::StopJitter(Side::Enemy), 0)
    }

    /// Forces every probability-gated proc to fail.
    pub fn all_procs_off(self) -> Self {
        self.set(RollKind::Crit, 99)
            .set(RollKind::Multihit, 999)
            .set(RollKind::Evade, 999)
            .set(RollKind::Counter, 99)
            .set(RollKind::EnemyMateriaGate, 99)
            .set(RollKind::MateriaDrop, 99)
            .set(RollKind::RareBanter, 99)
    }
}

impl RngOracle for ScriptedRng {
    fn next_u32(&self, kind: RollKind, seed: u64) -> u32 {
        match self.overrides.get(&kind) {
            Some(&raw) => raw,
            None => self.fallback.next_u32(kind, seed),
        }
    }
}

/// A single-template catalog, handy for pinning enemy stats in tests.
pub fn fixed_catalog(hp: u32, str_: u32, def: u32) -> EnemyCatalog {
    EnemyCatalog::new(vec![EnemyTemplate {
        id: "sparring_knight".into(),
        name: "Sparring Knight".into(),
        min_kills: 0,
        max_kills: None,
        base_hp: hp,
        base_str: str_,
        base_agi: 1,
        base_def: def,
        materia_chance: 0,
    }])
}

/// Starts a runtime over the scripted oracle with an optional config tweak.
pub fn start_duel(
    rng: ScriptedRng,
    catalog: EnemyCatalog,
    tweak: impl FnOnce(&mut EngineConfig),
) -> DuelHandle {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut engine = EngineConfig::default();
    tweak(&mut engine);
    DuelRuntime::start(RuntimeConfig {
        engine,
        catalog,
        seed: 0xD1CE,
        rng: Arc::new(rng),
        collaborators: Collaborators::default(),
    })
}
