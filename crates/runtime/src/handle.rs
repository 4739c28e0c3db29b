//! Client-facing handle and runtime startup.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::info;

use duel_content::EngineConfig;
use duel_core::{EnemyCatalog, MateriaKind, PcgRng, RngOracle, Stance};

use crate::collab::Collaborators;
use crate::engine::{Command, EngineWorker};
use crate::error::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::session::{CombatSession, SessionSnapshot, SharedSession};
use crate::stage::{SharedStage, Stage};

/// Startup configuration for a duel runtime.
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub catalog: EnemyCatalog,
    pub seed: u64,
    pub rng: Arc<dyn RngOracle>,
    pub collaborators: Collaborators,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            catalog: EnemyCatalog::fallback(),
            seed: 0,
            rng: Arc::new(PcgRng),
            collaborators: Collaborators::default(),
        }
    }
}

/// Owns the engine worker task.
pub struct DuelRuntime;

impl DuelRuntime {
    /// Spawns the engine worker and returns the handle clients drive it with.
    pub fn start(config: RuntimeConfig) -> DuelHandle {
        let session = SharedSession::new(CombatSession::new(
            config.seed,
            &config.engine.rules,
            &config.engine.stamina,
            &config.catalog,
            &*config.rng,
        ));
        let stage = SharedStage::new(&config.engine.stage);
        let bus = EventBus::new();
        let (command_tx, command_rx) = mpsc::channel(32);

        let worker = EngineWorker::new(
            session.clone(),
            stage.clone(),
            bus.clone(),
            config.rng,
            Arc::new(config.engine),
            Arc::new(config.catalog),
            config.collaborators,
            command_rx,
        );
        tokio::spawn(worker.run());
        info!(seed = config.seed, "duel runtime started");

        DuelHandle {
            command_tx,
            bus,
            session,
            stage,
        }
    }
}

/// Client-facing handle to interact with a running duel.
#[derive(Clone)]
pub struct DuelHandle {
    command_tx: mpsc::Sender<Command>,
    bus: EventBus,
    session: SharedSession,
    stage: SharedStage,
}

impl DuelHandle {
    async fn send(&self, cmd: Command) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::EngineClosed)
    }

    /// Begin a new round's dice.
    pub async fn roll(&self) -> Result<()> {
        self.send(Command::Roll).await
    }

    /// Commit to the stored (or face-derived) round outcome.
    pub async fn attack(&self) -> Result<()> {
        self.send(Command::Attack).await
    }

    /// Skip combat for stamina recovery.
    pub async fn pass(&self) -> Result<()> {
        self.send(Command::Pass).await
    }

    pub async fn set_stance(&self, stance: Stance) -> Result<()> {
        self.send(Command::SetStance(stance)).await
    }

    pub async fn cycle_stance(&self, forward: bool) -> Result<()> {
        self.send(Command::CycleStance { forward }).await
    }

    /// Equips an owned materia. Returns false if the kind is not in the
    /// inventory.
    pub async fn equip(&self, kind: MateriaKind) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Equip { kind, reply }).await?;
        rx.await.map_err(|_| RuntimeError::EngineClosed)
    }

    /// Unequips a materia. Returns whether it was equipped.
    pub async fn unequip(&self, kind: MateriaKind) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Unequip { kind, reply }).await?;
        rx.await.map_err(|_| RuntimeError::EngineClosed)
    }

    /// Point-in-time copy of the combat state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Point-in-time copy of the presentation state.
    pub fn stage_snapshot(&self) -> Stage {
        self.stage.snapshot()
    }

    /// Subscribe to one event topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.bus.subscribe(topic)
    }
}
