//! Content loaders for the dice duel.
//!
//! Converts external data files into the structures `duel-core` and the
//! runtime consume: the enemy template catalog (RON), the engine
//! balance/timing config (TOML), and the banter script (RON). Every loader
//! has an embedded fallback so a missing or broken file never prevents a
//! session from starting.

pub mod banter;
pub mod catalog;
pub mod config;

pub use banter::BanterScript;
pub use catalog::CatalogLoader;
pub use config::{EngineConfig, RulesConfig, StageConfig, StaminaConfig, TimingConfig};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
