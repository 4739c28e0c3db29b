//! Enemy catalog loader.
//!
//! RON format: `Vec<EnemyTemplate>`, ordered by tier. A load failure falls
//! back to the built-in catalog so enemy spawning never fails.

use std::path::Path;

use duel_core::{EnemyCatalog, EnemyTemplate};

use crate::{LoadResult, read_file};

/// Loader for the enemy template catalog.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Loads and validates a catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<EnemyCatalog> {
        let content = read_file(path)?;
        let templates: Vec<EnemyTemplate> = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse enemy catalog RON: {}", e))?;

        if templates.is_empty() {
            anyhow::bail!("enemy catalog is empty");
        }
        for t in &templates {
            if let Some(max) = t.max_kills
                && max < t.min_kills
            {
                anyhow::bail!(
                    "enemy template '{}' has inverted kill window [{}, {}]",
                    t.id,
                    t.min_kills,
                    max
                );
            }
            if t.base_hp == 0 {
                anyhow::bail!("enemy template '{}' has zero base HP", t.id);
            }
            if t.materia_chance > 100 {
                anyhow::bail!(
                    "enemy template '{}' materia chance {} exceeds 100",
                    t.id,
                    t.materia_chance
                );
            }
        }

        Ok(EnemyCatalog::new(templates))
    }

    /// Loads a catalog, falling back to the built-in tiers on any failure.
    pub fn load_or_fallback(path: &Path) -> EnemyCatalog {
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!("enemy catalog load failed, using fallback: {err}");
                EnemyCatalog::fallback()
            }
        }
    }
}
