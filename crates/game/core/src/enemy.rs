//! Enemy templates, the kill-count tier catalog, and the spawn factory.
//!
//! Spawning is total: if no template's kill window matches, the factory
//! falls back to the hardest unlocked template, and failing that to the
//! first entry of the built-in catalog.

use crate::materia::{EnemyMateriaKind, assign_enemy_materia};
use crate::rng::{RngOracle, RollKind};
use crate::stats::CombatStats;

/// One entry of the enemy catalog.
///
/// `min_kills..=max_kills` is the eligibility window; `max_kills: None`
/// means open-ended. `materia_chance` is a percentage gate for the
/// spawn-time trait roll.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyTemplate {
    pub id: String,
    pub name: String,
    pub min_kills: u32,
    pub max_kills: Option<u32>,
    pub base_hp: u32,
    pub base_str: u32,
    pub base_agi: u32,
    pub base_def: u32,
    pub materia_chance: u32,
}

/// A live enemy instance, replaced on every defeat-respawn cycle.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Enemy {
    pub id: String,
    pub name: String,
    pub stats: CombatStats,
    pub hp: i64,
    pub max_hp: u32,
    pub materia: Option<EnemyMateriaKind>,
    pub is_poisoned: bool,
}

impl Enemy {
    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }

    /// Restores full HP (respawn of the same slot).
    pub fn heal_full(&mut self) {
        self.hp = self.max_hp as i64;
    }

    pub fn has_materia(&self, kind: EnemyMateriaKind) -> bool {
        self.materia == Some(kind)
    }
}

/// Ordered template collection with the spawn rules.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyCatalog {
    templates: Vec<EnemyTemplate>,
}

impl EnemyCatalog {
    /// Wraps a loaded template list; an empty list falls back to the
    /// built-in catalog so spawning can never fail.
    pub fn new(templates: Vec<EnemyTemplate>) -> Self {
        if templates.is_empty() {
            Self::fallback()
        } else {
            Self { templates }
        }
    }

    /// Built-in four-tier catalog used when external data is unavailable.
    pub fn fallback() -> Self {
        let t = |id: &str, name: &str, min, max, hp, str_, agi, def, chance| EnemyTemplate {
            id: id.into(),
            name: name.into(),
            min_kills: min,
            max_kills: max,
            base_hp: hp,
            base_str: str_,
            base_agi: agi,
            base_def: def,
            materia_chance: chance,
        };
        Self {
            templates: vec![
                t("novice_knight", "Novice Knight", 0, Some(4), 5, 1, 1, 1, 3),
                t("knight", "Knight", 5, Some(9), 12, 2, 1, 2, 8),
                t("elite_knight", "Elite Knight", 10, Some(19), 25, 3, 2, 3, 15),
                t("champion_knight", "Champion Knight", 20, None, 40, 4, 3, 4, 22),
            ],
        }
    }

    pub fn templates(&self) -> &[EnemyTemplate] {
        &self.templates
    }

    /// Picks the template for the given kill count.
    ///
    /// Uniform pick among templates whose window contains `kills`; if none
    /// match, the unlocked template with the highest `min_kills`; if still
    /// none, the first built-in fallback entry.
    pub fn pick_template(&self, kills: u32, rng: &dyn RngOracle, seed: u64) -> EnemyTemplate {
        let candidates: Vec<&EnemyTemplate> = self
            .templates
            .iter()
            .filter(|t| kills >= t.min_kills && t.max_kills.is_none_or(|max| kills <= max))
            .collect();

        if !candidates.is_empty() {
            let idx = rng.pick(RollKind::TemplatePick, seed, candidates.len() as u32) as usize;
            return candidates[idx].clone();
        }

        self.templates
            .iter()
            .filter(|t| kills >= t.min_kills)
            .max_by_key(|t| t.min_kills)
            .cloned()
            .unwrap_or_else(|| Self::fallback().templates[0].clone())
    }

    /// Instantiates a fresh, fully healed enemy for the given kill count,
    /// rolling its spawn-time materia trait.
    pub fn spawn(&self, kills: u32, rng: &dyn RngOracle, seed: u64) -> Enemy {
        let template = self.pick_template(kills, rng, seed);
        let materia = assign_enemy_materia(template.materia_chance, rng, seed);
        Enemy {
            id: template.id,
            name: template.name,
            stats: CombatStats {
                str_: template.base_str,
                agi: template.base_agi,
                def: template.base_def,
            },
            hp: template.base_hp as i64,
            max_hp: template.base_hp,
            materia,
            is_poisoned: false,
        }
    }
}

impl Default for EnemyCatalog {
    fn default() -> Self {
        Self::fallback()
    }
}
