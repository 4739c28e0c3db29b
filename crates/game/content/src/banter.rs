//! Banter script loading.
//!
//! The combat core only issues fire-and-forget `say(actor, category, name)`
//! cues; this module supplies the line pools those cues draw from. Knight
//! lines may be specialized per enemy name with a `generic` fallback, the
//! samurai has flat categories.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::{LoadResult, read_file};

/// Line pools for both actors.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BanterScript {
    /// category -> lines
    pub samurai: HashMap<String, Vec<String>>,
    /// enemy name (or "generic") -> category -> lines
    pub knight: HashMap<String, HashMap<String, Vec<String>>>,
}

impl BanterScript {
    /// Loads a script from a RON file.
    pub fn load(path: &Path) -> LoadResult<Self> {
        let content = read_file(path)?;
        ron::from_str(&content).map_err(|e| anyhow::anyhow!("Failed to parse banter RON: {}", e))
    }

    /// Loads a script, falling back to the embedded lines on failure.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(script) => script,
            Err(err) => {
                tracing::warn!("banter script load failed, using embedded lines: {err}");
                Self::embedded()
            }
        }
    }

    /// Minimal embedded script so cues always have something to say.
    pub fn embedded() -> Self {
        let mut samurai = HashMap::new();
        samurai.insert("attack".into(), vec!["No hesitation.".into()]);
        samurai.insert("hit".into(), vec!["Too slow.".into()]);
        samurai.insert("hurt".into(), vec!["Tch.".into()]);
        samurai.insert("pass".into(), vec!["Patience.".into()]);
        samurai.insert("death".into(), vec!["...so be it.".into()]);
        samurai.insert("found".into(), vec!["This will serve.".into()]);
        samurai.insert("roll".into(), vec!["Again.".into()]);

        let mut generic = HashMap::new();
        generic.insert("intro".into(), vec!["Another challenger.".into()]);
        generic.insert("hit".into(), vec!["Yield!".into()]);
        generic.insert("hurt".into(), vec!["Grk--".into()]);
        generic.insert("death".into(), vec!["Impossible...".into()]);
        generic.insert("pass".into(), vec!["Coward.".into()]);
        generic.insert("roll".into(), vec!["Fate decides.".into()]);

        let mut knight = HashMap::new();
        knight.insert("generic".into(), generic);

        Self { samurai, knight }
    }

    /// Looks up the line pool for a cue. Knight lookups try the named enemy
    /// first, then the generic pool.
    pub fn lines(&self, actor: &str, category: &str, enemy_name: Option<&str>) -> Option<&[String]> {
        match actor {
            "samurai" => self.samurai.get(category).map(Vec::as_slice),
            "knight" => {
                if let Some(name) = enemy_name
                    && let Some(pool) = self.knight.get(name).and_then(|c| c.get(category))
                {
                    return Some(pool);
                }
                self.knight
                    .get("generic")
                    .and_then(|c| c.get(category))
                    .map(Vec::as_slice)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn named_enemy_overrides_generic() {
        let mut script = BanterScript::embedded();
        let mut named = HashMap::new();
        named.insert("intro".into(), vec!["We meet again.".into()]);
        script.knight.insert("Pale Judge".into(), named);

        let lines = script.lines("knight", "intro", Some("Pale Judge")).unwrap();
        assert_eq!(lines, ["We meet again."]);
        // Unknown name falls back to generic.
        let generic = script.lines("knight", "intro", Some("Nobody")).unwrap();
        assert_eq!(generic, ["Another challenger."]);
    }

    #[test]
    fn unknown_actor_is_none() {
        assert!(BanterScript::embedded().lines("narrator", "intro", None).is_none());
    }

    #[test]
    fn loads_ron_script() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"(
                samurai: { "attack": ["Ha!"] },
                knight: { "generic": { "intro": ["Halt."] } },
            )"#,
        )
        .unwrap();
        let script = BanterScript::load(file.path()).unwrap();
        assert_eq!(script.lines("samurai", "attack", None).unwrap(), ["Ha!"]);
    }
}
