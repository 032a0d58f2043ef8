use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::transcript::{CharacterMap, SceneDetails};

/// Settings for a transcript import, usually read from `screenplay.toml`:
///
/// ```toml
/// [scene]
/// int_ext = "INT."
/// location = "Cafe"
/// time = "DAY"
///
/// [characters]
/// Vivek = "VIVEK ROHTASVI"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    pub scene: SceneDetails,
    pub characters: CharacterMap,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Add a speaker mapping the way the import dialog does: rows missing
    /// either side are ignored and the canonical name is uppercased.
    /// Returns whether the row was kept.
    pub fn add_mapping(&mut self, from: &str, to: &str) -> bool {
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return false;
        }
        self.characters.insert(from.to_string(), to.to_uppercase());
        true
    }
}
