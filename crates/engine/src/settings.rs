use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use bubbles::Growth;

/// Coordinator tuning knobs.
///
/// Every field has a default, so a settings file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    pub growth: Growth,
    /// Playback handles allocated on activation.
    pub pool_size: usize,
    /// Volume for every pop cue, 0.0..=1.0.
    pub volume: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            growth: Growth::default(),
            pool_size: 4,
            volume: 1.0,
        }
    }
}

impl FieldSettings {
    /// Loads settings from a TOML file, filling unnamed fields with
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_classic_toy() {
        let settings = FieldSettings::default();
        assert_eq!(settings.pool_size, 4);
        assert_eq!(settings.volume, 1.0);
        assert_eq!(settings.growth.max_radius, 100.0);
    }

    #[test]
    fn partial_files_merge_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pool_size = 2\n\n[growth]\nmax_radius = 50.0").unwrap();

        let settings = FieldSettings::load(file.path()).unwrap();
        assert_eq!(settings.pool_size, 2);
        assert_eq!(settings.growth.max_radius, 50.0);
        // Untouched knobs keep their defaults.
        assert_eq!(settings.growth.initial_radius, 20.0);
        assert_eq!(settings.volume, 1.0);
    }

    #[test]
    fn unreadable_and_invalid_files_report_typed_errors() {
        let missing = FieldSettings::load(Path::new("/nonexistent/bubbles.toml"));
        assert!(matches!(missing, Err(SettingsError::Read { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pool_size = \"many\"").unwrap();
        let invalid = FieldSettings::load(file.path());
        assert!(matches!(invalid, Err(SettingsError::Parse { .. })));
    }
}
