use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::config::themes::ThemeName;
use crate::storage::SortMode;

pub mod themes;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "ks";
const APP_NAME: &str = "ks";

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub notes_dir: PathBuf,
}

impl ConfigPaths {
    /// Resolves locations from CLI flags first, env vars second, and the
    /// platform project directories last.
    pub fn discover(
        config_override: Option<PathBuf>,
        notes_override: Option<PathBuf>,
    ) -> Result<Self> {
        let env_config = env::var("KS_CONFIG").ok().map(PathBuf::from);
        let env_notes = env::var("KS_NOTES_DIR").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_file = config_override
            .or(env_config)
            .unwrap_or_else(|| project_dirs.config_dir().join("config.toml"));
        let notes_dir = notes_override
            .or(env_notes)
            .unwrap_or_else(|| project_dirs.data_dir().to_path_buf());

        Ok(Self {
            config_file,
            notes_dir,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub theme: ThemeName,
    pub default_sort: SortMode,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreviewConfig {
    pub visible: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { visible: true }
    }
}

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn new(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Loads the config, writing a default file on first run.
    pub fn load_or_init(&self) -> Result<AppConfig> {
        if !self.paths.config_file.exists() {
            let default_cfg = AppConfig::default();
            self.save(&default_cfg)?;
            return Ok(default_cfg);
        }
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        toml::from_str(&raw).context("parsing config toml")
    }

    pub fn save(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&self.paths.config_file, toml)
            .with_context(|| format!("writing config {}", self.paths.config_file.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_load_writes_defaults_to_disk() {
        let temp = TempDir::new().expect("temp dir");
        let paths = ConfigPaths {
            config_file: temp.path().join("cfg/config.toml"),
            notes_dir: temp.path().join("notes"),
        };
        let loader = ConfigLoader::new(paths.clone());

        let cfg = loader.load_or_init().expect("init config");
        assert_eq!(cfg, AppConfig::default());
        assert!(paths.config_file.exists());
    }

    #[test]
    fn saved_settings_survive_a_reload() {
        let temp = TempDir::new().expect("temp dir");
        let paths = ConfigPaths {
            config_file: temp.path().join("config.toml"),
            notes_dir: temp.path().join("notes"),
        };
        let loader = ConfigLoader::new(paths);

        let cfg = AppConfig {
            theme: ThemeName::Ocean,
            default_sort: SortMode::Date,
            preview: PreviewConfig { visible: false },
        };
        loader.save(&cfg).expect("save config");
        assert_eq!(loader.load_or_init().expect("reload"), cfg);
    }

    #[test]
    fn explicit_paths_win_over_environment() {
        let explicit = PathBuf::from("/tmp/explicit-config.toml");
        let notes = PathBuf::from("/tmp/explicit-notes");
        let paths = ConfigPaths::discover(Some(explicit.clone()), Some(notes.clone()))
            .expect("discover paths");
        assert_eq!(paths.config_file, explicit);
        assert_eq!(paths.notes_dir, notes);
    }
}
