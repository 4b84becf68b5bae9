use crate::quality::QualityThresholds;
use crate::sample;
use crate::scoring::BatchPolicy;
use crate::storage::{write_items, write_programs};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    pub programs_csv: PathBuf,
    pub items_csv: PathBuf,
    pub favorites_json: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScoringConfig {
    pub batch_policy: BatchPolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UiConfig {
    pub currency_symbol: String,
    pub good_value_threshold: f64,
    pub poor_value_threshold: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub paths: PathsConfig,
    pub scoring: ScoringConfig,
    pub quality: QualityThresholds,
    pub ui: UiConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub base_dir: PathBuf,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let dirs = project_dirs()?;
        Self::load_from(dirs.data_dir())
    }

    /// Reads `settings.json` under `base_dir`, writing defaults and the sample
    /// catalog on first use.
    pub fn load_from(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir)
            .with_context(|| format!("Failed to create {}", base_dir.display()))?;

        let settings_path = base_dir.join("settings.json");
        let settings: Settings = load_or_write(&settings_path, default_settings(base_dir))?;

        if !settings.paths.programs_csv.exists() {
            write_programs(&settings.paths.programs_csv, &sample::programs())?;
            info!(path = %settings.paths.programs_csv.display(), "Wrote sample programs");
        }
        if !settings.paths.items_csv.exists() {
            write_items(&settings.paths.items_csv, &sample::items())?;
            info!(path = %settings.paths.items_csv.display(), "Wrote sample items");
        }

        Ok(AppConfig {
            settings,
            base_dir: base_dir.to_path_buf(),
        })
    }
}

fn load_or_write<T>(path: &Path, default: T) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    if !path.exists() {
        let data = serde_json::to_string_pretty(&default)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        return Ok(default);
    }
    let bytes =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(value)
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "example", "reward_ranker")
        .context("Unable to determine platform data directory")
}

fn default_settings(base_dir: &Path) -> Settings {
    let data_dir = base_dir.join("data");
    Settings {
        paths: PathsConfig {
            programs_csv: data_dir.join("programs.csv"),
            items_csv: data_dir.join("items.csv"),
            favorites_json: base_dir.join("favorites.json"),
        },
        scoring: ScoringConfig {
            batch_policy: BatchPolicy::Isolate,
        },
        quality: QualityThresholds::default(),
        ui: UiConfig {
            currency_symbol: "$".into(),
            good_value_threshold: 100.0,
            poor_value_threshold: 50.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{read_items, read_programs};
    use tempfile::tempdir;

    #[test]
    fn test_first_load_writes_defaults_and_sample() {
        let dir = tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path()).unwrap();

        assert!(dir.path().join("settings.json").exists());
        assert_eq!(cfg.settings.scoring.batch_policy, BatchPolicy::Isolate);
        assert_eq!(read_programs(&cfg.settings.paths.programs_csv).unwrap(), sample::programs());
        assert_eq!(read_items(&cfg.settings.paths.items_csv).unwrap(), sample::items());
    }

    #[test]
    fn test_existing_settings_are_respected() {
        let dir = tempdir().unwrap();
        let mut settings = default_settings(dir.path());
        settings.scoring.batch_policy = BatchPolicy::FailFast;
        settings.ui.currency_symbol = "€".into();
        fs::write(
            dir.path().join("settings.json"),
            serde_json::to_string(&settings).unwrap(),
        )
        .unwrap();

        let cfg = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(cfg.settings.scoring.batch_policy, BatchPolicy::FailFast);
        assert_eq!(cfg.settings.ui.currency_symbol, "€");
    }

    #[test]
    fn test_broken_settings_name_the_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
        let err = AppConfig::load_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("settings.json"));
    }
}
