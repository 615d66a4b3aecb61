//! Configuration system for causalab.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/causalab/config.toml` and/or `.causalab/config.toml`
//! in the workspace directory.

use crate::error::ConfigError;
use crate::search::HyperparameterGrid;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CausalabConfig {
    /// Python runtime used by the discovery backends.
    #[serde(default)]
    pub python: PythonConfig,
    /// Cross-validation settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Default hyperparameter grids per algorithm.
    #[serde(default)]
    pub grids: GridsConfig,
}

/// Python runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PythonConfig {
    /// Path to Python executable (`python3` if not set).
    #[serde(default)]
    pub python_path: Option<PathBuf>,
    /// Path to a virtual environment (auto-detected if not set).
    #[serde(default)]
    pub venv_path: Option<PathBuf>,
    /// Wall-clock budget for one backend invocation (seconds).
    #[serde(default = "default_python_timeout")]
    pub timeout_secs: u64,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            python_path: None,
            venv_path: None,
            timeout_secs: default_python_timeout(),
        }
    }
}

fn default_python_timeout() -> u64 {
    300
}

/// Cross-validation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of folds.
    #[serde(default = "default_n_splits")]
    pub n_splits: usize,
    /// Seed for the fold shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_splits: default_n_splits(),
            seed: default_seed(),
        }
    }
}

fn default_n_splits() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

/// Default grid per discovery algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridsConfig {
    #[serde(default = "default_pc_grid")]
    pub pc: HyperparameterGrid,
    #[serde(default = "default_ica_lingam_grid")]
    pub ica_lingam: HyperparameterGrid,
    #[serde(default = "default_direct_lingam_grid")]
    pub direct_lingam: HyperparameterGrid,
}

impl Default for GridsConfig {
    fn default() -> Self {
        Self {
            pc: default_pc_grid(),
            ica_lingam: default_ica_lingam_grid(),
            direct_lingam: default_direct_lingam_grid(),
        }
    }
}

fn default_pc_grid() -> HyperparameterGrid {
    HyperparameterGrid::new()
        .with_param("alpha", [0.01, 0.05, 0.1])
        .with_param("stable", [true, false])
        .with_param("uc_rule", [0, 1, 2])
}

fn default_ica_lingam_grid() -> HyperparameterGrid {
    HyperparameterGrid::new().with_param("max_iter", [500, 1000, 1500, 2000, 2500])
}

fn default_direct_lingam_grid() -> HyperparameterGrid {
    HyperparameterGrid::new().with_param("measure", ["default", "pwling", "pwling_fast"])
}

impl CausalabConfig {
    /// Reject values the search cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.n_splits < 2 {
            return Err(ConfigError::Invalid {
                field: "search.n_splits".into(),
                reason: format!("must be at least 2, got {}", self.search.n_splits),
            });
        }
        if self.python.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "python.timeout_secs".into(),
                reason: "must be positive".into(),
            });
        }
        for (name, grid) in [
            ("grids.pc", &self.grids.pc),
            ("grids.ica_lingam", &self.grids.ica_lingam),
            ("grids.direct_lingam", &self.grids.direct_lingam),
        ] {
            grid.validate().map_err(|e| ConfigError::Invalid {
                field: name.into(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "causalab", "causalab")
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".causalab").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `CAUSALAB_`)
/// 3. Workspace-local config (`.causalab/config.toml`)
/// 4. User config (`~/.config/causalab/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&CausalabConfig>,
) -> Result<CausalabConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(CausalabConfig::default()));

    if let Some(dirs) = project_dirs() {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // CAUSALAB_SEARCH__SEED, CAUSALAB_PYTHON__TIMEOUT_SECS, etc.
    figment = figment.merge(Env::prefixed("CAUSALAB_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: CausalabConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}

/// Check whether a user-level or workspace-level config file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(dirs) = project_dirs() {
        if dirs.config_dir().join("config.toml").exists() {
            return true;
        }
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}
