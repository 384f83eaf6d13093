//! Configuration file support for deminify
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.deminifyrc.json` in project root
//! 3. `deminify.config.json` in project root
//! 4. `"deminify"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::report::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Deminify configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeminifyConfig {
    /// Directory holding minified scripts and their source maps,
    /// relative to the config file's directory
    #[serde(default)]
    pub artifacts_dir: Option<String>,

    /// Resolve function names only, without source maps (default: false)
    #[serde(default)]
    pub name_only: Option<bool>,

    /// Deminify frames in parallel (default: false)
    #[serde(default)]
    pub parallel: Option<bool>,

    /// Output format: "text" or "json" (default: text)
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

/// Resolved configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub artifacts_dir: Option<PathBuf>,
    pub name_only: bool,
    pub parallel: bool,
    pub format: OutputFormat,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl DeminifyConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref dir) = self.artifacts_dir {
            if dir.trim().is_empty() {
                anyhow::bail!("artifacts_dir must not be empty");
            }
        }

        Ok(())
    }

    /// Resolve config into its final form
    ///
    /// Relative paths resolve against the config file's directory, or against
    /// `project_root` when no file was loaded.
    pub fn resolve(&self, config_path: Option<&Path>, project_root: &Path) -> Result<ResolvedConfig> {
        self.validate()?;

        let base_dir = config_path.and_then(Path::parent).unwrap_or(project_root);
        let artifacts_dir = self.artifacts_dir.as_deref().map(|dir| base_dir.join(dir));

        Ok(ResolvedConfig {
            artifacts_dir,
            name_only: self.name_only.unwrap_or(false),
            parallel: self.parallel.unwrap_or(false),
            format: self.format.unwrap_or_default(),
            config_path: config_path.map(Path::to_path_buf),
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Self {
        ResolvedConfig {
            artifacts_dir: None,
            name_only: false,
            parallel: false,
            format: OutputFormat::Text,
            config_path: None,
        }
    }
}

/// Discover and load a config file from the project root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(DeminifyConfig, PathBuf)>> {
    for name in [".deminifyrc.json", "deminify.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            return Ok(Some((load_config_file(&path)?, path)));
        }
    }

    let pkg_path = project_root.join("package.json");
    if !pkg_path.exists() {
        return Ok(None);
    }
    match read_json(&pkg_path)?.get_mut("deminify").map(serde_json::Value::take) {
        Some(value) => Ok(Some((config_from_value(value, &pkg_path)?, pkg_path))),
        None => Ok(None),
    }
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<DeminifyConfig> {
    config_from_value(read_json(path)?, path)
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

fn config_from_value(value: serde_json::Value, path: &Path) -> Result<DeminifyConfig> {
    let config: DeminifyConfig = serde_json::from_value(value)
        .with_context(|| format!("invalid deminify config in {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid deminify config in {}", path.display()))?;
    Ok(config)
}

/// Load and resolve config for a project
///
/// An explicit `config_path` wins over discovery from `project_root`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let found = match config_path {
        Some(path) => Some((load_config_file(path)?, path.to_path_buf())),
        None => discover_config(project_root)?,
    };

    match found {
        Some((config, path)) => config.resolve(Some(&path), project_root),
        None => DeminifyConfig::default().resolve(None, project_root),
    }
}
