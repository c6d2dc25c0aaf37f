//! Configuration file loading for linepatch.
//!
//! Discovers and loads `linepatch.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use linepatch_core::settings::{NotifySettings, SchemaSettings, TypeCheckSettings};
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "linepatch.toml";

/// Top-level configuration from linepatch.toml. Unset keys fall back to built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinepatchConfig {
    pub notify: NotifyConfig,
    pub typecheck: TypeCheckConfig,
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Relative paths resolve against the project root.
    pub diff_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeCheckConfig {
    pub enabled: Option<bool>,
    pub command: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub path: Option<Utf8PathBuf>,
}

/// Returns the config path if `linepatch.toml` exists in `project_root`.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<LinepatchConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<LinepatchConfig> {
    let config: LinepatchConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<LinepatchConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(LinepatchConfig::default()),
    }
}

/// CLI flags that override the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub orchestrator_url: Option<String>,
    pub no_notify: bool,
    pub diff_dir: Option<Utf8PathBuf>,
    pub no_type_check: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedConfig {
    pub notify: NotifySettings,
    pub typecheck: TypeCheckSettings,
    pub schema: SchemaSettings,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: LinepatchConfig,
}

impl ConfigMerger {
    pub fn new(config: LinepatchConfig) -> Self {
        Self { config }
    }

    /// `--no-*` flags can only switch a feature off; values given on the CLI replace file values.
    pub fn merge(self, cli: &CliOverrides) -> MergedConfig {
        let LinepatchConfig {
            notify,
            typecheck,
            schema,
        } = self.config;
        let notify_defaults = NotifySettings::default();
        let typecheck_defaults = TypeCheckSettings::default();

        MergedConfig {
            notify: NotifySettings {
                enabled: !cli.no_notify && notify.enabled.unwrap_or(notify_defaults.enabled),
                url: cli
                    .orchestrator_url
                    .clone()
                    .or(notify.url)
                    .unwrap_or(notify_defaults.url),
                timeout_secs: notify.timeout_secs.unwrap_or(notify_defaults.timeout_secs),
                diff_dir: cli.diff_dir.clone().or(notify.diff_dir),
            },
            typecheck: TypeCheckSettings {
                enabled: !cli.no_type_check
                    && typecheck.enabled.unwrap_or(typecheck_defaults.enabled),
                command: typecheck
                    .command
                    .filter(|c| !c.is_empty())
                    .unwrap_or(typecheck_defaults.command),
                extensions: typecheck.extensions.unwrap_or(typecheck_defaults.extensions),
                timeout_secs: typecheck
                    .timeout_secs
                    .unwrap_or(typecheck_defaults.timeout_secs),
            },
            schema: SchemaSettings {
                path: schema.path.unwrap_or_else(|| SchemaSettings::default().path),
            },
        }
    }
}
