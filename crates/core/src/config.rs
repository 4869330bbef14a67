//! Configuration loading and validation.
//!
//! The configuration file is optional. Every field has a default that
//! reproduces the stock behaviour: `git` on `$PATH`, remote `origin`,
//! conflicted files opened in VS Code, and no confirmation prompt.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub sync: SyncOptions,
}

// ---------------------------------------------------------------------------
// General
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

/// Version-control binary and remote settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Binary invoked for every version-control command.
    #[serde(default = "default_git_binary")]
    pub binary: String,

    /// Remote that branches are pushed to and pulled from.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Fetch every remote (`git fetch --all`) instead of just `remote`.
    #[serde(default = "default_true")]
    pub fetch_all: bool,
}

fn default_git_binary() -> String {
    "git".into()
}

fn default_remote() -> String {
    "origin".into()
}

fn default_true() -> bool {
    true
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
            remote: default_remote(),
            fetch_all: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// External editor used to open conflicted files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Editor executable. Empty disables launching.
    #[serde(default = "default_editor")]
    pub command: String,

    /// Extra arguments placed before the file list.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_editor() -> String {
    "code".into()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: default_editor(),
            args: Vec::new(),
        }
    }
}

impl EditorConfig {
    pub fn is_enabled(&self) -> bool {
        !self.command.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Sync options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Ask once for confirmation before fetching, merging and pushing.
    #[serde(default)]
    pub confirm: bool,
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl SyncConfig {
    /// Load a [`SyncConfig`] from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load from `path` when given; otherwise from the default location,
    /// falling back to defaults when that file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::load_from_file(&p)?,
                _ => {
                    debug!("no configuration file, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate that all fields are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "git.binary".into(),
                detail: "git binary must not be empty".into(),
            });
        }
        if self.git.remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "git.remote".into(),
                detail: "remote name must not be empty".into(),
            });
        }
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".into(),
                detail: format!(
                    "unknown level '{}', expected one of: {}",
                    self.general.log_level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }
}

/// `~/.config/branchsync/config.toml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("branchsync").join("config.toml"))
}

/// Commented template written by `branchsync init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# branchsync configuration

[general]
# trace, debug, info, warn, error
log_level = "warn"

[git]
binary = "git"
remote = "origin"
# Fetch every remote before merging; set false to fetch only `remote`.
fetch_all = true

[editor]
# Conflicted files are appended to this command. Leave empty to disable.
command = "code"
args = []

[sync]
# Ask before fetching, merging and pushing.
confirm = false
"#;
