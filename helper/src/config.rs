use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "BASTION_HELPER_CONFIG";

/// Read when present and no other location was given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/bastion/helper.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{field} must be an absolute path, got {}", value.display())]
    RelativePath { field: &'static str, value: PathBuf },
}

/// Where helpers live and how they are started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HelperConfig {
    #[serde(default = "default_sudo_path")]
    pub sudo_path: PathBuf,
    #[serde(default = "default_helpers_dir")]
    pub helpers_dir: PathBuf,
    /// Stdout cap applied to every helper run unless the caller sets one.
    pub max_stdout_bytes: Option<u64>,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            sudo_path: default_sudo_path(),
            helpers_dir: default_helpers_dir(),
            max_stdout_bytes: None,
        }
    }
}

fn default_sudo_path() -> PathBuf {
    PathBuf::from("/usr/bin/sudo")
}

fn default_helpers_dir() -> PathBuf {
    PathBuf::from("/opt/bastion/bin/helper")
}

impl HelperConfig {
    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("loaded helper config from {}", path.display());
        Ok(config)
    }

    /// Load from `explicit` if given, else from [`CONFIG_ENV_VAR`], else from
    /// [`DEFAULT_CONFIG_PATH`] when that file exists. Falls back to the
    /// built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match config_path(explicit, std::env::var_os(CONFIG_ENV_VAR), default_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("sudo_path", &self.sudo_path), ("helpers_dir", &self.helpers_dir)] {
            if !value.is_absolute() {
                return Err(ConfigError::RelativePath {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

fn config_path(explicit: Option<&Path>, env: Option<OsString>, default_path: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    match env {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => default_path.is_file().then(|| default_path.to_path_buf()),
    }
}
