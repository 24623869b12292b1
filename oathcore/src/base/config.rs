use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    ext::trace::TraceLevel,
    magic::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_CONFIG_PATH},
    utils::error::{OathError, OathResult},
};

/// How a `Borrowed` gives its frame back when it is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOrder {
    /// The released token must be the top of the stack; anything else is an
    /// `OutOfOrderRelease` violation and leaves the stack untouched.
    #[default]
    Strict,
    /// Pop the top frame whoever releases. Out-of-order releases silently remove the wrong
    /// frame.
    Unchecked,
}

/// What to do when an `Owned` is destroyed while borrows are still active.
///
/// The resource is dropped under every policy; remaining `Borrowed` become stale. The
/// `OwnerDestroyed` trace event, carrying the remaining depth, is emitted whatever the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutstandingBorrowPolicy {
    /// Say nothing.
    Ignore,
    /// Log a warning.
    #[default]
    Warn,
    /// Report an `OutstandingBorrows` violation through the violation hook.
    Violation,
}

/// Where trace events go when tracing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSinkKind {
    #[default]
    Log,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub enabled: bool,
    /// Minimum level an event needs to reach the sink.
    pub level: TraceLevel,
    pub sink: TraceSinkKind,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: TraceLevel::Debug,
            sink: TraceSinkKind::Log,
        }
    }
}

/// Runtime configuration of the ownership checks.
///
/// ```
/// use oathcore::base::config::{OathConfig, ReleaseOrder};
///
/// let config: OathConfig = toml::from_str(r#"
///     release_order = "unchecked"
///
///     [trace]
///     enabled = true
///     sink = "stdout"
/// "#).unwrap();
/// assert_eq!(config.release_order, ReleaseOrder::Unchecked);
/// assert!(config.trace.enabled);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OathConfig {
    pub release_order: ReleaseOrder,
    pub outstanding_borrows: OutstandingBorrowPolicy,
    pub trace: TraceConfig,
}

impl OathConfig {
    /// Get the default path to the oath configuration file.
    pub fn default_path() -> PathBuf {
        // Check if the environment variable is set
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        // Fallback to default paths based on OS
        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            } else {
                // Fallback to current directory if HOME is not set
            }
        }

        path.push(CONFIG_DIR_NAME);
        path.push(CONFIG_FILE_NAME);
        path
    }

    /// Load the configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> OathResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;

        toml::from_str(&toml_str).map_err(|e| OathError::ConfigParseError {
            source: e,
            file: path.display().to_string(),
        })
    }

    /// Load the configuration from [`OathConfig::default_path`], or the defaults if no file
    /// exists there.
    pub fn load_or_default() -> OathResult<Self> {
        let path = Self::default_path();
        if !path.exists() {
            log::debug!(
                "No oath configuration at `{}`, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        Self::load_from_toml(&path)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_toml(&self, path: &Path) -> OathResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| OathError::ConfigSerializeError {
            source: e,
            file: path.display().to_string(),
        })?;

        // Attempt to create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
