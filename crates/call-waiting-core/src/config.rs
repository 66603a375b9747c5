//! Configuration for call-waiting-core
//!
//! Settings come from an optional TOML/JSON/YAML file layered under
//! `CALL_WAITING__*` environment variables:
//!
//! ```toml
//! preference_group = "terminal_based_call_waiting"
//! store_path = "/var/lib/phone/call_waiting.json"
//!
//! [logging]
//! level = "debug"
//! json = true
//! ```
//!
//! `CALL_WAITING__LOGGING__LEVEL=trace` overrides `logging.level`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CallWaitingError, Result};
use crate::store::{
    DEFAULT_PREFERENCE_GROUP, FilePreferenceStore, MemoryPreferenceStore, PreferenceStore,
};

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "CALL_WAITING";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallWaitingConfig {
    /// Preference group the controller record lives under
    pub preference_group: String,
    /// JSON file for the preference store; in-memory when unset
    pub store_path: Option<PathBuf>,
    pub logging: LogSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Base level, further refined by `RUST_LOG`
    pub level: String,
    pub json: bool,
    pub file_info: bool,
}

impl Default for CallWaitingConfig {
    fn default() -> Self {
        Self {
            preference_group: DEFAULT_PREFERENCE_GROUP.to_string(),
            store_path: None,
            logging: LogSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
        }
    }
}

impl CallWaitingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preference_group(mut self, group: impl Into<String>) -> Self {
        self.preference_group = group.into();
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn with_logging(mut self, logging: LogSettings) -> Self {
        self.logging = logging;
        self
    }

    /// Load from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment overrides only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.preference_group.trim().is_empty() {
            return Err(CallWaitingError::config("preference_group must not be empty"));
        }
        crate::logging::parse_log_level(&self.logging.level)?;
        Ok(())
    }

    /// Open the preference store this configuration points at
    pub fn open_store(&self) -> Result<Arc<dyn PreferenceStore>> {
        match &self.store_path {
            Some(path) => Ok(Arc::new(FilePreferenceStore::open(path)?)),
            None => Ok(Arc::new(MemoryPreferenceStore::new())),
        }
    }
}
