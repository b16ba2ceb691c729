use serde::Deserialize;
use std::path::Path;

/// Environment variable naming a TOML config file. Unset means defaults;
/// the binaries themselves take no configuration arguments.
pub const CONFIG_ENV: &str = "CHROMA_CONFIG";

#[derive(Deserialize, Debug)]
pub struct ChromaConfig {
    /// Backing file for the shared region; doubles as the system-wide
    /// name every process agrees on for one run.
    #[serde(default = "defaults::shm_file_path")]
    pub shm_file_path: String,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    /// Slot count of the circular buffer. Must be a power of two.
    #[serde(default = "defaults::ring_capacity")]
    pub ring_capacity: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn shm_file_path() -> String {
        "/tmp/chroma_shm".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn ring_capacity() -> usize {
        128
    }
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            shm_file_path: defaults::shm_file_path(),
            log_level: defaults::log_level(),
            ring_capacity: defaults::ring_capacity(),
        }
    }
}

impl ChromaConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: ChromaConfig = toml::from_str(&toml_to_str)?;
        Ok(config)
    }

    /// Resolves the config from [`CONFIG_ENV`]: load the named file when
    /// the variable is set, defaults otherwise. A set-but-unreadable file
    /// is an error, not a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }
}
