mod config;

pub use config::{CONFIG_ENV, ChromaConfig, ConfigError};
