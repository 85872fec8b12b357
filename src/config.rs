//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local use.

use std::env;
use std::path::PathBuf;

/// Which durable storage backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// One JSON document per key under `storage_dir`.
    File,
    /// Process-local, lost on exit.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    /// Directory for the file backend
    pub storage_dir: PathBuf,
    /// Load catalog data from here instead of the built-in copy
    pub catalog_dir: Option<PathBuf>,
    /// Run the stale-record sweep when the store is opened
    pub sweep_on_start: bool,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            storage_dir: PathBuf::from(".coverage-store"),
            catalog_dir: None,
            sweep_on_start: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_backend = match env::var("COVERAGE_STORAGE_BACKEND") {
            Err(_) => StorageBackend::File,
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "file" | "dir" | "directory" => StorageBackend::File,
                "memory" | "mem" => StorageBackend::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "COVERAGE_STORAGE_BACKEND",
                        value,
                    })
                }
            },
        };

        let sweep_on_start = match env::var("COVERAGE_SWEEP_ON_START") {
            Err(_) => true,
            Ok(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                name: "COVERAGE_SWEEP_ON_START",
                value,
            })?,
        };

        Ok(Self {
            storage_backend,
            storage_dir: env::var("COVERAGE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".coverage-store")),
            catalog_dir: env::var("COVERAGE_CATALOG_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            sweep_on_start,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
