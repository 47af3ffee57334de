//! Loading the project's `runtime.toml`.
//!
//! ```toml
//! name = "shop"
//!
//! [api]
//! path = "services/api"
//! runCommand = "cargo run"
//! ```
//!
//! Every table is a service; file order is display order.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::ServiceDescriptor;

pub const DEFAULT_CONFIG_FILE: &str = "runtime.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct RawService {
    path: Option<String>,
    #[serde(rename = "runCommand")]
    run_command: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeConfig {
    pub name: Option<String>,
    pub services: Vec<ServiceDescriptor>,
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let base_dir = std::path::absolute(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        Self::parse(&content, &base_dir)
    }

    /// Parse config text, resolving service paths against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;

        let mut config = RuntimeConfig::default();
        for (key, value) in table {
            match value {
                toml::Value::String(name) if key == "name" => config.name = Some(name),
                toml::Value::Table(table) => {
                    let raw: RawService = toml::Value::Table(table).try_into()?;
                    let (Some(path), Some(command)) = (raw.path, raw.run_command) else {
                        continue;
                    };
                    if command.trim().is_empty() {
                        continue;
                    }
                    config
                        .services
                        .push(ServiceDescriptor::new(key, base_dir.join(path), command));
                }
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
