use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "DEVMUX_LOG";

pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("devmux.log")
}

/// Sends tracing output to `path`. The TUI owns stdout and stderr, so
/// nothing is ever logged to the terminal.
pub fn init_tracing(path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .with_context(|| format!("log path {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(tracing_appender::rolling::never(dir, file))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_go_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("devmux.log");

        init_tracing(&path).unwrap();
        tracing::info!(service = "api", "hello from the test");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("hello from the test"));
        assert!(content.contains("service=\"api\"") || content.contains("service=api"));
    }

    #[test]
    fn test_rejects_path_without_file_name() {
        assert!(init_tracing(Path::new("/")).is_err());
    }
}
