use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to bring a single service up. Never fatal to the run.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("working directory {} does not exist", .0.display())]
    WorkingDir(PathBuf),

    #[error("failed to open pty: {0}")]
    OpenPty(String),

    #[error("failed to spawn `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("failed to attach to pty: {0}")]
    Attach(String),
}

/// Failure of the shared terminal. Always fatal.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to initialise terminal: {0}")]
    Setup(#[source] io::Error),

    #[error("failed to draw: {0}")]
    Draw(#[source] io::Error),

    #[error("failed to read terminal events: {0}")]
    Input(#[source] io::Error),

    #[error("failed to restore terminal: {0}")]
    Restore(#[source] io::Error),
}
