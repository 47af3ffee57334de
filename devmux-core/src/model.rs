use std::fmt;
use std::path::PathBuf;

pub type ServiceId = String;

/// One service to run, as declared in the project config.
///
/// Descriptors are immutable once loaded; `name` is the only stable key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: ServiceId,
    pub working_dir: PathBuf,
    pub command: String,
}

impl ServiceDescriptor {
    pub fn new(
        name: impl Into<ServiceId>,
        working_dir: impl Into<PathBuf>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            working_dir: working_dir.into(),
            command: command.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceStatus {
    Starting,
    Running,
    Stopped {
        code: Option<u32>,
    },
    Failed {
        message: String,
    },
}

impl ServiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceStatus::Starting => "starting",
            ServiceStatus::Running => "running",
            ServiceStatus::Stopped { .. } => "stopped",
            ServiceStatus::Failed { .. } => "failed",
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ServiceStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Stopped { code: Some(code) } => write!(f, "stopped (exit {})", code),
            other => f.write_str(other.label()),
        }
    }
}

/// Which output stream a line came from.
///
/// A pseudo-terminal merges stdout and stderr, so relayed output is always
/// tagged `Stdout`; `Stderr` only appears for lines synthesised by devmux.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogStream {
    #[default]
    Stdout,
    Stderr,
}

impl LogStream {
    pub fn is_error(self) -> bool {
        self == LogStream::Stderr
    }
}
