use chrono::{DateTime, Local};

use crate::model::{LogStream, ServiceId, ServiceStatus};

/// Events produced by a service's relay and runner, consumed exactly once
/// by the event loop.
///
/// Events for one service arrive in production order. Nothing is promised
/// about interleaving across services.
#[derive(Clone, Debug, PartialEq)]
pub enum LogEvent {
    Line {
        service: ServiceId,
        text: String,
        stream: LogStream,
    },
    ClearScreen {
        service: ServiceId,
    },
    StatusChange {
        service: ServiceId,
        status: ServiceStatus,
        at: DateTime<Local>,
    },
}

impl LogEvent {
    pub fn line(service: impl Into<ServiceId>, text: impl Into<String>) -> Self {
        LogEvent::Line {
            service: service.into(),
            text: text.into(),
            stream: LogStream::Stdout,
        }
    }

    pub fn status(service: impl Into<ServiceId>, status: ServiceStatus) -> Self {
        LogEvent::StatusChange {
            service: service.into(),
            status,
            at: Local::now(),
        }
    }

    pub fn service(&self) -> &str {
        match self {
            LogEvent::Line { service, .. }
            | LogEvent::ClearScreen { service }
            | LogEvent::StatusChange { service, .. } => service,
        }
    }
}
