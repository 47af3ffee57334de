use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use devmux_core::event::LogEvent;
use devmux_core::model::{ServiceDescriptor, ServiceId};
use devmux_core::relay::RELAY_QUEUE_CAPACITY;
use devmux_core::state::PaneSize;

use crate::runner::{COMMAND_QUEUE_CAPACITY, RunnerCommand, run_service};

/// Upper bound on joining a single runner during shutdown.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the event loop sends keystrokes and resizes.
pub trait RunnerSink {
    fn send_input(&self, index: usize, bytes: Vec<u8>);
    fn resize_all(&self, size: PaneSize);
}

struct RunnerHandle {
    name: ServiceId,
    commands: mpsc::Sender<RunnerCommand>,
    task: Option<JoinHandle<()>>,
}

impl RunnerHandle {
    fn send(&self, command: RunnerCommand) {
        match self.commands.try_send(command) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(service = %self.name, "runner busy, command dropped");
            }
            // The runner has finished; its pane stays up but takes no input.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

/// Starts one runner per service and tears them all down exactly once.
pub struct Lifecycle {
    runners: Vec<RunnerHandle>,
    cancel: CancellationToken,
}

impl Lifecycle {
    /// Spawns every runner concurrently. Receivers come back in config
    /// order, one per service.
    pub fn start(
        services: &[ServiceDescriptor],
        size: PaneSize,
        cancel: CancellationToken,
    ) -> (Self, Vec<mpsc::Receiver<LogEvent>>) {
        let mut runners = Vec::with_capacity(services.len());
        let mut receivers = Vec::with_capacity(services.len());

        for service in services {
            let (event_tx, event_rx) = mpsc::channel(RELAY_QUEUE_CAPACITY);
            let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
            let task = tokio::spawn(run_service(
                service.clone(),
                size,
                event_tx,
                command_rx,
                cancel.clone(),
            ));
            runners.push(RunnerHandle {
                name: service.name.clone(),
                commands: command_tx,
                task: Some(task),
            });
            receivers.push(event_rx);
        }
        tracing::info!(services = runners.len(), "started runners");

        (Self { runners, cancel }, receivers)
    }

    /// Cancels every runner and waits for each to release its PTY.
    /// Calling it again is a no-op.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        for runner in &mut self.runners {
            let Some(task) = runner.task.take() else {
                continue;
            };
            match tokio::time::timeout(JOIN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(service = %runner.name, error = %err, "runner task failed");
                }
                Err(_) => {
                    tracing::warn!(service = %runner.name, "runner did not stop in time");
                }
            }
        }
    }
}

impl RunnerSink for Lifecycle {
    fn send_input(&self, index: usize, bytes: Vec<u8>) {
        if let Some(runner) = self.runners.get(index) {
            runner.send(RunnerCommand::Input(bytes));
        }
    }

    fn resize_all(&self, size: PaneSize) {
        for runner in &self.runners {
            runner.send(RunnerCommand::Resize(size));
        }
    }
}
