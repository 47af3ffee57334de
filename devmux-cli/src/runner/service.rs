use std::time::Duration;

use portable_pty::{ChildKiller, MasterPty};

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;

use devmux_core::event::LogEvent;
use devmux_core::model::{ServiceDescriptor, ServiceStatus};
use devmux_core::state::PaneSize;

use super::RunnerCommand;
use super::pty::{PtyProcess, pty_size, spawn_in_pty};
use super::relay::spawn_relay;
use super::writer::InputWriter;

/// Time a child gets to exit after SIGTERM before it is killed outright.
const TERM_GRACE: Duration = Duration::from_millis(750);
/// Time to wait after the hard kill before giving up on the child.
const KILL_GRACE: Duration = Duration::from_millis(1500);
/// Bound on waiting for the relay to flush the last lines.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Status events are never dropped while the loop is draining. Once
/// shutdown has started nobody is, so fall back to a best-effort send.
async fn emit_status(
    events: &mpsc::Sender<LogEvent>,
    cancel: &CancellationToken,
    service: &ServiceDescriptor,
    status: ServiceStatus,
) {
    let event = LogEvent::status(service.name.clone(), status);
    if cancel.is_cancelled() {
        let _ = events.try_send(event);
        return;
    }
    tokio::select! {
        _ = events.send(event) => {}
        _ = cancel.cancelled() => {}
    }
}

/// The parts of a running PTY the runner keeps once the child has been
/// handed to the wait task.
struct Control {
    pid: Option<u32>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    master: Box<dyn MasterPty + Send>,
    input: InputWriter,
}

impl Control {
    /// SIGTERM to the terminal's foreground process group, falling back to
    /// the child's own group.
    #[cfg(unix)]
    fn terminate(&mut self) {
        let target = self
            .master
            .process_group_leader()
            .or_else(|| self.pid.and_then(|pid| libc::pid_t::try_from(pid).ok()));
        let sent = target.is_some_and(|pgid| unsafe { libc::killpg(pgid, libc::SIGTERM) } == 0);
        if !sent {
            self.kill();
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) {
        self.kill();
    }

    fn kill(&mut self) {
        if let Err(err) = self.killer.kill() {
            tracing::warn!(pid = ?self.pid, error = %err, "failed to kill child");
        }
    }

    fn apply(&mut self, service: &ServiceDescriptor, command: RunnerCommand) {
        match command {
            RunnerCommand::Input(bytes) => {
                self.input.send(bytes);
            }
            RunnerCommand::Resize(size) => {
                if let Err(err) = self.master.resize(pty_size(size)) {
                    tracing::warn!(service = %service.name, error = %err, "failed to resize pty");
                }
            }
        }
    }
}

/// Drives one service from spawn to exit.
///
/// Emits `Starting`, then `Running` or `Failed`, and finally `Stopped` once
/// the child is gone. Cancelling `cancel` terminates the child: SIGTERM
/// first, a hard kill after `TERM_GRACE`, and after `KILL_GRACE` the runner
/// stops waiting so shutdown stays bounded.
pub async fn run_service(
    service: ServiceDescriptor,
    size: PaneSize,
    events: mpsc::Sender<LogEvent>,
    mut commands: mpsc::Receiver<RunnerCommand>,
    cancel: CancellationToken,
) {
    emit_status(&events, &cancel, &service, ServiceStatus::Starting).await;

    let PtyProcess {
        mut child,
        killer,
        master,
        writer,
        reader,
    } = match spawn_in_pty(&service, size) {
        Ok(process) => process,
        Err(err) => {
            tracing::warn!(service = %service.name, error = %err, "service failed to start");
            let status = ServiceStatus::Failed {
                message: err.to_string(),
            };
            emit_status(&events, &cancel, &service, status).await;
            return;
        }
    };
    let pid = child.process_id();
    tracing::info!(service = %service.name, pid = ?pid, "service started");

    let drained = spawn_relay(service.name.clone(), reader, events.clone());
    emit_status(&events, &cancel, &service, ServiceStatus::Running).await;

    let mut wait = tokio::task::spawn_blocking(move || child.wait());
    let mut control = Control {
        pid,
        killer,
        master,
        input: InputWriter::spawn(service.name.clone(), writer),
    };

    let mut deadline: Option<Instant> = None;
    let mut killed = false;
    let mut commands_open = true;

    let code = loop {
        tokio::select! {
            waited = &mut wait => {
                break match waited {
                    Ok(Ok(status)) => Some(status.exit_code()),
                    Ok(Err(err)) => {
                        tracing::warn!(service = %service.name, error = %err, "failed to wait on child");
                        None
                    }
                    Err(err) => {
                        tracing::warn!(service = %service.name, error = %err, "wait task failed");
                        None
                    }
                };
            }
            _ = cancel.cancelled(), if deadline.is_none() => {
                tracing::info!(service = %service.name, "terminating service");
                control.terminate();
                deadline = Some(Instant::now() + TERM_GRACE);
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if killed {
                    tracing::warn!(service = %service.name, "child ignored kill, giving up");
                    break None;
                }
                control.kill();
                killed = true;
                deadline = Some(Instant::now() + KILL_GRACE);
            }
            command = commands.recv(), if commands_open => match command {
                Some(command) => control.apply(&service, command),
                None => commands_open = false,
            },
        }
    };

    if timeout(DRAIN_TIMEOUT, drained).await.is_err() {
        tracing::debug!(service = %service.name, "relay still open after exit");
    }
    drop(control);

    tracing::info!(service = %service.name, code = ?code, "service stopped");
    emit_status(&events, &cancel, &service, ServiceStatus::Stopped { code }).await;
}
