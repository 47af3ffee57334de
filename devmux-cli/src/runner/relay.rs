use std::io::{ErrorKind, Read};
use std::thread;

use tokio::sync::{mpsc, oneshot};

use devmux_core::event::LogEvent;
use devmux_core::model::ServiceId;
use devmux_core::relay::{LineScanner, classify_line};

const READ_CHUNK: usize = 4096;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub delivered: usize,
    pub dropped: usize,
}

impl RelayStats {
    fn record(&mut self, events: &mpsc::Sender<LogEvent>, event: LogEvent) {
        match events.try_send(event) {
            Ok(()) => self.delivered += 1,
            // Full or closed: keep reading so the child never stalls on output.
            Err(_) => self.dropped += 1,
        }
    }
}

/// Reads `reader` to end-of-stream, turning each line into a `LogEvent`.
/// Never blocks on the queue: lines that do not fit are dropped.
pub fn relay_lines(
    service: &ServiceId,
    mut reader: impl Read,
    events: &mpsc::Sender<LogEvent>,
) -> RelayStats {
    let mut scanner = LineScanner::new();
    let mut stats = RelayStats::default();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                for line in scanner.push(&buf[..n]) {
                    stats.record(events, classify_line(service, line));
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            // A PTY master reports EIO once the slave side is gone.
            Err(_) => break,
        }
    }
    if let Some(line) = scanner.finish() {
        stats.record(events, classify_line(service, line));
    }
    stats
}

/// Starts the relay thread. The returned receiver fires once the reader
/// has hit end-of-stream and every line has been offered to the queue.
pub fn spawn_relay(
    service: ServiceId,
    reader: Box<dyn Read + Send>,
    events: mpsc::Sender<LogEvent>,
) -> oneshot::Receiver<RelayStats> {
    let (done_tx, done_rx) = oneshot::channel();
    let spawned = thread::Builder::new()
        .name(format!("relay-{service}"))
        .spawn(move || {
            let stats = relay_lines(&service, reader, &events);
            if stats.dropped > 0 {
                tracing::debug!(service = %service, dropped = stats.dropped, "relay dropped lines");
            }
            tracing::debug!(service = %service, delivered = stats.delivered, "relay finished");
            let _ = done_tx.send(stats);
        });
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "failed to start relay thread");
    }
    done_rx
}
