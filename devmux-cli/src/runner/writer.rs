use std::io::Write;
use std::thread;

use tokio::sync::mpsc;

use devmux_core::model::ServiceId;

/// Pending writes per runner before keystrokes are dropped.
pub const INPUT_QUEUE_CAPACITY: usize = 64;

/// Feeds bytes to the child's terminal from its own thread, so a child
/// that stops reading stalls this thread and never the runner loop.
pub struct InputWriter {
    service: ServiceId,
    queue: mpsc::Sender<Vec<u8>>,
}

impl InputWriter {
    pub fn spawn(service: ServiceId, writer: Box<dyn Write + Send>) -> Self {
        let (queue, rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
        let name = service.clone();
        let spawned = thread::Builder::new()
            .name(format!("input-{service}"))
            .spawn(move || write_input(&name, writer, rx));
        if let Err(err) = spawned {
            tracing::warn!(service = %service, error = %err, "failed to start input thread");
        }
        Self { service, queue }
    }

    /// Queues `bytes` without waiting. Returns false if they were dropped.
    pub fn send(&self, bytes: Vec<u8>) -> bool {
        match self.queue.try_send(bytes) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(service = %self.service, "child is not reading input, dropping keystrokes");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Writes every queued chunk until the queue closes or the terminal errors.
fn write_input(service: &ServiceId, mut writer: impl Write, mut rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(bytes) = rx.blocking_recv() {
        if let Err(err) = writer.write_all(&bytes).and_then(|()| writer.flush()) {
            tracing::debug!(service = %service, error = %err, "input writer closed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Never accepts a byte, like a terminal whose child stopped reading.
    struct Stalled;

    impl Write for Stalled {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            thread::sleep(Duration::from_secs(60));
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_queued_bytes_are_written_in_order() {
        let sink = Shared::default();
        let writer = InputWriter::spawn("svc".into(), Box::new(sink.clone()));
        assert!(writer.send(b"ab".to_vec()));
        assert!(writer.send(b"cd".to_vec()));
        drop(writer);

        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.0.lock().unwrap().len() < 4 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"abcd");
    }

    #[test]
    fn test_send_never_blocks_on_a_stalled_terminal() {
        let writer = InputWriter::spawn("svc".into(), Box::new(Stalled));
        let started = Instant::now();
        let accepted = (0..INPUT_QUEUE_CAPACITY * 2)
            .filter(|_| writer.send(vec![b'x'; 1024]))
            .count();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(accepted <= INPUT_QUEUE_CAPACITY + 1);
    }
}
