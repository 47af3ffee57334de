//! Turning raw pseudo-terminal bytes into discrete log events.
//!
//! This is a narrow text-pattern check, not a terminal emulator: output is
//! treated as an append-only stream of lines, and the only control sequences
//! recognised are the handful that clear the screen. Everything else,
//! including SGR colour codes, is passed through verbatim.

use crate::event::LogEvent;
use crate::model::ServiceId;

/// Capacity of each service's event queue.
pub const RELAY_QUEUE_CAPACITY: usize = 100;

/// Longest line buffered before it is flushed without a newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// How far back from a forced cut to look for an unfinished escape.
const ESCAPE_LOOKBACK: usize = 32;

const CLEAR_SCREEN_SEQUENCES: [&str; 3] = ["\x1b[2J", "\x1b[H\x1b[2J", "\x1b[3J"];

pub fn is_clear_screen(line: &str) -> bool {
    CLEAR_SCREEN_SEQUENCES.iter().any(|seq| line.contains(seq))
}

/// Map one scanned line to the event the relay should emit for it.
///
/// Clear-screen lines are swallowed and replaced by `ClearScreen` so a
/// nested interactive program cannot wipe the multiplexer's own buffer.
pub fn classify_line(service: &ServiceId, line: String) -> LogEvent {
    if is_clear_screen(&line) {
        LogEvent::ClearScreen {
            service: service.clone(),
        }
    } else {
        LogEvent::line(service.clone(), line)
    }
}

/// Incremental line splitter over arbitrary byte chunks.
#[derive(Debug, Default)]
pub struct LineScanner {
    pending: Vec<u8>,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in chunk {
            if b == b'\n' {
                lines.push(Self::decode(std::mem::take(&mut self.pending)));
            } else {
                self.pending.push(b);
                if self.pending.len() >= MAX_LINE_BYTES {
                    lines.push(self.split_overlong());
                }
            }
        }
        lines
    }

    /// Flush a trailing partial line at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(Self::decode(std::mem::take(&mut self.pending)))
        }
    }

    /// Emit the pending bytes up to the last point that does not split a
    /// character or an escape sequence; the rest starts the next line.
    fn split_overlong(&mut self) -> String {
        let cut = safe_cut(&self.pending);
        let rest = self.pending.split_off(cut);
        Self::decode(std::mem::replace(&mut self.pending, rest))
    }

    fn decode(mut buf: Vec<u8>) -> String {
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn safe_cut(buf: &[u8]) -> usize {
    let mut cut = buf.len();

    // Back off an incomplete trailing UTF-8 sequence.
    let tail = buf.len().saturating_sub(4);
    if let Some(lead) = buf[tail..].iter().rposition(|&b| b & 0xC0 != 0x80) {
        let lead = tail + lead;
        let needed = match buf[lead] {
            b if b >= 0xF0 => 4,
            b if b >= 0xE0 => 3,
            b if b >= 0xC0 => 2,
            _ => 1,
        };
        if buf.len() - lead < needed {
            cut = lead;
        }
    }

    let window = cut.saturating_sub(ESCAPE_LOOKBACK);
    if let Some(esc) = buf[window..cut].iter().rposition(|&b| b == 0x1b) {
        let esc = window + esc;
        if is_unfinished_escape(&buf[esc..cut]) {
            cut = esc;
        }
    }

    if cut == 0 { buf.len() } else { cut }
}

fn is_unfinished_escape(seq: &[u8]) -> bool {
    match seq {
        [_] => true,
        [_, b'[', params @ ..] => !params.iter().any(|b| (0x40..=0x7E).contains(b)),
        _ => false,
    }
}
