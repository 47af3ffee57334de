use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::model::{LogStream, ServiceStatus};

/// Maximum number of lines retained per pane.
pub const VIEWPORT_CAPACITY: usize = 5_000;

/// One entry in a pane's content buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum PaneLine {
    /// Relayed child output. `text` keeps its escape sequences intact.
    Output { text: String, stream: LogStream },
    /// Synthesised lifecycle line.
    Status {
        at: DateTime<Local>,
        status: ServiceStatus,
    },
}

impl PaneLine {
    pub fn status_text(at: &DateTime<Local>, status: &ServiceStatus) -> String {
        let mut line = format!("[{}] Service {}", at.format("%H:%M:%S"), status);
        if let Some(err) = status.error() {
            line.push_str(": ");
            line.push_str(err);
        }
        line
    }
}

/// A scrollable window over a bounded ring of lines.
///
/// `scroll` counts lines up from the bottom: 0 means pinned to the newest
/// line. It is always clamped to `len - height`.
#[derive(Clone, Debug)]
pub struct Viewport {
    lines: VecDeque<PaneLine>,
    cap: usize,
    width: u16,
    height: u16,
    scroll: usize,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_capacity(width, height, VIEWPORT_CAPACITY)
    }

    pub fn with_capacity(width: u16, height: u16, cap: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            cap: cap.max(1),
            width,
            height,
            scroll: 0,
        }
    }

    pub fn push(&mut self, line: PaneLine) {
        self.lines.push_back(line);
        while self.lines.len() > self.cap {
            self.lines.pop_front();
        }
        self.clamp_scroll();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll = 0;
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.clamp_scroll();
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &PaneLine> {
        self.lines.iter()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn at_bottom(&self) -> bool {
        self.scroll == 0
    }

    pub fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height as usize)
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_add(n);
        self.clamp_scroll();
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_sub(n);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height.max(1) as usize);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height.max(1) as usize);
    }

    pub fn goto_bottom(&mut self) {
        self.scroll = 0;
    }

    /// The lines currently inside the window, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &PaneLine> {
        let end = self.lines.len() - self.scroll;
        let start = end.saturating_sub(self.height as usize);
        self.lines.range(start..end)
    }

    fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }
}
