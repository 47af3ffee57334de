use std::io::{self, Write};

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event,
    EventStream, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use devmux_core::event::LogEvent;
use devmux_core::model::ServiceDescriptor;
use devmux_core::reducer::{ScrollAction, UiEvent, reduce};
use devmux_core::state::{DEFAULT_PANE_SIZE, PaneSize, RenderState};

use crate::error::RunError;
use crate::keys::{self, Control};
use crate::lifecycle::{Lifecycle, RunnerSink};
use crate::ui;

/// Lines moved per mouse wheel notch.
const WHEEL_STEP: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    NoServices,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Routes terminal input: our own chords mutate the view, everything else
/// is encoded and handed to the focused runner.
pub struct Controller {
    state: RenderState,
}

impl Controller {
    pub fn new(services: &[ServiceDescriptor]) -> Self {
        Self {
            state: RenderState::new(services),
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn on_log(&mut self, event: LogEvent) {
        reduce(&mut self.state, &UiEvent::Log(event));
    }

    pub fn on_terminal_event(&mut self, event: Event, sink: &impl RunnerSink) -> Flow {
        match event {
            Event::Key(key) if keys::is_actionable(&key) => {
                if let Some(control) = keys::control_for(&key) {
                    return self.on_control(control);
                }
                if let Some(bytes) = keys::key_to_bytes(&key) {
                    self.forward(bytes, sink);
                }
            }
            Event::Paste(text) => self.forward(text.into_bytes(), sink),
            Event::Mouse(MouseEvent { kind, .. }) => match kind {
                MouseEventKind::ScrollUp => self.scroll(ScrollAction::Up(WHEEL_STEP)),
                MouseEventKind::ScrollDown => self.scroll(ScrollAction::Down(WHEEL_STEP)),
                _ => {}
            },
            Event::Resize(width, height) => {
                reduce(&mut self.state, &UiEvent::Resize { width, height });
                sink.resize_all(self.state.pane_size());
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_control(&mut self, control: Control) -> Flow {
        match control {
            Control::Quit => return Flow::Quit,
            Control::NextTab => reduce(&mut self.state, &UiEvent::FocusNext),
            Control::PrevTab => reduce(&mut self.state, &UiEvent::FocusPrev),
            Control::Scroll(action) => self.scroll(action),
        }
        Flow::Continue
    }

    fn scroll(&mut self, action: ScrollAction) {
        reduce(&mut self.state, &UiEvent::Scroll(action));
    }

    fn forward(&self, bytes: Vec<u8>, sink: &impl RunnerSink) {
        if let Some(index) = self.state.focused_index() {
            sink.send_input(index, bytes);
        }
    }
}

/// Fans every per-service queue into one stream. Order within a service
/// is kept; across services it is whatever arrives first.
fn merge_logs(receivers: Vec<mpsc::Receiver<LogEvent>>) -> stream::SelectAll<BoxStream<'static, LogEvent>> {
    stream::select_all(receivers.into_iter().map(|rx| {
        stream::unfold(rx, |mut rx| async move {
            let event = rx.recv().await?;
            Some((event, rx))
        })
        .boxed()
    }))
}

/// Runs until quit, cancellation or end of input. The log receivers are
/// consumed so they are dropped as soon as the loop stops reading.
pub async fn event_loop<B, I>(
    terminal: &mut Terminal<B>,
    controller: &mut Controller,
    sink: &impl RunnerSink,
    receivers: Vec<mpsc::Receiver<LogEvent>>,
    mut input: I,
    cancel: &CancellationToken,
) -> Result<(), RunError>
where
    B: Backend,
    I: Stream<Item = io::Result<Event>> + Unpin,
{
    let mut logs = merge_logs(receivers);

    let size = terminal.size().map_err(RunError::Draw)?;
    controller.on_terminal_event(Event::Resize(size.width, size.height), sink);
    terminal
        .draw(|frame| ui::draw(frame, controller.state()))
        .map_err(RunError::Draw)?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = input.next() => match event {
                Some(Ok(event)) => {
                    if controller.on_terminal_event(event, sink) == Flow::Quit {
                        tracing::info!("quit requested");
                        break;
                    }
                }
                Some(Err(err)) => return Err(RunError::Input(err)),
                None => break,
            },
            Some(event) = logs.next() => controller.on_log(event),
        }
        terminal
            .draw(|frame| ui::draw(frame, controller.state()))
            .map_err(RunError::Draw)?;
    }
    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let attached = enter_screen(&mut io::stdout(), || {
        Terminal::new(CrosstermBackend::new(io::stdout()))
    });
    if attached.is_err() {
        let _ = disable_raw_mode();
    }
    attached
}

/// Switches `out` to the alternate screen with mouse and paste reporting,
/// then runs `attach`. Any failure leaves the screen as it was found.
fn enter_screen<W: Write, T>(out: &mut W, attach: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    let attached = execute!(
        out,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )
    .and_then(|()| attach());
    if attached.is_err() {
        let _ = leave_screen(out);
    }
    attached
}

fn leave_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(
        out,
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    leave_screen(terminal.backend_mut())?;
    terminal.show_cursor()?;
    Ok(())
}

/// Cancels on SIGINT, and on SIGTERM or SIGHUP where those exist.
async fn watch_signals(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let (Ok(mut term), Ok(mut hup)) =
            (signal(SignalKind::terminate()), signal(SignalKind::hangup()))
        else {
            tracing::warn!("failed to install signal handlers");
            return;
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
            _ = hup.recv() => {}
            _ = cancel.cancelled() => return,
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = cancel.cancelled() => return,
        }
    }
    tracing::info!("shutdown signal received");
    cancel.cancel();
}

/// Takes over the terminal, runs every service until the user quits, then
/// restores the terminal and stops every child.
pub async fn run(services: Vec<ServiceDescriptor>) -> Result<RunOutcome, RunError> {
    if services.is_empty() {
        return Ok(RunOutcome::NoServices);
    }

    let size = crossterm::terminal::size()
        .map(|(width, height)| PaneSize::for_terminal(width, height))
        .unwrap_or(DEFAULT_PANE_SIZE);
    let mut terminal = setup_terminal().map_err(RunError::Setup)?;

    let cancel = CancellationToken::new();
    let signals = tokio::spawn(watch_signals(cancel.clone()));
    let (mut lifecycle, receivers) = Lifecycle::start(&services, size, cancel.clone());

    let mut controller = Controller::new(&services);
    let result = event_loop(
        &mut terminal,
        &mut controller,
        &lifecycle,
        receivers,
        EventStream::new(),
        &cancel,
    )
    .await;

    let restored = restore_terminal(&mut terminal);
    lifecycle.shutdown().await;
    signals.abort();

    if let Err(err) = &result {
        tracing::error!(error = %err, "event loop failed");
    }
    result?;
    restored.map_err(RunError::Restore)?;
    Ok(RunOutcome::Quit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use devmux_core::model::ServiceStatus;
    use devmux_core::relay::RELAY_QUEUE_CAPACITY;
    use ratatui::backend::TestBackend;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        inputs: RefCell<Vec<(usize, Vec<u8>)>>,
        resizes: RefCell<Vec<PaneSize>>,
    }

    impl RunnerSink for RecordingSink {
        fn send_input(&self, index: usize, bytes: Vec<u8>) {
            self.inputs.borrow_mut().push((index, bytes));
        }

        fn resize_all(&self, size: PaneSize) {
            self.resizes.borrow_mut().push(size);
        }
    }

    fn services(names: &[&str]) -> Vec<ServiceDescriptor> {
        names
            .iter()
            .map(|n| ServiceDescriptor::new(*n, "/srv", "run"))
            .collect()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn shift(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::SHIFT))
    }

    fn wheel(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_keystrokes_follow_focus() {
        let sink = RecordingSink::default();
        let mut controller = Controller::new(&services(&["a", "b"]));
        controller.on_terminal_event(Event::Resize(80, 24), &sink);

        controller.on_terminal_event(key(KeyCode::Char('x')), &sink);
        controller.on_terminal_event(shift(KeyCode::Right), &sink);
        controller.on_terminal_event(key(KeyCode::Char('y')), &sink);
        controller.on_terminal_event(key(KeyCode::Enter), &sink);

        assert_eq!(
            *sink.inputs.borrow(),
            vec![(0, b"x".to_vec()), (1, b"y".to_vec()), (1, b"\r".to_vec())]
        );
    }

    #[test]
    fn test_controls_are_not_forwarded() {
        let sink = RecordingSink::default();
        let mut controller = Controller::new(&services(&["a", "b"]));

        assert_eq!(controller.on_terminal_event(shift(KeyCode::Left), &sink), Flow::Continue);
        assert_eq!(controller.state().focused, 0);
        assert_eq!(controller.on_terminal_event(shift(KeyCode::Right), &sink), Flow::Continue);
        assert_eq!(controller.on_terminal_event(shift(KeyCode::Right), &sink), Flow::Continue);
        assert_eq!(controller.state().focused, 1);
        assert_eq!(controller.on_terminal_event(key(KeyCode::Char('q')), &sink), Flow::Quit);
        assert_eq!(
            controller.on_terminal_event(
                Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
                &sink
            ),
            Flow::Quit
        );
        assert!(sink.inputs.borrow().is_empty());
    }

    #[test]
    fn test_resize_reaches_every_runner() {
        let sink = RecordingSink::default();
        let mut controller = Controller::new(&services(&["a", "b", "c"]));

        controller.on_terminal_event(Event::Resize(124, 41), &sink);

        let expected = PaneSize { cols: 120, rows: 40 };
        assert_eq!(*sink.resizes.borrow(), vec![expected]);
        for pane in &controller.state().panes {
            assert_eq!(pane.viewport.width(), expected.cols);
            assert_eq!(pane.viewport.height(), expected.rows);
        }
        assert!(controller.state().ready);
    }

    #[test]
    fn test_wheel_scrolls_focused_pane_only() {
        let sink = RecordingSink::default();
        let mut controller = Controller::new(&services(&["a", "b"]));
        controller.on_terminal_event(Event::Resize(40, 6), &sink);
        for i in 0..20 {
            controller.on_log(LogEvent::line("a", format!("a{i}")));
            controller.on_log(LogEvent::line("b", format!("b{i}")));
        }

        controller.on_terminal_event(wheel(MouseEventKind::ScrollUp), &sink);

        let panes = &controller.state().panes;
        assert_eq!(panes[0].viewport.scroll_offset(), WHEEL_STEP);
        assert_eq!(panes[1].viewport.scroll_offset(), 0);

        controller.on_terminal_event(shift(KeyCode::End), &sink);
        assert_eq!(controller.state().panes[0].viewport.scroll_offset(), 0);
    }

    #[test]
    fn test_no_services_input_is_noop() {
        let sink = RecordingSink::default();
        let mut controller = Controller::new(&[]);
        controller.on_terminal_event(Event::Resize(80, 24), &sink);

        assert_eq!(controller.on_terminal_event(key(KeyCode::Char('x')), &sink), Flow::Continue);
        assert_eq!(controller.on_terminal_event(shift(KeyCode::Right), &sink), Flow::Continue);
        assert!(sink.inputs.borrow().is_empty());
    }

    #[test]
    fn test_paste_reaches_focused_runner() {
        let sink = RecordingSink::default();
        let mut controller = Controller::new(&services(&["a", "b"]));
        controller.on_terminal_event(Event::Resize(80, 24), &sink);
        controller.on_terminal_event(shift(KeyCode::Right), &sink);

        controller.on_terminal_event(Event::Paste("npm run build\n".into()), &sink);

        assert_eq!(*sink.inputs.borrow(), vec![(1, b"npm run build\n".to_vec())]);
    }

    #[cfg(unix)]
    #[test]
    fn test_entering_screen_enables_bracketed_paste() {
        let mut out = Vec::new();
        enter_screen(&mut out, || Ok(())).unwrap();
        let written = String::from_utf8_lossy(&out);
        assert!(written.contains("\x1b[?1049h"));
        assert!(written.contains("\x1b[?2004h"));

        let mut out = Vec::new();
        leave_screen(&mut out).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("\x1b[?2004l"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_attach_leaves_the_screen() {
        let mut out = Vec::new();
        let attached: io::Result<()> =
            enter_screen(&mut out, || Err(io::Error::other("no terminal")));

        assert!(attached.is_err());
        let written = String::from_utf8_lossy(&out);
        assert!(written.contains("\x1b[?1049l"));
        assert!(written.contains("\x1b[?2004l"));
        let entered = written.find("\x1b[?1049h").unwrap();
        let left = written.find("\x1b[?1049l").unwrap();
        assert!(entered < left);
    }

    #[tokio::test]
    async fn test_event_loop_applies_logs_and_quits() {
        let sink = RecordingSink::default();
        let services = services(&["api", "web"]);
        let mut controller = Controller::new(&services);
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();

        let (api_tx, api_rx) = mpsc::channel(RELAY_QUEUE_CAPACITY);
        let (web_tx, web_rx) = mpsc::channel(RELAY_QUEUE_CAPACITY);
        api_tx.send(LogEvent::status("api", ServiceStatus::Running)).await.unwrap();
        api_tx.send(LogEvent::line("api", "listening")).await.unwrap();
        web_tx.send(LogEvent::line("web", "compiled")).await.unwrap();
        drop(api_tx);
        drop(web_tx);

        // Input stays quiet until the queued logs are through, then quits.
        let input = stream::once(async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok::<_, io::Error>(key(KeyCode::Char('q')))
        })
        .boxed();

        event_loop(
            &mut terminal,
            &mut controller,
            &sink,
            vec![api_rx, web_rx],
            input,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let state = controller.state();
        assert!(state.ready);
        assert_eq!(state.panes[0].status, ServiceStatus::Running);
        assert_eq!(state.panes[0].viewport.len(), 2);
        assert_eq!(state.panes[1].viewport.len(), 1);
        assert_eq!(*sink.resizes.borrow(), vec![PaneSize::for_terminal(60, 10)]);
    }

    #[tokio::test]
    async fn test_event_loop_stops_on_cancel() {
        let sink = RecordingSink::default();
        let mut controller = Controller::new(&services(&["api"]));
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        let (_tx, rx) = mpsc::channel(RELAY_QUEUE_CAPACITY);
        let cancel = CancellationToken::new();
        cancel.cancel();

        event_loop(
            &mut terminal,
            &mut controller,
            &sink,
            vec![rx],
            stream::pending::<io::Result<Event>>().boxed(),
            &cancel,
        )
        .await
        .unwrap();
    }
}
