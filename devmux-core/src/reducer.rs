use crate::event::LogEvent;
use crate::state::RenderState;
use crate::viewport::PaneLine;

/// Manual scroll-back on the focused pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    Up(usize),
    Down(usize),
    PageUp,
    PageDown,
    Bottom,
}

/// Everything that can change the view model.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    Log(LogEvent),
    Resize { width: u16, height: u16 },
    FocusNext,
    FocusPrev,
    Scroll(ScrollAction),
}

pub fn reduce(state: &mut RenderState, event: &UiEvent) {
    match event {
        UiEvent::Log(log) => reduce_log(state, log),
        UiEvent::Resize { width, height } => {
            state.width = *width;
            state.height = *height;
            state.ready = true;
            let size = state.pane_size();
            for pane in &mut state.panes {
                pane.viewport.resize(size.cols, size.rows);
            }
        }
        UiEvent::FocusNext => state.focus_next(),
        UiEvent::FocusPrev => state.focus_prev(),
        UiEvent::Scroll(action) => {
            let Some(pane) = state.focused_pane_mut() else {
                return;
            };
            let vp = &mut pane.viewport;
            match action {
                ScrollAction::Up(n) => vp.scroll_up(*n),
                ScrollAction::Down(n) => vp.scroll_down(*n),
                ScrollAction::PageUp => vp.page_up(),
                ScrollAction::PageDown => vp.page_down(),
                ScrollAction::Bottom => vp.goto_bottom(),
            }
        }
    }
}

fn reduce_log(state: &mut RenderState, event: &LogEvent) {
    let Some(pane) = state.pane_mut(event.service()) else {
        return;
    };

    match event {
        LogEvent::Line { text, stream, .. } => {
            pane.viewport.push(PaneLine::Output {
                text: text.clone(),
                stream: *stream,
            });
            pane.viewport.goto_bottom();
        }
        LogEvent::ClearScreen { .. } => pane.viewport.clear(),
        LogEvent::StatusChange { status, at, .. } => {
            pane.status = status.clone();
            pane.viewport.push(PaneLine::Status {
                at: *at,
                status: status.clone(),
            });
            pane.viewport.goto_bottom();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ServiceDescriptor, ServiceStatus};
    use crate::state::PaneSize;

    fn state(names: &[&str]) -> RenderState {
        let services: Vec<_> = names
            .iter()
            .map(|n| ServiceDescriptor::new(*n, "/srv", "run"))
            .collect();
        RenderState::new(&services)
    }

    fn log(state: &mut RenderState, event: LogEvent) {
        reduce(state, &UiEvent::Log(event));
    }

    #[test]
    fn test_line_only_touches_its_service() {
        let mut s = state(&["a", "b"]);
        log(&mut s, LogEvent::line("a", "hello"));
        assert_eq!(s.panes[0].viewport.len(), 1);
        assert_eq!(s.panes[1].viewport.len(), 0);
    }

    #[test]
    fn test_line_pins_to_bottom() {
        let mut s = state(&["a"]);
        reduce(&mut s, &UiEvent::Resize { width: 20, height: 3 });
        for i in 0..10 {
            log(&mut s, LogEvent::line("a", i.to_string()));
        }
        reduce(&mut s, &UiEvent::Scroll(ScrollAction::Up(4)));
        assert_eq!(s.panes[0].viewport.scroll_offset(), 4);
        log(&mut s, LogEvent::line("a", "new"));
        assert!(s.panes[0].viewport.at_bottom());
    }

    #[test]
    fn test_clear_screen_only_resets_its_service() {
        let mut s = state(&["a", "b"]);
        reduce(&mut s, &UiEvent::Resize { width: 20, height: 3 });
        for i in 0..6 {
            log(&mut s, LogEvent::line("a", i.to_string()));
            log(&mut s, LogEvent::line("b", i.to_string()));
        }
        reduce(&mut s, &UiEvent::FocusNext);
        reduce(&mut s, &UiEvent::Scroll(ScrollAction::Up(2)));

        log(
            &mut s,
            LogEvent::ClearScreen {
                service: "a".into(),
            },
        );
        assert!(s.panes[0].viewport.is_empty());
        assert_eq!(s.panes[1].viewport.len(), 6);
        assert_eq!(s.panes[1].viewport.scroll_offset(), 2);
    }

    #[test]
    fn test_status_change_appends_line_and_records_status() {
        let mut s = state(&["api"]);
        log(&mut s, LogEvent::status("api", ServiceStatus::Running));
        assert_eq!(s.panes[0].status, ServiceStatus::Running);
        assert!(matches!(
            s.panes[0].viewport.lines().last(),
            Some(PaneLine::Status {
                status: ServiceStatus::Running,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_service_is_ignored() {
        let mut s = state(&["a"]);
        log(&mut s, LogEvent::line("ghost", "boo"));
        assert_eq!(s.panes[0].viewport.len(), 0);
    }

    #[test]
    fn test_resize_applies_to_every_pane_and_marks_ready() {
        let mut s = state(&["a", "b", "c"]);
        assert!(!s.ready);
        reduce(&mut s, &UiEvent::Resize { width: 120, height: 40 });
        assert!(s.ready);
        let expected = PaneSize::for_terminal(120, 40);
        for pane in &s.panes {
            assert_eq!(pane.viewport.width(), expected.cols);
            assert_eq!(pane.viewport.height(), expected.rows);
        }
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut s = state(&["a", "b", "c"]);
        reduce(&mut s, &UiEvent::FocusPrev);
        assert_eq!(s.focused, 0);
        reduce(&mut s, &UiEvent::FocusNext);
        reduce(&mut s, &UiEvent::FocusNext);
        reduce(&mut s, &UiEvent::FocusNext);
        assert_eq!(s.focused, 2);
    }

    #[test]
    fn test_scroll_only_affects_focused_pane() {
        let mut s = state(&["a", "b"]);
        reduce(&mut s, &UiEvent::Resize { width: 20, height: 3 });
        for i in 0..10 {
            log(&mut s, LogEvent::line("a", i.to_string()));
            log(&mut s, LogEvent::line("b", i.to_string()));
        }
        reduce(&mut s, &UiEvent::Scroll(ScrollAction::PageUp));
        assert_eq!(s.panes[0].viewport.scroll_offset(), 2);
        assert!(s.panes[1].viewport.at_bottom());
        reduce(&mut s, &UiEvent::Scroll(ScrollAction::Bottom));
        assert!(s.panes[0].viewport.at_bottom());
    }

    #[test]
    fn test_scroll_on_empty_state_is_noop() {
        let mut s = state(&[]);
        reduce(&mut s, &UiEvent::Scroll(ScrollAction::Up(1)));
        reduce(&mut s, &UiEvent::FocusNext);
        assert!(s.is_empty());
    }
}
