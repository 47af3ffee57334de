use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph},
};

use devmux_core::state::{PANE_HORIZONTAL_CHROME, RenderState, ServicePane, TAB_BAR_ROWS};
use devmux_core::viewport::PaneLine;

use super::ansi;
use super::theme::styles;

const NAV_HINT: &str = "shift + ←/→ to switch tabs";
const NAV_HINT_SHORT: &str = "shift ←/→";
const TAB_SEPARATOR: &str = "│";

pub fn draw(frame: &mut Frame, state: &RenderState) {
    let area = frame.area();

    if !state.ready {
        frame.render_widget(Paragraph::new("Loading...").style(styles::muted()), area);
        return;
    }
    let Some(pane) = state.focused_pane() else {
        frame.render_widget(Paragraph::new("No services found"), area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(TAB_BAR_ROWS)])
        .split(area);

    let side = PANE_HORIZONTAL_CHROME / 2;
    let lines: Vec<Line> = pane.viewport.visible().map(|l| pane_line(pane, l)).collect();
    let body = Paragraph::new(lines).block(Block::default().padding(Padding::horizontal(side)));
    frame.render_widget(body, chunks[0]);

    frame.render_widget(Paragraph::new(tab_strip(state, chunks[1].width)), chunks[1]);
}

fn pane_line(pane: &ServicePane, line: &PaneLine) -> Line<'static> {
    match line {
        PaneLine::Output { text, stream } => {
            let mut spans = vec![
                Span::styled(format!(" {} ", pane.name), styles::service_tag(pane.color)),
                Span::styled("▌", styles::stream_glyph(*stream)),
                Span::raw(" "),
            ];
            spans.extend(ansi::to_spans(text, Default::default()));
            Line::from(spans)
        }
        PaneLine::Status { at, status } => Line::from(Span::styled(
            PaneLine::status_text(at, status),
            styles::status(status),
        )),
    }
}

fn tab_span(pane: &ServicePane, active: bool) -> Vec<Span<'static>> {
    vec![
        Span::styled(
            format!("  {} {}  ", styles::status_icon(&pane.status), pane.name),
            styles::tab(active),
        ),
        Span::styled(TAB_SEPARATOR, styles::tab_border()),
    ]
}

/// The one-row tab strip, never wider than `width`.
///
/// All tabs are shown when they fit, followed by a hint filler. When they
/// do not, only the focused tab is kept (truncated if need be).
pub fn tab_strip(state: &RenderState, width: u16) -> Line<'static> {
    let width = width as usize;
    if width == 0 {
        return Line::default();
    }

    let all: Vec<Span<'static>> = state
        .panes
        .iter()
        .enumerate()
        .flat_map(|(i, pane)| tab_span(pane, i == state.focused))
        .collect();
    let all_width: usize = all.iter().map(Span::width).sum();

    let mut spans = if all_width <= width {
        all
    } else if let Some(pane) = state.focused_pane() {
        fit_spans(tab_span(pane, true), width)
    } else {
        Vec::new()
    };

    let used: usize = spans.iter().map(Span::width).sum();
    let remaining = width - used;
    if remaining > 0 {
        spans.push(filler(remaining));
    }
    Line::from(spans)
}

fn filler(remaining: usize) -> Span<'static> {
    let hint_width = |s: &str| Span::raw(s).width();
    let text = if remaining > hint_width(NAV_HINT) + 4 {
        NAV_HINT
    } else if remaining > hint_width(NAV_HINT_SHORT) + 4 {
        NAV_HINT_SHORT
    } else {
        ""
    };
    let pad = remaining - hint_width(text) - usize::from(!text.is_empty());
    let content = if text.is_empty() {
        " ".repeat(remaining)
    } else {
        format!("{}{} ", " ".repeat(pad), text)
    };
    Span::styled(content, styles::tab_fill())
}

fn fit_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Span<'static>> {
    let mut out = Vec::new();
    let mut left = width;
    for span in spans {
        if left == 0 {
            break;
        }
        if span.width() <= left {
            left -= span.width();
            out.push(span);
            continue;
        }
        let mut cut = String::new();
        let mut used = 0;
        for c in span.content.chars() {
            let w = Span::raw(c.to_string()).width();
            if used + w > left {
                break;
            }
            used += w;
            cut.push(c);
        }
        out.push(Span::styled(cut, span.style));
        break;
    }
    out
}
