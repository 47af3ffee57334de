//! Rendering relayed output that still carries its escape sequences.
//!
//! Buffers keep the child's bytes verbatim; only at draw time does a
//! `vte::Parser` walk them and turn SGR sequences (`ESC[...m`) into ratatui
//! styles. Cursor movement, OSC, DCS and charset escapes have no meaning in
//! a line-oriented pane and are dropped.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use vte::{Params, Parser, Perform};

const TAB_WIDTH: usize = 4;

struct SpanBuilder {
    base: Style,
    style: Style,
    buf: String,
    spans: Vec<Span<'static>>,
}

impl SpanBuilder {
    fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.spans
                .push(Span::styled(std::mem::take(&mut self.buf), self.style));
        }
    }
}

impl Perform for SpanBuilder {
    fn print(&mut self, c: char) {
        self.buf.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if byte == b'\t' {
            self.buf.push_str(&" ".repeat(TAB_WIDTH));
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        // Private-marker forms like `ESC[>4;2m` are not SGR.
        if action != 'm' || ignore || !intermediates.is_empty() {
            return;
        }
        let codes: Vec<u16> = params.iter().flatten().copied().collect();
        self.flush();
        self.style = apply_sgr(self.style, self.base, &codes);
    }
}

/// Split `text` into styled spans, starting from `base`.
pub fn to_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    // A carriage return mid-line means the child redrew the line in place
    // (progress bars); only the final redraw is visible.
    let trimmed = text.trim_end_matches('\r');
    let text = trimmed.rsplit('\r').next().unwrap_or(trimmed);

    let mut builder = SpanBuilder {
        base,
        style: base,
        buf: String::new(),
        spans: Vec::new(),
    };
    Parser::new().advance(&mut builder, text.as_bytes());
    builder.flush();
    builder.spans
}

fn apply_sgr(mut style: Style, base: Style, codes: &[u16]) -> Style {
    if codes.is_empty() {
        return base;
    }

    let mut i = 0;
    while i < codes.len() {
        match codes[i] {
            0 => style = base,
            1 => style = style.add_modifier(Modifier::BOLD),
            2 => style = style.add_modifier(Modifier::DIM),
            3 => style = style.add_modifier(Modifier::ITALIC),
            4 => style = style.add_modifier(Modifier::UNDERLINED),
            5 => style = style.add_modifier(Modifier::SLOW_BLINK),
            7 => style = style.add_modifier(Modifier::REVERSED),
            9 => style = style.add_modifier(Modifier::CROSSED_OUT),
            22 => style = style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style = style.remove_modifier(Modifier::ITALIC),
            24 => style = style.remove_modifier(Modifier::UNDERLINED),
            25 => style = style.remove_modifier(Modifier::SLOW_BLINK),
            27 => style = style.remove_modifier(Modifier::REVERSED),
            29 => style = style.remove_modifier(Modifier::CROSSED_OUT),
            n @ 30..=37 => style = style.fg(Color::Indexed((n - 30) as u8)),
            n @ 90..=97 => style = style.fg(Color::Indexed((n - 90 + 8) as u8)),
            n @ 40..=47 => style = style.bg(Color::Indexed((n - 40) as u8)),
            n @ 100..=107 => style = style.bg(Color::Indexed((n - 100 + 8) as u8)),
            39 => style.fg = base.fg,
            49 => style.bg = base.bg,
            38 | 48 => {
                let (color, used) = extended_color(&codes[i + 1..]);
                if let Some(color) = color {
                    style = if codes[i] == 38 {
                        style.fg(color)
                    } else {
                        style.bg(color)
                    };
                }
                i += used;
            }
            _ => {}
        }
        i += 1;
    }
    style
}

/// Parse the tail of a `38;...` / `48;...` sequence. Returns the colour and
/// how many extra codes it consumed.
fn extended_color(rest: &[u16]) -> (Option<Color>, usize) {
    match rest {
        [5, n, ..] => (u8::try_from(*n).ok().map(Color::Indexed), 2),
        [2, r, g, b, ..] => {
            let rgb = (u8::try_from(*r), u8::try_from(*g), u8::try_from(*b));
            match rgb {
                (Ok(r), Ok(g), Ok(b)) => (Some(Color::Rgb(r, g, b)), 4),
                _ => (None, 4),
            }
        }
        _ => (None, rest.len()),
    }
}
