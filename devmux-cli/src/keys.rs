//! Keyboard handling: a few chords are ours, everything else belongs to
//! the focused service and is encoded the way a terminal would send it.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use devmux_core::reducer::ScrollAction;

/// Lines moved per scroll key press.
pub const SCROLL_STEP: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Quit,
    NextTab,
    PrevTab,
    Scroll(ScrollAction),
}

/// Whether the event is a press or auto-repeat. Releases are ignored.
pub fn is_actionable(key: &KeyEvent) -> bool {
    matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat)
}

pub fn control_for(key: &KeyEvent) -> Option<Control> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('q') if key.modifiers.is_empty() => Some(Control::Quit),
        KeyCode::Char('c' | 'C') if ctrl => Some(Control::Quit),
        KeyCode::Right if shift => Some(Control::NextTab),
        KeyCode::Left if shift => Some(Control::PrevTab),
        KeyCode::Up if shift => Some(Control::Scroll(ScrollAction::Up(SCROLL_STEP))),
        KeyCode::Down if shift => Some(Control::Scroll(ScrollAction::Down(SCROLL_STEP))),
        KeyCode::PageUp if shift => Some(Control::Scroll(ScrollAction::PageUp)),
        KeyCode::PageDown if shift => Some(Control::Scroll(ScrollAction::PageDown)),
        KeyCode::End if shift => Some(Control::Scroll(ScrollAction::Bottom)),
        _ => None,
    }
}

fn control_byte(c: char) -> Option<u8> {
    match c {
        ' ' | '@' => Some(0x00),
        'a'..='z' | 'A'..='Z' | '[' | '\\' | ']' | '^' | '_' => {
            Some(c.to_ascii_uppercase() as u8 & 0x1f)
        }
        '?' => Some(0x7f),
        _ => None,
    }
}

fn function_key(n: u8) -> Option<&'static [u8]> {
    let seq: &'static [u8] = match n {
        1 => b"\x1bOP",
        2 => b"\x1bOQ",
        3 => b"\x1bOR",
        4 => b"\x1bOS",
        5 => b"\x1b[15~",
        6 => b"\x1b[17~",
        7 => b"\x1b[18~",
        8 => b"\x1b[19~",
        9 => b"\x1b[20~",
        10 => b"\x1b[21~",
        11 => b"\x1b[23~",
        12 => b"\x1b[24~",
        _ => return None,
    };
    Some(seq)
}

/// The bytes a terminal sends for `key`, or `None` for keys with no
/// sensible encoding.
pub fn key_to_bytes(key: &KeyEvent) -> Option<Vec<u8>> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let fixed: &[u8] = match key.code {
        KeyCode::Char(c) => {
            let mut bytes = Vec::with_capacity(5);
            if alt {
                bytes.push(0x1b);
            }
            if ctrl {
                bytes.push(control_byte(c)?);
            } else {
                let mut utf8 = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
            return Some(bytes);
        }
        KeyCode::Enter => b"\r",
        KeyCode::Backspace => b"\x7f",
        KeyCode::Tab => b"\t",
        KeyCode::BackTab => b"\x1b[Z",
        KeyCode::Esc => b"\x1b",
        KeyCode::Up => b"\x1b[A",
        KeyCode::Down => b"\x1b[B",
        KeyCode::Right => b"\x1b[C",
        KeyCode::Left => b"\x1b[D",
        KeyCode::Home => b"\x1b[H",
        KeyCode::End => b"\x1b[F",
        KeyCode::Insert => b"\x1b[2~",
        KeyCode::Delete => b"\x1b[3~",
        KeyCode::PageUp => b"\x1b[5~",
        KeyCode::PageDown => b"\x1b[6~",
        KeyCode::F(n) => function_key(n)?,
        _ => return None,
    };
    Some(fixed.to_vec())
}
