//! UI Theme Module - palette tokens and style helpers for the tab strip and panes
//!
//! Colours are xterm-256 indices so they survive terminals without truecolor.

use ratatui::style::{Color, Modifier, Style};

use devmux_core::model::{LogStream, ServiceStatus};

/// Color palette tokens for the theme
#[derive(Clone, Debug)]
pub struct Palette {
    /// Inactive tab background
    pub tab_bg: Color,
    /// Inactive tab text
    pub tab_fg: Color,
    /// Focused tab background
    pub tab_active_bg: Color,
    /// Focused tab text
    pub tab_active_fg: Color,
    /// Separator between tabs
    pub tab_border: Color,
    /// Filler text to the right of the tabs
    pub tab_fill_fg: Color,
    /// Text drawn on top of a service's colour tag
    pub tag_fg: Color,
    /// Glyph for relayed output
    pub stdout_glyph: Color,
    /// Glyph for error output
    pub stderr_glyph: Color,
    /// Muted text (status lines, loading state)
    pub text_muted: Color,
    /// Success state (running)
    pub success: Color,
    /// Warning state (starting)
    pub warn: Color,
    /// Error state (failed)
    pub error: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::vim()
    }
}

impl Palette {
    /// Vim-like tab line: dark inactive tabs, bright focused tab
    pub fn vim() -> Self {
        Self {
            tab_bg: Color::Indexed(238),
            tab_fg: Color::Indexed(252),
            tab_active_bg: Color::Indexed(255),
            tab_active_fg: Color::Indexed(16),
            tab_border: Color::Indexed(235),
            tab_fill_fg: Color::Indexed(250),
            tag_fg: Color::Indexed(231),
            stdout_glyph: Color::Indexed(28),
            stderr_glyph: Color::Indexed(196),
            text_muted: Color::Indexed(244),
            success: Color::Indexed(35),
            warn: Color::Indexed(178),
            error: Color::Indexed(167),
        }
    }
}

/// Theme configuration
#[derive(Clone, Debug, Default)]
pub struct Theme {
    pub palette: Palette,
}

impl Theme {
    /// Style for a tab in the strip
    pub fn tab_style(&self, active: bool) -> Style {
        if active {
            Style::default()
                .bg(self.palette.tab_active_bg)
                .fg(self.palette.tab_active_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .bg(self.palette.tab_bg)
                .fg(self.palette.tab_fg)
        }
    }

    pub fn tab_border_style(&self) -> Style {
        Style::default()
            .bg(self.palette.tab_bg)
            .fg(self.palette.tab_border)
    }

    pub fn tab_fill_style(&self) -> Style {
        Style::default()
            .bg(self.palette.tab_bg)
            .fg(self.palette.tab_fill_fg)
            .add_modifier(Modifier::ITALIC)
    }

    /// Coloured name tag prefixed to every output line
    pub fn service_tag_style(&self, color: u8) -> Style {
        Style::default()
            .bg(Color::Indexed(color))
            .fg(self.palette.tag_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn stream_glyph_style(&self, stream: LogStream) -> Style {
        let color = if stream.is_error() {
            self.palette.stderr_glyph
        } else {
            self.palette.stdout_glyph
        };
        Style::default().fg(color)
    }

    /// Style for service status
    pub fn status_style(&self, status: &ServiceStatus) -> Style {
        let color = match status {
            ServiceStatus::Running => self.palette.success,
            ServiceStatus::Starting => self.palette.warn,
            ServiceStatus::Stopped { code: Some(0) | None } => self.palette.text_muted,
            ServiceStatus::Stopped { .. } | ServiceStatus::Failed { .. } => self.palette.error,
        };
        Style::default().fg(color)
    }

    /// Icon for service status
    pub fn status_icon(&self, status: &ServiceStatus) -> &'static str {
        match status {
            ServiceStatus::Running => "●",
            ServiceStatus::Starting => "◐",
            ServiceStatus::Stopped { code: Some(0) | None } => "○",
            ServiceStatus::Stopped { .. } | ServiceStatus::Failed { .. } => "✗",
        }
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.palette.text_muted)
    }
}

static DEFAULT_THEME: std::sync::OnceLock<Theme> = std::sync::OnceLock::new();

pub fn theme() -> &'static Theme {
    DEFAULT_THEME.get_or_init(Theme::default)
}

/// Convenience re-exports for common use cases
pub mod styles {
    use super::*;

    pub fn tab(active: bool) -> Style {
        theme().tab_style(active)
    }

    pub fn tab_border() -> Style {
        theme().tab_border_style()
    }

    pub fn tab_fill() -> Style {
        theme().tab_fill_style()
    }

    pub fn service_tag(color: u8) -> Style {
        theme().service_tag_style(color)
    }

    pub fn stream_glyph(stream: LogStream) -> Style {
        theme().stream_glyph_style(stream)
    }

    pub fn status(status: &ServiceStatus) -> Style {
        theme().status_style(status)
    }

    pub fn status_icon(status: &ServiceStatus) -> &'static str {
        theme().status_icon(status)
    }

    pub fn muted() -> Style {
        theme().muted_style()
    }
}
