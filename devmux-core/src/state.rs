use crate::model::{ServiceDescriptor, ServiceId, ServiceStatus};
use crate::viewport::Viewport;

/// Rows reserved below the pane for the tab strip.
pub const TAB_BAR_ROWS: u16 = 1;
/// Columns reserved for the pane's horizontal padding.
pub const PANE_HORIZONTAL_CHROME: u16 = 4;

/// Pane size used until the first resize arrives.
pub const DEFAULT_PANE_SIZE: PaneSize = PaneSize {
    cols: 120,
    rows: 50,
};

/// Background colours (xterm-256 indices) for service name tags.
pub const SERVICE_PALETTE: [u8; 5] = [
    22, // dark green
    23, // dark cyan
    54, // dark purple
    94, // dark orange
    58, // olive
];

pub fn service_color(index: usize) -> u8 {
    SERVICE_PALETTE[index % SERVICE_PALETTE.len()]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaneSize {
    pub cols: u16,
    pub rows: u16,
}

impl PaneSize {
    /// Usable content area for a terminal of the given size.
    pub fn for_terminal(width: u16, height: u16) -> Self {
        Self {
            cols: width.saturating_sub(PANE_HORIZONTAL_CHROME).max(1),
            rows: height.saturating_sub(TAB_BAR_ROWS).max(1),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServicePane {
    pub name: ServiceId,
    pub color: u8,
    pub status: ServiceStatus,
    pub viewport: Viewport,
}

/// The single-owner view model. Only the event loop touches it.
#[derive(Clone, Debug)]
pub struct RenderState {
    pub panes: Vec<ServicePane>,
    pub focused: usize,
    pub width: u16,
    pub height: u16,
    pub ready: bool,
}

impl RenderState {
    pub fn new(services: &[ServiceDescriptor]) -> Self {
        let size = DEFAULT_PANE_SIZE;
        let panes = services
            .iter()
            .enumerate()
            .map(|(i, svc)| ServicePane {
                name: svc.name.clone(),
                color: service_color(i),
                status: ServiceStatus::Starting,
                viewport: Viewport::new(size.cols, size.rows),
            })
            .collect();

        Self {
            panes,
            focused: 0,
            width: 0,
            height: 0,
            ready: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn focused_pane(&self) -> Option<&ServicePane> {
        self.panes.get(self.focused)
    }

    pub fn focused_pane_mut(&mut self) -> Option<&mut ServicePane> {
        self.panes.get_mut(self.focused)
    }

    pub fn focused_index(&self) -> Option<usize> {
        (!self.panes.is_empty()).then_some(self.focused)
    }

    pub fn pane_mut(&mut self, name: &str) -> Option<&mut ServicePane> {
        self.panes.iter_mut().find(|p| p.name == name)
    }

    pub fn pane_size(&self) -> PaneSize {
        if self.ready {
            PaneSize::for_terminal(self.width, self.height)
        } else {
            DEFAULT_PANE_SIZE
        }
    }

    pub fn focus_next(&mut self) {
        if !self.panes.is_empty() {
            self.focused = (self.focused + 1).min(self.panes.len() - 1);
        }
    }

    pub fn focus_prev(&mut self) {
        self.focused = self.focused.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services(names: &[&str]) -> Vec<ServiceDescriptor> {
        names
            .iter()
            .map(|n| ServiceDescriptor::new(*n, "/tmp", "true"))
            .collect()
    }

    #[test]
    fn test_one_pane_per_service_in_order() {
        let state = RenderState::new(&services(&["web", "api", "db"]));
        let names: Vec<_> = state.panes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["web", "api", "db"]);
        assert_eq!(state.focused_index(), Some(0));
        assert!(!state.ready);
    }

    #[test]
    fn test_focus_is_clamped() {
        let mut state = RenderState::new(&services(&["a", "b"]));
        state.focus_prev();
        assert_eq!(state.focused, 0);
        state.focus_next();
        assert_eq!(state.focused, 1);
        state.focus_next();
        assert_eq!(state.focused, 1);
    }

    #[test]
    fn test_focus_on_empty_state() {
        let mut state = RenderState::new(&[]);
        state.focus_next();
        state.focus_prev();
        assert_eq!(state.focused_index(), None);
        assert!(state.focused_pane().is_none());
    }

    #[test]
    fn test_palette_wraps() {
        let state = RenderState::new(&services(&["a", "b", "c", "d", "e", "f"]));
        assert_eq!(state.panes[0].color, SERVICE_PALETTE[0]);
        assert_eq!(state.panes[5].color, SERVICE_PALETTE[0]);
        assert_eq!(state.panes[4].color, SERVICE_PALETTE[4]);
    }

    #[test]
    fn test_pane_size_subtracts_chrome() {
        assert_eq!(
            PaneSize::for_terminal(120, 40),
            PaneSize { cols: 116, rows: 39 }
        );
        assert_eq!(PaneSize::for_terminal(2, 1), PaneSize { cols: 1, rows: 1 });
    }
}
