use crate::utils::{Local, Point, Size};

/// The tab bar docked at the top of the launcher, one tab per page
///
/// The tab bar never keeps icons. An icon dropped on a tab is moved to the page of that tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabBar {
    tabs: usize,
}

impl TabBar {
    /// A tab bar showing `tabs` tabs
    pub fn new(tabs: usize) -> Self {
        TabBar { tabs }
    }

    /// Number of tabs
    pub fn tabs(&self) -> usize {
        self.tabs
    }

    pub(crate) fn set_tabs(&mut self, tabs: usize) {
        self.tabs = tabs;
    }

    /// Tab under a point local to a tab bar of size `size`
    ///
    /// Tabs share the width of the bar equally.
    pub fn tab_at(&self, point: Point<f64, Local>, size: Size<f64, Local>) -> Option<usize> {
        if self.tabs == 0 || size.w <= 0.0 {
            return None;
        }
        if point.x < 0.0 || point.x >= size.w || point.y < 0.0 || point.y >= size.h {
            return None;
        }
        let width = size.w / self.tabs as f64;
        Some(((point.x / width) as usize).min(self.tabs - 1))
    }
}
