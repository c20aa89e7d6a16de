/// The quick-launch bar docked at the bottom of the launcher
///
/// Icons in the bar stay visible whatever page is centered. The bar only has room for a few of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickLaunchBar {
    capacity: usize,
}

impl QuickLaunchBar {
    /// A bar holding at most `capacity` icons
    pub fn new(capacity: usize) -> Self {
        QuickLaunchBar { capacity }
    }

    /// Maximum number of icons in the bar
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
