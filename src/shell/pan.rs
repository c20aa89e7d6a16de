//! Horizontal paging state
//!
//! The pages are laid out side by side and scrolled by a shared horizontal *anchor*: page `i` is
//! displayed at offset `i * page_width - anchor`. A page is *centered* when its offset is zero.
//! Changing the centered page runs a [`SnapAnimation`] of the anchor, during which no page is
//! centered.

use tracing::{debug, trace};

use crate::utils::easing::Easing;

/// Parameters of the snap animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanConfig {
    /// Duration of a snap to a neighbour page, in milliseconds
    pub duration: u32,
    /// Easing curve of the snap
    pub easing: Easing,
}

impl Default for PanConfig {
    fn default() -> Self {
        PanConfig {
            duration: 250,
            easing: Easing::OutCubic,
        }
    }
}

/// A running animation of the anchor towards a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapAnimation {
    from: f64,
    to: f64,
    target: usize,
    start: u32,
    duration: u32,
}

impl SnapAnimation {
    /// Page the animation centers
    pub fn target(&self) -> usize {
        self.target
    }

    /// Linear progress at `now`, in `[0, 1]`
    fn progress(&self, now: u32) -> f64 {
        if self.duration == 0 {
            return 1.0;
        }
        (now.wrapping_sub(self.start) as f64 / self.duration as f64).clamp(0.0, 1.0)
    }
}

/// Anchor, animation and centered page bookkeeping
#[derive(Debug, Clone)]
pub struct PanState {
    anchor: f64,
    page_width: f64,
    page_count: usize,
    animation: Option<SnapAnimation>,
    last_visited: Option<usize>,
    config: PanConfig,
}

impl PanState {
    /// Paging state showing the first of `page_count` pages
    pub fn new(page_width: f64, page_count: usize, config: PanConfig) -> Self {
        PanState {
            anchor: 0.0,
            page_width,
            page_count,
            animation: None,
            last_visited: (page_count > 0).then_some(0),
            config,
        }
    }

    /// Current anchor
    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Horizontal offset at which page `index` is displayed
    pub fn offset_of(&self, index: usize) -> f64 {
        index as f64 * self.page_width - self.anchor
    }

    fn max_anchor(&self) -> f64 {
        self.page_count.saturating_sub(1) as f64 * self.page_width
    }

    /// The centered page, `None` while panning
    pub fn centered(&self) -> Option<usize> {
        if self.animation.is_some() {
            return None;
        }
        let tolerance = f64::EPSILON * self.page_width.max(1.0) * self.page_count.max(1) as f64;
        (0..self.page_count).find(|index| self.offset_of(*index).abs() <= tolerance)
    }

    /// Whether a snap animation is running
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// The running snap animation
    pub fn animation(&self) -> Option<&SnapAnimation> {
        self.animation.as_ref()
    }

    /// The page that was centered last
    pub fn last_visited(&self) -> Option<usize> {
        self.last_visited
    }

    /// Start snapping to page `index`
    ///
    /// Returns `false` if `index` does not exist, is already centered or already the target of the
    /// running animation.
    pub fn pan_to(&mut self, index: usize, now: u32) -> bool {
        if index >= self.page_count {
            return false;
        }
        if self.centered() == Some(index) || self.animation.map(|a| a.target) == Some(index) {
            return false;
        }
        debug!(from = self.anchor, page = index, "snapping");
        self.animation = Some(SnapAnimation {
            from: self.anchor,
            to: index as f64 * self.page_width,
            target: index,
            start: now,
            duration: self.config.duration,
        });
        true
    }

    /// Start snapping `delta` pages away from the centered (or targeted) page
    pub fn pan_by(&mut self, delta: isize, now: u32) -> bool {
        let base = match (self.animation, self.centered()) {
            (Some(animation), _) => animation.target,
            (None, Some(index)) => index,
            (None, None) => self.nearest(),
        };
        match base.checked_add_signed(delta) {
            Some(index) => self.pan_to(index, now),
            None => false,
        }
    }

    fn nearest(&self) -> usize {
        if self.page_width <= 0.0 {
            return 0;
        }
        ((self.anchor / self.page_width).round().max(0.0) as usize).min(self.page_count.saturating_sub(1))
    }

    /// Advance the snap animation to `now`
    ///
    /// Returns the page that became centered if the animation finished.
    pub fn advance(&mut self, now: u32) -> Option<usize> {
        let animation = self.animation?;
        let progress = animation.progress(now);
        if progress >= 1.0 {
            self.anchor = animation.to;
            self.animation = None;
            self.last_visited = Some(animation.target);
            debug!(page = animation.target, "page centered");
            return Some(animation.target);
        }
        self.anchor = animation.from + (animation.to - animation.from) * self.config.easing.apply(progress);
        trace!(anchor = self.anchor, "snap progress");
        None
    }

    /// Move the anchor directly, as a pan gesture does
    ///
    /// Stops any running animation. The anchor is kept within the pages.
    pub fn drag(&mut self, anchor: f64) {
        self.animation = None;
        self.anchor = anchor.clamp(0.0, self.max_anchor());
    }

    /// Finish a pan gesture released with horizontal `velocity` (pixels per millisecond)
    ///
    /// A contact moving faster than `threshold` carries the pages to the next page in its direction,
    /// otherwise the nearest page is snapped to.
    pub fn fling(&mut self, velocity: f64, threshold: f64, now: u32) -> bool {
        if self.page_width <= 0.0 || self.page_count == 0 {
            return false;
        }
        let position = self.anchor / self.page_width;
        let index = if velocity <= -threshold {
            position.ceil()
        } else if velocity >= threshold {
            position.floor()
        } else {
            position.round()
        };
        let index = (index.max(0.0) as usize).min(self.page_count - 1);
        self.pan_to(index, now)
    }

    /// Update the number of pages, keeping the anchor within them
    pub fn set_page_count(&mut self, count: usize) {
        self.page_count = count;
        if let Some(animation) = self.animation {
            if animation.target >= count {
                self.animation = None;
            }
        }
        self.anchor = self.anchor.clamp(0.0, self.max_anchor());
        self.last_visited = match self.last_visited {
            Some(index) if index < count => Some(index),
            _ => count.checked_sub(1),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pages: usize) -> PanState {
        PanState::new(400.0, pages, PanConfig::default())
    }

    #[test]
    fn starts_centered_on_first_page() {
        let pan = state(3);
        assert_eq!(pan.centered(), Some(0));
        assert_eq!(pan.last_visited(), Some(0));
        assert_eq!(pan.offset_of(1), 400.0);
    }

    #[test]
    fn no_page_is_centered_while_animating() {
        let mut pan = state(3);
        assert!(pan.pan_to(1, 1000));
        assert_eq!(pan.centered(), None);
        assert_eq!(pan.advance(1100), None);
        assert!(pan.anchor() > 0.0 && pan.anchor() < 400.0);
        assert_eq!(pan.centered(), None);
        assert_eq!(pan.advance(1250), Some(1));
        assert_eq!(pan.anchor(), 400.0);
        assert_eq!(pan.centered(), Some(1));
        assert_eq!(pan.last_visited(), Some(1));
    }

    #[test]
    fn pan_to_centered_page_is_a_noop() {
        let mut pan = state(3);
        assert!(!pan.pan_to(0, 0));
        assert!(!pan.is_animating());
        assert!(!pan.pan_to(3, 0));
    }

    #[test]
    fn pan_by_stays_within_pages() {
        let mut pan = state(2);
        assert!(!pan.pan_by(-1, 0));
        assert!(pan.pan_by(1, 0));
        // already heading there
        assert!(!pan.pan_by(0, 10));
        pan.advance(1000);
        assert!(!pan.pan_by(1, 1000));
    }

    #[test]
    fn fling_picks_the_page_in_the_flick_direction() {
        let mut pan = state(3);
        pan.drag(100.0);
        assert!(pan.fling(-1.0, 0.4, 0));
        assert_eq!(pan.animation().map(|a| a.target()), Some(1));

        let mut pan = state(3);
        pan.drag(100.0);
        assert!(pan.fling(0.0, 0.4, 0));
        assert_eq!(pan.animation().map(|a| a.target()), Some(0));

        let mut pan = state(3);
        pan.drag(700.0);
        assert!(pan.fling(1.0, 0.4, 0));
        assert_eq!(pan.animation().map(|a| a.target()), Some(1));
    }

    #[test]
    fn drag_is_clamped() {
        let mut pan = state(2);
        pan.drag(-50.0);
        assert_eq!(pan.anchor(), 0.0);
        pan.drag(5000.0);
        assert_eq!(pan.anchor(), 400.0);
    }

    #[test]
    fn removing_pages_clamps_state() {
        let mut pan = state(3);
        assert!(pan.pan_to(2, 0));
        pan.advance(1000);
        assert_eq!(pan.last_visited(), Some(2));
        pan.set_page_count(2);
        assert_eq!(pan.anchor(), 400.0);
        assert_eq!(pan.centered(), Some(1));
        assert_eq!(pan.last_visited(), Some(1));
    }
}
