use smallvec::SmallVec;
use tracing::trace;

use crate::{
    transfer::Direction,
    utils::{Local, Point, Rectangle, Size},
};

/// Named region of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Content area of the container
    Inner,
    /// Band along the left edge of a page
    LeftBorder,
    /// Band along the right edge of a page
    RightBorder,
    /// Area of a page covered by the quick-launch bar
    Bar,
    /// Area of a page covered by the tab bar
    Tray,
    /// Not inside the container at all
    Outside,
}

impl Zone {
    /// Whether this is one of the border bands triggering auto-pan
    pub fn is_border(self) -> bool {
        matches!(self, Zone::LeftBorder | Zone::RightBorder)
    }

    /// Direction a drag leaves the container in, when sitting in this zone
    pub fn direction(self) -> Option<Direction> {
        match self {
            Zone::LeftBorder => Some(Direction::Left),
            Zone::RightBorder => Some(Direction::Right),
            Zone::Bar => Some(Direction::Down),
            Zone::Tray => Some(Direction::Up),
            Zone::Inner | Zone::Outside => None,
        }
    }
}

/// Geometry of the zones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneConfig {
    /// Width of the left and right border bands of a page
    pub border_width: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig { border_width: 32.0 }
    }
}

/// Classifies container-local points into [`Zone`]s
///
/// Docked areas take precedence over the border bands, which take precedence over the inner area.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    bounds: Size<f64, Local>,
    border_width: f64,
    docked: SmallVec<[(Zone, Rectangle<f64, Local>); 2]>,
}

impl ZoneClassifier {
    /// Classifier for a container of size `bounds`
    ///
    /// A `border_width` of zero disables the border bands.
    pub fn new(bounds: Size<f64, Local>, border_width: f64) -> Self {
        ZoneClassifier {
            bounds,
            border_width: border_width.max(0.0),
            docked: SmallVec::new(),
        }
    }

    /// Declare that `area` of the container is covered by a docked container, reported as `zone`
    pub fn with_docked(mut self, zone: Zone, area: Rectangle<f64, Local>) -> Self {
        self.docked.push((zone, area));
        self
    }

    /// Classify a container-local point
    pub fn classify(&self, point: Point<f64, Local>) -> Zone {
        let zone = if !Rectangle::from_size(self.bounds).contains(point) {
            Zone::Outside
        } else if let Some((zone, _)) = self.docked.iter().find(|(_, area)| area.contains(point)) {
            *zone
        } else if point.x < self.border_width {
            Zone::LeftBorder
        } else if point.x >= self.bounds.w - self.border_width {
            Zone::RightBorder
        } else {
            Zone::Inner
        };
        trace!(?point, ?zone, "classified");
        zone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> ZoneClassifier {
        ZoneClassifier::new((400.0, 800.0).into(), 30.0)
            .with_docked(Zone::Tray, Rectangle::from_loc_and_size((0.0, 0.0), (400.0, 40.0)))
            .with_docked(Zone::Bar, Rectangle::from_loc_and_size((0.0, 700.0), (400.0, 100.0)))
    }

    #[test]
    fn page_zones() {
        let zones = page();
        assert_eq!(zones.classify((200.0, 300.0).into()), Zone::Inner);
        assert_eq!(zones.classify((10.0, 300.0).into()), Zone::LeftBorder);
        assert_eq!(zones.classify((390.0, 300.0).into()), Zone::RightBorder);
        assert_eq!(zones.classify((200.0, 750.0).into()), Zone::Bar);
        assert_eq!(zones.classify((200.0, 20.0).into()), Zone::Tray);
        assert_eq!(zones.classify((-1.0, 300.0).into()), Zone::Outside);
        assert_eq!(zones.classify((200.0, 800.0).into()), Zone::Outside);
    }

    #[test]
    fn docked_areas_win_over_borders() {
        let zones = page();
        assert_eq!(zones.classify((5.0, 750.0).into()), Zone::Bar);
        assert_eq!(zones.classify((395.0, 5.0).into()), Zone::Tray);
    }

    #[test]
    fn no_border_bands_without_width() {
        let zones = ZoneClassifier::new((400.0, 100.0).into(), 0.0);
        assert_eq!(zones.classify((0.0, 50.0).into()), Zone::Inner);
        assert_eq!(zones.classify((399.0, 50.0).into()), Zone::Inner);
        assert_eq!(zones.classify((400.0, 50.0).into()), Zone::Outside);
    }

    #[test]
    fn zone_directions() {
        assert_eq!(Zone::LeftBorder.direction(), Some(Direction::Left));
        assert_eq!(Zone::Tray.direction(), Some(Direction::Up));
        assert_eq!(Zone::Inner.direction(), None);
        assert!(Zone::RightBorder.is_border());
        assert!(!Zone::Bar.is_border());
    }
}
