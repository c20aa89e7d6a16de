use crate::utils::{Global, Point, Rectangle, Size};

use super::zone::{Zone, ZoneClassifier, ZoneConfig};

/// A page of the launcher grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    capacity: usize,
}

impl Page {
    /// A page holding at most `capacity` icons
    pub fn new(capacity: usize) -> Self {
        Page { capacity }
    }

    /// Maximum number of icons on this page
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Zones of a page displayed at `geometry`, under the docked containers covering it
    ///
    /// `docked` areas are given in the global space.
    pub fn classifier(
        &self,
        geometry: Rectangle<f64, Global>,
        docked: impl IntoIterator<Item = (Zone, Rectangle<f64, Global>)>,
        config: &ZoneConfig,
    ) -> ZoneClassifier {
        docked.into_iter().fold(
            ZoneClassifier::new(geometry.size.cast(), config.border_width),
            |classifier, (zone, area)| classifier.with_docked(zone, area.to_local(geometry.loc)),
        )
    }
}

/// Where page `index` is displayed, for a given pan `anchor`
pub(crate) fn page_geometry(index: usize, anchor: f64, size: Size<f64, Global>) -> Rectangle<f64, Global> {
    Rectangle {
        loc: Point::from((index as f64 * size.w - anchor, 0.0)),
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docked_areas_follow_the_page() {
        let page = Page::new(16);
        let geometry = page_geometry(1, 200.0, (400.0, 800.0).into());
        assert_eq!(geometry.loc, (200.0, 0.0).into());

        let bar = Rectangle::from_loc_and_size((0.0, 700.0), (400.0, 100.0));
        let zones = page.classifier(geometry, [(Zone::Bar, bar)], &ZoneConfig::default());
        // global (300, 750) is page-local (100, 750)
        assert_eq!(zones.classify((100.0, 750.0).into()), Zone::Bar);
        // global (500, 750) is past the bar, page-local (300, 750)
        assert_eq!(zones.classify((300.0, 750.0).into()), Zone::Inner);
    }
}
