//! Gesture recognition on top of the [`PointerArbiter`]
//!
//! The recognizer never acts on a contact directly. It inspects the contact register, decides which
//! gesture family the contact looks like and asks the arbiter to claim it. Only a successful claim
//! is reported back to the caller.
//!
//! - A contact held still on an icon for [`GestureConfig::long_press_timeout`] becomes a
//!   [`GestureKind::LongPress`], which lifts the icon.
//! - A contact moving further than [`GestureConfig::drag_threshold`] before that becomes a
//!   [`GestureKind::Flick`], which pans the pages.
//! - A contact released without either becomes a [`GestureKind::Tap`].

use tracing::trace;

use crate::utils::{Global, Point};

use super::{ContactId, GestureKind, PointerArbiter};

/// Thresholds used to tell gestures apart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Distance in pixels a contact has to travel before it counts as moving
    pub drag_threshold: f64,
    /// Time in milliseconds a still contact on an icon needs to become a long press
    pub long_press_timeout: u32,
    /// Horizontal speed in pixels per millisecond above which a released pan flings to the neighbour page
    pub flick_velocity: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            drag_threshold: 16.0,
            long_press_timeout: 600,
            flick_velocity: 0.4,
        }
    }
}

/// Stateless recognizer claiming contacts through the [`PointerArbiter`]
#[derive(Debug, Default, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
}

impl GestureRecognizer {
    /// Create a recognizer with the given thresholds
    pub fn new(config: GestureConfig) -> Self {
        GestureRecognizer { config }
    }

    /// The thresholds of this recognizer
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Inspect a motion of `contact`, before it is recorded in its register
    ///
    /// Returns the gesture kind that was claimed because of this motion, if any.
    pub fn motion(
        &self,
        arbiter: &mut PointerArbiter,
        contact: ContactId,
        location: Point<f64, Global>,
        time: u32,
    ) -> Option<GestureKind> {
        let register = arbiter.get(contact)?;
        if register.claimed() != GestureKind::None || !register.is_valid() {
            return None;
        }

        if register.start().distance(location) < self.config.drag_threshold {
            return self.long_press(arbiter, contact, time);
        }

        let held = time.wrapping_sub(register.start_time()) >= self.config.long_press_timeout;
        let kind = if register.pressed().is_some() && held {
            GestureKind::LongPress
        } else {
            GestureKind::Flick
        };
        trace!(?contact, ?kind, "contact left the drag threshold");
        arbiter
            .claim(contact, GestureKind::None, kind)
            .then_some(kind)
    }

    /// Check whether `contact` has been held long enough on an icon to become a long press
    pub fn long_press(
        &self,
        arbiter: &mut PointerArbiter,
        contact: ContactId,
        time: u32,
    ) -> Option<GestureKind> {
        let register = arbiter.get(contact)?;
        if register.claimed() != GestureKind::None || !register.is_valid() || register.pressed().is_none() {
            return None;
        }
        if register.start().distance(register.last()) >= self.config.drag_threshold {
            return None;
        }
        if time.wrapping_sub(register.start_time()) < self.config.long_press_timeout {
            return None;
        }

        arbiter
            .claim(contact, GestureKind::None, GestureKind::LongPress)
            .then_some(GestureKind::LongPress)
    }

    /// Inspect the release of `contact`
    ///
    /// Returns [`GestureKind::Tap`] if the release completed a tap.
    pub fn release(
        &self,
        arbiter: &mut PointerArbiter,
        contact: ContactId,
        location: Point<f64, Global>,
    ) -> Option<GestureKind> {
        let register = arbiter.get(contact)?;
        if register.claimed() != GestureKind::None || !register.is_valid() {
            return None;
        }
        if register.start().distance(location) >= self.config.drag_threshold {
            return None;
        }

        arbiter
            .claim(contact, GestureKind::None, GestureKind::Tap)
            .then_some(GestureKind::Tap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ContactRegister;
    use crate::shell::{Container, ContainerHandle};
    use crate::transfer::{Icon, IconHandle};
    use crate::utils::Arena;

    struct Fixture {
        arbiter: PointerArbiter,
        origin: ContainerHandle,
        icon: IconHandle,
        recognizer: GestureRecognizer,
        _containers: Arena<Container>,
        _icons: Arena<Icon>,
    }

    fn fixture() -> Fixture {
        let mut containers = Arena::new();
        let origin = containers.insert(Container::root((480.0, 800.0).into()));
        let mut icons = Arena::new();
        let icon = icons.insert(Icon::new("org.example.clock", (80.0, 80.0).into()));
        Fixture {
            arbiter: PointerArbiter::new(),
            origin,
            icon,
            recognizer: GestureRecognizer::default(),
            _containers: containers,
            _icons: icons,
        }
    }

    #[test]
    fn still_contact_on_icon_becomes_long_press() {
        let mut f = fixture();
        let contact = ContactId(1);
        let register = ContactRegister::new(f.origin, (50.0, 50.0).into(), 1000)
            .with_pressed(f.icon, (10.0, 10.0).into());
        f.arbiter.begin(contact, register).unwrap();

        assert_eq!(f.recognizer.long_press(&mut f.arbiter, contact, 1300), None);
        assert_eq!(
            f.recognizer.long_press(&mut f.arbiter, contact, 1600),
            Some(GestureKind::LongPress)
        );
        // already claimed, a tap can no longer win
        assert_eq!(f.recognizer.release(&mut f.arbiter, contact, (50.0, 50.0).into()), None);
    }

    #[test]
    fn early_motion_becomes_flick() {
        let mut f = fixture();
        let contact = ContactId(1);
        let register =
            ContactRegister::new(f.origin, (50.0, 50.0).into(), 0).with_pressed(f.icon, (0.0, 0.0).into());
        f.arbiter.begin(contact, register).unwrap();

        assert_eq!(f.recognizer.motion(&mut f.arbiter, contact, (55.0, 50.0).into(), 50), None);
        assert_eq!(
            f.recognizer.motion(&mut f.arbiter, contact, (120.0, 50.0).into(), 100),
            Some(GestureKind::Flick)
        );
        assert_eq!(f.recognizer.long_press(&mut f.arbiter, contact, 5000), None);
    }

    #[test]
    fn late_motion_on_icon_becomes_long_press() {
        let mut f = fixture();
        let contact = ContactId(1);
        let register =
            ContactRegister::new(f.origin, (50.0, 50.0).into(), 0).with_pressed(f.icon, (0.0, 0.0).into());
        f.arbiter.begin(contact, register).unwrap();

        assert_eq!(
            f.recognizer.motion(&mut f.arbiter, contact, (120.0, 50.0).into(), 900),
            Some(GestureKind::LongPress)
        );
    }

    #[test]
    fn short_release_is_a_tap() {
        let mut f = fixture();
        let contact = ContactId(4);
        f.arbiter
            .begin(contact, ContactRegister::new(f.origin, (50.0, 50.0).into(), 0))
            .unwrap();
        assert_eq!(
            f.recognizer.release(&mut f.arbiter, contact, (52.0, 51.0).into()),
            Some(GestureKind::Tap)
        );
        assert_eq!(f.arbiter.get(contact).unwrap().claimed(), GestureKind::Tap);
    }

    #[test]
    fn long_press_needs_an_icon() {
        let mut f = fixture();
        let contact = ContactId(2);
        f.arbiter
            .begin(contact, ContactRegister::new(f.origin, (50.0, 50.0).into(), 0))
            .unwrap();
        assert_eq!(f.recognizer.long_press(&mut f.arbiter, contact, 10_000), None);
    }
}
