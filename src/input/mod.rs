//! Pointer input abstractions
//!
//! Input reaches the launcher as a minimal [`PointerEvent`]: a contact id, a location in the global
//! launcher space, a [`Phase`] and a millisecond timestamp. Toolkit specific touch points are
//! expected to be translated into this model by the embedder.
//!
//! Before any handler acts on a contact, the gesture layer ([`GestureRecognizer`]) has to claim it
//! through the [`PointerArbiter`]. This guarantees that two recognizers (say tap and long press)
//! never both react to the same physical contact.

use crate::utils::{Global, Point};

mod arbiter;
mod gesture;

pub use self::arbiter::{ArbiterError, ContactRegister, GestureKind, PointerArbiter};
pub use self::gesture::{GestureConfig, GestureRecognizer};

/// Identifier of one continuous pointer contact, from its start to its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId(pub u32);

impl From<u32> for ContactId {
    #[inline]
    fn from(id: u32) -> Self {
        ContactId(id)
    }
}

/// Lifecycle phase of a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The contact appeared
    Start,
    /// The contact moved
    Move,
    /// The contact was released
    End,
    /// The contact was lost without a release (e.g. taken over by a system gesture)
    Cancel,
}

/// A single pointer event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Contact this event belongs to
    pub contact: ContactId,
    /// Location of the contact in the global launcher space
    pub location: Point<f64, Global>,
    /// Phase of the contact
    pub phase: Phase,
    /// Timestamp of the event, with millisecond granularity
    pub time: u32,
}

impl PointerEvent {
    /// Create a new event
    pub fn new(
        contact: impl Into<ContactId>,
        location: impl Into<Point<f64, Global>>,
        phase: Phase,
        time: u32,
    ) -> Self {
        PointerEvent {
            contact: contact.into(),
            location: location.into(),
            phase,
            time,
        }
    }
}
