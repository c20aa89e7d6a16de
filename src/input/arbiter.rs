use indexmap::IndexMap;
use tracing::{debug, error, trace};

use crate::{
    shell::ContainerHandle,
    transfer::{IconHandle, RedirectStatus},
    utils::{Global, Local, Point},
};

use super::ContactId;

/// Gesture family that claimed a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureKind {
    /// Nothing claimed the contact yet
    #[default]
    None,
    /// The contact was released without moving, it activates what it pressed
    Tap,
    /// The contact was held still on an icon, the icon follows the contact
    LongPress,
    /// The contact moved before a long press was recognized, it pans the pages
    Flick,
}

/// Errors of the [`PointerArbiter`] register bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArbiterError {
    /// A start event arrived for a contact that was never ended
    #[error("contact {0:?} already has a register")]
    AlreadyActive(ContactId),
    /// A contact id was used outside of its start/end window
    #[error("no register for contact {0:?}")]
    UnknownContact(ContactId),
}

/// State kept for one active contact, between its start and its end
#[derive(Debug)]
pub struct ContactRegister {
    claimed: GestureKind,
    valid: bool,
    tracking: bool,
    origin: ContainerHandle,
    pressed: Option<IconHandle>,
    hotspot: Point<f64, Local>,
    start: Point<f64, Global>,
    last: Point<f64, Global>,
    start_time: u32,
    last_time: u32,
    velocity: f64,
    pub(crate) redirect: RedirectStatus,
    pub(crate) cancel_marked: bool,
}

impl ContactRegister {
    /// Register for a contact that started on `origin` at `location`
    pub fn new(origin: ContainerHandle, location: Point<f64, Global>, time: u32) -> Self {
        ContactRegister {
            claimed: GestureKind::None,
            valid: true,
            tracking: false,
            origin,
            pressed: None,
            hotspot: Point::default(),
            start: location,
            last: location,
            start_time: time,
            last_time: time,
            velocity: 0.0,
            redirect: RedirectStatus::None,
            cancel_marked: false,
        }
    }

    /// Record the icon under the contact start, and where inside the icon it was pressed
    pub fn with_pressed(mut self, icon: IconHandle, hotspot: Point<f64, Local>) -> Self {
        self.pressed = Some(icon);
        self.hotspot = hotspot;
        self
    }

    /// Gesture kind that claimed this contact
    pub fn claimed(&self) -> GestureKind {
        self.claimed
    }

    /// Whether events of this contact should still be acted upon
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether this contact drags an icon
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Container that received the start event
    pub fn origin(&self) -> ContainerHandle {
        self.origin
    }

    /// Icon under the contact when it started, if any
    pub fn pressed(&self) -> Option<IconHandle> {
        self.pressed
    }

    /// Offset of the contact inside the pressed icon
    pub fn hotspot(&self) -> Point<f64, Local> {
        self.hotspot
    }

    /// Location of the start event
    pub fn start(&self) -> Point<f64, Global> {
        self.start
    }

    /// Location of the latest event
    pub fn last(&self) -> Point<f64, Global> {
        self.last
    }

    /// Timestamp of the start event
    pub fn start_time(&self) -> u32 {
        self.start_time
    }

    /// Timestamp of the latest event
    pub fn last_time(&self) -> u32 {
        self.last_time
    }

    /// Horizontal velocity in pixels per millisecond, smoothed over the latest events
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Whether the contact is redirected to another container
    pub fn is_redirecting(&self) -> bool {
        self.redirect.target().is_some()
    }

    /// Container the contact is redirected to
    pub fn redirect_target(&self) -> Option<ContainerHandle> {
        self.redirect.target()
    }
}

/// Per-contact arbitration between gesture recognizers
///
/// A register exists for a contact only between its start and its end, and is created and
/// destroyed synchronously by the dispatch of those events. At most one gesture kind is claimed
/// per register, and at most one register tracks an icon at any time.
#[derive(Debug, Default)]
pub struct PointerArbiter {
    registers: IndexMap<ContactId, ContactRegister>,
}

impl PointerArbiter {
    /// Create an arbiter without any active contact
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the register of a starting contact
    pub fn begin(&mut self, contact: ContactId, register: ContactRegister) -> Result<(), ArbiterError> {
        if self.registers.contains_key(&contact) {
            return Err(ArbiterError::AlreadyActive(contact));
        }
        trace!(?contact, origin = ?register.origin, "contact started");
        self.registers.insert(contact, register);
        Ok(())
    }

    /// Close the register of an ending contact
    pub fn end(&mut self, contact: ContactId) -> Result<ContactRegister, ArbiterError> {
        let register = self
            .registers
            .shift_remove(&contact)
            .ok_or(ArbiterError::UnknownContact(contact))?;
        trace!(?contact, claimed = ?register.claimed, "contact ended");
        Ok(register)
    }

    /// Register of an active contact
    pub fn get(&self, contact: ContactId) -> Option<&ContactRegister> {
        self.registers.get(&contact)
    }

    /// Iterate over the active contacts in start order
    pub fn contacts(&self) -> impl Iterator<Item = (ContactId, &ContactRegister)> {
        self.registers.iter().map(|(id, register)| (*id, register))
    }

    /// Number of active contacts
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// Whether no contact is active
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Try to claim `contact` for the gesture kind `to`
    ///
    /// Succeeds if the contact has no register, or if it is currently claimed by `from`.
    /// On success the claim is updated to `to`.
    pub fn claim(&mut self, contact: ContactId, from: GestureKind, to: GestureKind) -> bool {
        match self.registers.get_mut(&contact) {
            None => true,
            Some(register) if register.claimed == from => {
                debug!(?contact, ?from, ?to, "contact claimed");
                register.claimed = to;
                true
            }
            Some(register) => {
                trace!(?contact, claimed = ?register.claimed, ?to, "claim refused");
                false
            }
        }
    }

    /// The contact currently dragging an icon, if any
    pub fn any_tracking(&self) -> Option<ContactId> {
        self.registers
            .iter()
            .find(|(_, register)| register.tracking)
            .map(|(id, _)| *id)
    }

    /// Start or stop motion tracking of the pressed icon for `contact`
    ///
    /// Starting fails if another contact is already tracking.
    pub fn set_tracking(&mut self, contact: ContactId, tracking: bool) -> bool {
        if tracking {
            if let Some(other) = self.any_tracking() {
                if other != contact {
                    debug!(?contact, ?other, "another contact is already tracking");
                    return false;
                }
            }
        }
        match self.register_mut(contact) {
            Some(register) => {
                register.tracking = tracking;
                true
            }
            None => false,
        }
    }

    /// Stop acting on `contact` until it ends
    pub fn invalidate(&mut self, contact: ContactId) {
        if let Some(register) = self.register_mut(contact) {
            register.valid = false;
            register.tracking = false;
        }
    }

    /// Record the latest location of `contact`
    pub(crate) fn update(&mut self, contact: ContactId, location: Point<f64, Global>, time: u32) {
        if let Some(register) = self.register_mut(contact) {
            let elapsed = time.wrapping_sub(register.last_time);
            if elapsed > 0 {
                let instant = (location.x - register.last.x) / elapsed as f64;
                register.velocity = 0.6 * instant + 0.4 * register.velocity;
            }
            register.last = location;
            register.last_time = time;
        }
    }

    /// Access to a register whose existence is guaranteed by the event ordering
    pub(crate) fn register_mut(&mut self, contact: ContactId) -> Option<&mut ContactRegister> {
        let register = self.registers.get_mut(&contact);
        if register.is_none() {
            error!(?contact, "{}", ArbiterError::UnknownContact(contact));
            debug_assert!(false, "contact {:?} used outside of its lifetime", contact);
        }
        register
    }

    pub(crate) fn registers_mut(&mut self) -> impl Iterator<Item = &mut ContactRegister> {
        self.registers.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::Container;
    use crate::utils::Arena;

    fn origin() -> ContainerHandle {
        let mut arena: Arena<Container> = Arena::new();
        arena.insert(Container::root((480.0, 800.0).into()))
    }

    fn register(origin: ContainerHandle) -> ContactRegister {
        ContactRegister::new(origin, (10.0, 10.0).into(), 0)
    }

    #[test]
    fn claim_without_register_succeeds() {
        let mut arbiter = PointerArbiter::new();
        assert!(arbiter.claim(ContactId(7), GestureKind::None, GestureKind::Tap));
        assert!(arbiter.is_empty());
    }

    #[test]
    fn second_claim_on_same_contact_fails() {
        let mut arbiter = PointerArbiter::new();
        let contact = ContactId(1);
        arbiter.begin(contact, register(origin())).unwrap();
        assert!(arbiter.claim(contact, GestureKind::None, GestureKind::LongPress));
        assert!(!arbiter.claim(contact, GestureKind::None, GestureKind::Tap));
        assert_eq!(arbiter.get(contact).unwrap().claimed(), GestureKind::LongPress);
    }

    #[test]
    fn begin_twice_is_an_error() {
        let mut arbiter = PointerArbiter::new();
        let origin = origin();
        arbiter.begin(ContactId(1), register(origin)).unwrap();
        assert_eq!(
            arbiter.begin(ContactId(1), register(origin)),
            Err(ArbiterError::AlreadyActive(ContactId(1)))
        );
    }

    #[test]
    fn end_destroys_register() {
        let mut arbiter = PointerArbiter::new();
        arbiter.begin(ContactId(3), register(origin())).unwrap();
        assert!(arbiter.end(ContactId(3)).is_ok());
        assert!(arbiter.get(ContactId(3)).is_none());
        assert_eq!(
            arbiter.end(ContactId(3)).unwrap_err(),
            ArbiterError::UnknownContact(ContactId(3))
        );
        // a fresh contact with the same id starts unclaimed
        arbiter.begin(ContactId(3), register(origin())).unwrap();
        assert_eq!(arbiter.get(ContactId(3)).unwrap().claimed(), GestureKind::None);
    }

    #[test]
    fn only_one_contact_tracks() {
        let mut arbiter = PointerArbiter::new();
        let origin = origin();
        arbiter.begin(ContactId(1), register(origin)).unwrap();
        arbiter.begin(ContactId(2), register(origin)).unwrap();
        assert!(arbiter.set_tracking(ContactId(1), true));
        assert!(!arbiter.set_tracking(ContactId(2), true));
        assert_eq!(arbiter.any_tracking(), Some(ContactId(1)));
        arbiter.end(ContactId(1)).unwrap();
        assert_eq!(arbiter.any_tracking(), None);
        assert!(arbiter.set_tracking(ContactId(2), true));
    }

    #[test]
    fn invalidate_stops_tracking() {
        let mut arbiter = PointerArbiter::new();
        arbiter.begin(ContactId(1), register(origin())).unwrap();
        arbiter.set_tracking(ContactId(1), true);
        arbiter.invalidate(ContactId(1));
        let register = arbiter.get(ContactId(1)).unwrap();
        assert!(!register.is_valid());
        assert!(!register.is_tracking());
    }

    #[test]
    fn velocity_follows_motion() {
        let mut arbiter = PointerArbiter::new();
        arbiter.begin(ContactId(1), register(origin())).unwrap();
        arbiter.update(ContactId(1), (30.0, 10.0).into(), 10);
        arbiter.update(ContactId(1), (50.0, 10.0).into(), 20);
        let register = arbiter.get(ContactId(1)).unwrap();
        assert!(register.velocity() > 1.5);
        assert_eq!(register.last(), (50.0, 10.0).into());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::shell::Container;
    use crate::utils::Arena;
    use proptest::prelude::*;

    fn kind() -> impl Strategy<Value = GestureKind> {
        prop_oneof![
            Just(GestureKind::Tap),
            Just(GestureKind::LongPress),
            Just(GestureKind::Flick),
        ]
    }

    proptest! {
        /// Whatever sequence of claims runs on a contact, only the first one from `None` wins.
        #[test]
        fn at_most_one_kind_is_claimed(claims in proptest::collection::vec(kind(), 1..8)) {
            let mut containers: Arena<Container> = Arena::new();
            let origin = containers.insert(Container::root((100.0, 100.0).into()));
            let mut arbiter = PointerArbiter::new();
            let contact = ContactId(1);
            arbiter.begin(contact, ContactRegister::new(origin, (0.0, 0.0).into(), 0)).unwrap();

            let won: Vec<_> = claims
                .iter()
                .filter(|to| arbiter.claim(contact, GestureKind::None, **to))
                .collect();
            prop_assert_eq!(won.len(), 1);
            prop_assert_eq!(arbiter.get(contact).unwrap().claimed(), claims[0]);
        }
    }
}
