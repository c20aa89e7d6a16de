//! Ownership transfer of icons between containers
//!
//! Moving an icon from one container to another is a handshake between three parties:
//!
//! 1. the destination is *offered* the icon and checks whether it can accept it (capacity,
//!    duplicates). Refusing leaves every party untouched.
//! 2. the icon is *taken* by the destination. The current owner is asked whether it is willing to
//!    let go of the icon (*taking*) and may veto the whole transfer.
//! 3. the owner reference of the icon is repointed, the icon enters the *limbo* set of the destination
//!    and its geometry is translated into destination-local coordinates.
//! 4. the source is notified that the icon was *taken* so that it can forget it.
//!
//! The icon stays in limbo until the contact dragging it is released, at which point the destination
//! [settles](TransferCoordinator::settle) it into a concrete slot.
//!
//! The whole handshake is driven by the [`TransferCoordinator`], which borrows the icon and container
//! arenas of the launcher for the duration of one operation.

use indexmap::IndexMap;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    shell::{Container, ContainerHandle},
    utils::Arena,
};

mod icon;
mod redirect;

pub use self::icon::{Icon, IconHandle};
pub use self::redirect::{Direction, RedirectContext, RedirectError};
pub(crate) use self::redirect::RedirectStatus;

/// Reasons for a refused or failed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The icon handle is dead
    #[error("the icon does not exist anymore")]
    IconGone,
    /// The container handle is dead
    #[error("the container does not exist anymore")]
    ContainerGone,
    /// The destination cannot accept the icon
    #[error("the destination cannot accept the icon")]
    Rejected,
    /// The current owner refused to let go of the icon
    #[error("the current owner vetoed the transfer")]
    Vetoed,
    /// The container settling the icon does not own it
    #[error("the container does not own the icon")]
    NotOwner,
}

/// Icons held by one container
///
/// Settled icons occupy a concrete slot, in order. Icons in limbo were accepted during a drag but
/// are not placed yet. An icon is never both settled and in limbo.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransferState {
    settled: Vec<IconHandle>,
    limbo: IndexMap<Uuid, IconHandle>,
}

impl TransferState {
    /// Settled icons, in slot order
    pub fn settled(&self) -> &[IconHandle] {
        &self.settled
    }

    /// Icons in limbo, in acceptance order
    pub fn limbo(&self) -> impl Iterator<Item = IconHandle> + '_ {
        self.limbo.values().copied()
    }

    /// Whether the icon with the given identity is in limbo
    pub fn in_limbo(&self, id: &Uuid) -> bool {
        self.limbo.contains_key(id)
    }

    /// Whether the icon is held here, settled or in limbo
    pub fn contains(&self, icon: IconHandle, id: &Uuid) -> bool {
        self.limbo.contains_key(id) || self.settled.contains(&icon)
    }

    /// Number of icons held, settled or in limbo
    pub fn len(&self) -> usize {
        self.settled.len() + self.limbo.len()
    }

    /// Whether no icon is held
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty() && self.limbo.is_empty()
    }

    /// Slot index of a settled icon
    pub fn position(&self, icon: IconHandle) -> Option<usize> {
        self.settled.iter().position(|handle| *handle == icon)
    }

    pub(crate) fn insert_limbo(&mut self, id: Uuid, icon: IconHandle) {
        self.limbo.insert(id, icon);
    }

    /// Forget about the icon, wherever it is held
    pub(crate) fn remove(&mut self, icon: IconHandle, id: &Uuid) -> bool {
        let in_limbo = self.limbo.shift_remove(id).is_some();
        let settled = match self.position(icon) {
            Some(index) => {
                self.settled.remove(index);
                true
            }
            None => false,
        };
        in_limbo || settled
    }

    /// Place the icon at `index` of the settled slots, leaving limbo if it was there
    ///
    /// An icon that was already settled is moved. Returns the index it ended up at.
    pub(crate) fn settle(&mut self, icon: IconHandle, id: &Uuid, index: usize) -> usize {
        self.remove(icon, id);
        let index = index.min(self.settled.len());
        self.settled.insert(index, icon);
        index
    }
}

/// Executes the transfer handshake on the launcher arenas
#[derive(Debug)]
pub struct TransferCoordinator<'a> {
    icons: &'a mut Arena<Icon>,
    containers: &'a mut Arena<Container>,
}

impl<'a> TransferCoordinator<'a> {
    /// Borrow the arenas for the duration of a transfer
    pub fn new(icons: &'a mut Arena<Icon>, containers: &'a mut Arena<Container>) -> Self {
        TransferCoordinator { icons, containers }
    }

    /// Offer `icon` to `dest`
    ///
    /// Returns `true` if the icon is now in limbo of `dest`. If it returns `false`, nothing changed.
    pub fn offer(&mut self, dest: ContainerHandle, icon: IconHandle) -> bool {
        match self.try_offer(dest, icon) {
            Ok(()) => true,
            Err(err) => {
                debug!(?dest, ?icon, "offer refused: {}", err);
                false
            }
        }
    }

    /// Offer `icon` to `dest`, reporting why the offer was refused
    pub fn try_offer(&mut self, dest: ContainerHandle, icon: IconHandle) -> Result<(), TransferError> {
        let id = self.icons.get(icon).ok_or(TransferError::IconGone)?.id();
        let destination = self.containers.get(dest).ok_or(TransferError::ContainerGone)?;
        if !destination.can_accept(icon, &id) {
            return Err(TransferError::Rejected);
        }
        let dest_origin = destination.geometry().loc;

        let source = self.take(icon, dest)?;

        let source_origin = source
            .and_then(|source| self.containers.get(source))
            .map(|source| source.geometry().loc);
        if let Some(object) = self.icons.get_mut(icon) {
            if let Some(source_origin) = source_origin {
                object.geometry.loc = object.geometry.loc.rebase(source_origin, dest_origin);
            }
        }
        if let Some(destination) = self.containers.get_mut(dest) {
            destination.transfer.insert_limbo(id, icon);
        }

        if let Some(source) = source.and_then(|source| self.containers.get_mut(source)) {
            source.taken(icon, &id, dest);
        }
        debug!(?icon, ?source, ?dest, "icon entered limbo");
        Ok(())
    }

    /// Let `dest` take the icon from its current owner
    ///
    /// Returns the previous owner.
    fn take(
        &mut self,
        icon: IconHandle,
        dest: ContainerHandle,
    ) -> Result<Option<ContainerHandle>, TransferError> {
        let owner = self.icons.get(icon).ok_or(TransferError::IconGone)?.owner;
        if let Some(current) = owner.and_then(|owner| self.containers.get(owner)) {
            if !current.taking(icon, dest) {
                return Err(TransferError::Vetoed);
            }
        }
        if let Some(object) = self.icons.get_mut(icon) {
            object.owner = Some(dest);
        }
        Ok(owner)
    }

    /// Make the placement of `icon` in `container` permanent, at slot `index`
    ///
    /// The icon has to be owned by `container`. It leaves limbo if it was there, or is moved to
    /// `index` if it was already settled. Returns the slot it ended up at.
    pub fn settle(
        &mut self,
        container: ContainerHandle,
        icon: IconHandle,
        index: usize,
    ) -> Result<usize, TransferError> {
        let object = self.icons.get_mut(icon).ok_or(TransferError::IconGone)?;
        if object.owner != Some(container) {
            return Err(TransferError::NotOwner);
        }
        let holder = self
            .containers
            .get_mut(container)
            .ok_or(TransferError::ContainerGone)?;
        if !holder.keeps_icons() {
            return Err(TransferError::Rejected);
        }
        let index = holder.transfer.settle(icon, &object.id(), index);
        object.last_settled = Some(container);
        trace!(?icon, ?container, index, "icon settled");
        Ok(index)
    }

    /// Remove `icon` from its owner, leaving it unowned
    pub fn release(&mut self, icon: IconHandle) -> Result<(), TransferError> {
        let object = self.icons.get_mut(icon).ok_or(TransferError::IconGone)?;
        if let Some(owner) = object.owner.take().and_then(|owner| self.containers.get_mut(owner)) {
            owner.transfer.remove(icon, &object.id());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{Page, QuickLaunchBar, Role};
    use crate::utils::Rectangle;

    struct World {
        icons: Arena<Icon>,
        containers: Arena<Container>,
        left: ContainerHandle,
        right: ContainerHandle,
        bar: ContainerHandle,
    }

    impl World {
        fn new() -> World {
            let mut containers = Arena::new();
            let left = containers.insert(Container::new(
                Role::Page(Page::new(4)),
                Rectangle::from_loc_and_size((0.0, 0.0), (400.0, 800.0)),
            ));
            let right = containers.insert(Container::new(
                Role::Page(Page::new(4)),
                Rectangle::from_loc_and_size((400.0, 0.0), (400.0, 800.0)),
            ));
            let bar = containers.insert(Container::new(
                Role::QuickLaunchBar(QuickLaunchBar::new(1)),
                Rectangle::from_loc_and_size((0.0, 700.0), (400.0, 100.0)),
            ));
            World {
                icons: Arena::new(),
                containers,
                left,
                right,
                bar,
            }
        }

        fn coordinator(&mut self) -> TransferCoordinator<'_> {
            TransferCoordinator::new(&mut self.icons, &mut self.containers)
        }

        fn add(&mut self, container: ContainerHandle) -> IconHandle {
            let icon = self.icons.insert(Icon::new("org.example.app", (64.0, 64.0).into()));
            let mut coordinator = self.coordinator();
            assert!(coordinator.offer(container, icon));
            coordinator.settle(container, icon, usize::MAX).unwrap();
            icon
        }
    }

    #[test]
    fn accepted_offer_moves_icon_to_limbo() {
        let mut world = World::new();
        let icon = world.add(world.left);
        world.icons.get_mut(icon).unwrap().geometry.loc = (100.0, 50.0).into();

        let (left, right) = (world.left, world.right);
        assert!(world.coordinator().offer(right, icon));

        let object = world.icons.get(icon).unwrap();
        assert_eq!(object.owner(), Some(right));
        assert_eq!(object.geometry().loc, (-300.0, 50.0).into());
        assert!(world.containers.get(right).unwrap().transfer().in_limbo(&object.id()));
        assert!(world.containers.get(left).unwrap().transfer().is_empty());
    }

    #[test]
    fn full_destination_rejects() {
        let mut world = World::new();
        let resident = world.add(world.bar);
        let icon = world.add(world.left);
        let bar = world.bar;

        assert_eq!(world.coordinator().try_offer(bar, icon), Err(TransferError::Rejected));
        assert_eq!(world.icons.get(icon).unwrap().owner(), Some(world.left));
        assert_eq!(world.containers.get(bar).unwrap().transfer().settled(), &[resident]);
    }

    #[test]
    fn duplicate_is_rejected() {
        let mut world = World::new();
        let icon = world.add(world.left);
        let left = world.left;
        assert_eq!(world.coordinator().try_offer(left, icon), Err(TransferError::Rejected));
    }

    #[test]
    fn locked_owner_vetoes() {
        let mut world = World::new();
        let icon = world.add(world.left);
        world.containers.get_mut(world.left).unwrap().set_locked(true);
        let (left, right) = (world.left, world.right);

        assert_eq!(world.coordinator().try_offer(right, icon), Err(TransferError::Vetoed));
        assert_eq!(world.icons.get(icon).unwrap().owner(), Some(left));
        assert!(world.containers.get(right).unwrap().transfer().is_empty());
        assert_eq!(world.containers.get(left).unwrap().transfer().settled(), &[icon]);
    }

    #[test]
    fn settle_requires_ownership() {
        let mut world = World::new();
        let icon = world.add(world.left);
        let right = world.right;
        assert_eq!(
            world.coordinator().settle(right, icon, 0),
            Err(TransferError::NotOwner)
        );
    }

    #[test]
    fn settle_reorders_within_container() {
        let mut world = World::new();
        let a = world.add(world.left);
        let b = world.add(world.left);
        let c = world.add(world.left);
        let left = world.left;

        assert_eq!(world.coordinator().settle(left, c, 0), Ok(0));
        assert_eq!(world.containers.get(left).unwrap().transfer().settled(), &[c, a, b]);
        assert_eq!(world.icons.get(c).unwrap().last_settled(), Some(left));
    }

    #[test]
    fn dead_handles_are_reported() {
        let mut world = World::new();
        let icon = world.add(world.left);
        let right = world.right;
        world.containers.remove(right);
        assert_eq!(
            world.coordinator().try_offer(right, icon),
            Err(TransferError::ContainerGone)
        );
        world.coordinator().release(icon).unwrap();
        world.icons.remove(icon);
        let left = world.left;
        assert_eq!(
            world.coordinator().try_offer(left, icon),
            Err(TransferError::IconGone)
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::shell::{Page, Role};
    use crate::utils::Rectangle;
    use proptest::prelude::*;

    fn snapshot(
        icons: &Arena<Icon>,
        containers: &Arena<Container>,
        icon: IconHandle,
        a: ContainerHandle,
        b: ContainerHandle,
    ) -> (Icon, TransferState, TransferState) {
        (
            icons.get(icon).unwrap().clone(),
            containers.get(a).unwrap().transfer().clone(),
            containers.get(b).unwrap().transfer().clone(),
        )
    }

    proptest! {
        /// A refused offer leaves the icon and both containers exactly as they were.
        #[test]
        fn refused_offer_changes_nothing(
            source_fill in 1usize..4,
            dest_fill in 0usize..4,
            dest_capacity in 1usize..4,
            locked in any::<bool>(),
        ) {
            let mut icons = Arena::new();
            let mut containers = Arena::new();
            let source = containers.insert(Container::new(
                Role::Page(Page::new(4)),
                Rectangle::from_loc_and_size((0.0, 0.0), (400.0, 800.0)),
            ));
            let dest = containers.insert(Container::new(
                Role::Page(Page::new(dest_capacity)),
                Rectangle::from_loc_and_size((400.0, 0.0), (400.0, 800.0)),
            ));

            let mut fill = |container: ContainerHandle, count: usize| -> Vec<IconHandle> {
                (0..count)
                    .filter_map(|_| {
                        let icon = icons.insert(Icon::new("org.example.app", (64.0, 64.0).into()));
                        let mut coordinator = TransferCoordinator::new(&mut icons, &mut containers);
                        if coordinator.offer(container, icon) {
                            coordinator.settle(container, icon, usize::MAX).ok()?;
                            Some(icon)
                        } else {
                            None
                        }
                    })
                    .collect()
            };
            let moving = fill(source, source_fill)[0];
            fill(dest, dest_fill);
            containers.get_mut(source).unwrap().set_locked(locked);

            let before = snapshot(&icons, &containers, moving, source, dest);
            let accepted = TransferCoordinator::new(&mut icons, &mut containers).offer(dest, moving);
            let after = snapshot(&icons, &containers, moving, source, dest);

            prop_assert_eq!(accepted, !locked && dest_fill.min(dest_capacity) < dest_capacity);
            if !accepted {
                prop_assert_eq!(before, after);
            } else {
                prop_assert_eq!(after.0.owner(), Some(dest));
                prop_assert!(after.2.in_limbo(&after.0.id()));
                prop_assert!(!after.1.contains(moving, &after.0.id()));
            }
        }
    }
}
