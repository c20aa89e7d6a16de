use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    transfer::{IconHandle, TransferState},
    utils::{Global, Handle, Local, Point, Rectangle, Size},
};

use super::{Page, QuickLaunchBar, TabBar};

/// Weak reference to a [`Container`] stored in the launcher
pub type ContainerHandle = Handle<Container>;

/// What a container is used for
#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    /// A page of the launcher grid
    Page(Page),
    /// The quick-launch bar
    QuickLaunchBar(QuickLaunchBar),
    /// The page tab bar
    TabBar(TabBar),
    /// The launcher itself, holding what no other container holds
    Root,
}

/// Something that can own icons and take part in transfers
#[derive(Debug, Clone)]
pub struct Container {
    role: Role,
    geometry: Rectangle<f64, Global>,
    locked: bool,
    pub(crate) transfer: TransferState,
}

impl Container {
    /// Create an empty container
    pub fn new(role: Role, geometry: Rectangle<f64, Global>) -> Self {
        Container {
            role,
            geometry,
            locked: false,
            transfer: TransferState::default(),
        }
    }

    /// Root container covering a screen of the given size
    pub fn root(size: Size<f64, Global>) -> Self {
        Container::new(Role::Root, Rectangle::from_size(size))
    }

    /// Role of this container
    pub fn role(&self) -> &Role {
        &self.role
    }

    pub(crate) fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    /// Whether this container is a page
    pub fn is_page(&self) -> bool {
        matches!(self.role, Role::Page(_))
    }

    /// Where the container is displayed
    pub fn geometry(&self) -> Rectangle<f64, Global> {
        self.geometry
    }

    pub(crate) fn set_geometry(&mut self, geometry: Rectangle<f64, Global>) {
        self.geometry = geometry;
    }

    /// Express a global point relative to this container
    pub fn to_local(&self, point: Point<f64, Global>) -> Point<f64, Local> {
        point.to_local(self.geometry.loc)
    }

    /// Whether the container refuses to let icons go
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock or unlock the container
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Icons held by this container
    pub fn transfer(&self) -> &TransferState {
        &self.transfer
    }

    /// Maximum number of icons held, settled or in limbo
    pub fn capacity(&self) -> Option<usize> {
        match &self.role {
            Role::Page(page) => Some(page.capacity()),
            Role::QuickLaunchBar(bar) => Some(bar.capacity()),
            Role::TabBar(_) => Some(1),
            Role::Root => None,
        }
    }

    /// Whether icons can be settled here, or only pass through
    pub fn keeps_icons(&self) -> bool {
        !matches!(self.role, Role::TabBar(_))
    }

    /// Capacity and duplicate check of an incoming icon
    pub fn can_accept(&self, icon: IconHandle, id: &Uuid) -> bool {
        if self.transfer.contains(icon, id) {
            trace!(?icon, "icon is already held");
            return false;
        }
        self.capacity()
            .map_or(true, |capacity| self.transfer.len() < capacity)
    }

    /// Whether this container lets `icon` go to `dest`
    pub fn taking(&self, icon: IconHandle, dest: ContainerHandle) -> bool {
        if self.locked {
            debug!(?icon, ?dest, "locked container keeps its icon");
            return false;
        }
        true
    }

    /// `icon` now belongs to `dest`
    pub(crate) fn taken(&mut self, icon: IconHandle, id: &Uuid, dest: ContainerHandle) {
        if self.transfer.remove(icon, id) {
            trace!(?icon, ?dest, "icon left");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::Icon;
    use crate::utils::Arena;

    #[test]
    fn capacities() {
        let geometry = Rectangle::from_loc_and_size((0.0, 0.0), (400.0, 800.0));
        assert_eq!(Container::new(Role::Page(Page::new(16)), geometry).capacity(), Some(16));
        assert_eq!(
            Container::new(Role::QuickLaunchBar(QuickLaunchBar::new(4)), geometry).capacity(),
            Some(4)
        );
        assert_eq!(Container::root(geometry.size).capacity(), None);
        assert!(!Container::new(Role::TabBar(TabBar::new(2)), geometry).keeps_icons());
    }

    #[test]
    fn limbo_counts_against_capacity() {
        let mut icons = Arena::new();
        let a = icons.insert(Icon::new("a", (10.0, 10.0).into()));
        let b = icons.insert(Icon::new("b", (10.0, 10.0).into()));
        let b_id = icons.get(b).unwrap().id();
        let mut bar = Container::new(
            Role::QuickLaunchBar(QuickLaunchBar::new(1)),
            Rectangle::from_loc_and_size((0.0, 700.0), (400.0, 100.0)),
        );
        bar.transfer.insert_limbo(icons.get(a).unwrap().id(), a);
        assert!(!bar.can_accept(b, &b_id));

        let mut root = Container::root((400.0, 800.0).into());
        root.transfer.insert_limbo(icons.get(a).unwrap().id(), a);
        assert!(root.can_accept(b, &b_id));
        let a_id = icons.get(a).unwrap().id();
        assert!(!root.can_accept(a, &a_id));
    }

    #[test]
    fn locked_container_refuses_taking() {
        let mut containers = Arena::new();
        let other = containers.insert(Container::root((400.0, 800.0).into()));
        let mut icons = Arena::new();
        let icon = icons.insert(Icon::new("a", (10.0, 10.0).into()));

        let mut page = Container::new(
            Role::Page(Page::new(4)),
            Rectangle::from_loc_and_size((0.0, 0.0), (400.0, 800.0)),
        );
        assert!(page.taking(icon, other));
        page.set_locked(true);
        assert!(!page.taking(icon, other));
    }
}
