//! Launcher containers and event dispatch
//!
//! The [`Launcher`] owns every container (pages, the quick-launch bar, the tab bar and the root
//! container) and every icon, and is the entry point of pointer events. It lays the pages out
//! horizontally according to its [`PanState`], and drives the transfer of icons between containers
//! while they are dragged.
//!
//! ## Dragging icons around
//!
//! A contact held on an icon becomes a long press and starts *tracking* the icon. While tracking,
//! every motion is routed through the [`Zone`] the contact sits in, on the container currently
//! handling the contact:
//!
//! - in the inner zone the icon is offered to that container,
//! - in a border zone of the centered page, the pages pan to the neighbour,
//! - in the bar or tray zone of a page, the contact is redirected to the quick-launch bar or the tab bar,
//! - outside of a bar, the contact is redirected back to the centered page.
//!
//! On release the icon is settled in the container holding it, at the slot the
//! [`LauncherHandler::nearest_slot`] collaborator chooses. If that does not resolve, the icon falls
//! back to the last container it was settled in, and it is never lost.
//!
//! ## Collaborators
//!
//! Layout and persistence are left to the embedder, which implements [`LauncherHandler`]:
//!
//! ```
//! use handoff::shell::{ContainerHandle, Launcher, LauncherConfig, LauncherHandler};
//! use handoff::transfer::IconHandle;
//!
//! struct Shell {
//!     dirty: Vec<ContainerHandle>,
//! }
//!
//! impl LauncherHandler for Shell {
//!     fn needs_save(&mut self, container: ContainerHandle) {
//!         self.dirty.push(container);
//!     }
//!
//!     fn launch_requested(&mut self, _icon: IconHandle, app: &str) {
//!         println!("launching {}", app);
//!     }
//! }
//!
//! let mut shell = Shell { dirty: Vec::new() };
//! let mut launcher = Launcher::new(LauncherConfig::default());
//! let page = launcher.pages()[0];
//! launcher.add_icon(&mut shell, "org.example.clock", page).unwrap();
//! assert_eq!(shell.dirty, vec![page]);
//! ```

use smallvec::SmallVec;
use tracing::{debug, error, info_span, instrument, trace, warn};

use crate::{
    input::{
        ContactId, ContactRegister, GestureKind, GestureRecognizer, Phase, PointerArbiter,
        PointerEvent,
    },
    transfer::{
        Direction, Icon, IconHandle, RedirectContext, RedirectError, TransferCoordinator, TransferError,
    },
    utils::{Arena, Global, Local, Point, Rectangle, Size},
};

mod bar;
mod container;
mod page;
mod pan;
mod tab_bar;
mod zone;

pub use self::bar::QuickLaunchBar;
pub use self::container::{Container, ContainerHandle, Role};
pub use self::page::Page;
pub use self::pan::{PanConfig, PanState, SnapAnimation};
pub use self::tab_bar::TabBar;
pub use self::zone::{Zone, ZoneClassifier, ZoneConfig};

use self::page::page_geometry;


/// Number of redirects a single motion may go through
const MAX_HOPS: usize = 4;

/// Collaborators of the [`Launcher`]
///
/// Every method has a default implementation doing the least possible.
pub trait LauncherHandler {
    /// Choose the slot `icon` dropped at `position` should be inserted at, in `container`
    ///
    /// `occupied` lists the icons already settled in `container`, not counting the dropped one.
    /// Returning `None` means the drop does not resolve to a slot.
    fn nearest_slot(
        &mut self,
        _container: ContainerHandle,
        occupied: &[IconHandle],
        _position: Point<f64, Local>,
    ) -> Option<usize> {
        Some(occupied.len())
    }

    /// Geometry of slot `index` of `container`, local to it
    ///
    /// Icons are moved to the geometry of their slot whenever the slots of a container change.
    fn slot_geometry(&mut self, _container: ContainerHandle, _index: usize) -> Option<Rectangle<f64, Local>> {
        None
    }

    /// The settled icons of `container` changed and should be persisted
    fn needs_save(&mut self, _container: ContainerHandle) {}

    /// A tap on `icon` asks for its application to be launched
    fn launch_requested(&mut self, _icon: IconHandle, _app: &str) {}
}

/// Configuration of a [`Launcher`]
#[derive(Debug, Clone, PartialEq)]
pub struct LauncherConfig {
    /// Size of the screen, and of every page
    pub screen: Size<f64, Global>,
    /// Height of the tab bar, docked at the top
    pub tab_bar_height: f64,
    /// Height of the quick-launch bar, docked at the bottom
    pub bar_height: f64,
    /// Size of an icon
    pub icon_size: Size<f64, Local>,
    /// Maximum number of icons per page
    pub page_capacity: usize,
    /// Maximum number of icons in the quick-launch bar
    pub bar_capacity: usize,
    /// Gesture thresholds
    pub gesture: crate::input::GestureConfig,
    /// Zone geometry
    pub zones: ZoneConfig,
    /// Page snap animation
    pub pan: PanConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            screen: (480.0, 800.0).into(),
            tab_bar_height: 48.0,
            bar_height: 112.0,
            icon_size: (80.0, 80.0).into(),
            page_capacity: 16,
            bar_capacity: 4,
            gesture: Default::default(),
            zones: Default::default(),
            pan: Default::default(),
        }
    }
}

/// Errors of the [`Launcher`] management operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LauncherError {
    /// The container is not one of the pages
    #[error("container {0:?} is not a page")]
    NotAPage(ContainerHandle),
    /// The page still holds icons
    #[error("page {0:?} still holds icons")]
    PageNotEmpty(ContainerHandle),
    /// The launcher needs at least one page
    #[error("the last page cannot be removed")]
    LastPage,
    /// The container does not exist anymore
    #[error("the container does not exist anymore")]
    ContainerGone,
    /// The icon does not exist anymore
    #[error("the icon does not exist anymore")]
    IconGone,
    /// The icon could not be placed
    #[error(transparent)]
    Refused(#[from] TransferError),
}

/// The launcher: containers, icons and the pointer contacts acting on them
#[derive(Debug)]
pub struct Launcher {
    config: LauncherConfig,
    containers: Arena<Container>,
    icons: Arena<Icon>,
    pages: Vec<ContainerHandle>,
    bar: ContainerHandle,
    tab_bar: ContainerHandle,
    root: ContainerHandle,
    arbiter: PointerArbiter,
    recognizer: GestureRecognizer,
    pan: PanState,
    span: tracing::Span,
}

impl Launcher {
    /// Create a launcher with a single empty page
    pub fn new(config: LauncherConfig) -> Self {
        let span = info_span!("launcher");
        let screen = config.screen;

        let mut containers = Arena::new();
        let root = containers.insert(Container::root(screen));
        let bar = containers.insert(Container::new(
            Role::QuickLaunchBar(QuickLaunchBar::new(config.bar_capacity)),
            Rectangle::from_loc_and_size((0.0, screen.h - config.bar_height), (screen.w, config.bar_height)),
        ));
        let tab_bar = containers.insert(Container::new(
            Role::TabBar(TabBar::new(1)),
            Rectangle::from_loc_and_size((0.0, 0.0), (screen.w, config.tab_bar_height)),
        ));
        let first = containers.insert(Container::new(
            Role::Page(Page::new(config.page_capacity)),
            page_geometry(0, 0.0, screen),
        ));

        let _guard = span.enter();
        debug!(?screen, "launcher created");
        drop(_guard);

        Launcher {
            recognizer: GestureRecognizer::new(config.gesture),
            pan: PanState::new(screen.w, 1, config.pan),
            config,
            containers,
            icons: Arena::new(),
            pages: vec![first],
            bar,
            tab_bar,
            root,
            arbiter: PointerArbiter::new(),
            span,
        }
    }

    /// Configuration of this launcher
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// The pages, in display order
    pub fn pages(&self) -> &[ContainerHandle] {
        &self.pages
    }

    /// The quick-launch bar
    pub fn bar(&self) -> ContainerHandle {
        self.bar
    }

    /// The tab bar
    pub fn tab_bar(&self) -> ContainerHandle {
        self.tab_bar
    }

    /// The root container
    pub fn root(&self) -> ContainerHandle {
        self.root
    }

    /// Access a container
    pub fn container(&self, container: ContainerHandle) -> Option<&Container> {
        self.containers.get(container)
    }

    /// Access an icon
    pub fn icon(&self, icon: IconHandle) -> Option<&Icon> {
        self.icons.get(icon)
    }

    /// Iterate over every icon
    pub fn icons(&self) -> impl Iterator<Item = (IconHandle, &Icon)> {
        self.icons.iter()
    }

    /// The pointer contacts currently active
    pub fn arbiter(&self) -> &PointerArbiter {
        &self.arbiter
    }

    /// Paging state
    pub fn pan(&self) -> &PanState {
        &self.pan
    }

    /// The centered page, `None` while panning
    pub fn centered_page(&self) -> Option<ContainerHandle> {
        self.pan.centered().and_then(|index| self.pages.get(index).copied())
    }

    fn page_index(&self, container: ContainerHandle) -> Option<usize> {
        self.pages.iter().position(|page| *page == container)
    }

    fn coordinator(&mut self) -> TransferCoordinator<'_> {
        TransferCoordinator::new(&mut self.icons, &mut self.containers)
    }

    /*
     * Management
     */

    /// Append an empty page
    #[instrument(level = "debug", parent = &self.span, skip(self, handler))]
    pub fn add_page<H: LauncherHandler>(&mut self, handler: &mut H) -> ContainerHandle {
        let index = self.pages.len();
        let page = self.containers.insert(Container::new(
            Role::Page(Page::new(self.config.page_capacity)),
            page_geometry(index, self.pan.anchor(), self.config.screen),
        ));
        self.pages.push(page);
        self.pages_changed();
        handler.needs_save(page);
        page
    }

    /// Remove an empty page
    #[instrument(level = "debug", parent = &self.span, skip(self, handler))]
    pub fn remove_page<H: LauncherHandler>(
        &mut self,
        handler: &mut H,
        page: ContainerHandle,
    ) -> Result<(), LauncherError> {
        let index = self.page_index(page).ok_or(LauncherError::NotAPage(page))?;
        let container = self.containers.get(page).ok_or(LauncherError::ContainerGone)?;
        if !container.transfer().is_empty() {
            return Err(LauncherError::PageNotEmpty(page));
        }
        if self.pages.len() == 1 {
            return Err(LauncherError::LastPage);
        }
        self.pages.remove(index);
        self.containers.remove(page);
        self.pages_changed();
        handler.needs_save(self.root);
        Ok(())
    }

    fn pages_changed(&mut self) {
        let count = self.pages.len();
        self.pan.set_page_count(count);
        if let Some(Role::TabBar(tabs)) = self.containers.get_mut(self.tab_bar).map(Container::role_mut) {
            tabs.set_tabs(count);
        }
        self.relayout_pages();
    }

    /// Create an icon for `app`, settled at the end of `container`
    #[instrument(level = "debug", parent = &self.span, skip(self, handler, app), fields(app = %app.as_ref()))]
    pub fn add_icon<H: LauncherHandler>(
        &mut self,
        handler: &mut H,
        app: impl AsRef<str>,
        container: ContainerHandle,
    ) -> Result<IconHandle, LauncherError> {
        let holder = self.containers.get(container).ok_or(LauncherError::ContainerGone)?;
        if !holder.keeps_icons() {
            return Err(TransferError::Rejected.into());
        }

        let icon = self.icons.insert(Icon::new(app.as_ref(), self.config.icon_size));
        let mut coordinator = self.coordinator();
        let placed = coordinator
            .try_offer(container, icon)
            .and_then(|()| coordinator.settle(container, icon, usize::MAX));
        if let Err(err) = placed {
            self.icons.remove(icon);
            return Err(err.into());
        }

        self.layout(handler, container);
        handler.needs_save(container);
        Ok(icon)
    }

    /// Destroy an icon
    ///
    /// Contacts pressing the icon are ignored until they end.
    #[instrument(level = "debug", parent = &self.span, skip(self, handler))]
    pub fn remove_icon<H: LauncherHandler>(
        &mut self,
        handler: &mut H,
        icon: IconHandle,
    ) -> Result<(), LauncherError> {
        let owner = self.icons.get(icon).ok_or(LauncherError::IconGone)?.owner();

        let pressing: SmallVec<[ContactId; 2]> = self
            .arbiter
            .contacts()
            .filter(|(_, register)| register.pressed() == Some(icon))
            .map(|(contact, _)| contact)
            .collect();
        for contact in pressing {
            self.arbiter.invalidate(contact);
            self.arbiter.cancel_redirection(contact, false);
        }

        self.coordinator().release(icon)?;
        self.icons.remove(icon);
        if let Some(owner) = owner.filter(|owner| self.containers.contains(*owner)) {
            self.layout(handler, owner);
            handler.needs_save(owner);
        }
        Ok(())
    }

    /// Stop forwarding the events of `contact`
    ///
    /// The redirect context is dropped right away, later events of the contact are handled by the
    /// container it started on again.
    pub fn cancel_redirection(&mut self, contact: ContactId) {
        self.arbiter.cancel_redirection(contact, false);
    }

    /// Lock or unlock a container, a locked container does not let its icons go
    pub fn set_locked(&mut self, container: ContainerHandle, locked: bool) -> Result<(), LauncherError> {
        self.containers
            .get_mut(container)
            .ok_or(LauncherError::ContainerGone)?
            .set_locked(locked);
        Ok(())
    }

    /// Offer `icon` to `dest`, see [`TransferCoordinator::offer`]
    pub fn offer(&mut self, dest: ContainerHandle, icon: IconHandle) -> bool {
        self.coordinator().offer(dest, icon)
    }

    /// Snap the pages to page `index`
    pub fn pan_to(&mut self, index: usize, now: u32) -> bool {
        self.pan.pan_to(index, now)
    }

    /// Check that every icon is held by exactly one container, its owner
    pub fn ownership_consistent(&self) -> bool {
        self.icons.iter().all(|(handle, icon)| {
            let holders: SmallVec<[ContainerHandle; 2]> = self
                .containers
                .iter()
                .filter(|(_, container)| container.transfer().contains(handle, &icon.id()))
                .map(|(container, _)| container)
                .collect();
            holders.len() == 1 && icon.owner() == Some(holders[0])
        })
    }

    /*
     * Layout
     */

    fn relayout_pages(&mut self) {
        let anchor = self.pan.anchor();
        for (index, page) in self.pages.iter().enumerate() {
            if let Some(container) = self.containers.get_mut(*page) {
                container.set_geometry(page_geometry(index, anchor, self.config.screen));
            }
        }
    }

    /// Move the settled icons of `container` to the geometry of their slots
    fn layout<H: LauncherHandler>(&mut self, handler: &mut H, container: ContainerHandle) {
        let Some(holder) = self.containers.get(container) else {
            return;
        };
        for (index, icon) in holder.transfer.settled().iter().enumerate() {
            let geometry = handler.slot_geometry(container, index);
            if let (Some(geometry), Some(icon)) = (geometry, self.icons.get_mut(*icon)) {
                icon.geometry = geometry;
            }
        }
    }

    /// Move `icon` so that its hotspot lies under the global `location`
    fn follow(&mut self, icon: IconHandle, location: Point<f64, Global>, hotspot: Point<f64, Local>) {
        let Some(object) = self.icons.get_mut(icon) else {
            return;
        };
        if let Some(owner) = object.owner().and_then(|owner| self.containers.get(owner)) {
            object.follow(owner.to_local(location), hotspot);
        }
    }

    fn container_at(&self, location: Point<f64, Global>) -> ContainerHandle {
        [self.bar, self.tab_bar]
            .into_iter()
            .chain(self.pages.iter().copied())
            .find(|handle| {
                self.containers
                    .get(*handle)
                    .map_or(false, |container| container.geometry().contains(location))
            })
            .unwrap_or(self.root)
    }

    fn icon_at(
        &self,
        container: ContainerHandle,
        location: Point<f64, Global>,
    ) -> Option<(IconHandle, Point<f64, Local>)> {
        let holder = self.containers.get(container)?;
        let local = holder.to_local(location);
        holder.transfer().settled().iter().find_map(|handle| {
            let icon = self.icons.get(*handle)?;
            icon.geometry()
                .contains(local)
                .then(|| (*handle, local - icon.geometry().loc))
        })
    }

    fn classify(&self, container: ContainerHandle, location: Point<f64, Global>) -> Zone {
        let Some(holder) = self.containers.get(container) else {
            return Zone::Outside;
        };
        let local = holder.to_local(location);
        match holder.role() {
            Role::Page(page) => {
                let docked = [(Zone::Bar, self.bar), (Zone::Tray, self.tab_bar)]
                    .into_iter()
                    .filter_map(|(zone, handle)| Some((zone, self.containers.get(handle)?.geometry())));
                page.classifier(holder.geometry(), docked, &self.config.zones)
                    .classify(local)
            }
            _ => ZoneClassifier::new(holder.geometry().size.cast(), 0.0).classify(local),
        }
    }

    /*
     * Event dispatch
     */

    /// Process a pointer event
    #[instrument(level = "debug", parent = &self.span, skip(self, handler))]
    pub fn dispatch<H: LauncherHandler>(&mut self, handler: &mut H, event: &PointerEvent) {
        match event.phase {
            Phase::Start => self.start(event),
            Phase::Move => self.motion(event),
            Phase::End => self.release(handler, event),
            Phase::Cancel => self.cancel(handler, event),
        }
        self.arbiter.flush_deferred();
    }

    /// Advance animations and timers to `now`
    #[instrument(level = "trace", parent = &self.span, skip(self))]
    pub fn tick(&mut self, now: u32) {
        if self.pan.is_animating() {
            self.pan.advance(now);
            self.relayout_pages();
        }

        let waiting: SmallVec<[ContactId; 4]> = self
            .arbiter
            .contacts()
            .filter(|(_, register)| register.claimed() == GestureKind::None && register.is_valid())
            .map(|(contact, _)| contact)
            .collect();
        for contact in waiting {
            if self.recognizer.long_press(&mut self.arbiter, contact, now).is_some() {
                self.start_tracking(contact);
            }
        }

        // a contact resting in a zone acts again once the pages settled
        if !self.pan.is_animating() {
            if let Some(contact) = self.arbiter.any_tracking() {
                if let Some(location) = self.arbiter.get(contact).map(ContactRegister::last) {
                    self.deliver_motion(contact, location, now);
                }
            }
        }
        self.arbiter.flush_deferred();
    }

    fn start(&mut self, event: &PointerEvent) {
        let origin = self.container_at(event.location);
        let mut register = ContactRegister::new(origin, event.location, event.time);
        if let Some((icon, hotspot)) = self.icon_at(origin, event.location) {
            register = register.with_pressed(icon, hotspot);
        }
        if let Err(err) = self.arbiter.begin(event.contact, register) {
            error!(contact = ?event.contact, "{}", err);
            debug_assert!(false, "{}", err);
        }
    }

    fn motion(&mut self, event: &PointerEvent) {
        let contact = event.contact;
        let Some(register) = self.arbiter.register_mut(contact) else {
            return;
        };
        if register.is_valid() {
            match self.recognizer.motion(&mut self.arbiter, contact, event.location, event.time) {
                Some(GestureKind::LongPress) => self.start_tracking(contact),
                Some(GestureKind::Flick) => self.start_pan(contact),
                _ => {}
            }
            self.deliver_motion(contact, event.location, event.time);
        }
        self.arbiter.update(contact, event.location, event.time);
    }

    fn start_tracking(&mut self, contact: ContactId) {
        if self.arbiter.set_tracking(contact, true) {
            debug!(?contact, "icon lifted");
        } else {
            self.arbiter.invalidate(contact);
        }
    }

    fn start_pan(&mut self, contact: ContactId) {
        let Some(register) = self.arbiter.get(contact) else {
            return;
        };
        let origin = register.origin();
        if self.containers.get(origin).map_or(false, Container::is_page) {
            let context = RedirectContext::Pan {
                start_anchor: self.pan.anchor(),
            };
            self.arbiter.redirect_to(contact, self.root, context, &self.containers);
        }
    }

    fn deliver_motion(&mut self, contact: ContactId, location: Point<f64, Global>, time: u32) {
        let Some(register) = self.arbiter.get(contact) else {
            return;
        };
        if register.is_redirecting() {
            if let Err(err) = self.forward_motion(contact, location, time) {
                debug!(?contact, "motion consumed: {}", err);
            }
        } else {
            let origin = register.origin();
            self.route_drag(origin, contact, location, time);
        }
    }

    fn forward_motion(
        &mut self,
        contact: ContactId,
        location: Point<f64, Global>,
        time: u32,
    ) -> Result<(), RedirectError> {
        let (target, context) = self.arbiter.lend_context(contact)?;
        if !self.containers.contains(target) {
            self.arbiter.restore_context(contact, target, context);
            return Err(RedirectError::TargetMissing(target));
        }
        self.redirected_moved(target, contact, location, time, &context);
        self.arbiter.restore_context(contact, target, context);
        Ok(())
    }

    fn redirected_moved(
        &mut self,
        target: ContainerHandle,
        contact: ContactId,
        location: Point<f64, Global>,
        time: u32,
        context: &RedirectContext,
    ) {
        match *context {
            RedirectContext::Pan { start_anchor } => {
                let Some(start) = self.arbiter.get(contact).map(ContactRegister::start) else {
                    return;
                };
                self.pan.drag(start_anchor - (location.x - start.x));
                self.relayout_pages();
            }
            RedirectContext::Transfer { source, direction, .. } => {
                trace!(?contact, ?source, ?direction, "forwarding drag");
                self.route_drag(target, contact, location, time)
            }
        }
    }

    /// Route the motion of a tracking contact, handled by `current`
    fn route_drag(
        &mut self,
        current: ContainerHandle,
        contact: ContactId,
        location: Point<f64, Global>,
        time: u32,
    ) {
        let mut current = current;
        for _ in 0..MAX_HOPS {
            match self.route_step(current, contact, location, time) {
                Some(next) => current = next,
                None => return,
            }
        }
        warn!(?contact, "too many redirects for a single motion");
    }

    /// Returns the container now handling the contact, if it was redirected
    fn route_step(
        &mut self,
        current: ContainerHandle,
        contact: ContactId,
        location: Point<f64, Global>,
        time: u32,
    ) -> Option<ContainerHandle> {
        let register = self.arbiter.get(contact)?;
        if !register.is_tracking() {
            return None;
        }
        let icon = register.pressed()?;
        let hotspot = register.hotspot();
        self.follow(icon, location, hotspot);

        let container = self.containers.get(current)?;
        if container.is_page() {
            let index = self.page_index(current)?;
            let centered = self.pan.centered()?;
            if centered != index {
                let direction = if centered > index { Direction::Right } else { Direction::Left };
                return self.hop(contact, current, self.pages[centered], direction);
            }
        }

        let zone = self.classify(current, location);
        trace!(?contact, ?current, ?zone, "dragging");
        match zone {
            Zone::Inner => {
                let owner = self.icons.get(icon)?.owner();
                if owner != Some(current) && self.coordinator().offer(current, icon) {
                    self.follow(icon, location, hotspot);
                }
                if current == self.tab_bar && !self.pan.is_animating() {
                    if let Some(tab) = self.tab_under(location) {
                        self.pan.pan_to(tab, time);
                    }
                }
                None
            }
            Zone::LeftBorder | Zone::RightBorder => {
                if !self.pan.is_animating() {
                    let delta = if zone.direction() == Some(Direction::Left) { -1 } else { 1 };
                    if self.pan.pan_by(delta, time) {
                        debug!(?contact, ?zone, "auto-pan");
                    }
                }
                None
            }
            Zone::Bar | Zone::Tray => {
                let target = if zone == Zone::Bar { self.bar } else { self.tab_bar };
                self.hop(contact, current, target, zone.direction()?)
            }
            Zone::Outside => {
                let page = self.centered_page().filter(|page| *page != current)?;
                let direction = if current == self.tab_bar { Direction::Down } else { Direction::Up };
                self.hop(contact, current, page, direction)
            }
        }
    }

    fn tab_under(&self, location: Point<f64, Global>) -> Option<usize> {
        let container = self.containers.get(self.tab_bar)?;
        match container.role() {
            Role::TabBar(tabs) => tabs.tab_at(container.to_local(location), container.geometry().size.cast()),
            _ => None,
        }
    }

    /// Hand the contact handled by `current` over to `new`
    fn hop(
        &mut self,
        contact: ContactId,
        current: ContainerHandle,
        new: ContainerHandle,
        direction: Direction,
    ) -> Option<ContainerHandle> {
        let register = self.arbiter.get(contact)?;
        let origin = register.origin();
        let context = RedirectContext::Transfer {
            icon: register.pressed()?,
            source: current,
            direction,
        };
        let hopped = if current == origin && !register.is_redirecting() {
            self.arbiter.redirect_to(contact, new, context, &self.containers)
        } else {
            self.arbiter.change_redirect_to(contact, current, new, context)
        };
        if !hopped {
            return None;
        }
        let register = self.arbiter.get(contact)?;
        Some(register.redirect_target().unwrap_or(origin))
    }

    fn release<H: LauncherHandler>(&mut self, handler: &mut H, event: &PointerEvent) {
        let contact = event.contact;
        let Some(register) = self.arbiter.register_mut(contact) else {
            return;
        };
        if register.is_valid() {
            let (origin, pressed) = (register.origin(), register.pressed());
            let redirecting = register.is_redirecting();
            if register.claimed() == GestureKind::None {
                if self.recognizer.release(&mut self.arbiter, contact, event.location).is_some() {
                    self.tap(handler, origin, pressed, event);
                }
            } else if redirecting {
                if let Err(err) = self.forward_release(handler, contact, event) {
                    debug!(?contact, "release consumed: {}", err);
                }
            } else if let Some(icon) = pressed.filter(|_| register_tracks(&self.arbiter, contact)) {
                self.drop_icon(handler, origin, icon, event.location);
            }
        }
        self.finish(handler, contact);
    }

    fn cancel<H: LauncherHandler>(&mut self, handler: &mut H, event: &PointerEvent) {
        let contact = event.contact;
        if let Some(RedirectContext::Pan { .. }) = self.arbiter.redirect_context(contact) {
            self.pan.fling(0.0, self.config.gesture.flick_velocity, event.time);
        }
        self.finish(handler, contact);
    }

    /// End the contact, making sure the icon it dragged is not left in limbo
    fn finish<H: LauncherHandler>(&mut self, handler: &mut H, contact: ContactId) {
        let register = match self.arbiter.end(contact) {
            Ok(register) => register,
            Err(err) => {
                error!("{}", err);
                debug_assert!(false, "{}", err);
                return;
            }
        };
        if !register.is_tracking() {
            return;
        }
        let Some(icon) = register.pressed() else {
            return;
        };
        let Some(object) = self.icons.get(icon) else {
            return;
        };
        let in_limbo = object
            .owner()
            .and_then(|owner| self.containers.get(owner))
            .map_or(true, |owner| owner.transfer().in_limbo(&object.id()));
        if in_limbo {
            self.fallback_settle(handler, icon);
        } else if let Some(owner) = object.owner() {
            // back to its slot
            self.layout(handler, owner);
        }
    }

    fn tap<H: LauncherHandler>(
        &mut self,
        handler: &mut H,
        origin: ContainerHandle,
        pressed: Option<IconHandle>,
        event: &PointerEvent,
    ) {
        if let Some((icon, object)) = pressed.and_then(|icon| Some((icon, self.icons.get(icon)?))) {
            debug!(?icon, app = object.app(), "launch requested");
            handler.launch_requested(icon, object.app());
        } else if origin == self.tab_bar {
            if let Some(tab) = self.tab_under(event.location) {
                self.pan.pan_to(tab, event.time);
            }
        }
    }

    fn forward_release<H: LauncherHandler>(
        &mut self,
        handler: &mut H,
        contact: ContactId,
        event: &PointerEvent,
    ) -> Result<(), RedirectError> {
        let (target, context) = self.arbiter.lend_context(contact)?;
        if !self.containers.contains(target) {
            self.arbiter.restore_context(contact, target, context);
            return Err(RedirectError::TargetMissing(target));
        }
        self.redirected_released(handler, target, contact, event, &context);
        self.arbiter.restore_context(contact, target, context);
        self.arbiter.cancel_redirection(contact, true);
        Ok(())
    }

    fn redirected_released<H: LauncherHandler>(
        &mut self,
        handler: &mut H,
        target: ContainerHandle,
        contact: ContactId,
        event: &PointerEvent,
        context: &RedirectContext,
    ) {
        match *context {
            RedirectContext::Pan { .. } => {
                let velocity = self.arbiter.get(contact).map_or(0.0, ContactRegister::velocity);
                self.pan
                    .fling(velocity, self.config.gesture.flick_velocity, event.time);
            }
            RedirectContext::Transfer { icon, .. } => {
                if register_tracks(&self.arbiter, contact) {
                    self.drop_icon(handler, target, icon, event.location);
                }
            }
        }
    }

    /// `icon` was released over `at`
    #[instrument(level = "debug", parent = &self.span, skip(self, handler))]
    fn drop_icon<H: LauncherHandler>(
        &mut self,
        handler: &mut H,
        at: ContainerHandle,
        icon: IconHandle,
        location: Point<f64, Global>,
    ) {
        let Some(object) = self.icons.get(icon) else {
            return;
        };
        let (owner, id, previous) = (object.owner(), object.id(), object.last_settled());
        let Some(container) = self.containers.get(at) else {
            return;
        };

        if owner != Some(at) {
            // nothing accepted the icon here, it returns to its place when the contact ends
            trace!(?icon, ?at, "dropped over a container not holding it");
            return;
        }

        let (dest, index) = match container.role() {
            Role::TabBar(_) => {
                let Some(page) = self.tab_under(location).and_then(|tab| self.pages.get(tab).copied()) else {
                    return;
                };
                if !self.coordinator().offer(page, icon) {
                    return;
                }
                (page, usize::MAX)
            }
            _ => {
                let occupied: Vec<IconHandle> = container
                    .transfer()
                    .settled()
                    .iter()
                    .copied()
                    .filter(|handle| *handle != icon)
                    .collect();
                let Some(index) = handler.nearest_slot(at, &occupied, container.to_local(location)) else {
                    return;
                };
                (at, index)
            }
        };

        let reorder = self
            .containers
            .get(dest)
            .map_or(false, |container| container.transfer().position(icon).is_some());
        match self.coordinator().settle(dest, icon, index) {
            Ok(index) => {
                debug!(?icon, ?dest, index, reorder, "icon dropped");
                self.layout(handler, dest);
                handler.needs_save(dest);
                if let Some(previous) = previous.filter(|previous| *previous != dest) {
                    if self.containers.contains(previous) {
                        self.layout(handler, previous);
                        handler.needs_save(previous);
                    }
                }
            }
            Err(err) => debug!(?icon, ?dest, ?id, "drop not settled: {}", err),
        }
    }

    /// Settle an icon whose release did not resolve
    ///
    /// Candidates are tried in order: the container the icon was last settled in, the last centered
    /// page, every page in display order and finally the root container.
    fn fallback_settle<H: LauncherHandler>(&mut self, handler: &mut H, icon: IconHandle) {
        let Some(object) = self.icons.get(icon) else {
            return;
        };
        let owner = object.owner();

        let mut candidates: SmallVec<[ContainerHandle; 8]> = SmallVec::new();
        candidates.extend(object.last_settled());
        candidates.extend(self.pan.last_visited().and_then(|index| self.pages.get(index).copied()));
        candidates.extend(self.pages.iter().copied());
        candidates.push(self.root);

        for candidate in candidates {
            let accepted = owner == Some(candidate) || self.coordinator().offer(candidate, icon);
            if accepted && self.coordinator().settle(candidate, icon, usize::MAX).is_ok() {
                warn!(?icon, ?candidate, "unresolved release, icon fell back");
                self.settled_after_fallback(handler, candidate, owner);
                return;
            }
        }

        // the holder vetoes every transfer, take the icon away from it
        let root = self.root;
        let mut coordinator = self.coordinator();
        let forced = coordinator
            .release(icon)
            .and_then(|()| coordinator.try_offer(root, icon))
            .and_then(|()| coordinator.settle(root, icon, usize::MAX));
        match forced {
            Ok(_) => {
                warn!(?icon, "unresolved release, icon moved to the root container");
                self.settled_after_fallback(handler, root, owner);
            }
            Err(err) => error!(?icon, "icon could not be placed: {}", err),
        }
    }

    fn settled_after_fallback<H: LauncherHandler>(
        &mut self,
        handler: &mut H,
        container: ContainerHandle,
        previous_owner: Option<ContainerHandle>,
    ) {
        self.layout(handler, container);
        handler.needs_save(container);
        if let Some(previous) = previous_owner.filter(|previous| *previous != container) {
            if self.containers.contains(previous) {
                handler.needs_save(previous);
            }
        }
    }
}

fn register_tracks(arbiter: &PointerArbiter, contact: ContactId) -> bool {
    arbiter.get(contact).map_or(false, ContactRegister::is_tracking)
}
