use uuid::Uuid;

use crate::{
    shell::ContainerHandle,
    utils::{Handle, Local, Point, Rectangle, Size},
};

/// Weak reference to an [`Icon`] stored in the launcher
pub type IconHandle = Handle<Icon>;

/// A draggable launcher item
///
/// An icon is owned by exactly one container at a time. The owner reference is only repointed by a
/// successful transfer, see [`TransferCoordinator`](super::TransferCoordinator).
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    id: Uuid,
    app: String,
    pub(crate) owner: Option<ContainerHandle>,
    pub(crate) geometry: Rectangle<f64, Local>,
    pub(crate) last_settled: Option<ContainerHandle>,
}

impl Icon {
    /// Create an unowned icon for the application `app`
    pub fn new(app: impl Into<String>, size: Size<f64, Local>) -> Self {
        Icon {
            id: Uuid::new_v4(),
            app: app.into(),
            owner: None,
            geometry: Rectangle::from_size(size),
            last_settled: None,
        }
    }

    /// Identity of this icon, stable for its whole life
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identity of the application this icon launches
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Container currently owning this icon
    pub fn owner(&self) -> Option<ContainerHandle> {
        self.owner
    }

    /// Bounding rectangle, local to the owner
    pub fn geometry(&self) -> Rectangle<f64, Local> {
        self.geometry
    }

    /// Container this icon was last settled into
    pub fn last_settled(&self) -> Option<ContainerHandle> {
        self.last_settled
    }

    /// Move the icon so that the point `hotspot` of it lies under `position`
    ///
    /// Both points are relative to the owner.
    pub(crate) fn follow(&mut self, position: Point<f64, Local>, hotspot: Point<f64, Local>) {
        self.geometry.loc = position - hotspot;
    }
}
