use std::collections::HashSet;

use handoff::{
    shell::{ContainerHandle, LauncherHandler},
    transfer::IconHandle,
    utils::{Local, Point, Rectangle, Size},
};
use tracing::info;

/// Grid layout and fake persistence of the demo shell
pub struct Smallshell {
    pub bar: ContainerHandle,
    pub columns: usize,
    pub cell: Size<f64, Local>,
    pub top: f64,
    pub dirty: HashSet<ContainerHandle>,
    pub launched: Vec<String>,
}

impl Smallshell {
    fn cell_of(&self, container: ContainerHandle, index: usize) -> Point<f64, Local> {
        if container == self.bar {
            (index as f64 * self.cell.w, 0.0).into()
        } else {
            (
                (index % self.columns) as f64 * self.cell.w,
                self.top + (index / self.columns) as f64 * self.cell.h,
            )
                .into()
        }
    }
}

impl LauncherHandler for Smallshell {
    fn nearest_slot(
        &mut self,
        container: ContainerHandle,
        occupied: &[IconHandle],
        position: Point<f64, Local>,
    ) -> Option<usize> {
        // the free slot right after the last occupied one is a valid target too
        (0..=occupied.len()).min_by(|a, b| {
            let a = self.cell_of(container, *a).distance(position);
            let b = self.cell_of(container, *b).distance(position);
            a.total_cmp(&b)
        })
    }

    fn slot_geometry(&mut self, container: ContainerHandle, index: usize) -> Option<Rectangle<f64, Local>> {
        Some(Rectangle {
            loc: self.cell_of(container, index),
            size: self.cell,
        })
    }

    fn needs_save(&mut self, container: ContainerHandle) {
        self.dirty.insert(container);
    }

    fn launch_requested(&mut self, icon: IconHandle, app: &str) {
        info!(?icon, app, "launch");
        self.launched.push(app.to_owned());
    }
}
