use handoff::{
    input::{Phase, PointerEvent},
    shell::{Launcher, LauncherConfig},
};
use tracing::debug;

use crate::Smallshell;

/// A step of a scripted session
pub enum Step {
    Event(PointerEvent),
    Tick(u32),
}

/// Frame interval used while waiting
const FRAME: u32 = 16;

fn hold(steps: &mut Vec<Step>, from: u32, to: u32) {
    steps.extend((from..to).step_by(FRAME as usize).map(Step::Tick));
}

/// Build a scripted session for a screen of the configured size
pub fn by_name(name: &str, config: &LauncherConfig) -> Option<Vec<Step>> {
    let w = config.screen.w;
    let h = config.screen.h;
    let first_icon = (w / 8.0, config.tab_bar_height + 40.0);
    let mut steps = Vec::new();
    match name {
        // long press the first icon, carry it over the right border and drop it on the next page
        "drag" => {
            steps.push(Step::Event(PointerEvent::new(1, first_icon, Phase::Start, 0)));
            hold(&mut steps, 0, 700);
            steps.push(Step::Event(PointerEvent::new(1, (w / 2.0, h / 2.0), Phase::Move, 720)));
            steps.push(Step::Event(PointerEvent::new(1, (w - 4.0, h / 2.0), Phase::Move, 760)));
            hold(&mut steps, 760, 1100);
            steps.push(Step::Event(PointerEvent::new(1, (w / 2.0, h / 2.0), Phase::Move, 1120)));
            steps.push(Step::Event(PointerEvent::new(1, (w / 2.0, h / 2.0), Phase::End, 1140)));
        }
        // long press the first icon and drop it into the quick-launch bar
        "dock" => {
            steps.push(Step::Event(PointerEvent::new(1, first_icon, Phase::Start, 0)));
            hold(&mut steps, 0, 700);
            let bar = (w / 2.0, h - config.bar_height / 2.0);
            steps.push(Step::Event(PointerEvent::new(1, bar, Phase::Move, 720)));
            steps.push(Step::Event(PointerEvent::new(1, bar, Phase::End, 760)));
        }
        // flick to the second page and tap its first icon
        "flick" => {
            steps.push(Step::Event(PointerEvent::new(1, (w * 0.8, h / 2.0), Phase::Start, 0)));
            steps.push(Step::Event(PointerEvent::new(1, (w * 0.5, h / 2.0), Phase::Move, 40)));
            steps.push(Step::Event(PointerEvent::new(1, (w * 0.2, h / 2.0), Phase::End, 80)));
            hold(&mut steps, 80, 500);
            steps.push(Step::Event(PointerEvent::new(2, first_icon, Phase::Start, 520)));
            steps.push(Step::Event(PointerEvent::new(2, first_icon, Phase::End, 560)));
        }
        _ => return None,
    }
    Some(steps)
}

/// Feed a session to the launcher
pub fn play(launcher: &mut Launcher, shell: &mut Smallshell, steps: &[Step]) {
    for step in steps {
        match step {
            Step::Event(event) => {
                debug!(?event, "event");
                launcher.dispatch(shell, event);
            }
            Step::Tick(now) => launcher.tick(*now),
        }
    }
}
