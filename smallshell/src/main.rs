mod script;
mod state;

use std::collections::HashSet;

use handoff::shell::{Launcher, LauncherConfig};
use tracing::info;

pub use state::Smallshell;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().init();
    }

    let config = LauncherConfig::default();
    let mut launcher = Launcher::new(config.clone());
    let mut shell = Smallshell {
        bar: launcher.bar(),
        columns: 4,
        cell: (config.screen.w / 4.0, config.icon_size.h + 20.0).into(),
        top: config.tab_bar_height,
        dirty: HashSet::new(),
        launched: Vec::new(),
    };

    let second = launcher.add_page(&mut shell);
    let first = launcher.pages()[0];
    for app in ["org.example.clock", "org.example.mail", "org.example.notes"] {
        launcher.add_icon(&mut shell, app, first)?;
    }
    launcher.add_icon(&mut shell, "org.example.camera", second)?;
    shell.dirty.clear();

    let mut args = std::env::args().skip(1);
    let scenario = args.next().unwrap_or_else(|| String::from("drag"));
    let script = script::by_name(&scenario, &config).ok_or_else(|| format!("unknown scenario {}", scenario))?;
    script::play(&mut launcher, &mut shell, &script);

    for (index, page) in launcher.pages().iter().enumerate() {
        let apps = launcher
            .container(*page)
            .map(|container| {
                container
                    .transfer()
                    .settled()
                    .iter()
                    .filter_map(|icon| launcher.icon(*icon).map(|icon| icon.app().to_owned()))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        info!(page = index, ?apps, "layout");
    }
    info!(dirty = shell.dirty.len(), launched = ?shell.launched, "done");
    debug_assert!(launcher.ownership_consistent());

    Ok(())
}
