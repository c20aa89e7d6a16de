use criterion::{black_box, criterion_group, criterion_main, Criterion};
use handoff::{
    shell::{Container, Page, Role, Zone, ZoneClassifier},
    transfer::{Icon, TransferCoordinator},
    utils::{Arena, Rectangle},
};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("TransferCoordinator::offer back and forth", |b| {
        let mut icons = Arena::new();
        let mut containers = Arena::new();
        let left = containers.insert(Container::new(
            Role::Page(Page::new(16)),
            Rectangle::from_loc_and_size((0.0, 0.0), (400.0, 800.0)),
        ));
        let right = containers.insert(Container::new(
            Role::Page(Page::new(16)),
            Rectangle::from_loc_and_size((400.0, 0.0), (400.0, 800.0)),
        ));
        let icon = icons.insert(Icon::new("bench", (80.0, 80.0).into()));
        let mut coordinator = TransferCoordinator::new(&mut icons, &mut containers);
        coordinator.offer(left, icon);
        b.iter(|| {
            coordinator.offer(black_box(right), icon);
            coordinator.offer(black_box(left), icon)
        })
    });

    c.bench_function("ZoneClassifier::classify", |b| {
        let zones = ZoneClassifier::new((400.0, 800.0).into(), 32.0)
            .with_docked(Zone::Tray, Rectangle::from_loc_and_size((0.0, 0.0), (400.0, 48.0)))
            .with_docked(Zone::Bar, Rectangle::from_loc_and_size((0.0, 688.0), (400.0, 112.0)));
        let points = [(10.0, 400.0), (200.0, 20.0), (200.0, 400.0), (390.0, 700.0), (500.0, 10.0)];
        b.iter(|| {
            points
                .iter()
                .map(|point| zones.classify(black_box(*point).into()))
                .filter(|zone| zone.is_border())
                .count()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
