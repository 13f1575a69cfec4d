//! Benchmarks for submenu placement and menu open/close cycles.
//!
//! Run with: cargo bench -p flyout-widgets

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use flyout_core::event::PointerEvent;
use flyout_core::geometry::Rect;
use flyout_render::{Scene, Viewport};
use flyout_widgets::menu::place_submenu;
use flyout_widgets::{
    FlyoutMenuOption, MenuConfig, MenuHierarchy, MenuPosition, OverlayHost, PlacementConfig,
    ShowOptions,
};
use std::hint::black_box;

// ============================================================================
// Side selection and clamping
// ============================================================================

fn bench_place_submenu(c: &mut Criterion) {
    let mut group = c.benchmark_group("menu/place_submenu");
    let cfg = PlacementConfig::default();
    let vp = Viewport::new(1280.0, 800.0);

    for (name, x) in [("left_half", 40.0), ("center", 600.0), ("right_edge", 1180.0)] {
        let pos = MenuPosition::from_rect(Rect::new(x, 100.0, 90.0, 200.0), vp, cfg.min_submenu_width);
        let trigger = Rect::new(x, 150.0, 90.0, 20.0);
        group.bench_with_input(BenchmarkId::new("depth", name), &pos, |b, pos| {
            b.iter(|| {
                for depth in 1..=4 {
                    black_box(place_submenu(pos, trigger, depth, vp, &cfg));
                }
            })
        });
    }

    group.finish();
}

// ============================================================================
// Full hierarchy on the headless scene
// ============================================================================

fn nested(depth: usize, width: usize) -> Vec<FlyoutMenuOption> {
    let mut options: Vec<FlyoutMenuOption> = (0..width)
        .map(|i| FlyoutMenuOption::action(format!("Item {i}"), |_| {}))
        .collect();
    if depth > 0 {
        options.push(FlyoutMenuOption::submenu("More", nested(depth - 1, width)));
    }
    options
}

fn bench_open_close_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("menu/open_close");

    for depth in [1usize, 3, 6] {
        let mut host = OverlayHost::new(Scene::new(1280.0, 800.0));
        let Ok(mut menu) = MenuHierarchy::new(&mut host, MenuConfig::new(nested(depth, 8))) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("levels", depth), &depth, |b, &depth| {
            b.iter(|| {
                let Ok(mut root) = host.panel_mut(menu.root()) else {
                    return;
                };
                root.show(40.0, 40.0, ShowOptions::exact());
                for d in 0..depth {
                    let Some(&trigger) = menu.rows(d).last() else {
                        break;
                    };
                    black_box(menu.activate(&mut host, trigger).ok());
                }
                black_box(menu.close_menus(&mut host).ok());
            })
        });
    }

    group.finish();
}

fn bench_outside_dismissal(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay/pointer_down");

    for depth in [2usize, 6] {
        let mut host = OverlayHost::new(Scene::new(1280.0, 800.0));
        let Ok(mut menu) = MenuHierarchy::new(&mut host, MenuConfig::new(nested(depth, 4))) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("chain", depth), &depth, |b, &depth| {
            b.iter(|| {
                if let Ok(mut root) = host.panel_mut(menu.root()) {
                    root.show(40.0, 40.0, ShowOptions::exact());
                }
                for d in 0..depth {
                    if let Some(&trigger) = menu.rows(d).last() {
                        let _ = menu.activate(&mut host, trigger);
                    }
                }
                black_box(host.pointer_down(&PointerEvent::down(5.0, 790.0)));
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_place_submenu,
    bench_open_close_cycle,
    bench_outside_dismissal
);
criterion_main!(benches);
