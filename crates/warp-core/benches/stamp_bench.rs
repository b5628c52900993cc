use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kurbo::{Point, Vec2};
use warp_core::stamp::build_round_stamp;
use warp_core::{build_map, CancelToken, IRect};
use warp_data::{Warp, WarpKind};

fn radial_warp(radius: f64) -> Warp {
    let p = Point::new(500.0, 500.0);
    let mut w = Warp::new(WarpKind::RadialGrow, p);
    w.radius = p + Vec2::new(radius, 0.0);
    w.strength = p + Vec2::new(radius / 2.0, 0.0);
    w
}

fn bench_stamps(c: &mut Criterion) {
    c.bench_function("round_stamp_r100", |b| {
        let w = radial_warp(100.0);
        b.iter(|| build_round_stamp(black_box(&w)))
    });

    c.bench_function("build_map_50_stamps", |b| {
        let warps: Vec<Warp> = (0..50)
            .map(|i| {
                let mut w = radial_warp(40.0);
                w.relocate(Point::new(100.0 + 15.0 * i as f64, 500.0));
                w
            })
            .collect();
        let roi = IRect::new(0, 0, 1000, 1000);
        let cancel = CancelToken::new();
        b.iter(|| build_map(black_box(&warps), &roi, &cancel))
    });
}

criterion_group!(benches, bench_stamps);
criterion_main!(benches);
