use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spanline::prelude::*;

fn bench_star_mask_fill(c: &mut Criterion) {
    let bounds = IntRect::new(0, 0, 256, 256);
    let mut path = Path::new();
    path.add_star(128.0, 128.0, 9, 120.0, 50.0, 0.3);

    c.bench_function("star_mask_fill_256", |b| {
        let mut canvas = SelfContainedRaster::<Mask8>::new(bounds, false).unwrap();
        b.iter(|| {
            let mask = PolygonMask::new(&path, bounds, FillRule::NonZero);
            canvas.as_raster().fill(&mask, bounds);
            black_box(canvas.get_pixel(128, 128))
        })
    });
}

fn bench_stroked_circle_blend(c: &mut Criterion) {
    let bounds = IntRect::new(0, 0, 256, 256);
    let mut path = Path::new();
    path.add_circle(128.0, 128.0, 100.0, 1.0);
    path.stroke(12.0, EndCapStyle::Butt, JointStyle::Curve, 2.0, 1.0);

    c.bench_function("stroked_circle_blend_256", |b| {
        let mut canvas = SelfContainedRaster::<Argb32>::new(bounds, false).unwrap();
        let color = Solid::<Argb32>::new(0xFF4080C0);
        b.iter(|| {
            let mask = PolygonMask::new(&path, bounds, FillRule::NonZero);
            let filled: Multiplier<Argb32, Mask8> = Multiplier::new(&color, &mask);
            canvas.as_raster().blend_with(&filled);
            black_box(canvas.get_pixel(128, 28))
        })
    });
}

criterion_group!(benches, bench_star_mask_fill, bench_stroked_circle_blend);
criterion_main!(benches);
