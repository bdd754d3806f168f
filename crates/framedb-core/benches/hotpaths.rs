use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};

use framedb_core::detect_screen_bounds;

/// Opaque frame with a centered transparent cut-out and a transparent
/// apron, the shape of a real device template asset.
fn make_frame_fixture(width: u32, height: u32) -> RgbaImage {
    let screen_x = width / 6;
    let screen_y = height / 8;
    let screen_w = width - 2 * screen_x;
    let screen_h = height - 2 * screen_y;
    let apron = width.min(height) / 24;

    RgbaImage::from_fn(width, height, |x, y| {
        let in_screen = x >= screen_x
            && x < screen_x + screen_w
            && y >= screen_y
            && y < screen_y + screen_h;
        let in_apron = x < apron || y < apron || x >= width - apron || y >= height - apron;
        if in_screen || in_apron {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([30, 30, 30, 255])
        }
    })
}

fn bench_detect(c: &mut Criterion) {
    let small = make_frame_fixture(828, 1792);
    let large = make_frame_fixture(1242, 2688);

    c.bench_function("detect_bounds_828x1792", |b| {
        b.iter(|| {
            let bounds = detect_screen_bounds(black_box(&small)).expect("fixture has a cut-out");
            black_box(bounds)
        })
    });

    c.bench_function("detect_bounds_1242x2688", |b| {
        b.iter(|| {
            let bounds = detect_screen_bounds(black_box(&large)).expect("fixture has a cut-out");
            black_box(bounds)
        })
    });
}

criterion_group!(hotpaths, bench_detect);
criterion_main!(hotpaths);
