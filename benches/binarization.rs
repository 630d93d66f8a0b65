use autoqr::utils::binarization::{invert, mean_binarize};
use autoqr::utils::grayscale::rgba_to_grayscale;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let v = ((x + y) % 256) as u8;
        Rgba([v, v.wrapping_mul(3), 255 - v, 255])
    })
}

fn bench_grayscale_medium(c: &mut Criterion) {
    let img = gradient(640, 480);
    let raw = img.as_raw();
    c.bench_function("rgba_to_grayscale_640x480", |b| {
        b.iter(|| rgba_to_grayscale(black_box(raw), black_box(640), black_box(480)))
    });
}

fn bench_invert_medium(c: &mut Criterion) {
    let img = gradient(640, 480);
    c.bench_function("invert_640x480", |b| b.iter(|| invert(black_box(&img))));
}

fn bench_mean_binarize_medium(c: &mut Criterion) {
    let img = gradient(640, 480);
    c.bench_function("mean_binarize_640x480", |b| {
        b.iter(|| mean_binarize(black_box(&img)))
    });
}

fn bench_mean_binarize_canvas(c: &mut Criterion) {
    // padded 800px target canvas
    let img = gradient(900, 900);
    c.bench_function("mean_binarize_900x900", |b| {
        b.iter(|| mean_binarize(black_box(&img)))
    });
}

criterion_group!(
    benches,
    bench_grayscale_medium,
    bench_invert_medium,
    bench_mean_binarize_medium,
    bench_mean_binarize_canvas
);
criterion_main!(benches);
