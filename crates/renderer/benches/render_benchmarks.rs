//! Benchmarks for the renderer crate - masks, trails, color scales and PNG encoding.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flow_common::{Bounds, ColorScale, Rgba, View};
use projection::MaskOutline;
use rand::Rng;
use renderer::{gradient, png, Canvas, Mask, StyleConfig, WindIntensityScale};

/// Generate random RGBA pixel data for PNG encoding benchmarks.
fn generate_rgba_data(width: usize, height: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut data = vec![0u8; width * height * 4];
    for chunk in data.chunks_mut(4) {
        chunk[0] = rng.gen();
        chunk[1] = rng.gen();
        chunk[2] = rng.gen();
        chunk[3] = 255;
    }
    data
}

/// Random trail segments of roughly particle length.
fn generate_segments(view: View, count: usize) -> Vec<renderer::Segment> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let x = rng.gen_range(0.0..view.width as f64);
            let y = rng.gen_range(0.0..view.height as f64);
            (x, y, x + rng.gen_range(-2.0..2.0), y + rng.gen_range(-2.0..2.0))
        })
        .collect()
}

fn bench_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask");

    for (width, height) in [(480, 320), (960, 640), (1920, 1080)] {
        let view = View::new(width, height);
        let outline = MaskOutline::Circle {
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
            r: height as f64 * 0.45,
        };
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(
            BenchmarkId::new("rasterize_disc", format!("{}x{}", width, height)),
            &outline,
            |b, outline| {
                b.iter(|| Mask::rasterize(black_box(outline), view));
            },
        );
    }

    group.finish();
}

fn bench_trails(c: &mut Criterion) {
    let mut group = c.benchmark_group("trails");
    let view = View::new(960, 640);
    let bounds = Bounds::of_view(view);
    let intensity = WindIntensityScale::new(10, 17.0);

    for particles in [1000usize, 5000, 20000] {
        let segments = generate_segments(view, particles);
        let buckets: Vec<Vec<renderer::Segment>> = segments
            .chunks((particles / intensity.len()).max(1))
            .map(|chunk| chunk.to_vec())
            .collect();

        group.throughput(Throughput::Elements(particles as u64));
        group.bench_with_input(
            BenchmarkId::new("fade_and_stroke", particles),
            &buckets,
            |b, buckets| {
                let mut canvas = Canvas::new(view).unwrap();
                b.iter(|| {
                    canvas.fade(&bounds, 0.97);
                    for (style, bucket) in intensity.styles().iter().zip(buckets) {
                        canvas.stroke_segments(*style, 1.0, black_box(bucket));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_color_scales(c: &mut Criterion) {
    let mut group = c.benchmark_group("color_scales");
    let styles = StyleConfig::builtin().unwrap();
    let values: Vec<f64> = (0..10_000).map(|i| i as f64 / 100.0).collect();

    for name in ["wind", "temp"] {
        let scale = styles.scale(name).unwrap();
        group.throughput(Throughput::Elements(values.len() as u64));
        group.bench_with_input(BenchmarkId::new("gradient", name), &values, |b, values| {
            b.iter(|| {
                values
                    .iter()
                    .map(|&v| scale.gradient(black_box(v), 102))
                    .fold(0u32, |acc, c: Rgba| acc.wrapping_add(c.r as u32))
            });
        });
    }

    group.bench_function("extended_sinebow", |b| {
        b.iter(|| gradient::extended_sinebow_color(black_box(0.7), 255));
    });

    group.finish();
}

fn bench_png_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encoding");

    for (width, height) in [(256, 256), (960, 640)] {
        let rgba_data = generate_rgba_data(width, height);
        group.throughput(Throughput::Bytes((width * height * 4) as u64));
        group.bench_with_input(
            BenchmarkId::new("rgba_random", format!("{}x{}", width, height)),
            &rgba_data,
            |b, data| {
                b.iter(|| png::create_png(black_box(data), width, height));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_mask,
    bench_trails,
    bench_color_scales,
    bench_png_encoding,
);
criterion_main!(benches);
