use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};

use folio_server::render::watermark::{label, Watermarker};

fn bench_stamp(c: &mut Criterion) {
    let watermarker = Watermarker::new();
    let text = label(Some("reader@example.com"));

    let mut group = c.benchmark_group("watermark_stamp");
    for (width, height) in [(640u32, 900u32), (1100, 1540), (2200, 3080)] {
        let base = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &base,
            |b, base| {
                b.iter(|| {
                    let mut page = base.clone();
                    watermarker.stamp(black_box(&mut page), &text);
                    page
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_stamp);
criterion_main!(benches);
