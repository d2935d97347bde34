use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tiledet::{
    suppress, BoundingBox, DetectConfig, Detector, FnEngine, ModelInfo, OwnedImage,
    PixelFormat,
};

fn make_image(width: usize, height: usize) -> OwnedImage {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.extend_from_slice(&[value as u8, (value as u8).wrapping_mul(3), 128]);
        }
    }
    OwnedImage::new(data, width, height, PixelFormat::Rgb8).unwrap()
}

fn make_boxes(count: usize) -> Vec<BoundingBox> {
    (0..count)
        .map(|i| {
            let x = (i * 37 % 97) as f32 / 110.0;
            let y = (i * 53 % 89) as f32 / 100.0;
            let confidence = 0.3 + (i * 7 % 70) as f32 / 100.0;
            BoundingBox::from_corners(x, y, x + 0.08, y + 0.1, confidence, i % 4, "1")
        })
        .collect()
}

/// Engine that emits a fixed scatter of anchors, so decode and NMS have work.
fn scatter_engine() -> impl tiledet::InferenceEngine {
    let info = ModelInfo::from_dims(&[1, 64, 64, 3], &[1, 6, 256]).unwrap();
    FnEngine::new(info, |input: &[f32], output: &mut [f32]| {
        let e = 256;
        let bias = input[0];
        for a in 0..e {
            output[a] = 0.1 + (a % 16) as f32 * 0.05;
            output[a + e] = 0.1 + (a / 16) as f32 * 0.05;
            output[a + 2 * e] = 0.1;
            output[a + 3 * e] = 0.1;
            output[a + 4 * e] = ((a * 31) % 100) as f32 / 100.0;
            output[a + 5 * e] = bias;
        }
        Ok(())
    })
}

fn bench_nms(c: &mut Criterion) {
    let boxes = make_boxes(2000);
    c.bench_function("nms_2000_boxes", |b| {
        b.iter(|| black_box(suppress(black_box(&boxes), 0.5)));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let image = make_image(1920, 1080);
    let detector = Detector::new(scatter_engine()).with_config(DetectConfig {
        tile_width: 640,
        tile_height: 360,
        ..DetectConfig::default()
    });

    c.bench_function("detect_1080p_3x3_tiles", |b| {
        b.iter(|| black_box(detector.detect(image.view()).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let detector_par = Detector::new(scatter_engine()).with_config(DetectConfig {
            tile_width: 640,
            tile_height: 360,
            parallel: true,
            ..DetectConfig::default()
        });

        c.bench_function("detect_1080p_3x3_tiles_parallel", |b| {
            b.iter(|| black_box(detector_par.detect(image.view()).unwrap()));
        });
    }
}

criterion_group!(benches, bench_nms, bench_pipeline);
criterion_main!(benches);
