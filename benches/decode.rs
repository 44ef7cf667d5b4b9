//! Decoding benchmark suite.
//!
//! Measures the client-side cost of turning worker replies into grids:
//! - RLE mask decoding at common mask resolutions
//! - 16-bit PNG depth decoding at common frame sizes
//! - Segment request framing
//!
//! Run with: cargo bench --bench decode
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};

use vizion::SegmentationRequest;
use vizion::decode::{decode_depth, decode_mask};
use vizion::protocol::encode_segment;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const MASK_SIZES: &[(u32, u32)] = &[(64, 64), (256, 256), (720, 1280)];
const DEPTH_SIZES: &[(u32, u32)] = &[(240, 320), (480, 640), (720, 1280)];

// ============================================================================
// Fixtures
// ============================================================================

/// RLE for a mask with a filled ellipse in the middle.
fn ellipse_rle(height: u32, width: u32) -> Vec<u32> {
    let (cy, cx) = (height as f32 / 2.0, width as f32 / 2.0);
    let (ry, rx) = (height as f32 / 3.0, width as f32 / 3.0);

    let mut runs = Vec::new();
    let mut current = false;
    let mut run = 0u32;

    for col in 0..width {
        for row in 0..height {
            let dy = (row as f32 - cy) / ry;
            let dx = (col as f32 - cx) / rx;
            let inside = dy * dy + dx * dx <= 1.0;
            if inside != current {
                runs.push(run);
                current = inside;
                run = 0;
            }
            run += 1;
        }
    }
    runs.push(run);
    runs
}

/// Base64 PNG with a horizontal gradient.
fn gradient_png(height: u32, width: u32) -> String {
    let pixels: Vec<u16> = (0..height)
        .flat_map(|_| (0..width).map(move |x| ((x as u64 * 65535) / u64::from(width)) as u16))
        .collect();
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width, height, pixels).expect("buffer");

    let mut png = Vec::new();
    DynamicImage::ImageLuma16(buffer)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("png");
    STANDARD.encode(png)
}

// ============================================================================
// Benchmark: Mask Decoding
// ============================================================================

fn bench_decode_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_mask");

    for &(height, width) in MASK_SIZES {
        let rle = ellipse_rle(height, width);
        group.throughput(Throughput::Elements(u64::from(height * width)));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{height}x{width}")),
            &rle,
            |b, rle| b.iter(|| decode_mask(black_box(rle), height, width).expect("mask")),
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Depth Decoding
// ============================================================================

fn bench_decode_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_depth");
    group.sample_size(20);

    for &(height, width) in DEPTH_SIZES {
        let png = gradient_png(height, width);
        group.throughput(Throughput::Elements(u64::from(height * width)));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{height}x{width}")),
            &png,
            |b, png| b.iter(|| decode_depth(black_box(png), 0.2, 12.0).expect("depth")),
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Request Framing
// ============================================================================

fn bench_encode_segment(c: &mut Criterion) {
    let image = vec![0xA5u8; 200 * 1024];
    let request = SegmentationRequest::new(image, ["person", "car", "bicycle"]);

    c.bench_function("encode_segment/200KiB", |b| {
        b.iter(|| encode_segment(black_box(&request)).expect("frame"))
    });
}

criterion_group!(benches, bench_decode_mask, bench_decode_depth, bench_encode_segment);
criterion_main!(benches);
