//! Benchmarks for frame compositing

use ass_overlay::compositor::{composite_mask, composite_rgba};
use ass_overlay::{MaskTile, RgbaTile, VideoFrame};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const FRAME_WIDTH: u32 = 1920;
const FRAME_HEIGHT: u32 = 1080;

/// Glyph-sized tiles spread along a subtitle line near the bottom
fn tile_positions(count: usize, width: u32) -> Vec<(i32, i32)> {
    (0..count)
        .map(|i| {
            let x = (i as i32 * (width as i32 + 4)) % (FRAME_WIDTH as i32 - width as i32);
            (x, 900 + (i as i32 % 3) * 40)
        })
        .collect()
}

fn benchmark_rgba(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_rgba");
    let mut frame_data = vec![0u8; (FRAME_WIDTH * FRAME_HEIGHT * 4) as usize];

    for &(tiles, size) in &[(10usize, 48u32), (100, 48), (20, 256)] {
        let pixels: Vec<u8> = (0..size * size)
            .flat_map(|i| {
                let a = (i % 256) as u8;
                [a / 2, a / 3, a / 4, a]
            })
            .collect();
        let list: Vec<RgbaTile<'_>> = tile_positions(tiles, size)
            .into_iter()
            .map(|(dst_x, dst_y)| RgbaTile {
                width: size,
                height: size,
                stride: size as usize * 4,
                dst_x,
                dst_y,
                rgba: &pixels,
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("tiles", format!("{tiles}x{size}px")),
            &list,
            |b, list| {
                b.iter(|| {
                    let mut frame =
                        VideoFrame::new(&mut frame_data, FRAME_WIDTH, FRAME_HEIGHT).unwrap();
                    composite_rgba(&mut frame, black_box(list))
                })
            },
        );
    }
    group.finish();
}

fn benchmark_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_mask");
    let mut frame_data = vec![0u8; (FRAME_WIDTH * FRAME_HEIGHT * 4) as usize];

    for &(tiles, size) in &[(10usize, 48u32), (100, 48), (20, 256)] {
        let coverage: Vec<u8> = (0..size * size).map(|i| (i % 256) as u8).collect();
        let list: Vec<MaskTile<'_>> = tile_positions(tiles, size)
            .into_iter()
            .enumerate()
            .map(|(i, (dst_x, dst_y))| MaskTile {
                width: size,
                height: size,
                stride: size as usize,
                dst_x,
                dst_y,
                color: if i % 2 == 0 { 0xFFFF_FF00 } else { 0x0000_0080 },
                bitmap: &coverage,
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("tiles", format!("{tiles}x{size}px")),
            &list,
            |b, list| {
                b.iter(|| {
                    let mut frame =
                        VideoFrame::new(&mut frame_data, FRAME_WIDTH, FRAME_HEIGHT).unwrap();
                    composite_mask(&mut frame, black_box(list))
                })
            },
        );
    }
    group.finish();
}

fn benchmark_flipped_frame(c: &mut Criterion) {
    let mut frame_data = vec![0u8; (FRAME_WIDTH * FRAME_HEIGHT * 4) as usize];
    let coverage = vec![200u8; 64 * 64];
    let list: Vec<MaskTile<'_>> = tile_positions(50, 64)
        .into_iter()
        .map(|(dst_x, dst_y)| MaskTile {
            width: 64,
            height: 64,
            stride: 64,
            dst_x,
            dst_y,
            color: 0xFFFF_FF00,
            bitmap: &coverage,
        })
        .collect();

    c.bench_function("composite_mask_flipped", |b| {
        b.iter(|| {
            let mut frame = VideoFrame::new(&mut frame_data, FRAME_WIDTH, FRAME_HEIGHT)
                .unwrap()
                .flipped(true);
            composite_mask(&mut frame, black_box(&list))
        })
    });
}

criterion_group!(
    benches,
    benchmark_rgba,
    benchmark_mask,
    benchmark_flipped_frame
);
criterion_main!(benches);
