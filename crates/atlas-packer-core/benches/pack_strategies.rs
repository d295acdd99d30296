use atlas_packer_core::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// RGBA sprites with a transparent border of random width.
fn generate_sprites(count: usize, min_size: u32, max_size: u32) -> Vec<(String, u32, u32, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(1234);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            let border = rng.gen_range(0..w.min(h) / 3);
            let mut data = vec![0u8; (w * h * 4) as usize];
            for y in border..h - border {
                for x in border..w - border {
                    let idx = ((y * w + x) * 4) as usize;
                    data[idx..idx + 4].copy_from_slice(&[255, 255, 255, 255]);
                }
            }
            (format!("sprite_{i}"), w, h, data)
        })
        .collect()
}

fn run(cfg: &AtlasConfig, sprites: &[(String, u32, u32, Vec<u8>)]) -> usize {
    let packer = cfg.create_packer().expect("valid config");
    let mut ctx = Context::new(cfg.context.clone(), packer);
    for (name, w, h, data) in sprites {
        let view = PixelView::new(*w, *h, 4, data).expect("sized buffer");
        ctx.add_sprite(name.clone(), view).expect("add sprite");
    }
    ctx.pack().expect("pack").placed
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_strategies");

    for count in [50, 100, 200] {
        let sprites = generate_sprites(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));

        let skyline = AtlasConfig::builder().kind(PackerKind::Skyline).build();
        group.bench_with_input(BenchmarkId::new("Skyline", count), &sprites, |b, sprites| {
            b.iter(|| black_box(run(&skyline, sprites)));
        });

        let tile = AtlasConfig::builder().kind(PackerKind::Tile).tile_size(8).build();
        group.bench_with_input(BenchmarkId::new("Tile", count), &sprites, |b, sprites| {
            b.iter(|| black_box(run(&tile, sprites)));
        });

        let padded = AtlasConfig::builder()
            .kind(PackerKind::Tile)
            .tile_size(8)
            .padding(2)
            .build();
        group.bench_with_input(
            BenchmarkId::new("Tile_padded", count),
            &sprites,
            |b, sprites| {
                b.iter(|| black_box(run(&padded, sprites)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
