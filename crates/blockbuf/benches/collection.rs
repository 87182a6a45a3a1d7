// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(missing_docs, reason = "Benchmark code")]

use std::hint::black_box;

use blockbuf::{Block, BlockCollection, FixedBlock};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

// Roughly the shape of a chain of network receive descriptors.
const BLOCK_SIZE: usize = 1536;
const BLOCK_COUNT: usize = 16;
const TOTAL_LEN: usize = BLOCK_SIZE * BLOCK_COUNT;

fn entrypoint(c: &mut Criterion) {
    let mut storage = vec![[0x5A_u8; BLOCK_SIZE]; BLOCK_COUNT];
    let mut blocks = storage.iter_mut().map(|s| FixedBlock::new(s)).collect::<Vec<_>>();
    let mut collection = BlockCollection::from_blocks(blocks.iter_mut().map(|b| b as &mut dyn Block));

    // A fixed pseudo-random walk over the whole collection.
    let scattered = (0..1024_usize)
        .map(|i| i.wrapping_mul(7919) % TOTAL_LEN)
        .collect::<Vec<_>>();

    let mut group = c.benchmark_group("BlockCollection");

    group.bench_function("get_sequential", |b| {
        b.iter(|| {
            for i in 0..TOTAL_LEN {
                _ = black_box(collection.get(i));
            }
        });
    });

    group.bench_function("get_reverse", |b| {
        b.iter(|| {
            for i in (0..TOTAL_LEN).rev() {
                _ = black_box(collection.get(i));
            }
        });
    });

    group.bench_function("get_scattered", |b| {
        b.iter(|| {
            for &i in &scattered {
                _ = black_box(collection.get(i));
            }
        });
    });

    group.bench_function("iter_sum", |b| {
        b.iter(|| collection.iter().map(u64::from).sum::<u64>());
    });

    group.bench_function("copy_to_slice_all", |b| {
        let mut dst = vec![0_u8; TOTAL_LEN];

        b.iter(|| {
            collection.copy_to_slice(black_box(0), &mut dst);
        });
    });

    group.bench_function("copy_to_slice_tail", |b| {
        let mut dst = [0_u8; 64];

        b.iter(|| {
            collection.copy_to_slice(black_box(TOTAL_LEN - 64), &mut dst);
        });
    });

    group.bench_function("copy_from_slice_all", |b| {
        let src = vec![0xA5_u8; TOTAL_LEN];

        b.iter(|| {
            collection.copy_from_slice(black_box(0), &src);
        });
    });

    group.finish();
}
