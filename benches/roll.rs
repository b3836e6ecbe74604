//! Benchmarks for rolling and seeding the native generators
//!
//! Run with: cargo bench --bench roll

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dice_engine::{DiceContext, Variant};
use num_bigint::BigUint;
use std::hint::black_box;

const NATIVE: [Variant; 4] = [
    Variant::Bbs,
    Variant::Isaac,
    Variant::HashChain,
    Variant::Twister,
];

fn seeded(variant: Variant) -> DiceContext {
    let mut ctx = DiceContext::new(variant);
    if variant == Variant::Bbs {
        // Two 31/32-bit primes congruent to 3 mod 4
        if let Err(err) = ctx.set_bbs_factors("2147483647", "4294967291") {
            panic!("bbs setup failed: {err}");
        }
    }
    if let Err(err) = ctx.install_seed(1_234_567) {
        panic!("seeding failed: {err}");
    }
    ctx
}

fn bench_roll(c: &mut Criterion) {
    let mut group = c.benchmark_group("roll");
    group.throughput(Throughput::Elements(1));

    for variant in NATIVE {
        let mut ctx = seeded(variant);
        group.bench_with_input(
            BenchmarkId::from_parameter(variant.name()),
            &variant,
            |b, _| b.iter(|| black_box(ctx.roll())),
        );
    }

    group.finish();
}

fn bench_seed(c: &mut Criterion) {
    let mut group = c.benchmark_group("install_seed");
    let wide = (BigUint::from(1u32) << 512u32) + 99u32;

    for variant in NATIVE {
        let mut ctx = seeded(variant);
        group.bench_with_input(
            BenchmarkId::new("native", variant.name()),
            &variant,
            |b, _| b.iter(|| black_box(ctx.install_seed(black_box(42)))),
        );
        group.bench_with_input(BenchmarkId::new("wide", variant.name()), &variant, |b, _| {
            b.iter(|| black_box(ctx.install_seed_extended(black_box(wide.clone()))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_roll, bench_seed);
criterion_main!(benches);
