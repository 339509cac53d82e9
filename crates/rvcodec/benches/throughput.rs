//! Performance benchmarks for `rvcodec`.
//!
//! Measures:
//! - Single decode latency per format family
//! - Single encode latency per format family
//! - Mixed-workload throughput (instructions per second)
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use rvcodec::{decode, encode, Config};

// ─── Single-Instruction Latency ──────────────────────────────────────────────

fn bench_decode(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("decode");

    group.bench_function("r_type_add", |b| {
        b.iter(|| decode(black_box(0x00c58533), &config).unwrap())
    });

    group.bench_function("i_type_lw", |b| {
        b.iter(|| decode(black_box(0xffc12283), &config).unwrap())
    });

    group.bench_function("b_type_beq", |b| {
        b.iter(|| decode(black_box(0xfe000ee3), &config).unwrap())
    });

    group.bench_function("csr_named", |b| {
        b.iter(|| decode(black_box(0x30529073), &config).unwrap())
    });

    group.bench_function("fp_r4_fmadd", |b| {
        b.iter(|| decode(black_box(0x18208043), &config).unwrap())
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("encode");

    group.bench_function("r_type_add", |b| {
        b.iter(|| encode(black_box("add x10, x11, x12"), &config).unwrap())
    });

    group.bench_function("i_type_lw", |b| {
        b.iter(|| encode(black_box("lw x5, -4(x2)"), &config).unwrap())
    });

    group.bench_function("b_type_beq", |b| {
        b.iter(|| encode(black_box("beq x0, x0, -4"), &config).unwrap())
    });

    group.bench_function("csr_named", |b| {
        b.iter(|| encode(black_box("csrrw x0, mtvec, x5"), &config).unwrap())
    });

    group.bench_function("fp_r4_fmadd", |b| {
        b.iter(|| encode(black_box("fmadd.s f0, f1, f2, f3, rne"), &config).unwrap())
    });

    group.finish();
}

// ─── Mixed Throughput ────────────────────────────────────────────────────────

const MIXED_WORDS: [u32; 10] = [
    0x00c58533, // add
    0xffc12283, // lw
    0x0062a623, // sw
    0xfe000ee3, // beq
    0x0000006f, // jal
    0x123452b7, // lui
    0x30529073, // csrrw
    0x100022af, // lr.w
    0x003100d3, // fadd.s
    0x18208043, // fmadd.s
];

fn bench_mixed(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(MIXED_WORDS.len() as u64));

    group.bench_function("decode_10", |b| {
        b.iter(|| {
            for word in MIXED_WORDS {
                decode(black_box(word), &config).unwrap();
            }
        })
    });

    group.bench_function("round_trip_10", |b| {
        b.iter(|| {
            for word in MIXED_WORDS {
                let insn = decode(black_box(word), &config).unwrap();
                encode(&insn.asm, &config).unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode, bench_mixed);
criterion_main!(benches);
