//! Criterion benchmarks for the TAS script compiler.
//!
//! Measures each pipeline stage separately on the bundled fixture script and
//! on a long synthetic timeline.
//!
//! Run with:
//! ```bash
//! cargo bench --package tas-core --bench compile_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tas_core::protocol::payload::encode_payload;
use tas_core::script::normalize::normalize_source;
use tas_core::{compile_script, decode_payload, parse_script, ScriptOptions};

const FIXTURE: &str = include_str!("../tests/fixtures/tasfile.peng");

// ── Script fixtures ───────────────────────────────────────────────────────────

/// Builds a script with `n` control lines, alternating steering and playspeed.
fn synthetic_script(n: usize) -> String {
    let mut source = String::from("map = abyss\nkart_name = tux\nnum_laps = 3\ndifficulty = 1\nframebulks\n");
    for i in 0..n {
        if i % 50 == 0 {
            source.push_str("playspeed 1.0\n");
        }
        let angle = if i % 2 == 0 { "0.5" } else { "-0.5" };
        source.push_str(&format!("a-|-n-|{angle}|{}|  // step {i}\n", i % 300 + 1));
    }
    source
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks the line normalizer alone.
fn bench_normalize(c: &mut Criterion) {
    let long = synthetic_script(1_000);

    let mut group = c.benchmark_group("normalize");
    group.bench_function("fixture", |b| b.iter(|| normalize_source(black_box(FIXTURE))));
    group.bench_function("1000_lines", |b| b.iter(|| normalize_source(black_box(&long))));
    group.finish();
}

/// Benchmarks parsing (normalize + header + framebulks) at growing sizes.
fn bench_parse(c: &mut Criterion) {
    let options = ScriptOptions::default();

    let mut group = c.benchmark_group("parse_script");
    for n in [10usize, 100, 1_000] {
        let source = synthetic_script(n);
        group.bench_with_input(BenchmarkId::new("lines", n), &source, |b, source| {
            b.iter(|| parse_script(black_box(source), &options).expect("parse must succeed"))
        });
    }
    group.finish();
}

/// Benchmarks payload encoding and decoding from a pre-parsed script.
fn bench_encode(c: &mut Criterion) {
    let script = parse_script(&synthetic_script(1_000), &ScriptOptions::default())
        .expect("parse must succeed for benchmark setup");
    let payload = encode_payload(&script.header, &script.framebulks);

    let mut group = c.benchmark_group("payload");
    group.bench_function("encode_1000", |b| {
        b.iter(|| encode_payload(black_box(&script.header), black_box(&script.framebulks)))
    });
    group.bench_function("decode_1000", |b| {
        b.iter(|| decode_payload(black_box(&payload)).expect("decode must succeed"))
    });
    group.finish();
}

/// Benchmarks the whole pipeline on the fixture.
fn bench_compile(c: &mut Criterion) {
    let options = ScriptOptions::default();
    c.bench_function("compile_script/fixture", |b| {
        b.iter(|| compile_script(black_box(FIXTURE), &options).expect("compile must succeed"))
    });
}

criterion_group!(benches, bench_normalize, bench_parse, bench_encode, bench_compile);
criterion_main!(benches);
