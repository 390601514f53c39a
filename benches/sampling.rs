use criterion::{criterion_group, criterion_main, Criterion};
use nvsharptop::gpu::{parse_batch, parse_reading};
use nvsharptop::history::{aggregate, HistoryBuffer, HistoryEntry, Sample, HISTORY_CAPACITY};
use std::hint::black_box;
use std::time::SystemTime;

fn sample_batch(devices: usize) -> String {
    (0..devices)
        .map(|i| format!("{i}, NVIDIA GeForce RTX 4090, 55, 42, 2048, 24576\n"))
        .collect()
}

fn benchmark_parse_single_line(c: &mut Criterion) {
    c.bench_function("parse_single_line", |b| {
        b.iter(|| parse_reading(black_box("0, NVIDIA GeForce RTX 4090, 55, 42, 2048, 24576")));
    });
}

fn benchmark_parse_batch_with_noise(c: &mut Criterion) {
    let mut batch = sample_batch(8);
    batch.push_str("garbage line\n0, Broken, hot, 42, 1, 2\n");

    c.bench_function("parse_batch_8_devices_with_noise", |b| {
        b.iter(|| parse_batch(black_box(&batch)));
    });
}

fn benchmark_history_push(c: &mut Criterion) {
    c.bench_function("history_push_past_capacity", |b| {
        let mut buffer = HistoryBuffer::new(HISTORY_CAPACITY);
        b.iter(|| {
            buffer.push(black_box(HistoryEntry {
                utilization: 42.0,
                memory_percent: 25.0,
                timestamp: SystemTime::now(),
            }));
        });
    });
}

fn benchmark_aggregation(c: &mut Criterion) {
    let staged: Vec<Sample> = (0..100)
        .map(|i| Sample {
            utilization: f64::from(i),
            memory_percent: f64::from(i) / 2.0,
            timestamp: SystemTime::now(),
        })
        .collect();

    c.bench_function("aggregate_100_staged_samples", |b| {
        b.iter(|| aggregate(black_box(&staged)));
    });
}

criterion_group!(
    benches,
    benchmark_parse_single_line,
    benchmark_parse_batch_with_noise,
    benchmark_history_push,
    benchmark_aggregation
);
criterion_main!(benches);
