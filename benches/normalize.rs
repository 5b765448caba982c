use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use doc_convert::config::StreamingLimits;
use doc_convert::normalize::{column_letter, flatten};
use doc_convert::streaming::read_csv;
use serde_json::{Value, json};

fn nested_document(width: usize) -> Value {
    let items: Vec<Value> = (0..width)
        .map(|i| json!({"id": i, "name": format!("item-{i}"), "tags": ["a", "b"], "dims": {"w": 1.5, "h": 2}}))
        .collect();
    json!({"meta": {"source": "bench", "count": width}, "items": items})
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    for width in [10, 100, 1000] {
        let doc = nested_document(width);
        group.bench_function(format!("items_{width}"), |b| {
            b.iter(|| flatten(black_box(&doc)));
        });
    }
    group.finish();
}

fn bench_column_letters(c: &mut Criterion) {
    c.bench_function("column_letter_1_to_18278", |b| {
        b.iter(|| {
            for i in 1..=18_278u32 {
                black_box(column_letter(black_box(i)));
            }
        });
    });
}

fn bench_csv(c: &mut Criterion) {
    let mut body = String::from("id,name,score,city\n");
    for i in 0..20_000 {
        body.push_str(&format!("{i},name-{i},{}.5,city-{}\n", i % 100, i % 7));
    }
    let whole = StreamingLimits::default();
    let incremental = StreamingLimits {
        stream_threshold_bytes: 1024,
        ..StreamingLimits::default()
    };

    let mut group = c.benchmark_group("csv");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("whole_buffer", |b| {
        b.iter(|| read_csv(black_box(body.as_bytes()), &whole).map(|t| t.records.len()));
    });
    group.bench_function("incremental", |b| {
        b.iter(|| read_csv(black_box(body.as_bytes()), &incremental).map(|t| t.records.len()));
    });
    group.finish();
}

criterion_group!(benches, bench_flatten, bench_column_letters, bench_csv);
criterion_main!(benches);
