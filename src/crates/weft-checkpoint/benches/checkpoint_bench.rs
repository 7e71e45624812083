use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::collections::BTreeSet;
use weft_checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore, RunStatus};

fn sample_checkpoint(step: u64) -> Checkpoint {
    Checkpoint::new(
        "bench-thread",
        step,
        json!({"messages": ["hello", "world"], "count": step}),
        BTreeSet::from(["respond".to_string()]),
        RunStatus::Running,
    )
}

fn checkpoint_put_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("checkpoint put", |b| {
        b.to_async(&runtime).iter(|| async {
            let store = MemoryCheckpointStore::new();
            store.put(black_box(sample_checkpoint(0))).await.unwrap();
        });
    });
}

fn checkpoint_get_latest_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("checkpoint get_latest", |b| {
        b.to_async(&runtime).iter(|| async {
            let store = MemoryCheckpointStore::new();
            for step in 0..10 {
                store.put(sample_checkpoint(step)).await.unwrap();
            }
            store.get_latest(black_box("bench-thread")).await.unwrap();
        });
    });
}

criterion_group!(
    benches,
    checkpoint_put_benchmark,
    checkpoint_get_latest_benchmark
);
criterion_main!(benches);
