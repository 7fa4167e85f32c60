use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fitsync::{
    sort_for_drain, KeyValueStore, MemoryKeyValueStore, MutationPayload, Priority, ProgressUpdate,
    QueueStore, SyncQueueItem,
};
use serde_json::json;
use std::sync::Arc;

fn setup_items(count: usize) -> Vec<SyncQueueItem> {
    let start = Utc::now();
    (0..count)
        .map(|i| {
            let mut item = SyncQueueItem::new(
                MutationPayload::ProgressUpdate(ProgressUpdate {
                    user_id: format!("athlete_{}", i % 17),
                    metric: "body_weight".to_string(),
                    value: 70.0 + (i % 30) as f64 / 10.0,
                    unit: "kg".to_string(),
                    recorded_at: start,
                }),
                match i % 3 {
                    0 => Priority::Low,
                    1 => Priority::Normal,
                    _ => Priority::High,
                },
            );
            // Reverse chronological so the sort has real work to do.
            item.timestamp = start - Duration::milliseconds(i as i64);
            item
        })
        .collect()
}

fn bench_drain_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_order");

    for size in [100, 1_000, 10_000] {
        let items = setup_items(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("sort", size), &items, |b, items| {
            b.iter(|| {
                let mut batch = items.clone();
                sort_for_drain(&mut batch);
                black_box(batch)
            })
        });
    }

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");

    for size in [100, 1_000] {
        let items = setup_items(size);
        let store = QueueStore::new(Arc::new(MemoryKeyValueStore::new()), "sync_queue");
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("save", size), &items, |b, items| {
            b.iter(|| store.save(black_box(items)))
        });

        store.save(&items);
        group.bench_function(BenchmarkId::new("load", size), |b| {
            b.iter(|| black_box(store.load()))
        });
    }

    group.finish();
}

fn bench_legacy_migration(c: &mut Criterion) {
    let legacy: Vec<_> = (0..1_000)
        .map(|i| {
            json!({
                "id": format!("legacy-{}", i),
                "type": "user_preference",
                "data": {"user_id": "athlete-1", "key": format!("pref_{}", i), "value": i},
                "timestamp": 1_700_000_000_000i64 + i,
                "retryCount": i % 3,
                "priority": "normal"
            })
        })
        .collect();
    let kv = Arc::new(MemoryKeyValueStore::new());
    kv.put("sync_queue", &serde_json::Value::Array(legacy).to_string())
        .unwrap();
    let store = QueueStore::new(kv, "sync_queue");

    c.bench_function("legacy_v0_load_1000", |b| b.iter(|| black_box(store.load())));
}

criterion_group!(
    benches,
    bench_drain_order,
    bench_persistence,
    bench_legacy_migration
);
criterion_main!(benches);
