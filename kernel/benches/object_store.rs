//! Object store benchmarks: boot reset, session allocation, typed lookup

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use ctr_kernel::objects::KernelObjectType;
use ctr_kernel::{KernelConfig, ObjectStore};

fn booted_store() -> ObjectStore {
    let mut store = ObjectStore::new(&KernelConfig::default());
    store.reset().expect("reset failed");
    store
}

fn bench_reset(c: &mut Criterion) {
    let mut store = booted_store();
    c.bench_function("store_reset", |b| {
        b.iter(|| store.reset().expect("reset failed"))
    });
}

fn bench_connect(c: &mut Criterion) {
    c.bench_function("connect_srv_x256", |b| {
        b.iter_batched(
            booted_store,
            |mut store| {
                for _ in 0..256 {
                    black_box(store.connect(black_box("srv:")).expect("connect failed").ok());
                }
                store
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lookup_typed(c: &mut Criterion) {
    let mut store = booted_store();
    let sessions: Vec<_> = (0..256)
        .filter_map(|_| store.connect("srv:").expect("connect failed").ok())
        .collect();

    c.bench_function("lookup_typed_session", |b| {
        b.iter(|| {
            for &handle in &sessions {
                black_box(store.lookup_typed(black_box(handle), KernelObjectType::Session));
            }
        })
    });
}

fn bench_port_by_name(c: &mut Criterion) {
    let mut store = booted_store();
    for i in 0..31 {
        store.make_port(&format!("port{}", i)).expect("make_port failed");
    }

    c.bench_function("port_handle_last_of_32", |b| {
        b.iter(|| black_box(store.port_handle(black_box("port30"))))
    });
}

criterion_group!(
    benches,
    bench_reset,
    bench_connect,
    bench_lookup_typed,
    bench_port_by_name
);
criterion_main!(benches);
