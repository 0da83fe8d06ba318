use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::collections::HashSet;
use supervisor_core::models::{ExecutionContext, Metadata};
use supervisor_core::orchestration::{merge_child_metadata_to_parent, DependencyResolver};

fn benchmark_child_context(c: &mut Criterion) {
    let mut parent = ExecutionContext::new("user-1", "thread-1", "run-1");
    for i in 0..50 {
        parent
            .metadata
            .insert(format!("key_{i}_result"), json!({ "index": i, "values": [1, 2, 3] }));
    }

    c.bench_function("create_child_context", |b| {
        b.iter(|| black_box(&parent).create_child_context("triage", Metadata::new()))
    });
}

fn benchmark_dependency_check(c: &mut Criterion) {
    let resolver = DependencyResolver::default();
    let completed: HashSet<String> = ["triage", "data"].iter().map(|s| s.to_string()).collect();

    c.bench_function("can_execute", |b| {
        b.iter(|| resolver.can_execute(black_box("reporting"), black_box(&completed)))
    });
}

fn benchmark_metadata_merge(c: &mut Criterion) {
    let parent = ExecutionContext::new("user-1", "thread-1", "run-1");
    let mut child = parent.create_child_context("triage", Metadata::new());
    child
        .metadata
        .insert("triage_result".to_string(), json!({ "category": "cost" }));
    child
        .metadata
        .insert("extra_results".to_string(), json!([1, 2, 3]));

    c.bench_function("merge_child_metadata", |b| {
        b.iter(|| {
            let mut target = parent.clone();
            merge_child_metadata_to_parent(&mut target, black_box(&child), "triage")
        })
    });
}

fn benchmark_cycle_validation(c: &mut Criterion) {
    c.bench_function("default_table_validation", |b| {
        b.iter(|| DependencyResolver::new(black_box(Default::default())))
    });
}

criterion_group!(
    benches,
    benchmark_child_context,
    benchmark_dependency_check,
    benchmark_metadata_merge,
    benchmark_cycle_validation
);
criterion_main!(benches);
