//! Benchmarks for zero-ivm operators.
//!
//! Target: single row incremental update < 100μs

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use zero_core::{Row, Value};
use zero_ivm::{Change, Filter, Node, Source, View};

fn make_row(id: u64, age: i64) -> Row {
    Row::new(id, vec![Value::Int64(id as i64), Value::Int64(age)])
}

fn bench_source_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("source");

    group.bench_function("push_single", |b| {
        b.iter_batched(
            || Source::new("person"),
            |mut source| source.push(black_box(Change::Add(make_row(1, 30)))),
            BatchSize::SmallInput,
        )
    });

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("push_batch", size), &size, |b, &size| {
            b.iter_batched(
                || Source::new("person"),
                |mut source| {
                    for i in 0..size {
                        source.push(black_box(Change::Add(make_row(i as u64, i as i64))));
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_filter_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("push_through", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    Node::Filter(
                        Box::new(Node::Source(Source::new("person"))),
                        Filter::new(|item| {
                            item.row.get(1).and_then(|v| v.as_i64()).map(|age| age > 40).unwrap_or(false)
                        }),
                    )
                },
                |mut node| {
                    for i in 0..size {
                        black_box(node.push("person", Change::Add(make_row(i as u64, i as i64 % 80))));
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_view_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("view");

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("apply_and_commit", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut source = Source::new("person");
                    let changes: Vec<_> = (0..size)
                        .flat_map(|i| source.push(Change::Add(make_row(i as u64, i as i64 % 80))))
                        .collect();
                    (View::new(false), changes)
                },
                |(mut view, changes)| {
                    view.apply(changes);
                    view.commit();
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_source_push, bench_filter_node, bench_view_commit);
criterion_main!(benches);
