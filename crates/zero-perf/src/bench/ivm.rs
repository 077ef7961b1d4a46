//! Incremental view maintenance performance benchmarks

use crate::report::Report;
use crate::utils::*;
use zero_core::{Row, Value};
use zero_ivm::{Change, Filter, Node, Source, View};

pub fn run(report: &mut Report) {
    source_push(report);
    filter_node(report);
    view_commit(report);
}

fn make_row(id: u64, age: i64) -> Row {
    Row::new(id, vec![Value::Int64(id as i64), Value::Int64(age)])
}

fn source_push(report: &mut Report) {
    println!("  Source push:");

    for &size in &SMALL_SIZES {
        let result = measure_with_setup(
            ITERATIONS,
            || Source::new("person"),
            |mut source| {
                for i in 0..size {
                    source.push(Change::Add(make_row(i as u64, i as i64 % 80)));
                }
                source
            },
        );
        let throughput = result.throughput(size);
        println!(
            "    {:>7} rows: {:>10} ({:>12})",
            size,
            format_duration(result.mean),
            format_throughput(throughput)
        );
        report.add_result("Ivm/Source", "push_inserts", Some(size), result, Some(throughput));
    }
}

fn filter_node(report: &mut Report) {
    println!("  Filter node push:");

    for &size in &SMALL_SIZES {
        let result = measure_with_setup(
            ITERATIONS,
            || {
                let source = Source::new("person");
                Node::Filter(Box::new(Node::Source(source)), Filter::new(|item| {
                    item.row.get(1).and_then(|v| v.as_i64()).map(|age| age > 40).unwrap_or(false)
                }))
            },
            |mut node| {
                let mut produced = 0usize;
                for i in 0..size {
                    produced += node.push("person", Change::Add(make_row(i as u64, i as i64 % 80))).len();
                }
                produced
            },
        );
        let throughput = result.throughput(size);
        println!(
            "    {:>7} rows: {:>10} ({:>12})",
            size,
            format_duration(result.mean),
            format_throughput(throughput)
        );
        report.add_result("Ivm/Filter", "push_through_filter", Some(size), result, Some(throughput));
    }
}

fn view_commit(report: &mut Report) {
    println!("  View commit:");

    for &size in &SMALL_SIZES {
        let result = measure_with_setup(
            ITERATIONS,
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
                view
            },
        );
        let throughput = result.throughput(size);
        println!(
            "    {:>7} rows: {:>10} ({:>12})",
            size,
            format_duration(result.mean),
            format_throughput(throughput)
        );
        report.add_result("Ivm/View", "apply_and_commit", Some(size), result, Some(throughput));
    }
}
