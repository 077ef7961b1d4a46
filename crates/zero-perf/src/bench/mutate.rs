//! CRUD mutation layer performance benchmarks

use crate::report::Report;
use crate::utils::*;
use zero_core::schema::{Column, Table};
use zero_core::{DataType, Value};
use zero_mutate::Executor;

pub fn run(report: &mut Report) {
    insert_single(report);
    insert_batch(report);
    update_single(report);
    transaction_overhead(report);
}

fn issue_table() -> Table {
    Table::new(
        "issue",
        vec![
            Column::new("id", DataType::Int64),
            Column::new("title", DataType::String),
            Column::new("closed", DataType::Boolean),
        ],
        &["id"],
    )
    .unwrap()
}

fn executor() -> Executor {
    let mut ex = Executor::new();
    ex.register_table(issue_table());
    ex
}

fn fields(id: i64) -> Vec<(String, Value)> {
    vec![
        ("id".to_string(), Value::Int64(id)),
        ("title".to_string(), Value::String(format!("issue {id}"))),
        ("closed".to_string(), Value::Boolean(false)),
    ]
}

fn insert_single(report: &mut Report) {
    println!("  Insert (single row):");

    let result = measure_with_setup(ITERATIONS * 10, executor, |mut ex| {
        ex.insert("issue", fields(1)).unwrap()
    });
    let passed = result.mean_us() < 100.0;
    println!(
        "    insert:          {:>10} [target: <100μs] {}",
        format_duration(result.mean),
        if passed { "✓" } else { "✗" }
    );
    report.add_with_target("Mutate", "insert_single", None, result, None, "<100μs", passed);
}

fn insert_batch(report: &mut Report) {
    println!("  Insert (batch):");

    for &size in &SMALL_SIZES {
        let result = measure_with_setup(
            ITERATIONS,
            executor,
            |mut ex| {
                for i in 0..size as i64 {
                    ex.insert("issue", fields(i)).unwrap();
                }
                ex
            },
        );
        let throughput = result.throughput(size);
        println!(
            "    {:>7} rows: {:>10} ({:>12})",
            size,
            format_duration(result.mean),
            format_throughput(throughput)
        );
        report.add_result("Mutate", "insert_batch", Some(size), result, Some(throughput));
    }
}

fn update_single(report: &mut Report) {
    println!("  Update (single row):");

    let result = measure_with_setup(
        ITERATIONS * 10,
        || {
            let mut ex = executor();
            ex.insert("issue", fields(1)).unwrap();
            ex
        },
        |mut ex| {
            ex.update(
                "issue",
                &[Value::Int64(1)],
                vec![("closed".to_string(), Value::Boolean(true))],
            )
            .unwrap()
        },
    );
    let passed = result.mean_us() < 100.0;
    println!(
        "    update:          {:>10} [target: <100μs] {}",
        format_duration(result.mean),
        if passed { "✓" } else { "✗" }
    );
    report.add_with_target("Mutate", "update_single", None, result, None, "<100μs", passed);
}

fn transaction_overhead(report: &mut Report) {
    println!("  Transaction (fork/swap):");

    for &size in &[10usize, 100] {
        let result = measure_with_setup(ITERATIONS, executor, |mut ex| {
            ex.transaction(|tx| {
                for i in 0..size as i64 {
                    tx.insert("issue", fields(i))?;
                }
                Ok(())
            })
            .unwrap()
        });
        let throughput = result.throughput(size);
        println!(
            "    {:>7} rows: {:>10} ({:>12})",
            size,
            format_duration(result.mean),
            format_throughput(throughput)
        );
        report.add_result("Mutate", "transaction_batch", Some(size), result, Some(throughput));
    }
}
