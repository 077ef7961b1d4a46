//! HyperLogLog statistics performance benchmarks

use crate::report::Report;
use crate::utils::*;
use zero_core::Value;
use zero_stats::{Hll, StatsManager};

pub fn run(report: &mut Report) {
    hll_add(report);
    stats_manager_on_add(report);
    cardinality_lookup(report);
}

fn hll_add(report: &mut Report) {
    println!("  Hll::add:");

    for &size in &SIZES {
        let result = measure_with_setup(
            ITERATIONS,
            Hll::new,
            |mut hll| {
                for i in 0..size as i64 {
                    hll.add(&Value::Int64(i));
                }
                hll
            },
        );
        let throughput = result.throughput(size);
        println!(
            "    {:>7} values: {:>10} ({:>12})",
            size,
            format_duration(result.mean),
            format_throughput(throughput)
        );
        report.add_result("Stats/Hll", "add", Some(size), result, Some(throughput));
    }
}

fn stats_manager_on_add(report: &mut Report) {
    println!("  StatsManager::on_add:");

    let result = measure(ITERATIONS * 100, || {
        let mut stats = StatsManager::new();
        let id = Value::Int64(1);
        stats.on_add("issue", &[("id", &id)]);
    });
    let passed = result.mean_us() < 100.0;
    println!(
        "    single row:      {:>10} [target: <100μs] {}",
        format_duration(result.mean),
        if passed { "✓" } else { "✗" }
    );
    report.add_with_target("Stats/Manager", "on_add_single", None, result, None, "<100μs", passed);
}

fn cardinality_lookup(report: &mut Report) {
    println!("  StatsManager::cardinality:");

    for &size in &SMALL_SIZES {
        let stats = {
            let mut s = StatsManager::new();
            for i in 0..size as i64 {
                let id = Value::Int64(i);
                s.on_add("issue", &[("id", &id)]);
            }
            s
        };

        let result = measure(ITERATIONS, || stats.cardinality("issue", "id"));
        println!(
            "    {:>7} rows: {:>10}",
            size,
            format_duration(result.mean)
        );
        report.add_result("Stats/Manager", "cardinality", Some(size), result, None);
    }
}
