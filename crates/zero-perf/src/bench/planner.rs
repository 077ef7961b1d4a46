//! Query planner performance benchmarks

use crate::report::Report;
use crate::utils::*;
use zero_ast::{AstBuilder, Correlation, Subquery};
use zero_core::Value;
use zero_planner::Planner;
use zero_stats::StatsManager;

pub fn run(report: &mut Report) {
    plan_flat_query(report);
    plan_nested_query(report);
}

fn stats_with_rows(table: &str, rows: u64) -> StatsManager {
    let mut stats = StatsManager::new();
    for i in 0..rows {
        let id = Value::Int64(i as i64);
        stats.on_add(table, &[("id", &id)]);
    }
    stats
}

fn plan_flat_query(report: &mut Report) {
    println!("  Plan (no relations):");

    let stats = stats_with_rows("issue", 10_000);
    let ast = AstBuilder::new("issue").build().unwrap();

    let result = measure(ITERATIONS * 10, || {
        let mut planner = Planner::new(&stats);
        planner.plan(&ast)
    });
    println!("    flat:            {:>10}", format_duration(result.mean));
    report.add_result("Planner", "plan_flat", None, result, None);
}

fn plan_nested_query(report: &mut Report) {
    println!("  Plan (nested relations):");

    for &fanout in &[1usize, 10, 100] {
        let stats = {
            let mut s = stats_with_rows("issue", 10_000);
            for i in 0..1_000u64 {
                let issue_id = Value::Int64((i % fanout as u64) as i64);
                s.on_add("comment", &[("issue_id", &issue_id)]);
            }
            s
        };

        let ast = AstBuilder::new("issue")
            .related(
                Subquery::new(
                    AstBuilder::new("comment").build().unwrap(),
                    Correlation::new(vec!["id".into()], vec!["issue_id".into()]),
                    "comments",
                )
                .unwrap(),
            )
            .build()
            .unwrap();

        let result = measure(ITERATIONS, || {
            let mut planner = Planner::new(&stats);
            planner.plan(&ast)
        });
        println!(
            "    fanout {:>4}: {:>10}",
            fanout,
            format_duration(result.mean)
        );
        report.add_result("Planner", "plan_one_join", Some(fanout), result, None);
    }
}
