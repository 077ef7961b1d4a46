//! Virtualized window manager performance benchmarks

use crate::report::Report;
use crate::utils::*;
use zero_window::{page_size, WindowManager};

pub fn run(report: &mut Report) {
    page_size_calc(report);
    apply_page(report);
}

fn page_size_calc(report: &mut Report) {
    println!("  page_size:");

    let result = measure(ITERATIONS * 1000, || page_size(800.0, 32.0));
    println!("    viewport calc:   {:>10}", format_duration(result.mean));
    report.add_result("Window", "page_size", None, result, None);
}

fn apply_page(report: &mut Report) {
    println!("  WindowManager::apply_page:");

    for &size in &SMALL_SIZES {
        let result = measure_with_setup(
            ITERATIONS,
            || WindowManager::<u64, ()>::new(),
            |mut manager| {
                let ids: Vec<u64> = (0..size as u64).collect();
                manager.apply_page(0, ids, true, false);
                manager
            },
        );
        let throughput = result.throughput(size);
        println!(
            "    {:>7} rows: {:>10} ({:>12})",
            size,
            format_duration(result.mean),
            format_throughput(throughput)
        );
        report.add_result("Window", "apply_page", Some(size), result, Some(throughput));
    }
}
