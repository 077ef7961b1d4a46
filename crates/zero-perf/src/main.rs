//! Runs every benchmark module and prints a summary report.
//!
//! `cargo run -p zero-perf --release`

mod bench;
mod report;
mod utils;

use report::Report;

fn main() {
    println!("Zero Performance Benchmarks\n");

    let mut report = Report::new();

    println!("━━ Stats ━━");
    bench::stats::run(&mut report);

    println!("━━ Planner ━━");
    bench::planner::run(&mut report);

    println!("━━ IVM ━━");
    bench::ivm::run(&mut report);

    println!("━━ Mutate ━━");
    bench::mutate::run(&mut report);

    println!("━━ Window ━━");
    bench::window::run(&mut report);

    report.print_summary();
}
