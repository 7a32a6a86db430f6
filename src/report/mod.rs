pub mod table;
pub mod json;

use crate::config::Config;
use crate::engine::RunOutcome;

pub fn print(outcome: &RunOutcome, config: &Config) {
    if config.json_output {
        println!("{}", json::render(outcome));
    } else {
        print!("{}", table::render(outcome));
        print_run_info(outcome);
        print_diagnostics(outcome, config.verbose);
    }
}

fn print_run_info(outcome: &RunOutcome) {
    let duration_sec = outcome.duration_ms as f64 / 1000.0;
    println!("\nplanned in {duration_sec:.2}s");
}

fn print_diagnostics(outcome: &RunOutcome, verbose: bool) {
    if outcome.diagnostics.is_empty() {
        return;
    }

    println!();
    if verbose {
        println!("Diagnostics:");
        println!("{}", "-".repeat(40));
        for diagnostic in &outcome.diagnostics {
            println!("  {diagnostic}");
        }
    } else {
        for diagnostic in &outcome.diagnostics {
            println!("[diagnostic] {diagnostic}");
        }
    }
}
