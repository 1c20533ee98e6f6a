//! Human-readable comparison report printer

use super::types::{CompareResult, TableKey};

/// Detail lines printed per table before truncating
const DETAIL_LIMIT: usize = 50;

fn print_keys(title: &str, keys: &[TableKey]) {
    println!("{} ({}):", title, keys.len());
    if keys.is_empty() {
        println!("  (none)");
    } else {
        for key in keys {
            println!("  {}", key);
        }
    }
    println!();
}

/// Print the comparison report to stdout.
pub fn print_report(result: &CompareResult) {
    println!("=== Schema Comparison Report ===");
    println!();

    if let Some((baseline, candidate)) = &result.version_difference {
        println!("--- Target version ---");
        println!("  baseline={}, candidate={}", baseline, candidate);
        println!();
    }

    println!("--- Tables ---");
    println!(
        "Total tables: baseline={}, candidate={}",
        result.total_baseline, result.total_candidate
    );
    println!();

    print_keys("Missing in candidate", &result.missing_in_candidate);
    print_keys("Extra in candidate", &result.extra_in_candidate);

    println!("Differences ({}):", result.differences.len());
    if result.differences.is_empty() {
        println!("  (none)");
    } else {
        for (key, lines) in &result.differences {
            println!("  {}:", key);
            for line in lines.iter().take(DETAIL_LIMIT) {
                println!("    {}", line);
            }
            if lines.len() > DETAIL_LIMIT {
                println!("    ... ({} more lines)", lines.len() - DETAIL_LIMIT);
            }
        }
    }
    println!();

    if !result.row_differences.is_empty() {
        println!("--- Seed rows ---");
        for line in &result.row_differences {
            println!("  {}", line);
        }
        println!();
    }

    println!(
        "Summary: {} missing, {} extra, {} different",
        result.missing_in_candidate.len(),
        result.extra_in_candidate.len(),
        result.differences.len()
    );
}
