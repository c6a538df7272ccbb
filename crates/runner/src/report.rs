use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;

use crate::harness::RunSummary;
use crate::stats::EntrySummary;

/// Print the request table, the error table and a one-line verdict.
pub fn print_report(summary: &RunSummary) {
    let stats = &summary.stats;

    println!();
    println!(
        "{:<8} {:<36} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Type", "Name", "# reqs", "# fails", "Avg", "Min", "Max", "Med", "95%", "Avg size"
    );
    println!("{}", "-".repeat(128));
    for e in &stats.entries {
        print_row(e);
    }
    println!("{}", "-".repeat(128));
    print_row(&stats.total);

    if !stats.errors.is_empty() {
        println!();
        println!("{:>6}  {:<8} {:<24} Error", "# occ", "Type", "Name");
        println!("{}", "-".repeat(128));
        for err in &stats.errors {
            println!(
                "{:>6}  {:<8} {:<24} {}",
                err.occurrences,
                err.request_type,
                err.name,
                one_line(&err.error)
            );
        }
    }

    println!();
    println!(
        "{} users, {} iterations, {:.1}s, stopped: {:?}",
        summary.users.len(),
        summary.iterations(),
        summary.elapsed_secs,
        summary.stop_reason
    );
}

fn print_row(e: &EntrySummary) {
    let fails = if e.requests == 0 {
        format!("{}", e.failures)
    } else {
        format!(
            "{}({:.0}%)",
            e.failures,
            e.failures as f64 / e.requests as f64 * 100.0
        )
    };
    println!(
        "{:<8} {:<36} {:>8} {:>8} {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>10.0}",
        e.request_type,
        truncate(&e.name, 36),
        e.requests,
        fails,
        e.avg_ms,
        e.min_ms,
        e.max_ms,
        e.median_ms,
        e.p95_ms,
        e.avg_bytes
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Write the summary as pretty JSON.
pub async fn write_json(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(summary).context("serialize run summary")?;
    let mut f = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("create {}", path.display()))?;
    f.write_all(&json)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    f.flush().await?;
    Ok(())
}
