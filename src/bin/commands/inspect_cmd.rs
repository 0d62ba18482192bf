use anyhow::{Context, Result};
use ipfence::{load_lines, FileSource, ListSource, OnBadEntry, RangeStore};
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::format_number;

/// Rejected entries shown in text mode before eliding the rest
const MAX_REJECTED_SHOWN: usize = 20;

pub fn cmd_inspect(list: PathBuf, json_output: bool, show_ranges: bool) -> Result<()> {
    let source = FileSource::new(&list);
    let lines = source
        .fetch()
        .with_context(|| format!("Failed to read list: {}", list.display()))?;

    let mut store = RangeStore::new();
    let report = load_lines(&mut store, &lines, OnBadEntry::Skip)?;

    let index = store.index();
    let ranges = index.ranges();
    let covered = index.covered_addresses();

    if json_output {
        let mut output = json!({
            "list": source.location(),
            "lines": report.lines,
            "ingested": report.ingested,
            "ignored": report.ignored,
            "rejected": report.rejected,
            "merged_ranges": ranges.len(),
            "covered_addresses": covered,
        });
        if show_ranges {
            output["ranges"] = json!(ranges.iter().map(ToString::to_string).collect::<Vec<_>>());
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("List:              {}", source.location());
    println!("Lines:             {}", format_number(report.lines));
    println!("Ingested:          {}", format_number(report.ingested));
    println!("Ignored:           {}", format_number(report.ignored));
    println!("Rejected:          {}", format_number(report.rejected.len()));
    println!("Merged ranges:     {}", format_number(ranges.len()));
    println!(
        "Covered addresses: {} ({:.4}% of IPv4)",
        covered,
        covered as f64 / (1u64 << 32) as f64 * 100.0
    );

    if !report.rejected.is_empty() {
        println!();
        println!("Rejected entries:");
        for rejected in report.rejected.iter().take(MAX_REJECTED_SHOWN) {
            println!(
                "  line {}: {} ({})",
                rejected.line, rejected.entry, rejected.reason
            );
        }
        if report.rejected.len() > MAX_REJECTED_SHOWN {
            println!(
                "  ... and {} more",
                report.rejected.len() - MAX_REJECTED_SHOWN
            );
        }
    }

    if show_ranges {
        println!();
        for range in ranges.iter() {
            println!("{}", range);
        }
    }

    Ok(())
}
