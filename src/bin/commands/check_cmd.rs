use anyhow::{Context, Result};
use ipfence::{AnyStore, Backend, Membership, OnBadEntry, StoreMode};
use rayon::prelude::*;
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::cli_utils::{load_list, OutputFormat};

fn membership_label(membership: Membership) -> &'static str {
    match membership {
        Membership::Member => "listed",
        Membership::NotMember => "not-listed",
        Membership::Indeterminate => "invalid",
    }
}

pub fn cmd_check(
    list: PathBuf,
    ips: Vec<String>,
    format: String,
    quiet: bool,
    backend: String,
    strict: bool,
    mode: String,
) -> Result<()> {
    let output_format = OutputFormat::from_str(&format)?;
    let backend: Backend = backend.parse().map_err(anyhow::Error::msg)?;
    let mode: StoreMode = mode.parse().map_err(anyhow::Error::msg)?;
    let on_bad_entry = if strict {
        OnBadEntry::Abort
    } else {
        OnBadEntry::Skip
    };

    let (store, _report) = load_list(&list, backend, mode, on_bad_entry)?;

    let results: Vec<(&str, Membership)> = match store {
        AnyStore::Exclusive(mut store) => ips
            .iter()
            .map(|ip| (ip.as_str(), store.check_membership(ip)))
            .collect(),
        AnyStore::Shared(store) => ips
            .par_iter()
            .map(|ip| (ip.as_str(), store.check_membership(ip)))
            .collect(),
    };
    let all_listed = results.iter().all(|(_, m)| *m == Membership::Member);

    if quiet {
        // Quiet mode: no output, just exit code
        std::process::exit(if all_listed { 0 } else { 1 });
    }

    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());

    match output_format {
        OutputFormat::Text => {
            for (ip, membership) in &results {
                writeln!(writer, "{}\t{}", ip, membership_label(*membership))?;
            }
        }
        OutputFormat::Json => {
            for (ip, membership) in &results {
                let member = match membership {
                    Membership::Member => json!(true),
                    Membership::NotMember => json!(false),
                    Membership::Indeterminate => json!(null),
                };
                writeln!(
                    writer,
                    "{}",
                    json!({
                        "ip": ip,
                        "member": member,
                        "result": membership_label(*membership),
                    })
                )?;
            }
        }
        OutputFormat::Csv => {
            let mut csv = csv::Writer::from_writer(&mut writer);
            csv.write_record(["ip", "result"])?;
            for (ip, membership) in &results {
                csv.write_record([*ip, membership_label(*membership)])?;
            }
            csv.flush().context("Failed to write CSV output")?;
        }
    }

    writer.flush()?;
    Ok(())
}
