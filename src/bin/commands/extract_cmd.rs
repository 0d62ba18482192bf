use anyhow::{Context, Result};
use ipfence::extract_range;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub fn cmd_extract(inputs: Vec<PathBuf>, unique: bool) -> Result<()> {
    let mut seen = if unique { Some(HashSet::new()) } else { None };

    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());

    for input_path in &inputs {
        let reader = ipfence::source::open(input_path)
            .with_context(|| format!("Failed to open {}", input_path.display()))?;
        process_reader(reader, &mut seen, &mut writer)
            .with_context(|| format!("Failed to read {}", input_path.display()))?;
    }

    writer.flush()?;
    Ok(())
}

fn process_reader<R: BufRead, W: Write>(
    mut reader: R,
    seen: &mut Option<HashSet<String>>,
    writer: &mut W,
) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let Some(range) = extract_range(&line) else {
            continue;
        };

        if let Some(seen) = seen.as_mut() {
            if !seen.insert(range.clone()) {
                continue;
            }
        }
        writeln!(writer, "{}", range)?;
    }
    Ok(())
}
