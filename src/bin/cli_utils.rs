use anyhow::{Context, Result};
use ipfence::{
    load_from_source, AnyStore, Backend, FileSource, LoadReport, OnBadEntry, StoreMode,
};
use std::path::Path;

/// Initialize env_logger; `RUST_LOG` wins over `-v`
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => anyhow::bail!("Invalid format '{}', expected: text, json, or csv", s),
        }
    }
}

/// Load one list file into a built store
pub fn load_list(
    path: &Path,
    backend: Backend,
    mode: StoreMode,
    on_bad_entry: OnBadEntry,
) -> Result<(AnyStore, LoadReport)> {
    load_from_source(&FileSource::new(path), backend, mode, on_bad_entry)
        .with_context(|| format!("Failed to load list: {}", path.display()))
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
