mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_check, cmd_evaluate, cmd_extract, cmd_inspect};

#[derive(Parser)]
#[command(name = "ipfence")]
#[command(
    about = "IPv4 range membership for blocklists and allowlists",
    long_about = "ipfence - Fast IPv4 range membership for blocklists and allowlists\n\n\
    Load CIDR lists (FireHOL, Spamhaus DROP, plain one-range-per-line files,\n\
    optionally gzipped) and check addresses against them, or evaluate a chain\n\
    of allow/deny rules described by a JSON config.\n\n\
    Examples:\n\
      ipfence check firehol_level1.netset 203.0.113.9 10.1.2.3\n\
      ipfence check drop.txt.gz 1.2.3.4 --quiet && echo listed\n\
      ipfence inspect firehol_level1.netset --ranges\n\
      ipfence extract access.log --unique\n\
      ipfence evaluate shield.json 203.0.113.9:51234\n\
      tail -f clients.txt | ipfence evaluate shield.json --watch"
)]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check addresses against a range list
    Check {
        /// Range list (plain or .gz), or "-" for stdin
        #[arg(value_name = "LIST")]
        list: PathBuf,

        /// IPv4 addresses to check
        #[arg(value_name = "IP", required = true)]
        ips: Vec<String>,

        /// Output format: text (default), json (NDJSON), or csv
        #[arg(long, default_value = "text")]
        format: String,

        /// Quiet mode - no output, only exit code (0 = all listed, 1 = otherwise)
        #[arg(short, long)]
        quiet: bool,

        /// Index backend: intervals (default) or trie
        #[arg(short, long, default_value = "intervals")]
        backend: String,

        /// Fail on malformed list entries instead of skipping them
        #[arg(long)]
        strict: bool,

        /// Store mode: exclusive (default) or shared (checks addresses in parallel)
        #[arg(short, long, default_value = "exclusive")]
        mode: String,
    },

    /// Show statistics for a range list
    Inspect {
        /// Range list (plain or .gz), or "-" for stdin
        #[arg(value_name = "LIST")]
        list: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        /// Print the merged ranges
        #[arg(short, long)]
        ranges: bool,
    },

    /// Print the range found on each line of the input
    Extract {
        /// Files to scan (plain or .gz), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output only unique ranges (deduplicate)
        #[arg(short, long)]
        unique: bool,
    },

    /// Evaluate client addresses against a policy config
    Evaluate {
        /// Policy config (JSON)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Client addresses (ip, ip:port, [ipv6]:port); read from stdin if none
        #[arg(value_name = "IP")]
        ips: Vec<String>,

        /// Output as JSON (one object per line)
        #[arg(short, long)]
        json: bool,

        /// Reload when the config or a list changes; stop with Ctrl+C
        #[arg(short, long)]
        watch: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_utils::init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            list,
            ips,
            format,
            quiet,
            backend,
            strict,
            mode,
        } => cmd_check(list, ips, format, quiet, backend, strict, mode),
        Commands::Inspect { list, json, ranges } => cmd_inspect(list, json, ranges),
        Commands::Extract { inputs, unique } => cmd_extract(inputs, unique),
        Commands::Evaluate {
            config,
            ips,
            json,
            watch,
        } => cmd_evaluate(config, ips, json, watch),
    }
}
