use anyhow::{Context, Result};
use ipfence::{Decision, DecisionReason, ReloadableShield};
use log::{debug, warn};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::json;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Quiet period after a change before reloading (editors write in bursts)
const SETTLE_DELAY: Duration = Duration::from_millis(250);

pub fn cmd_evaluate(
    config: PathBuf,
    ips: Vec<String>,
    json_output: bool,
    watch: bool,
) -> Result<()> {
    let shield = Arc::new(
        ReloadableShield::open(&config)
            .with_context(|| format!("Failed to load policy: {}", config.display()))?,
    );

    if !watch {
        return if ips.is_empty() {
            evaluate_stdin(&shield, json_output)
        } else {
            print_decisions(&shield, &ips, json_output)
        };
    }

    // Setup Ctrl+C handler for watch mode
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    let reading_stdin = ips.is_empty();
    ctrlc::set_handler(move || {
        eprintln!("\n[INFO] Shutting down...");
        if reading_stdin {
            // The main thread is blocked on stdin
            std::process::exit(130);
        }
        shutdown_clone.store(true, Ordering::Relaxed);
    })
    .context("Failed to set Ctrl+C handler")?;

    if reading_stdin {
        // Watcher in the background, stdin in the foreground
        let watcher_shield = Arc::clone(&shield);
        let watcher_shutdown = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("ipfence-watch".to_string())
            .spawn(move || watch_and_reload(&watcher_shield, &[], false, &watcher_shutdown))
            .context("Failed to spawn watcher thread")?;

        let result = evaluate_stdin(&shield, json_output);
        shutdown.store(true, Ordering::Relaxed);
        match handle.join() {
            Ok(watch_result) => watch_result?,
            Err(_) => anyhow::bail!("watcher thread panicked"),
        }
        result
    } else {
        print_decisions(&shield, &ips, json_output)?;
        watch_and_reload(&shield, &ips, json_output, &shutdown)
    }
}

fn evaluate_stdin(shield: &ReloadableShield, json_output: bool) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let client = line.trim();
        if client.is_empty() {
            continue;
        }
        let mut out = stdout.lock();
        write_decision(&mut out, client, &shield.evaluate(client), json_output)?;
        // Line-buffered so the command works in a pipeline
        out.flush()?;
    }
    Ok(())
}

fn print_decisions(shield: &ReloadableShield, ips: &[String], json_output: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for ip in ips {
        write_decision(&mut out, ip, &shield.evaluate(ip), json_output)?;
    }
    out.flush()?;
    Ok(())
}

fn write_decision<W: Write>(
    out: &mut W,
    client: &str,
    decision: &Decision,
    json_output: bool,
) -> io::Result<()> {
    if !json_output {
        return writeln!(out, "{}\t{}\t{}", client, decision.action, decision.reason);
    }

    let rule = match &decision.reason {
        DecisionReason::Rule { name, .. } => Some(name.as_str()),
        _ => None,
    };
    writeln!(
        out,
        "{}",
        json!({
            "client": client,
            "action": decision.action,
            "reason": decision.reason.to_string(),
            "rule": rule,
        })
    )
}

/// Directories holding the watched files
///
/// Parents are watched instead of the files so that lists replaced by
/// rename (the usual way list updaters publish) keep being noticed.
fn watch_dirs(paths: &[PathBuf]) -> HashSet<PathBuf> {
    paths
        .iter()
        .filter(|p| p.to_str() != Some("-"))
        .map(|p| match p.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        })
        .collect()
}

fn is_relevant(event: &Event, files: &HashSet<PathBuf>) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    kind_matches
        && event
            .paths
            .iter()
            .any(|p| files.contains(p) || files.contains(&canonical(p)))
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn watched_files(shield: &ReloadableShield) -> HashSet<PathBuf> {
    shield
        .watched_paths()
        .into_iter()
        .flat_map(|p| [canonical(&p), p])
        .collect()
}

/// Reload on every settled change until `shutdown` is set
fn watch_and_reload(
    shield: &ReloadableShield,
    reprint: &[String],
    json_output: bool,
    shutdown: &AtomicBool,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher: RecommendedWatcher =
        Watcher::new(tx, Config::default()).context("Failed to create file watcher")?;

    let mut watched_dirs = HashSet::new();
    let mut files = watched_files(shield);
    add_watches(&mut watcher, &mut watched_dirs, &shield.watched_paths())?;
    eprintln!("[INFO] Watching for policy changes (Ctrl+C to stop)...");

    while !shutdown.load(Ordering::Relaxed) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(event)) => {
                if !is_relevant(&event, &files) {
                    continue;
                }
                debug!("change detected: {:?}", event.paths);

                // Let the burst of writes finish, then reload once
                thread::sleep(SETTLE_DELAY);
                while rx.try_recv().is_ok() {}

                match shield.reload() {
                    Ok(generation) => {
                        eprintln!("[INFO] Policy reloaded (generation {})", generation);
                        files = watched_files(shield);
                        add_watches(&mut watcher, &mut watched_dirs, &shield.watched_paths())?;
                        if !reprint.is_empty() {
                            print_decisions(shield, reprint, json_output)?;
                        }
                    }
                    Err(e) => eprintln!("[WARN] Reload failed, keeping current policy: {}", e),
                }
            }
            Ok(Err(e)) => warn!("file watcher error: {}", e),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

fn add_watches(
    watcher: &mut RecommendedWatcher,
    watched_dirs: &mut HashSet<PathBuf>,
    paths: &[PathBuf],
) -> Result<()> {
    for dir in watch_dirs(paths) {
        if watched_dirs.contains(&dir) {
            continue;
        }
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        watched_dirs.insert(dir);
    }
    Ok(())
}
