//! Hot-reloadable shield
//!
//! [`ReloadableShield`] keeps the current [`Shield`] behind an atomic
//! pointer. A reload reads the config again, fetches every list and builds
//! a complete new shield before swapping it in, so evaluations in flight
//! finish against the generation they started with and never see a
//! half-loaded chain. A failed reload leaves the old generation serving.
//!
//! # Example
//!
//! ```no_run
//! use ipfence::ReloadableShield;
//!
//! let shield = ReloadableShield::open("shield.json")?;
//! println!("{}", shield.evaluate("203.0.113.9:51234"));
//!
//! // Lists changed on disk
//! shield.reload()?;
//! assert_eq!(shield.generation(), 2);
//! # Ok::<(), ipfence::FenceError>(())
//! ```

use crate::config::ShieldConfig;
use crate::error::FenceError;
use crate::policy::{Decision, Shield};
use arc_swap::ArcSwap;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One successfully loaded configuration
#[derive(Debug)]
struct Loaded {
    shield: Arc<Shield>,
    list_paths: Vec<PathBuf>,
}

impl Loaded {
    fn from_config_file(path: &Path) -> Result<Self, FenceError> {
        let config = ShieldConfig::from_file(path)?;
        let shield = config.load_shield()?;
        Ok(Self {
            shield: Arc::new(shield),
            list_paths: config.list_paths(),
        })
    }
}

/// Shield that can be rebuilt from its config file while serving
#[derive(Debug)]
pub struct ReloadableShield {
    config_path: PathBuf,
    /// Current generation using lock-free atomic Arc pointer
    current: ArcSwap<Loaded>,
    /// Successful loads, the initial one included
    generation: AtomicU64,
}

impl ReloadableShield {
    /// Load the config at `path` and everything it references
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FenceError> {
        let config_path = path.as_ref().to_path_buf();
        let loaded = Loaded::from_config_file(&config_path)?;
        info!(
            "loaded {} rule(s) from {}",
            loaded.shield.rules.len(),
            config_path.display()
        );

        Ok(Self {
            config_path,
            current: ArcSwap::from_pointee(loaded),
            generation: AtomicU64::new(1),
        })
    }

    /// Rebuild from the config file and swap the result in
    ///
    /// Returns the new generation. On error the current shield stays.
    pub fn reload(&self) -> Result<u64, FenceError> {
        match Loaded::from_config_file(&self.config_path) {
            Ok(loaded) => {
                let rules = loaded.shield.rules.len();
                self.current.store(Arc::new(loaded));
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                info!(
                    "reloaded {} ({} rule(s)), generation {}",
                    self.config_path.display(),
                    rules,
                    generation
                );
                Ok(generation)
            }
            Err(err) => {
                warn!(
                    "reload of {} failed, keeping generation {}: {}",
                    self.config_path.display(),
                    self.generation(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Decide for a client against the current generation
    pub fn evaluate(&self, client: &str) -> Decision {
        self.current.load().shield.evaluate(client)
    }

    /// The current shield; stays valid across later reloads
    pub fn snapshot(&self) -> Arc<Shield> {
        Arc::clone(&self.current.load().shield)
    }

    /// Number of successful loads
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The config file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Config file plus every list of the current generation
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let current = self.current.load();
        let mut paths = Vec::with_capacity(current.list_paths.len() + 1);
        paths.push(self.config_path.clone());
        paths.extend(current.list_paths.iter().cloned());
        paths
    }
}
