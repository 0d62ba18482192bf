//! Policy configuration
//!
//! A shield is described by a JSON document:
//!
//! ```json
//! {
//!   "lists": [
//!     { "file": "office.txt", "if_in_list": "allow" },
//!     { "file": "firehol_level1.netset.gz", "if_in_list": "deny", "backend": "trie" }
//!   ],
//!   "when_non_ipv4": "allow",
//!   "on_indeterminate": "deny",
//!   "log_decisions": true,
//!   "retry": { "attempts": 3, "pause_ms": 2000 }
//! }
//! ```
//!
//! Relative list paths are resolved against the directory holding the
//! config file. A `file` starting with `http://` or `https://` is
//! downloaded instead (feature `http`).

use crate::error::{ConfigError, FenceError};
use crate::loader::{load_from_source, OnBadEntry};
use crate::policy::{Action, ListRule, Shield};
use crate::source::{
    is_url, AnySource, FileSource, RetryingSource, DEFAULT_ATTEMPTS, DEFAULT_PAUSE,
};
use crate::store::{Backend, StoreMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One list in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListConfig {
    /// Path of the list (plain or `.gz`), or an `http(s)://` URL
    pub file: String,

    /// Name used in decisions; defaults to `file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Action when the client is in the list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_in_list: Option<Action>,

    /// Action when the client is not in the list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_not_in_list: Option<Action>,

    /// Index implementation
    #[serde(default)]
    pub backend: Backend,

    /// Handling of malformed entries
    #[serde(default)]
    pub on_bad_entry: OnBadEntry,
}

impl ListConfig {
    /// Name used in decisions and logs
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.file)
    }
}

/// Fetch retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempts per list, at least 1
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

fn default_pause_ms() -> u64 {
    DEFAULT_PAUSE.as_millis() as u64
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            pause_ms: default_pause_ms(),
        }
    }
}

impl RetryConfig {
    /// Pause as a [`Duration`]
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

fn default_on_indeterminate() -> Action {
    Action::Deny
}

/// Complete shield configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShieldConfig {
    /// Rules, evaluated first to last
    #[serde(default)]
    pub lists: Vec<ListConfig>,

    /// Action for IPv6 clients; unset lets them through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_non_ipv4: Option<Action>,

    /// Action for unparsable client addresses
    #[serde(default = "default_on_indeterminate")]
    pub on_indeterminate: Action,

    /// Log denials
    #[serde(default)]
    pub log_decisions: bool,

    /// Fetch retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Directory relative list paths are resolved against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl ShieldConfig {
    /// Read and validate a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_json_str(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse and validate a config document
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check constraints serde can't express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.attempts must be at least 1".to_string(),
            ));
        }

        for (i, list) in self.lists.iter().enumerate() {
            if list.file.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("lists[{}]: empty file", i)));
            }
            if is_url(&list.file) && !cfg!(feature = "http") {
                return Err(ConfigError::Invalid(format!(
                    "lists[{}]: '{}' needs the 'http' feature",
                    i, list.file
                )));
            }
            if list.if_in_list.is_none() && list.if_not_in_list.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "lists[{}] ({}): needs if_in_list or if_not_in_list",
                    i,
                    list.display_name()
                )));
            }
        }

        Ok(())
    }

    /// Resolved path of a list
    pub fn list_path(&self, list: &ListConfig) -> PathBuf {
        let path = Path::new(&list.file);
        match &self.base_dir {
            Some(base) if path.is_relative() && list.file != "-" => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Resolved paths of every file-backed list; URLs are left out
    pub fn list_paths(&self) -> Vec<PathBuf> {
        self.lists
            .iter()
            .filter(|list| !is_url(&list.file))
            .map(|list| self.list_path(list))
            .collect()
    }

    /// Where a list is fetched from: its URL or its resolved path
    pub fn list_source(&self, list: &ListConfig) -> Result<AnySource, FenceError> {
        if is_url(&list.file) {
            Ok(AnySource::for_location(&list.file)?)
        } else {
            Ok(AnySource::File(FileSource::new(self.list_path(list))))
        }
    }

    /// Fetch every list and assemble the shield
    ///
    /// Fails on the first list that can't be fetched or, with
    /// `on_bad_entry: abort`, holds a malformed entry.
    pub fn load_shield(&self) -> Result<Shield, FenceError> {
        self.validate()?;

        let mut rules = Vec::with_capacity(self.lists.len());
        for list in &self.lists {
            let source = RetryingSource::with_policy(
                self.list_source(list)?,
                self.retry.attempts,
                self.retry.pause(),
            );
            let (store, _report) =
                load_from_source(&source, list.backend, StoreMode::Shared, list.on_bad_entry)?;

            rules.push(ListRule {
                name: list.display_name().to_string(),
                index: store.into_shared(),
                if_in_list: list.if_in_list,
                if_not_in_list: list.if_not_in_list,
            });
        }

        Ok(Shield {
            rules,
            when_non_ipv4: self.when_non_ipv4,
            on_indeterminate: self.on_indeterminate,
            log_decisions: self.log_decisions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DecisionReason;
    use crate::source::ListSource;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config =
            ShieldConfig::from_json_str(r#"{"lists": [{"file": "a.txt", "if_in_list": "deny"}]}"#)
                .unwrap();

        let list = &config.lists[0];
        assert_eq!(list.backend, Backend::Intervals);
        assert_eq!(list.on_bad_entry, OnBadEntry::Skip);
        assert_eq!(list.display_name(), "a.txt");
        assert_eq!(config.when_non_ipv4, None);
        assert_eq!(config.on_indeterminate, Action::Deny);
        assert!(!config.log_decisions);
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.retry.pause(), Duration::from_secs(2));
    }

    #[test]
    fn test_url_lists_are_not_watched() {
        let config = ShieldConfig::from_json_str(
            r#"{"lists": [
                {"file": "https://lists.example.net/level1.netset", "if_in_list": "deny"},
                {"file": "/etc/ipfence/office.txt", "if_in_list": "allow"}
            ]}"#,
        );

        if !cfg!(feature = "http") {
            assert!(matches!(config, Err(ConfigError::Invalid(_))));
            return;
        }

        let config = config.unwrap();
        assert_eq!(
            config.list_paths(),
            vec![PathBuf::from("/etc/ipfence/office.txt")]
        );
        let remote = config.list_source(&config.lists[0]).unwrap();
        assert_eq!(remote.location(), "https://lists.example.net/level1.netset");
        assert!(matches!(
            config.list_source(&config.lists[1]).unwrap(),
            AnySource::File(_)
        ));
    }

    #[test]
    fn test_rule_without_action_rejected() {
        let err = ShieldConfig::from_json_str(r#"{"lists": [{"file": "a.txt"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("if_in_list or if_not_in_list"));
    }

    #[test]
    fn test_invalid_documents() {
        // Empty file name
        assert!(ShieldConfig::from_json_str(
            r#"{"lists": [{"file": " ", "if_in_list": "deny"}]}"#
        )
        .is_err());
        // Zero attempts
        assert!(ShieldConfig::from_json_str(r#"{"retry": {"attempts": 0}}"#).is_err());
        // Unknown action
        assert!(matches!(
            ShieldConfig::from_json_str(r#"{"lists": [{"file": "a", "if_in_list": "block"}]}"#),
            Err(ConfigError::Parse(_))
        ));
        // Misspelled field
        assert!(ShieldConfig::from_json_str(r#"{"when_ipv6": "deny"}"#).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let err = ShieldConfig::from_file("/nonexistent/ipfence.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_shield_relative_paths() {
        let dir = TempDir::new().unwrap();

        let mut office = std::fs::File::create(dir.path().join("office.txt")).unwrap();
        writeln!(office, "192.0.2.0/24").unwrap();
        let mut blocked = std::fs::File::create(dir.path().join("blocked.netset")).unwrap();
        writeln!(blocked, "# blocked\n192.0.2.0/24\n203.0.113.0/24").unwrap();

        let config_path = dir.path().join("shield.json");
        std::fs::write(
            &config_path,
            r#"{
                "lists": [
                    {"file": "office.txt", "name": "office", "if_in_list": "allow"},
                    {"file": "blocked.netset", "if_in_list": "deny", "backend": "trie"}
                ],
                "when_non_ipv4": "deny"
            }"#,
        )
        .unwrap();

        let config = ShieldConfig::from_file(&config_path).unwrap();
        assert_eq!(config.list_paths()[0], dir.path().join("office.txt"));

        let shield = config.load_shield().unwrap();
        assert_eq!(shield.rules.len(), 2);
        assert_eq!(shield.evaluate("192.0.2.1").action, Action::Allow);
        assert_eq!(shield.evaluate("203.0.113.1").action, Action::Deny);
        assert_eq!(shield.evaluate("198.51.100.1").action, Action::Allow);
        assert_eq!(shield.evaluate("::1").reason, DecisionReason::NonIpv4);
        assert_eq!(shield.evaluate("::1").action, Action::Deny);
    }

    #[test]
    fn test_load_shield_missing_list() {
        let config = ShieldConfig::from_json_str(
            r#"{
                "lists": [{"file": "/nonexistent/list.txt", "if_in_list": "deny"}],
                "retry": {"attempts": 2, "pause_ms": 0}
            }"#,
        )
        .unwrap();

        match config.load_shield() {
            Err(FenceError::Retrieval(err)) => assert_eq!(err.attempts, 2),
            other => panic!("expected retrieval error, got {:?}", other),
        }
    }
}
