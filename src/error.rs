//! Error types for the ipfence library
//!
//! Each stage of the pipeline has its own error type so callers can tell a
//! malformed list entry apart from an unreadable list or a broken policy
//! file. [`FenceError`] wraps all of them for code that doesn't care.

use thiserror::Error;

/// Result type alias for ipfence operations
pub type Result<T> = std::result::Result<T, FenceError>;

/// A CIDR or IPv4 literal could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Input was empty after trimming
    #[error("empty address")]
    Empty,

    /// CIDR text without a `/prefix` part
    #[error("missing prefix length in '{0}'")]
    MissingPrefix(String),

    /// Prefix is not a decimal integer in 0..=32
    #[error("invalid prefix length '{prefix}' in '{text}' (expected 0..=32)")]
    InvalidPrefix {
        /// Full input text
        text: String,
        /// The offending prefix part
        prefix: String,
    },

    /// Address does not have exactly four dot-separated parts
    #[error("expected 4 octets in '{text}', found {found}")]
    OctetCount {
        /// Full input text
        text: String,
        /// Number of dot-separated parts found
        found: usize,
    },

    /// An octet is not 1-3 decimal digits in 0..=255
    #[error("invalid octet '{octet}' in '{text}' (expected 0..=255)")]
    InvalidOctet {
        /// Full input text
        text: String,
        /// The offending octet
        octet: String,
    },

    /// A bare address was expected but a prefix was given
    #[error("unexpected prefix in address '{0}'")]
    UnexpectedPrefix(String),
}

/// A list source could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to read '{location}' after {attempts} attempt(s): {message}")]
pub struct RetrievalError {
    /// Path or other identifier of the source
    pub location: String,
    /// How many attempts were made
    pub attempts: u32,
    /// Text of the last underlying error
    pub message: String,
}

/// A list entry was rejected while the load policy aborts on bad entries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {source}")]
pub struct LoadError {
    /// 1-based line number within the source
    pub line: usize,
    /// Why the entry was rejected
    #[source]
    pub source: FormatError,
}

/// The policy configuration is unreadable or inconsistent
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Config file path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the schema
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config parses but violates a constraint
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Main error type wrapping every ipfence failure
#[derive(Error, Debug)]
pub enum FenceError {
    /// Malformed address or range
    #[error(transparent)]
    Format(#[from] FormatError),

    /// List source unavailable
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Bad entry in a strictly loaded list
    #[error("{location}: {source}")]
    Load {
        /// Source the bad entry came from
        location: String,
        /// The rejected entry
        #[source]
        source: LoadError,
    },

    /// Bad policy configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}
