//! List sources: where raw list text comes from
//!
//! A [`ListSource`] hands the loader the lines of one list or fails with a
//! [`RetrievalError`]. Files are read with automatic gzip decompression
//! (by `.gz` extension) and `-` means stdin, same as every other input
//! path the CLI accepts. With the `http` feature, `http://` and `https://`
//! locations are downloaded by [`HttpSource`]; anything but `200 OK` is a
//! failed attempt.
//!
//! Transient failures (a list being rewritten by a cron job, a network
//! filesystem hiccup) are handled by wrapping a source in
//! [`RetryingSource`], which makes a fixed number of attempts with a fixed
//! pause in between.
//!
//! # Example
//!
//! ```rust,no_run
//! use ipfence::source::{FileSource, ListSource, RetryingSource};
//!
//! let source = RetryingSource::new(FileSource::new("firehol_level1.netset.gz"));
//! let lines = source.fetch()?;
//! println!("{} lines from {}", lines.len(), source.location());
//! # Ok::<(), ipfence::RetrievalError>(())
//! ```

use crate::error::RetrievalError;
use flate2::read::GzDecoder;
use log::warn;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Buffer size for file reading (128KB, matches CLI default)
const BUFFER_SIZE: usize = 128 * 1024;

/// Attempts made by [`RetryingSource::new`]
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Pause between attempts used by [`RetryingSource::new`]
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(2);

/// Per-request timeout of [`HttpSource::new`]
#[cfg(feature = "http")]
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Does `location` name an HTTP(S) resource rather than a path?
pub fn is_url(location: &str) -> bool {
    let lower = location.trim_start().get(..8).unwrap_or("").to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// Query strings don't count: `list.gz?token=...` is still gzip
fn has_gz_extension(name: &str) -> bool {
    let name = name.split(['?', '#']).next().unwrap_or(name);
    name.len() >= 3
        && name
            .get(name.len() - 3..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".gz"))
}

/// Something that yields the raw lines of a list
pub trait ListSource {
    /// Human-readable identifier (path, URL, ...)
    fn location(&self) -> &str;

    /// Read every line of the list
    fn fetch(&self) -> Result<Vec<String>, RetrievalError>;
}

impl<S: ListSource + ?Sized> ListSource for &S {
    fn location(&self) -> &str {
        (**self).location()
    }

    fn fetch(&self) -> Result<Vec<String>, RetrievalError> {
        (**self).fetch()
    }
}

/// List stored in a local file (optionally gzipped) or read from stdin
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    location: String,
}

impl FileSource {
    /// Source for `path`; `-` reads stdin
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let location = path.display().to_string();
        Self { path, location }
    }

    /// The path this source reads
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ListSource for FileSource {
    fn location(&self) -> &str {
        &self.location
    }

    fn fetch(&self) -> Result<Vec<String>, RetrievalError> {
        open(&self.path)
            .and_then(read_lines)
            .map_err(|e| RetrievalError {
                location: self.location.clone(),
                attempts: 1,
                message: e.to_string(),
            })
    }
}

/// List downloaded over HTTP(S)
///
/// Each [`ListSource::fetch`] is one `GET`. URLs whose path ends in `.gz`
/// are decompressed like files are.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpSource {
    /// Source for `url` with a [`DEFAULT_HTTP_TIMEOUT`] per request
    pub fn new(url: &str) -> Result<Self, RetrievalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(concat!("ipfence/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RetrievalError {
                location: url.to_string(),
                attempts: 0,
                message: format!("cannot create HTTP client: {}", e),
            })?;
        Ok(Self::with_client(url, client))
    }

    /// Source for `url` using an existing client
    pub fn with_client(url: &str, client: reqwest::blocking::Client) -> Self {
        Self {
            url: url.trim().to_string(),
            client,
        }
    }

    /// The URL this source downloads
    pub fn url(&self) -> &str {
        &self.url
    }

    fn error(&self, message: String) -> RetrievalError {
        RetrievalError {
            location: self.url.clone(),
            attempts: 1,
            message,
        }
    }
}

#[cfg(feature = "http")]
impl ListSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<Vec<String>, RetrievalError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| self.error(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(self.error(format!("unexpected status {}", status)));
        }

        read_lines(buffered(response, has_gz_extension(&self.url)))
            .map_err(|e| self.error(e.to_string()))
    }
}

/// A file or URL, decided by the shape of its location
#[derive(Debug, Clone)]
pub enum AnySource {
    /// Local file or stdin
    File(FileSource),
    /// HTTP(S) download
    #[cfg(feature = "http")]
    Http(HttpSource),
}

impl AnySource {
    /// [`HttpSource`] for `http(s)://` locations, [`FileSource`] otherwise
    ///
    /// Without the `http` feature a URL location is an error.
    pub fn for_location(location: &str) -> Result<Self, RetrievalError> {
        if is_url(location) {
            url_source(location)
        } else {
            Ok(AnySource::File(FileSource::new(location)))
        }
    }
}

#[cfg(feature = "http")]
fn url_source(location: &str) -> Result<AnySource, RetrievalError> {
    HttpSource::new(location).map(AnySource::Http)
}

#[cfg(not(feature = "http"))]
fn url_source(location: &str) -> Result<AnySource, RetrievalError> {
    Err(RetrievalError {
        location: location.to_string(),
        attempts: 0,
        message: "built without the 'http' feature".to_string(),
    })
}

impl ListSource for AnySource {
    fn location(&self) -> &str {
        match self {
            AnySource::File(source) => source.location(),
            #[cfg(feature = "http")]
            AnySource::Http(source) => source.location(),
        }
    }

    fn fetch(&self) -> Result<Vec<String>, RetrievalError> {
        match self {
            AnySource::File(source) => source.fetch(),
            #[cfg(feature = "http")]
            AnySource::Http(source) => source.fetch(),
        }
    }
}

/// Lines held in memory
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    lines: Vec<String>,
}

impl StaticSource {
    /// Source named `name` yielding `lines`
    pub fn new<I, S>(name: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Source yielding the lines of `text`
    pub fn from_text(name: &str, text: &str) -> Self {
        Self::new(name, text.lines())
    }
}

impl ListSource for StaticSource {
    fn location(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<String>, RetrievalError> {
        Ok(self.lines.clone())
    }
}

/// Retries another source a bounded number of times
#[derive(Debug, Clone)]
pub struct RetryingSource<S> {
    inner: S,
    attempts: u32,
    pause: Duration,
}

impl<S: ListSource> RetryingSource<S> {
    /// Three attempts, two seconds apart
    pub fn new(inner: S) -> Self {
        Self::with_policy(inner, DEFAULT_ATTEMPTS, DEFAULT_PAUSE)
    }

    /// Custom policy; `attempts` is clamped to at least 1
    pub fn with_policy(inner: S, attempts: u32, pause: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            pause,
        }
    }

    /// The wrapped source
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ListSource> ListSource for RetryingSource<S> {
    fn location(&self) -> &str {
        self.inner.location()
    }

    fn fetch(&self) -> Result<Vec<String>, RetrievalError> {
        let mut attempt = 1;
        loop {
            match self.inner.fetch() {
                Ok(lines) => return Ok(lines),
                Err(err) if attempt >= self.attempts => {
                    return Err(RetrievalError {
                        attempts: attempt,
                        ..err
                    });
                }
                Err(err) => {
                    warn!(
                        "attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, self.attempts, err, self.pause
                    );
                    thread::sleep(self.pause);
                    attempt += 1;
                }
            }
        }
    }
}

/// Open a file with automatic gzip detection based on file extension
///
/// Files ending in `.gz` (case-insensitive) are decompressed; `-` is stdin.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    Ok(buffered(file, is_gzip))
}

fn buffered<R: Read + Send + 'static>(reader: R, is_gzip: bool) -> Box<dyn BufRead + Send> {
    if is_gzip {
        Box::new(BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(reader)))
    } else {
        Box::new(BufReader::with_capacity(BUFFER_SIZE, reader))
    }
}

/// Collect lines, tolerating invalid UTF-8 (lists are often Latin-1 commented)
fn read_lines(mut reader: Box<dyn BufRead + Send>) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        lines.push(line.trim_end_matches(['\n', '\r']).to_string());
    }
    Ok(lines)
}
