//! # Configuration
//!
//! [`SendOptions`] is the immutable per-mount configuration read by every
//! pipeline stage. It is either built in code (`SendOptions::default()` plus
//! setters) or validated from [`RawOptions`], the loosely-typed form found in
//! the `[send]` table of the TOML config file.
//!
//! [`Config`] is the application config used by the binary.

use serde_derive::{Deserialize, Serialize};

use log::{debug, warn};
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::exception::Exception;
use crate::param::MAX_MAXAGE;
use crate::util::parse_duration_ms;

/// How requests for dot-prefixed path segments are treated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Dotfiles {
    /// No special treatment.
    Allow,
    /// Pretend the file does not exist (404).
    #[default]
    Ignore,
    /// Refuse the request (403).
    Deny,
}

impl Dotfiles {
    pub fn parse(value: &str) -> Result<Self, Exception> {
        match value {
            "allow" => Ok(Dotfiles::Allow),
            "ignore" => Ok(Dotfiles::Ignore),
            "deny" => Ok(Dotfiles::Deny),
            other => Err(Exception::InvalidDotfiles(other.to_string())),
        }
    }
}

/// Validated configuration for one mount point.
#[derive(Debug, Clone, PartialEq)]
pub struct SendOptions {
    accept_ranges: bool,
    cache_control: bool,
    etag: bool,
    dotfiles: Dotfiles,
    extensions: Vec<String>,
    immutable: bool,
    index: Vec<String>,
    last_modified: bool,
    max_age: u64,
    root: Option<PathBuf>,
    start: u64,
    end: Option<u64>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            accept_ranges: true,
            cache_control: true,
            etag: true,
            dotfiles: Dotfiles::Ignore,
            extensions: Vec::new(),
            immutable: true,
            index: vec!["index.html".to_string()],
            last_modified: true,
            max_age: 0,
            root: None,
            start: 0,
            end: None,
        }
    }
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_raw(raw: RawOptions) -> Result<Self, Exception> {
        let defaults = Self::default();

        let dotfiles = match raw.dotfiles.as_deref() {
            Some(value) => Dotfiles::parse(value)?,
            None => defaults.dotfiles,
        };
        let extensions = match raw.extensions {
            Some(list) => list.normalize("extensions option")?,
            None => defaults.extensions,
        };
        let index = match raw.index {
            Some(list) => list.normalize("index option")?,
            None => defaults.index,
        };

        // `maxAge` wins unless it is absent or falsy, like `maxAge || maxage`.
        let max_age = raw
            .max_age
            .filter(|m| !m.is_falsy())
            .or(raw.maxage)
            .map_or(0, |m| m.to_millis());

        let options = Self {
            accept_ranges: raw.accept_ranges.unwrap_or(defaults.accept_ranges),
            cache_control: raw.cache_control.unwrap_or(defaults.cache_control),
            etag: raw.etag.unwrap_or(defaults.etag),
            dotfiles,
            extensions,
            immutable: raw.immutable.unwrap_or(defaults.immutable),
            index,
            last_modified: raw.last_modified.unwrap_or(defaults.last_modified),
            max_age,
            root: raw
                .root
                .filter(|r| !r.is_empty())
                .map(|r| absolutize(Path::new(&r))),
            start: raw.start.unwrap_or(0),
            end: raw.end,
        };
        debug!("Send options: {:?}", options);
        Ok(options)
    }

    pub fn accept_ranges(mut self, value: bool) -> Self {
        self.accept_ranges = value;
        self
    }

    pub fn cache_control(mut self, value: bool) -> Self {
        self.cache_control = value;
        self
    }

    pub fn etag(mut self, value: bool) -> Self {
        self.etag = value;
        self
    }

    pub fn dotfiles(mut self, value: Dotfiles) -> Self {
        self.dotfiles = value;
        self
    }

    pub fn extensions<I, S>(mut self, list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = list.into_iter().map(Into::into).collect();
        self
    }

    pub fn immutable(mut self, value: bool) -> Self {
        self.immutable = value;
        self
    }

    pub fn index<I, S>(mut self, list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index = list.into_iter().map(Into::into).collect();
        self
    }

    pub fn last_modified(mut self, value: bool) -> Self {
        self.last_modified = value;
        self
    }

    /// Set `max-age` in milliseconds, clamped to one year.
    pub fn max_age(mut self, millis: u64) -> Self {
        self.max_age = millis.min(MAX_MAXAGE);
        self
    }

    /// Set the base directory. Relative paths are resolved against the
    /// current directory.
    pub fn root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = Some(absolutize(root.as_ref()));
        self
    }

    /// Restrict the served bytes of the underlying file to `start..=end`.
    pub fn byte_window(mut self, start: u64, end: Option<u64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

// --- getters ---

impl SendOptions {
    pub fn accepts_ranges(&self) -> bool {
        self.accept_ranges
    }

    pub fn emits_cache_control(&self) -> bool {
        self.cache_control
    }

    pub fn emits_etag(&self) -> bool {
        self.etag
    }

    pub fn dotfiles_policy(&self) -> Dotfiles {
        self.dotfiles
    }

    pub fn extension_list(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn index_list(&self) -> &[String] {
        &self.index
    }

    pub fn emits_last_modified(&self) -> bool {
        self.last_modified
    }

    pub fn max_age_millis(&self) -> u64 {
        self.max_age
    }

    pub fn root_dir(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn byte_start(&self) -> u64 {
        self.start
    }

    pub fn byte_end(&self) -> Option<u64> {
        self.end
    }
}

/// A list option as written by a user: `false`, one string, or many.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ListOption {
    Flag(bool),
    One(String),
    Many(Vec<String>),
}

impl ListOption {
    fn normalize(self, name: &'static str) -> Result<Vec<String>, Exception> {
        match self {
            ListOption::Flag(false) => Ok(Vec::new()),
            ListOption::Flag(true) => Err(Exception::InvalidList(name)),
            ListOption::One(s) => Ok(vec![s]),
            ListOption::Many(list) => Ok(list),
        }
    }
}

/// `maxAge` as written by a user: milliseconds, or a duration string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum MaxAge {
    Millis(f64),
    Text(String),
}

impl MaxAge {
    fn is_falsy(&self) -> bool {
        match self {
            MaxAge::Millis(n) => *n == 0.0 || n.is_nan(),
            MaxAge::Text(s) => s.is_empty(),
        }
    }

    /// Milliseconds clamped to `[0, MAX_MAXAGE]`; unparsable text is 0.
    pub fn to_millis(&self) -> u64 {
        let millis = match self {
            MaxAge::Millis(n) => *n,
            MaxAge::Text(s) => match parse_duration_ms(s) {
                Some(n) => n,
                None => {
                    warn!("Unparsable maxAge {:?}, using 0", s);
                    return 0;
                }
            },
        };
        if millis.is_nan() {
            return 0;
        }
        millis.clamp(0.0, MAX_MAXAGE as f64) as u64
    }
}

/// Options exactly as they appear in a config file. Every field is optional;
/// [`SendOptions::from_raw`] fills in the defaults and validates.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawOptions {
    pub accept_ranges: Option<bool>,
    pub cache_control: Option<bool>,
    pub etag: Option<bool>,
    pub dotfiles: Option<String>,
    pub extensions: Option<ListOption>,
    pub immutable: Option<bool>,
    pub index: Option<ListOption>,
    pub last_modified: Option<bool>,
    pub max_age: Option<MaxAge>,
    #[serde(rename = "maxage")]
    pub maxage: Option<MaxAge>,
    pub root: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Application configuration loaded by the binary.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_chunk_size")]
    chunk_size: usize,
    #[serde(default = "default_log_config")]
    log_config: String,
    #[serde(default)]
    send: RawOptions,
}

fn default_chunk_size() -> usize {
    65536 // 64KB
}

fn default_log_config() -> String {
    "config/log4rs.yaml".to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            chunk_size: default_chunk_size(),
            log_config: default_log_config(),
            send: RawOptions::default(),
        }
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let text = fs::read_to_string(filename)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename, e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Exception> {
        let mut config: Config =
            toml::from_str(text).map_err(|e| Exception::ConfigMalformed(e.to_string()))?;
        if config.worker_threads == 0 {
            config.worker_threads = num_cpus::get();
        }
        if config.chunk_size == 0 {
            warn!("chunk_size was set to 0, falling back to {}", default_chunk_size());
            config.chunk_size = default_chunk_size();
        }
        Ok(config)
    }

    pub fn set_root(&mut self, root: &str) {
        self.send.root = Some(root.to_string());
    }

    pub fn send_options(&self) -> Result<SendOptions, Exception> {
        SendOptions::from_raw(self.send.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn log_config(&self) -> &str {
        &self.log_config
    }
}

/// Make `path` absolute against the current directory and normalize it
/// lexically. Never touches the filesystem beyond reading the cwd.
pub(crate) fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(e) => {
                warn!("Couldn't read current directory: {}", e);
                path.to_path_buf()
            }
        }
    };
    normalize_absolute(&joined)
}

/// Collapse `.` and `..` in an absolute path. `..` at the root stays at the root.
pub(crate) fn normalize_absolute(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
