// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception module
//!
//! Two kinds of failure leave the resolution pipeline:
//!
//! - **`Terminal`**: an expected, request-scoped outcome. Every stage returns
//!   `Result<T, Terminal>` and the orchestrator turns the first one it meets
//!   into the final status code. These are never propagated as errors to the
//!   caller of `send()`.
//! - **`Exception`**: configuration-time failures (rejected before any request
//!   is processed) and the single fatal request-time condition, a directory
//!   requested without a trailing slash.

use std::fmt;
use std::path::PathBuf;

/// A terminal pipeline outcome. Each variant maps to exactly one status code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// Undecodable path or embedded NUL byte. `400 Bad Request`.
    MalformedInput,
    /// Traversal attempt or a dotfile under the `deny` policy. `403 Forbidden`.
    Forbidden,
    /// Nothing to serve: dotfile under `ignore`, no file/index/extension match,
    /// or a benign stat failure. `404 Not Found`.
    NotFound,
    /// Conditional GET cache hit. `304 Not Modified`.
    NotModified,
    /// `If-Match` / `If-Unmodified-Since` violated. `412 Precondition Failed`.
    PreconditionFailed,
    /// `Range` present but no byte range survived. `416 Range Not Satisfiable`.
    RangeNotSatisfiable,
    /// Unclassified stat failure. `500 Internal Server Error`.
    InternalError,
}

impl Terminal {
    pub fn status(self) -> u16 {
        match self {
            Terminal::MalformedInput => 400,
            Terminal::Forbidden => 403,
            Terminal::NotFound => 404,
            Terminal::NotModified => 304,
            Terminal::PreconditionFailed => 412,
            Terminal::RangeNotSatisfiable => 416,
            Terminal::InternalError => 500,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::MalformedInput => write!(f, "Malformed request path (400)"),
            Terminal::Forbidden => write!(f, "Forbidden (403)"),
            Terminal::NotFound => write!(f, "File not found (404)"),
            Terminal::NotModified => write!(f, "Not modified (304)"),
            Terminal::PreconditionFailed => write!(f, "Precondition failed (412)"),
            Terminal::RangeNotSatisfiable => write!(f, "Range not satisfiable (416)"),
            Terminal::InternalError => write!(f, "Internal error (500)"),
        }
    }
}

/// Failures that are not request outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exception {
    /// `dotfiles` was something other than `allow`, `ignore` or `deny`.
    InvalidDotfiles(String),
    /// A list option (`extensions`, `index`) was neither `false`, a string,
    /// nor a list of strings. Carries the option name.
    InvalidList(&'static str),
    /// The configuration file could not be read.
    ConfigUnreadable(String),
    /// The configuration file is not valid TOML for [`crate::config::Config`].
    ConfigMalformed(String),
    /// A header line given to [`crate::request::Request::from_header_lines`]
    /// had no `:` separator.
    MalformedHeader(String),
    /// The located file is a directory and the request had no trailing slash.
    /// The caller should have redirected to the slash-suffixed URL; the core
    /// refuses to guess a `Location`.
    RedirectNotImplemented(PathBuf),
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidDotfiles(value) => write!(
                f,
                "dotfiles option must be \"allow\", \"deny\", or \"ignore\", got \"{}\"",
                value
            ),
            InvalidList(name) => write!(f, "{} must be array of strings or false", name),
            ConfigUnreadable(reason) => write!(f, "Couldn't read config file: {}", reason),
            ConfigMalformed(reason) => write!(f, "Couldn't parse config file: {}", reason),
            MalformedHeader(line) => write!(f, "Header line has no ':' separator: {}", line),
            RedirectNotImplemented(path) => write!(
                f,
                "Not implemented: redirect for directory {}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Exception {}
