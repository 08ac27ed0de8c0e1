//! # Path resolution
//!
//! Turns the raw request path into a filesystem path:
//!
//! 1. Percent-decode. A malformed escape or invalid UTF-8 is a `400`.
//! 2. Reject embedded NUL bytes (`400`).
//! 3. Without a root, any `..` segment in the decoded path is a `403`. With a
//!    root, normalize structurally and reject any surviving `..` segment
//!    (`403`). This runs on the *unjoined* path, so a traversal can never be
//!    hidden by the join onto `root`.
//! 4. Join onto `root`, or resolve against the current directory when there is
//!    no root.
//! 5. Apply the dotfile policy to the unjoined segments, so the check does not
//!    depend on what `root` itself contains.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use percent_encoding::percent_decode_str;

use crate::config::{absolutize, Dotfiles, SendOptions};
use crate::exception::Terminal;

/// A validated request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    parts: Vec<String>,
    trailing_slash: bool,
}

impl ResolvedPath {
    /// Absolute filesystem path (no trailing separator).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalized segments of the request path, before joining onto `root`.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Whether the request path ended with `/`.
    pub fn has_trailing_slash(&self) -> bool {
        self.trailing_slash
    }
}

pub fn parse_path(raw: &str, options: &SendOptions, id: u128) -> Result<ResolvedPath, Terminal> {
    let decoded = match decode(raw) {
        Some(d) => d,
        None => {
            warn!("[ID{}]Couldn't decode path {:?}", id, raw);
            return Err(Terminal::MalformedInput);
        }
    };

    if decoded.contains('\0') {
        warn!("[ID{}]Path contains a NUL byte: {:?}", id, raw);
        return Err(Terminal::MalformedInput);
    }

    let trailing_slash = decoded.ends_with('/');
    let root = options.root_dir();

    // Without a root nothing bounds the path, so `..` is refused before it
    // can be collapsed away.
    if root.is_none() && decoded.split('/').any(is_up_segment) {
        warn!("[ID{}]Malicious path {:?}", id, decoded);
        return Err(Terminal::Forbidden);
    }

    let absolute = root.is_none() && decoded.starts_with('/');
    let parts = normalize(&decoded);

    if parts.iter().any(|part| is_up_segment(part)) {
        warn!("[ID{}]Malicious path {:?}", id, decoded);
        return Err(Terminal::Forbidden);
    }

    let relative = parts.join("/");
    let path = match root {
        Some(root) if relative.is_empty() => root.to_path_buf(),
        Some(root) => root.join(&relative),
        None if absolute => Path::new("/").join(relative),
        None => absolutize(Path::new(&relative)),
    };

    if contains_dotfile(&parts) {
        match options.dotfiles_policy() {
            Dotfiles::Allow => {}
            Dotfiles::Ignore => {
                debug!("[ID{}]Ignoring dotfile path {:?}", id, decoded);
                return Err(Terminal::NotFound);
            }
            Dotfiles::Deny => {
                warn!("[ID{}]Denying dotfile path {:?}", id, decoded);
                return Err(Terminal::Forbidden);
            }
        }
    }

    debug!("[ID{}]Resolved {:?} to {}", id, raw, path.display());
    Ok(ResolvedPath {
        path,
        parts: parts.into_iter().map(str::to_string).collect(),
        trailing_slash,
    })
}

/// Percent-decode a URI component. `None` on a `%` not followed by two hex
/// digits, or when the decoded bytes are not UTF-8.
fn decode(raw: &str) -> Option<String> {
    let well_formed = raw.match_indices('%').all(|(i, _)| {
        raw.get(i + 1..i + 3)
            .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
    });
    if !well_formed {
        return None;
    }
    percent_decode_str(raw).decode_utf8().ok().map(Cow::into_owned)
}

/// Collapse empty, `.` and `..` segments. A `..` that has nothing left to pop
/// is kept, which is what the traversal check looks for.
fn normalize(path: &str) -> Vec<&str> {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match stack.last() {
                Some(&last) if last != ".." => {
                    stack.pop();
                }
                _ => stack.push(".."),
            },
            other => stack.push(other),
        }
    }
    stack
}

/// A `..` bounded by `/`, `\` or the ends of the segment.
fn is_up_segment(segment: &str) -> bool {
    segment.split('\\').any(|piece| piece == "..")
}

fn contains_dotfile(parts: &[&str]) -> bool {
    parts
        .iter()
        .any(|part| part.len() > 1 && part.starts_with('.') && *part != "..")
}
