//! # Response assembly
//!
//! [`send`] runs the resolution stages in order against one request:
//!
//! ```text
//! parse_path -> locate -> Validators::derive -> conditional::evaluate
//!            -> select_range -> ByteStream
//! ```
//!
//! Each stage returns `Result<_, Terminal>`; the first terminal outcome
//! finishes the [`ResponseContext`] and nothing after it runs. Headers set
//! before that point stay on the response.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use log::{debug, error, info};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};

use crate::conditional;
use crate::config::SendOptions;
use crate::exception::{Exception, Terminal};
use crate::locate::locate;
use crate::param::*;
use crate::path::parse_path;
use crate::range::{select_range, ByteRange};
use crate::request::Request;
use crate::validator::{effective_length, representation_headers, Validators};

/// Response headers in insertion order. Names are stored lowercase and
/// setting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let index = self.entries.iter().position(|(n, _)| *n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A not-yet-opened window `[start, end]` of a file. Nothing touches the
/// filesystem until [`ByteStream::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteStream {
    path: PathBuf,
    start: u64,
    /// Inclusive. `None` reads to the end of the file.
    end: Option<u64>,
}

impl ByteStream {
    pub fn new(path: PathBuf, start: u64, end: Option<u64>) -> Self {
        Self { path, start, end }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> Option<u64> {
        self.end
    }

    /// Number of bytes in the window, when it is bounded.
    pub fn len(&self) -> Option<u64> {
        self.end
            .map(|end| end.saturating_add(1).saturating_sub(self.start))
    }

    /// Open the file, seek to `start` and bound the reader at `end`.
    pub async fn open(&self) -> io::Result<Take<File>> {
        let mut file = File::open(&self.path).await?;
        if self.start > 0 {
            file.seek(SeekFrom::Start(self.start)).await?;
        }
        Ok(file.take(self.len().unwrap_or(u64::MAX)))
    }

    pub async fn read_all(&self) -> io::Result<Bytes> {
        let mut reader = self.open().await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

/// Per-request accumulator. Once a status is set the context is finished and
/// later header and stream updates are ignored.
#[derive(Debug, Default)]
pub struct ResponseContext {
    status: Option<u16>,
    headers: Headers,
    range: Option<ByteRange>,
    stream: Option<ByteStream>,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_some()
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        if !self.is_finished() {
            self.headers.insert(name, value);
        }
    }

    pub fn set_range(&mut self, range: ByteRange) {
        if !self.is_finished() {
            self.range = Some(range);
        }
    }

    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    pub fn set_stream(&mut self, stream: ByteStream) {
        if !self.is_finished() {
            self.stream = Some(stream);
        }
    }

    pub fn finish(&mut self, status: u16) {
        if !self.is_finished() {
            self.status = Some(status);
        }
    }

    /// Finish with a terminal outcome. A `304` carries no representation
    /// metadata, and no terminal outcome carries a body.
    pub fn terminate(&mut self, terminal: Terminal) {
        if self.is_finished() {
            return;
        }
        if terminal == Terminal::NotModified {
            for name in [CONTENT_TYPE, CONTENT_LENGTH, CONTENT_RANGE] {
                self.headers.remove(name);
            }
        }
        self.stream = None;
        self.finish(terminal.status());
    }

    fn into_response(self) -> SendResponse {
        let status = self.status.unwrap_or_else(|| {
            error!("Response context was never finished");
            Terminal::InternalError.status()
        });
        SendResponse {
            status,
            headers: self.headers,
            stream: self.stream,
        }
    }
}

#[derive(Debug)]
pub struct SendResponse {
    status: u16,
    headers: Headers,
    stream: Option<ByteStream>,
}

impl SendResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase for the status code.
    pub fn reason(&self) -> &'static str {
        STATUS_CODES.get(&self.status).copied().unwrap_or("")
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn stream(&self) -> Option<&ByteStream> {
        self.stream.as_ref()
    }

    pub fn into_parts(self) -> (u16, Headers, Option<ByteStream>) {
        (self.status, self.headers, self.stream)
    }
}

enum Halt {
    Terminal(Terminal),
    Fatal(Exception),
}

impl From<Terminal> for Halt {
    fn from(terminal: Terminal) -> Self {
        Halt::Terminal(terminal)
    }
}

/// Resolve `request` against `options` into a status, headers and a lazy
/// body.
///
/// Expected outcomes (`304`, `404`, `416`, ...) come back as `Ok` with the
/// matching status. The only `Err` is
/// [`Exception::RedirectNotImplemented`]: the request named a directory
/// without a trailing slash, and the caller is expected to redirect.
pub async fn send(request: &Request, options: &SendOptions) -> Result<SendResponse, Exception> {
    let id = request.id();
    let mut ctx = ResponseContext::new();

    match run(request, options, &mut ctx).await {
        Ok(()) => {}
        Err(Halt::Terminal(terminal)) => {
            debug!("[ID{}]{}: {}", id, request.path(), terminal);
            ctx.terminate(terminal);
        }
        Err(Halt::Fatal(e)) => {
            error!("[ID{}]{}", id, e);
            return Err(e);
        }
    }

    let response = ctx.into_response();
    info!(
        "[ID{}]{} {} {}",
        id,
        response.status(),
        response.reason(),
        request.path()
    );
    Ok(response)
}

async fn run(request: &Request, options: &SendOptions, ctx: &mut ResponseContext) -> Result<(), Halt> {
    let id = request.id();

    let resolved = parse_path(request.path(), options, id)?;
    let located = locate(&resolved, options, id).await?;
    if located.metadata.is_dir {
        return Err(Halt::Fatal(Exception::RedirectNotImplemented(located.path)));
    }

    let validators = Validators::derive(&located.metadata);
    for (name, value) in representation_headers(&located.path, &validators, options) {
        ctx.set_header(name, value);
    }

    conditional::evaluate(request, &validators)?;

    let len = effective_length(located.metadata.size, options);
    let start = options.byte_start();
    let (status, stream) = match select_range(request, &validators, options, len) {
        Ok(Some(range)) => {
            ctx.set_range(range);
            ctx.set_header(
                CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, len),
            );
            ctx.set_header(CONTENT_LENGTH, range.len().to_string());
            let stream = ByteStream::new(
                located.path,
                start + range.start,
                Some(start + range.end),
            );
            (206, stream)
        }
        Ok(None) => {
            ctx.set_header(CONTENT_LENGTH, len.to_string());
            (200, ByteStream::new(located.path, start, options.byte_end()))
        }
        Err(terminal) => {
            ctx.set_header(CONTENT_RANGE, format!("bytes */{}", len));
            return Err(terminal.into());
        }
    };

    ctx.set_stream(stream);
    ctx.finish(status);
    Ok(())
}
