//! # Byte ranges
//!
//! Only a single satisfiable range is ever served. Several disjoint ranges
//! fall back to the full representation, since multipart bodies are not
//! produced.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::config::SendOptions;
use crate::exception::Terminal;
use crate::param::*;
use crate::request::Request;
use crate::validator::{parse_http_date, Validators};

lazy_static! {
    static ref BYTES_UNIT: Regex = Regex::new(r"(?i)^ *bytes=").unwrap();
}

/// Inclusive, zero-based, relative to the effective length.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Pick the range to serve.
///
/// - `Ok(None)`: serve the full representation (ranges disabled, no usable
///   `Range`, stale `If-Range`, or more than one range).
/// - `Ok(Some(range))`: serve `206` with this range.
/// - `Err(RangeNotSatisfiable)`: nothing in the range set fits.
pub fn select_range(
    request: &Request,
    validators: &Validators,
    options: &SendOptions,
    len: u64,
) -> Result<Option<ByteRange>, Terminal> {
    let id = request.id();
    if !options.accepts_ranges() {
        return Ok(None);
    }
    let header = match request.header(RANGE) {
        Some(value) if BYTES_UNIT.is_match(value) => value,
        _ => return Ok(None),
    };

    if !is_range_fresh(request.header(IF_RANGE), validators) {
        debug!("[ID{}]If-Range is stale, ignoring {:?}", id, header);
        return Ok(None);
    }

    let ranges = parse_bytes_range(len, header);
    match ranges.as_slice() {
        [] => {
            debug!("[ID{}]Unsatisfiable range {:?} for length {}", id, header, len);
            Err(Terminal::RangeNotSatisfiable)
        }
        [range] => {
            debug!("[ID{}]Serving range {}-{}/{}", id, range.start, range.end, len);
            Ok(Some(*range))
        }
        _ => {
            debug!("[ID{}]{} ranges requested, serving full content", id, ranges.len());
            Ok(None)
        }
    }
}

/// Whether the client's copy described by `If-Range` still matches.
pub fn is_range_fresh(if_range: Option<&str>, validators: &Validators) -> bool {
    let Some(value) = if_range else {
        return true;
    };
    let value = value.trim();

    if value.contains('"') {
        return validators.etag() == value;
    }

    match (validators.last_modified(), parse_http_date(value)) {
        (Some(last_modified), Some(date)) => last_modified <= date,
        _ => false,
    }
}

/// Parse a `bytes=` range set against `len` bytes. Unsatisfiable entries are
/// dropped. Overlapping or adjacent ranges are merged, keeping the order in
/// which each merged group first appeared.
pub fn parse_bytes_range(len: u64, header: &str) -> Vec<ByteRange> {
    let Some((_, set)) = header.split_once('=') else {
        return Vec::new();
    };

    let ranges: Vec<ByteRange> = set
        .split(',')
        .filter_map(|spec| parse_range_spec(len, spec.trim()))
        .collect();

    combine(ranges)
}

fn parse_range_spec(len: u64, spec: &str) -> Option<ByteRange> {
    if len == 0 {
        return None;
    }
    let last = len - 1;
    let (first, second) = spec.split_once('-').unwrap_or((spec, ""));
    let first = parse_position(first);
    let second = parse_position(second);

    let (start, end) = match (first, second) {
        // `-suffix`: the final `suffix` bytes. Longer than the content is unsatisfiable.
        (None, Some(0)) => return None,
        (None, Some(suffix)) if suffix > len => return None,
        (None, Some(suffix)) => (len - suffix, last),
        (None, None) => return None,
        (Some(start), None) => (start, last),
        (Some(start), Some(end)) => (start, end.min(last)),
    };

    (start <= end).then_some(ByteRange { start, end })
}

fn parse_position(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn combine(ranges: Vec<ByteRange>) -> Vec<ByteRange> {
    if ranges.len() < 2 {
        return ranges;
    }

    let mut ordered: Vec<(usize, ByteRange)> = ranges.into_iter().enumerate().collect();
    ordered.sort_by_key(|(_, range)| range.start);

    let mut merged: Vec<(usize, ByteRange)> = Vec::with_capacity(ordered.len());
    for (index, range) in ordered {
        match merged.last_mut() {
            Some((first_index, last)) if range.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(range.end);
                *first_index = (*first_index).min(index);
            }
            _ => merged.push((index, range)),
        }
    }

    merged.sort_by_key(|(index, _)| *index);
    merged.into_iter().map(|(_, range)| range).collect()
}
