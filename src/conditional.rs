//! # Conditional GET
//!
//! Precondition failures (`412`) are checked first, then freshness (`304`).
//! Requests without any of `If-Match`, `If-Unmodified-Since`, `If-None-Match`
//! or `If-Modified-Since` pass straight through.

use log::debug;

use crate::exception::Terminal;
use crate::param::*;
use crate::request::Request;
use crate::validator::{parse_http_date, Validators};

pub fn evaluate(request: &Request, validators: &Validators) -> Result<(), Terminal> {
    let id = request.id();
    if !is_conditional(request) {
        return Ok(());
    }

    if is_precondition_failure(request, validators) {
        debug!("[ID{}]Precondition failed", id);
        return Err(Terminal::PreconditionFailed);
    }

    if is_fresh(request, validators) {
        debug!("[ID{}]Not modified", id);
        return Err(Terminal::NotModified);
    }

    Ok(())
}

fn is_conditional(request: &Request) -> bool {
    [IF_MATCH, IF_UNMODIFIED_SINCE, IF_NONE_MATCH, IF_MODIFIED_SINCE]
        .iter()
        .any(|name| request.has_header(name))
}

fn is_precondition_failure(request: &Request, validators: &Validators) -> bool {
    if let Some(value) = request.header(IF_MATCH) {
        if value.trim() != "*" && !any_token_matches(value, validators.etag()) {
            return true;
        }
    }

    // An unparsable If-Unmodified-Since is ignored.
    if let Some(since) = request.header(IF_UNMODIFIED_SINCE).and_then(parse_http_date) {
        return match validators.last_modified() {
            Some(last_modified) => last_modified > since,
            None => true,
        };
    }

    false
}

fn is_fresh(request: &Request, validators: &Validators) -> bool {
    if request.header(CACHE_CONTROL).is_some_and(has_no_cache) {
        return false;
    }

    if let Some(value) = request.header(IF_NONE_MATCH) {
        return value.trim() == "*" || any_token_matches(value, validators.etag());
    }

    match request.header(IF_MODIFIED_SINCE) {
        Some(value) => match (validators.last_modified(), parse_http_date(value)) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last_modified), Some(since)) => last_modified <= since,
        },
        None => false,
    }
}

fn has_no_cache(cache_control: &str) -> bool {
    cache_control
        .split(',')
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}

fn any_token_matches(list: &str, etag: &str) -> bool {
    parse_token_list(list)
        .into_iter()
        .any(|token| etag_matches(token, etag))
}

/// A token matches verbatim or once given the weak prefix.
fn etag_matches(token: &str, etag: &str) -> bool {
    token == etag || etag.strip_prefix("W/") == Some(token)
}

/// Split an entity-tag list on commas and spaces.
pub(crate) fn parse_token_list(value: &str) -> Vec<&str> {
    value
        .split([',', ' '])
        .filter(|token| !token.is_empty())
        .collect()
}
