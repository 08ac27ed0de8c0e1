// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Request descriptor
//!
//! The pipeline needs only two things from a request: the raw requested path
//! and its headers. Header names are stored lowercased so every lookup is
//! case-insensitive; a later value for the same name replaces the earlier one.

use std::collections::HashMap;

use crate::exception::Exception;

#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Raw, still percent-encoded path (no query string).
    path: String,
    /// Lowercased header name to raw header value.
    headers: HashMap<String, String>,
    /// Correlates log lines belonging to one request.
    id: u128,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            headers: HashMap::new(),
            id: 0,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn with_id(mut self, id: u128) -> Self {
        self.id = id;
        self
    }

    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .insert(name.trim().to_ascii_lowercase(), value.into());
    }

    /// Build a request from `"Name: value"` lines.
    pub fn from_header_lines<I, S>(path: &str, lines: I) -> Result<Self, Exception>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::new(path);
        for line in lines {
            let line = line.as_ref();
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Exception::MalformedHeader(line.to_string()))?;
            request.insert_header(name, value.trim());
        }
        Ok(request)
    }
}

impl Request {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> u128 {
        self.id
    }

    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        match self.headers.get(name) {
            Some(v) => Some(v.as_str()),
            None => self
                .headers
                .get(&name.to_ascii_lowercase())
                .map(String::as_str),
        }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_headers() {
        let request = Request::new("/").with_header("If-None-Match", "\"abc\"");

        assert_eq!(request.header("if-none-match"), Some("\"abc\""));
        assert_eq!(request.header("IF-NONE-MATCH"), Some("\"abc\""));
        assert!(request.has_header("If-None-Match"));
        assert!(!request.has_header("range"));
    }

    #[test]
    fn test_later_header_replaces_earlier() {
        let request = Request::new("/")
            .with_header("Range", "bytes=0-1")
            .with_header("range", "bytes=2-3");

        assert_eq!(request.header("range"), Some("bytes=2-3"));
    }

    #[test]
    fn test_from_header_lines() {
        let request = Request::from_header_lines(
            "/name.txt",
            ["Range: bytes=0-1", "If-Range:  Wed, 21 Oct 2015 07:28:00 GMT"],
        )
        .unwrap();

        assert_eq!(request.path(), "/name.txt");
        assert_eq!(request.header("range"), Some("bytes=0-1"));
        assert_eq!(
            request.header("if-range"),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn test_from_header_lines_without_colon() {
        let result = Request::from_header_lines("/", ["Range bytes=0-1"]);
        match result {
            Err(Exception::MalformedHeader(line)) => assert_eq!(line, "Range bytes=0-1"),
            _ => panic!("Expected MalformedHeader error"),
        }
    }

    #[test]
    fn test_path_is_kept_raw() {
        let request = Request::new("/some%20thing.txt").with_id(7);
        assert_eq!(request.path(), "/some%20thing.txt");
        assert_eq!(request.id(), 7);
    }
}
