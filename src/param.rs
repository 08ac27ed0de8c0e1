// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Protocol parameters and constants
//!
//! - Reason phrases for the status codes the pipeline can produce.
//! - The extension-to-MIME table used to derive `Content-Type`.
//! - Canonical (lowercase) names of every header the pipeline reads or emits.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Largest accepted `maxAge`, in milliseconds (one 365-day year).
pub const MAX_MAXAGE: u64 = 60 * 60 * 24 * 365 * 1000;

/// Content type used when the extension is unknown.
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Appended to UTF-8 text families.
pub const UTF8_CHARSET: &str = "; charset=UTF-8";

/// Emitted header names.
pub const ACCEPT_RANGES: &str = "accept-ranges";
pub const CACHE_CONTROL: &str = "cache-control";
pub const LAST_MODIFIED: &str = "last-modified";
pub const ETAG: &str = "etag";
pub const CONTENT_TYPE: &str = "content-type";
pub const CONTENT_RANGE: &str = "content-range";
pub const CONTENT_LENGTH: &str = "content-length";

/// Request header names.
pub const IF_MATCH: &str = "if-match";
pub const IF_NONE_MATCH: &str = "if-none-match";
pub const IF_MODIFIED_SINCE: &str = "if-modified-since";
pub const IF_UNMODIFIED_SINCE: &str = "if-unmodified-since";
pub const IF_RANGE: &str = "if-range";
pub const RANGE: &str = "range";

lazy_static! {
    /// Status codes produced by `send()` and their reason phrases.
    ///
    /// See [RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html).
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(200, "OK");
        map.insert(206, "Partial Content");
        map.insert(304, "Not Modified");
        map.insert(400, "Bad Request");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(412, "Precondition Failed");
        map.insert(416, "Range Not Satisfiable");
        map.insert(500, "Internal Server Error");
        map
    };
}

lazy_static! {
    /// File extension to MIME type. Lookups are by lowercased extension.
    ///
    /// Entries carry no charset parameter; `validator::content_type` appends
    /// one for UTF-8 text families.
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("aac", "audio/aac");
        map.insert("apk", "application/vnd.android.package-archive");
        map.insert("avi", "video/x-msvideo");
        map.insert("avif", "image/avif");
        map.insert("bin", "application/octet-stream");
        map.insert("bmp", "image/bmp");
        map.insert("bz", "application/x-bzip");
        map.insert("bz2", "application/x-bzip2");
        map.insert("css", "text/css");
        map.insert("csv", "text/csv");
        map.insert("deb", "application/x-deb");
        map.insert("doc", "application/msword");
        map.insert(
            "docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        );
        map.insert("eot", "application/vnd.ms-fontobject");
        map.insert("epub", "application/epub+zip");
        map.insert("gif", "image/gif");
        map.insert("gz", "application/gzip");
        map.insert("htm", "text/html");
        map.insert("html", "text/html");
        map.insert("ico", "image/x-icon");
        map.insert("ics", "text/calendar");
        map.insert("iso", "application/x-iso9660-image");
        map.insert("jar", "application/java-archive");
        map.insert("jpeg", "image/jpeg");
        map.insert("jpg", "image/jpeg");
        map.insert("js", "application/javascript");
        map.insert("json", "application/json");
        map.insert("jsonld", "application/ld+json");
        map.insert("md", "text/markdown");
        map.insert("mid", "audio/midi");
        map.insert("midi", "audio/midi");
        map.insert("mjs", "application/javascript");
        map.insert("mkv", "video/x-matroska");
        map.insert("mp3", "audio/mpeg");
        map.insert("mp4", "video/mp4");
        map.insert("mpeg", "video/mpeg");
        map.insert("oga", "audio/ogg");
        map.insert("ogv", "video/ogg");
        map.insert("opus", "audio/opus");
        map.insert("otf", "font/otf");
        map.insert("pdf", "application/pdf");
        map.insert("png", "image/png");
        map.insert("rar", "application/x-rar-compressed");
        map.insert("rtf", "application/rtf");
        map.insert("sh", "application/x-sh");
        map.insert("svg", "image/svg+xml");
        map.insert("tar", "application/x-tar");
        map.insert("tif", "image/tiff");
        map.insert("tiff", "image/tiff");
        map.insert("ttf", "font/ttf");
        map.insert("txt", "text/plain");
        map.insert("wasm", "application/wasm");
        map.insert("wav", "audio/wav");
        map.insert("weba", "audio/webm");
        map.insert("webm", "video/webm");
        map.insert("webp", "image/webp");
        map.insert("woff", "font/woff");
        map.insert("woff2", "font/woff2");
        map.insert("xhtml", "application/xhtml+xml");
        map.insert("xml", "text/xml");
        map.insert("yaml", "text/yaml");
        map.insert("yml", "text/yaml");
        map.insert("zip", "application/zip");
        map.insert("7z", "application/x-7z-compressed");
        map
    };
}
