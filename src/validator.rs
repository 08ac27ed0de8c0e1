//! # Validators and representation headers
//!
//! Everything here is a pure function of the located file's metadata and the
//! mount options. [`Validators`] are always computed from metadata; the
//! `etag`/`lastModified` options only decide whether they are emitted as
//! headers. Last-Modified is unknown only when the platform can't report a
//! modification time.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::config::SendOptions;
use crate::locate::FileMetadata;
use crate::param::*;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    etag: String,
    last_modified: Option<DateTime<Utc>>,
}

impl Validators {
    pub fn derive(metadata: &FileMetadata) -> Self {
        Self {
            etag: weak_etag(metadata.size, metadata.modified),
            last_modified: metadata.modified.map(to_http_precision),
        }
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Last-Modified at the one-second precision of its header form.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }
}

/// `W/"<hex size>-<hex mtime in ms>"`. An unknown mtime counts as zero.
pub fn weak_etag(size: u64, modified: Option<SystemTime>) -> String {
    let millis = modified
        .map(|m| DateTime::<Utc>::from(m).timestamp_millis())
        .unwrap_or(0);
    let mtime = if millis < 0 {
        format!("-{:x}", millis.unsigned_abs())
    } else {
        format!("{:x}", millis)
    };
    format!("W/\"{:x}-{}\"", size, mtime)
}

fn to_http_precision(modified: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(modified).trunc_subsecs(0)
}

pub fn http_date(date: &DateTime<Utc>) -> String {
    date.format(HTTP_DATE).to_string()
}

/// Parse an HTTP date in any of the three formats RFC 9110 requires a
/// recipient to accept. `None` when the value is not a date.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    [RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// MIME type by extension, with `; charset=UTF-8` for text families.
pub fn content_type(path: &Path) -> String {
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| MIME_TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(DEFAULT_MIME);

    if is_utf8_family(mime) {
        format!("{}{}", mime, UTF8_CHARSET)
    } else {
        mime.to_string()
    }
}

fn is_utf8_family(mime: &str) -> bool {
    mime.starts_with("text/") || mime == "application/javascript" || mime == "application/json"
}

pub fn cache_control(options: &SendOptions) -> String {
    let mut value = format!("public, max-age={}", options.max_age_millis() / 1000);
    if options.is_immutable() {
        value.push_str(", immutable");
    }
    value
}

/// Size after the configured `start`/`end` window is applied.
pub fn effective_length(size: u64, options: &SendOptions) -> u64 {
    let start = options.byte_start();
    let len = size.saturating_sub(start);
    match options.byte_end() {
        Some(end) => len.min(end.saturating_add(1).saturating_sub(start)),
        None => len,
    }
}

/// Headers describing the representation, in emission order.
pub fn representation_headers(
    path: &Path,
    validators: &Validators,
    options: &SendOptions,
) -> Vec<(&'static str, String)> {
    let mut headers = Vec::with_capacity(5);
    if options.accepts_ranges() {
        headers.push((ACCEPT_RANGES, "bytes".to_string()));
    }
    if options.emits_cache_control() {
        headers.push((CACHE_CONTROL, cache_control(options)));
    }
    if options.emits_last_modified() {
        if let Some(date) = validators.last_modified() {
            headers.push((LAST_MODIFIED, http_date(&date)));
        }
    }
    if options.emits_etag() {
        headers.push((ETAG, validators.etag().to_string()));
    }
    headers.push((CONTENT_TYPE, content_type(path)));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::{Duration, UNIX_EPOCH};

    fn metadata(size: u64, millis: u64) -> FileMetadata {
        FileMetadata {
            size,
            modified: Some(UNIX_EPOCH + Duration::from_millis(millis)),
            is_dir: false,
        }
    }

    #[test]
    fn test_weak_etag_format() {
        let modified = Some(UNIX_EPOCH + Duration::from_millis(0x17f_0000_0000));
        assert_eq!(weak_etag(4, modified), "W/\"4-17f00000000\"");
        assert_eq!(weak_etag(255, None), "W/\"ff-0\"");
    }

    #[test]
    fn test_weak_etag_changes_with_inputs() {
        let a = weak_etag(4, Some(UNIX_EPOCH + Duration::from_millis(1000)));
        assert_eq!(a, weak_etag(4, Some(UNIX_EPOCH + Duration::from_millis(1000))));
        assert_ne!(a, weak_etag(5, Some(UNIX_EPOCH + Duration::from_millis(1000))));
        assert_ne!(a, weak_etag(4, Some(UNIX_EPOCH + Duration::from_millis(1001))));
    }

    #[test]
    fn test_http_date_round_trip() {
        let date = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        let text = http_date(&date);
        assert_eq!(text, "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_http_date(&text), Some(date));
    }

    #[test]
    fn test_parse_obsolete_date_formats() {
        let date = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(date));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(date));
    }

    #[test]
    fn test_parse_garbage_date() {
        assert_eq!(parse_http_date("foo"), None);
        assert_eq!(parse_http_date(""), None);
        assert_eq!(parse_http_date("\"abc\""), None);
    }

    #[test]
    fn test_last_modified_is_truncated_to_seconds() {
        let validators = Validators::derive(&metadata(4, 1_445_412_480_750));
        let expected = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(validators.last_modified(), Some(expected));
    }

    #[test]
    fn test_validators_ignore_header_switches() {
        let validators = Validators::derive(&metadata(4, 1000));
        let modified = Some(UNIX_EPOCH + Duration::from_millis(1000));
        assert_eq!(validators.etag(), weak_etag(4, modified));
        assert_eq!(validators.last_modified(), Some(Utc.timestamp_opt(1, 0).unwrap()));
    }

    #[test]
    fn test_unknown_mtime() {
        let metadata = FileMetadata {
            size: 4,
            modified: None,
            is_dir: false,
        };
        let validators = Validators::derive(&metadata);
        assert_eq!(validators.etag(), "W/\"4-0\"");
        assert_eq!(validators.last_modified(), None);
        let headers = representation_headers(Path::new("a.txt"), &validators, &SendOptions::new());
        assert!(headers.iter().all(|(name, _)| *name != LAST_MODIFIED));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("name.txt")), "text/plain; charset=UTF-8");
        assert_eq!(content_type(Path::new("INDEX.HTML")), "text/html; charset=UTF-8");
        assert_eq!(
            content_type(Path::new("app.js")),
            "application/javascript; charset=UTF-8"
        );
        assert_eq!(content_type(Path::new("logo.png")), "image/png");
        assert_eq!(content_type(Path::new("blob")), DEFAULT_MIME);
        assert_eq!(content_type(Path::new("file.unknownext")), DEFAULT_MIME);
    }

    #[test]
    fn test_cache_control() {
        assert_eq!(cache_control(&SendOptions::new()), "public, max-age=0, immutable");
        let options = SendOptions::new().max_age(90_500).immutable(false);
        assert_eq!(cache_control(&options), "public, max-age=90");
    }

    #[test]
    fn test_effective_length() {
        let options = SendOptions::new();
        assert_eq!(effective_length(10, &options), 10);
        assert_eq!(effective_length(10, &options.clone().byte_window(3, None)), 7);
        assert_eq!(effective_length(10, &options.clone().byte_window(3, Some(5))), 3);
        assert_eq!(effective_length(10, &options.clone().byte_window(3, Some(50))), 7);
        assert_eq!(effective_length(10, &options.clone().byte_window(20, None)), 0);
        assert_eq!(effective_length(10, &options.byte_window(5, Some(2))), 0);
    }

    #[test]
    fn test_effective_length_with_max_end() {
        let options = SendOptions::new().byte_window(0, Some(u64::MAX));
        assert_eq!(effective_length(4, &options), 4);
        let options = SendOptions::new().byte_window(1, Some(u64::MAX));
        assert_eq!(effective_length(4, &options), 3);
    }

    #[test]
    fn test_representation_headers_order() {
        let validators = Validators::derive(&metadata(4, 1000));
        let headers = representation_headers(Path::new("a.txt"), &validators, &SendOptions::new());
        let names: Vec<_> = headers.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [ACCEPT_RANGES, CACHE_CONTROL, LAST_MODIFIED, ETAG, CONTENT_TYPE]
        );
    }

    #[test]
    fn test_representation_headers_respect_switches() {
        let options = SendOptions::new()
            .accept_ranges(false)
            .cache_control(false)
            .etag(false)
            .last_modified(false);
        let validators = Validators::derive(&metadata(4, 1000));
        let headers = representation_headers(Path::new("a.txt"), &validators, &options);
        assert_eq!(headers, [(CONTENT_TYPE, "text/plain; charset=UTF-8".to_string())]);
    }
}
