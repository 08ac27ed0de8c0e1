use std::time::{Duration, UNIX_EPOCH};

use proptest::prelude::*;
use staticsend::path::parse_path;
use staticsend::range::parse_bytes_range;
use staticsend::validator::weak_etag;
use staticsend::{Dotfiles, SendOptions, Terminal};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,8}"
}

fn rooted() -> SendOptions {
    SendOptions::new().root("/srv/www")
}

fn dotfiles() -> impl Strategy<Value = Dotfiles> {
    prop_oneof![
        Just(Dotfiles::Allow),
        Just(Dotfiles::Ignore),
        Just(Dotfiles::Deny)
    ]
}

proptest! {
    /// Climbing one level more than was descended always escapes the root.
    #[test]
    fn prop_traversal_is_forbidden(
        down in prop::collection::vec(segment(), 0..4),
        tail in prop::collection::vec(segment(), 0..3),
        encode in any::<bool>(),
    ) {
        let up = if encode { "%2e%2e" } else { ".." };
        let mut parts = down.clone();
        parts.extend(std::iter::repeat(up.to_string()).take(down.len() + 1));
        parts.extend(tail);
        let raw = format!("/{}", parts.join("/"));

        prop_assert_eq!(parse_path(&raw, &rooted(), 0), Err(Terminal::Forbidden));
    }

    #[test]
    fn prop_nul_byte_is_malformed(
        before in "[a-z/.]{0,12}",
        after in "[a-z/.]{0,12}",
        policy in dotfiles(),
        with_root in any::<bool>(),
    ) {
        let options = if with_root { rooted() } else { SendOptions::new() };
        let options = options.dotfiles(policy);
        let raw = format!("/{}\0{}", before, after);

        prop_assert_eq!(parse_path(&raw, &options, 0), Err(Terminal::MalformedInput));
    }

    #[test]
    fn prop_resolved_path_stays_under_root(parts in prop::collection::vec(segment(), 1..6)) {
        let raw = format!("/{}", parts.join("/"));
        let resolved = parse_path(&raw, &rooted(), 0).unwrap();
        prop_assert!(resolved.path().starts_with("/srv/www"));
        prop_assert_eq!(resolved.parts(), parts.as_slice());
    }

    #[test]
    fn prop_etag_is_a_function_of_size_and_mtime(
        size in any::<u32>(),
        millis in 0u64..4_102_444_800_000,
        bump in 1u64..1_000_000,
    ) {
        let size = u64::from(size);
        let mtime = Some(UNIX_EPOCH + Duration::from_millis(millis));
        let etag = weak_etag(size, mtime);

        prop_assert_eq!(&etag, &weak_etag(size, mtime));
        prop_assert_ne!(&etag, &weak_etag(size + bump, mtime));
        prop_assert_ne!(
            &etag,
            &weak_etag(size, Some(UNIX_EPOCH + Duration::from_millis(millis + bump)))
        );
        prop_assert!(etag.starts_with("W/\""));
    }

    /// Every surviving range fits the length, and no two touch.
    #[test]
    fn prop_ranges_are_bounded_and_disjoint(
        len in 0u64..2_000,
        specs in prop::collection::vec((proptest::option::of(0u64..3_000), proptest::option::of(0u64..3_000)), 1..6),
    ) {
        let set: Vec<String> = specs
            .iter()
            .map(|(start, end)| {
                format!(
                    "{}-{}",
                    start.map(|s| s.to_string()).unwrap_or_default(),
                    end.map(|e| e.to_string()).unwrap_or_default()
                )
            })
            .collect();
        let header = format!("bytes={}", set.join(","));
        let ranges = parse_bytes_range(len, &header);

        for range in &ranges {
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end < len);
        }
        for (i, a) in ranges.iter().enumerate() {
            for b in ranges.iter().skip(i + 1) {
                prop_assert!(a.end + 1 < b.start || b.end + 1 < a.start);
            }
        }
    }

    #[test]
    fn prop_single_range_is_clamped(len in 1u64..10_000, start in 0u64..10_000, width in 0u64..10_000) {
        let end = start + width;
        let ranges = parse_bytes_range(len, &format!("bytes={}-{}", start, end));
        if start < len {
            prop_assert_eq!(ranges.len(), 1);
            prop_assert_eq!(ranges[0].start, start);
            prop_assert_eq!(ranges[0].end, end.min(len - 1));
        } else {
            prop_assert!(ranges.is_empty());
        }
    }
}
