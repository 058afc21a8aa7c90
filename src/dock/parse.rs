// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Parse dockutil listing output.
//!
//! Running `dockutil --list` prints one tab-separated row per Dock tile:
//!
//! ```text
//! Safari	file:///Applications/Safari.app/	persistentApps	/Users/blah/Library/Preferences/com.apple.dock.plist
//! ```
//!
//! The columns are label, encoded path or URL, section marker, and the
//! preference file the tile came from. The format is not contractually
//! stable, so rows that do not split into enough columns are skipped instead
//! of treated as errors.
//!
//! # Type Inference
//!
//! The listing carries no explicit item type. The kind of each tile is
//! guessed from its target, checked in order:
//!
//! 1. Ends with `.app` means an application.
//! 2. Starts with `http://` or `https://` means a URL.
//! 3. Contains `spacer`, or has no target at all, means a spacer.
//! 4. Anything else is a folder.
//!
//! This is a known approximation. A folder named `Notes.app` will be reported
//! as an application, and a folder whose path mentions "spacer" will be
//! reported as a spacer. There is no stronger signal to be had from the tool.

use crate::dock::model::{DockEntry, DockItemKind, DockSection};

use tracing::debug;

/// Section marker of tiles the user pinned.
pub const PINNED_SECTION: &str = "persistentApps";

/// Fewest columns a usable row can have: label, target, and section.
pub const MIN_COLUMNS: usize = 3;

const APP_BUNDLE_SUFFIX: &str = ".app";
const FILE_SCHEME: &str = "file://";

/// Parse raw `dockutil --list` output into pinned Dock entries.
///
/// Order of the returned entries matches the order of the rows.
pub fn parse_dock_list(raw: &str) -> Vec<DockEntry> {
    let mut entries = Vec::new();
    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let columns = line.split('\t').collect::<Vec<_>>();
        if columns.len() < MIN_COLUMNS {
            debug!("skip malformed dock row {line:?}");
            continue;
        }

        if columns[2] != PINNED_SECTION {
            debug!("skip non-pinned dock row {line:?}");
            continue;
        }

        let target = normalize_target(columns[1]);
        entries.push(DockEntry {
            kind: infer_kind(&target),
            name: columns[0].to_string(),
            target,
            section: DockSection::Apps,
        });
    }

    entries
}

/// Normalize encoded tile target.
///
/// File URLs lose their scheme, get percent-decoded, and lose trailing
/// slashes (except for the root slash). Web URLs are kept verbatim.
pub fn normalize_target(raw: &str) -> String {
    let Some(path) = raw.strip_prefix(FILE_SCHEME) else {
        return raw.to_string();
    };

    // INVARIANT: Drop "localhost" authority so only the absolute path remains.
    let path = path.strip_prefix("localhost").unwrap_or(path);
    let mut path = percent_decode(path);
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    path
}

/// Guess item kind from normalized target.
pub fn infer_kind(target: &str) -> DockItemKind {
    if target.ends_with(APP_BUNDLE_SUFFIX) {
        DockItemKind::App
    } else if target.starts_with("http://") || target.starts_with("https://") {
        DockItemKind::Url
    } else if target.is_empty() || target.contains("spacer") {
        DockItemKind::Spacer
    } else {
        DockItemKind::Folder
    }
}

fn percent_decode(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' && index + 2 < bytes.len() {
            let high = hex_value(bytes[index + 1]);
            let low = hex_value(bytes[index + 2]);
            if let (Some(high), Some(low)) = (high, low) {
                decoded.push(high << 4 | low);
                index += 3;
                continue;
            }
        }

        decoded.push(bytes[index]);
        index += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test]
    fn parse_single_pinned_app() {
        let raw = "Safari\tfile:///Applications/Safari.app/\tpersistentApps\t/Users/blah/Library/Preferences/com.apple.dock.plist\n";
        let result = parse_dock_list(raw);
        let expect = vec![DockEntry::app("Safari", "/Applications/Safari.app")];
        assert_eq!(result, expect);
    }

    #[test]
    fn parse_drops_non_pinned_rows() {
        let raw = indoc! {"
            Safari\tfile:///Applications/Safari.app/\tpersistentApps\t/plist
            Downloads\tfile:///Users/blah/Downloads/\tpersistentOthers\t/plist
            Notes\tfile:///System/Applications/Notes.app/\trecentApps\t/plist
            Mail\tfile:///System/Applications/Mail.app/\tpersistentApps\t/plist
        "};
        let result = parse_dock_list(raw);
        let expect = vec![
            DockEntry::app("Safari", "/Applications/Safari.app"),
            DockEntry::app("Mail", "/System/Applications/Mail.app"),
        ];
        assert_eq!(result, expect);
    }

    #[test]
    fn parse_skips_rows_missing_columns() {
        let raw = indoc! {"
            Safari\tfile:///Applications/Safari.app/
            garbage
            Mail\tfile:///System/Applications/Mail.app/\tpersistentApps
        "};
        let result = parse_dock_list(raw);
        let expect = vec![DockEntry::app("Mail", "/System/Applications/Mail.app")];
        assert_eq!(result, expect);
    }

    #[test]
    fn parse_keeps_row_order_and_duplicates() {
        let raw = indoc! {"
            Mail\tfile:///System/Applications/Mail.app/\tpersistentApps\t/plist
            \tspacer-tile\tpersistentApps\t/plist
            Mail\tfile:///System/Applications/Mail.app/\tpersistentApps\t/plist
            Docs\thttps://docs.rs/\tpersistentApps\t/plist
        "};
        let result = parse_dock_list(raw);
        let expect = vec![
            DockEntry::app("Mail", "/System/Applications/Mail.app"),
            DockEntry::new(DockItemKind::Spacer, "", "spacer-tile"),
            DockEntry::app("Mail", "/System/Applications/Mail.app"),
            DockEntry::url("Docs", "https://docs.rs/"),
        ];
        assert_eq!(result, expect);
    }

    #[test]
    fn parse_empty_output() {
        assert!(parse_dock_list("").is_empty());
        assert!(parse_dock_list("\n\r\n").is_empty());
    }

    #[test_case("file:///Applications/Safari.app/", "/Applications/Safari.app"; "strip scheme and trailing slash")]
    #[test_case("file:///", "/"; "keep root slash")]
    #[test_case("file:///Users/blah/My%20Stuff//", "/Users/blah/My Stuff"; "percent decode")]
    #[test_case("file://localhost/Applications/Xcode.app/", "/Applications/Xcode.app"; "drop localhost")]
    #[test_case("file:///Users/blah/100%25%zz", "/Users/blah/100%%zz"; "keep bad escapes")]
    #[test_case("file:///Users/bl%C3%A5h", "/Users/blåh"; "decode utf8")]
    #[test_case("https://docs.rs/", "https://docs.rs/"; "leave web urls alone")]
    #[test]
    fn normalize_encoded_targets(raw: &str, expect: &str) {
        pretty_assertions::assert_eq!(normalize_target(raw), expect);
    }

    #[test_case("/Applications/Safari.app", DockItemKind::App; "app bundle")]
    #[test_case("https://docs.rs", DockItemKind::Url; "https url")]
    #[test_case("http://example.com", DockItemKind::Url; "http url")]
    #[test_case("spacer-tile", DockItemKind::Spacer; "spacer token")]
    #[test_case("", DockItemKind::Spacer; "no target")]
    #[test_case("/Users/blah/Downloads", DockItemKind::Folder; "folder fallback")]
    #[test_case("https://example.com/Tool.app", DockItemKind::App; "app suffix wins")]
    #[test]
    fn infer_kind_from_target(target: &str, expect: DockItemKind) {
        pretty_assertions::assert_eq!(infer_kind(target), expect);
    }
}
