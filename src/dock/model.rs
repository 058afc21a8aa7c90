// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Transient Dock data.
//!
//! Everything in here is built fresh for one read or write, handed to the
//! caller, and dropped. Nothing carries a database identity; equality is
//! purely structural.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Kind of item pinned to the Dock.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DockItemKind {
    /// Application bundle.
    #[default]
    App,

    /// Directory shown as a folder stack.
    Folder,

    /// Web shortcut.
    Url,

    /// Empty tile that only occupies space.
    Spacer,
}

impl Display for DockItemKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let kind = match self {
            Self::App => "app",
            Self::Folder => "folder",
            Self::Url => "url",
            Self::Spacer => "spacer",
        };
        fmt.write_str(kind)
    }
}

/// Section of the Dock an item lives in.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DockSection {
    /// Left or top of the divider.
    #[default]
    Apps,

    /// Right or bottom of the divider.
    Others,
}

impl Display for DockSection {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Apps => fmt.write_str("apps"),
            Self::Others => fmt.write_str("others"),
        }
    }
}

/// A single Dock item.
///
/// # Invariant
///
/// - Target is non-empty for apps, folders, and URLs. Spacers may leave it
///   empty.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DockEntry {
    pub kind: DockItemKind,
    pub name: String,
    pub target: String,
    pub section: DockSection,
}

impl DockEntry {
    /// Construct new Dock entry in the apps section.
    pub fn new(kind: DockItemKind, name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            target: target.into(),
            section: DockSection::Apps,
        }
    }

    /// Construct new application entry.
    pub fn app(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(DockItemKind::App, name, path)
    }

    /// Construct new folder entry.
    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(DockItemKind::Folder, name, path)
    }

    /// Construct new web shortcut entry.
    pub fn url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(DockItemKind::Url, name, url)
    }

    /// Construct new spacer entry.
    pub fn spacer() -> Self {
        Self::new(DockItemKind::Spacer, "", "")
    }

    /// Place entry in a different Dock section.
    pub fn in_section(mut self, section: DockSection) -> Self {
        self.section = section;
        self
    }

    /// Identity used when matching entries against each other.
    ///
    /// Spacers have no stable identity, so they can only be matched by
    /// position.
    pub fn identity(&self) -> Option<(DockItemKind, &str)> {
        match self.kind {
            DockItemKind::Spacer => None,
            kind => Some((kind, self.target.as_str())),
        }
    }
}

impl Display for DockEntry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self.kind {
            DockItemKind::Spacer => write!(fmt, "[{}]", self.kind),
            _ => write!(fmt, "[{}] {} ({})", self.kind, self.name, self.target),
        }
    }
}

/// What the Dock looked like at one point in time.
///
/// Never cached across calls, because the Dock can change at any moment
/// outside of this process.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DockSnapshot {
    entries: Vec<DockEntry>,
}

impl DockSnapshot {
    /// Construct new snapshot out of entries in Dock order.
    pub fn new(entries: Vec<DockEntry>) -> Self {
        Self { entries }
    }

    /// Entries in Dock order.
    pub fn entries(&self) -> &[DockEntry] {
        self.entries.as_slice()
    }

    /// Consume into entries in Dock order.
    pub fn into_entries(self) -> Vec<DockEntry> {
        self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in Dock order.
    pub fn iter(&self) -> impl Iterator<Item = &DockEntry> {
        self.entries.iter()
    }
}

impl FromIterator<DockEntry> for DockSnapshot {
    fn from_iter<I: IntoIterator<Item = DockEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Desired final state of the Dock.
///
/// Entry order is the intended Dock order. The caller derives positions
/// before handing the list over; the writer never re-sorts it.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TargetList {
    entries: Vec<DockEntry>,
}

impl TargetList {
    /// Construct new target list out of entries in Dock order.
    pub fn new(entries: Vec<DockEntry>) -> Self {
        Self { entries }
    }

    /// Entries in Dock order.
    pub fn entries(&self) -> &[DockEntry] {
        self.entries.as_slice()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in Dock order.
    pub fn iter(&self) -> impl Iterator<Item = &DockEntry> {
        self.entries.iter()
    }
}

impl FromIterator<DockEntry> for TargetList {
    fn from_iter<I: IntoIterator<Item = DockEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<DockSnapshot> for TargetList {
    fn from(snapshot: DockSnapshot) -> Self {
        Self::new(snapshot.into_entries())
    }
}

/// Outcome of one write to the Dock.
///
/// Partial success is the normal case, so what went wrong lives in here
/// rather than in logs.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    /// Number of entries the caller asked for.
    pub requested_count: usize,

    /// Number of entries whose add command succeeded.
    pub applied_count: usize,

    /// Entries dropped because their path does not exist or their target is empty.
    pub skipped_entries: Vec<DockEntry>,

    /// Number of pinned entries observed after the Dock restarted.
    pub verified_count: usize,

    /// Everything that degraded the run without stopping it.
    pub warnings: Vec<String>,
}

impl ApplyResult {
    /// Check if every requested entry landed without complaint.
    pub fn is_clean(&self) -> bool {
        self.skipped_entries.is_empty()
            && self.warnings.is_empty()
            && self.applied_count == self.requested_count
            && self.verified_count == self.requested_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn spacers_have_no_identity() {
        assert_eq!(DockEntry::spacer().identity(), None);
        assert_eq!(
            DockEntry::folder("Downloads", "/Users/blah/Downloads").identity(),
            Some((DockItemKind::Folder, "/Users/blah/Downloads"))
        );
    }

    #[test]
    fn identity_ignores_display_name() {
        let first = DockEntry::app("Safari", "/Applications/Safari.app");
        let second = DockEntry::app("Safari Browser", "/Applications/Safari.app");
        assert_ne!(first, second);
        assert_eq!(first.identity(), second.identity());
    }

    #[test]
    fn apply_result_cleanliness() {
        let mut result = ApplyResult {
            requested_count: 2,
            applied_count: 2,
            skipped_entries: vec![],
            verified_count: 2,
            warnings: vec![],
        };
        assert!(result.is_clean());

        result.warnings.push("blah".into());
        assert!(!result.is_clean());
    }

    #[test]
    fn display_dock_entry() {
        let entry = DockEntry::url("Docs", "https://docs.rs");
        assert_eq!(entry.to_string(), "[url] Docs (https://docs.rs)");
        assert_eq!(DockEntry::spacer().to_string(), "[spacer]");
    }
}
