// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dock reconciliation.
//!
//! The Dock is a single, process-wide OS resource owned by someone else. It
//! offers no locking, no transactions, and no documented API for editing it.
//! Dockfinity talks to it exclusively through [dockutil], and treats the
//! whole exchange as a best-effort synchronization protocol.
//!
//! # Reading
//!
//! `dockutil --list` prints one tab-separated row per Dock tile. Rows get
//! parsed into [`DockEntry`] values, everything that is not pinned gets
//! dropped, and the rest forms a [`DockSnapshot`]. Snapshots are never
//! cached, because the user can drag things around in the Dock at any time.
//!
//! # Writing
//!
//! A [`TargetList`] gets pushed onto the Dock by clearing it, adding every
//! entry back in order, restarting the Dock, and reading it back to verify.
//! Anything confined to one entry (a missing path, one failed addition, a slow
//! restart) degrades into the [`ApplyResult`] rather than failing the write.
//! Only failures that prevent any progress at all, i.e., a missing dockutil or
//! a Dock that refuses to clear, are returned as errors.
//!
//! # Concurrency
//!
//! The engine does not serialize calls for you. Callers must not run two
//! writes against the Dock at once, since dockutil corrupts the Dock
//! preference domain under concurrent access.
//!
//! # See Also
//!
//! 1. [`locate`]
//! 2. [`parse`]
//! 3. [`writer`]
//!
//! [dockutil]: https://github.com/kcrawford/dockutil

pub mod locate;
pub mod model;
pub mod parse;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub(crate) mod fake;

pub use model::{ApplyResult, DockEntry, DockItemKind, DockSection, DockSnapshot, TargetList};

use crate::{
    command::{CommandRunner, ProcessRunner},
    dock::{
        locate::DockToolLocator,
        reader::DockReader,
        writer::{DockWriter, RetryPolicy},
    },
};

use std::sync::Arc;
use tracing::instrument;

/// Read and write the live Dock.
///
/// Holds no state between calls besides the resolved dockutil path. Construct
/// one per process and hand it to whoever needs the Dock.
#[derive(Debug)]
pub struct ReconciliationEngine<R = ProcessRunner>
where
    R: CommandRunner,
{
    reader: DockReader<R>,
    writer: DockWriter<R>,
}

impl<R> ReconciliationEngine<R>
where
    R: CommandRunner,
{
    /// Construct new reconciliation engine.
    pub fn new(runner: R, locator: DockToolLocator, policy: RetryPolicy) -> Self {
        let runner = Arc::new(runner);
        let locator = Arc::new(locator);
        Self {
            reader: DockReader::new(runner.clone(), locator.clone()),
            writer: DockWriter::new(runner, locator, policy),
        }
    }

    /// Snapshot pinned items of the live Dock.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ToolUnavailable`] if dockutil cannot be located.
    /// - Return [`Error::List`] if dockutil fails to list the Dock.
    #[instrument(skip(self))]
    pub async fn capture_current(&self) -> Result<DockSnapshot> {
        self.reader.read_current().await
    }

    /// Converge live Dock onto target list.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ToolUnavailable`] if dockutil cannot be located.
    /// - Return [`Error::Clear`] if the Dock cannot be cleared.
    #[instrument(skip(self, target))]
    pub async fn apply_profile(&self, target: &TargetList) -> Result<ApplyResult> {
        self.writer.apply(target).await
    }
}

impl ReconciliationEngine<ProcessRunner> {
    /// Construct new engine backed by real processes with default settings.
    pub fn with_defaults() -> Self {
        Self::new(
            ProcessRunner::new(),
            DockToolLocator::default(),
            RetryPolicy::default(),
        )
    }
}

/// Dock reconciliation error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Dockutil cannot be located.
    #[error(transparent)]
    ToolUnavailable(#[from] locate::ToolUnavailable),

    /// Dockutil failed to list the Dock.
    #[error("failed to list dock items")]
    List(#[source] crate::command::Error),

    /// Dockutil failed to clear the Dock.
    #[error("failed to clear dock")]
    Clear(#[source] crate::command::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dock::fake::{immediate_policy, FakeDock, FAKE_TOOL};

    use pretty_assertions::assert_eq;
    use std::{fs::create_dir_all, path::Path};

    fn engine(fake: FakeDock) -> ReconciliationEngine<FakeDock> {
        ReconciliationEngine::new(
            fake,
            DockToolLocator::new(["/definitely/not/here/dockutil"]),
            immediate_policy(),
        )
    }

    #[tokio::test]
    async fn missing_tool_stops_everything() {
        let engine = engine(FakeDock::new().without_tool_on_path());

        let result = engine.capture_current().await;
        assert!(matches!(result, Err(Error::ToolUnavailable(_))));

        let target = TargetList::new(vec![DockEntry::url("Docs", "https://docs.rs")]);
        let result = engine.apply_profile(&target).await;
        assert!(matches!(result, Err(Error::ToolUnavailable(_))));

        let calls = engine.reader.runner().calls();
        assert!(calls.iter().all(|(program, _)| program != Path::new(FAKE_TOOL)));
    }

    #[tokio::test]
    async fn capture_after_apply_round_trips() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let safari = root.path().join("Applications/Safari.app");
        let mail = root.path().join("Applications/Mail.app");
        let downloads = root.path().join("Downloads");
        for dir in [&safari, &mail, &downloads] {
            create_dir_all(dir)?;
        }

        let target = TargetList::new(vec![
            DockEntry::app("Safari", safari.to_string_lossy()),
            DockEntry::app("Mail", mail.to_string_lossy()),
            DockEntry::spacer(),
            DockEntry::folder("Downloads", downloads.to_string_lossy()),
            DockEntry::url("Docs", "https://docs.rs"),
        ]);

        let engine = engine(FakeDock::new());
        let result = engine.apply_profile(&target).await?;
        assert!(result.is_clean());

        let snapshot = engine.capture_current().await?;
        let result = snapshot
            .iter()
            .map(|entry| entry.kind)
            .collect::<Vec<_>>();
        let expect = vec![
            DockItemKind::App,
            DockItemKind::App,
            DockItemKind::Spacer,
            DockItemKind::Folder,
            DockItemKind::Url,
        ];
        assert_eq!(result, expect);

        let identified = snapshot
            .iter()
            .filter_map(DockEntry::identity)
            .zip(target.iter().filter_map(DockEntry::identity))
            .all(|(observed, wanted)| observed == wanted);
        assert!(identified);

        Ok(())
    }
}
