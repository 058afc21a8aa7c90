// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Read pinned Dock items.

use crate::{
    command::{self, CommandOutput, CommandRunner},
    dock::{
        locate::DockToolLocator,
        model::DockSnapshot,
        parse::parse_dock_list,
        Error, Result,
    },
};

use std::{path::Path, sync::Arc};
use tracing::{debug, instrument};

/// Arguments that make dockutil print every Dock tile.
pub(crate) fn list_args() -> Vec<String> {
    vec!["--list".into()]
}

/// Take snapshots of the live Dock.
#[derive(Debug)]
pub struct DockReader<R>
where
    R: CommandRunner,
{
    runner: Arc<R>,
    locator: Arc<DockToolLocator>,
}

impl<R> DockReader<R>
where
    R: CommandRunner,
{
    /// Construct new Dock reader.
    pub fn new(runner: Arc<R>, locator: Arc<DockToolLocator>) -> Self {
        Self { runner, locator }
    }

    /// Snapshot pinned Dock items as they are right now.
    ///
    /// An empty snapshot is a legitimate answer. Callers that need a
    /// non-empty baseline must check for themselves.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ToolUnavailable`] if dockutil cannot be located.
    /// - Return [`Error::List`] if dockutil fails to list the Dock.
    #[instrument(skip(self), level = "debug")]
    pub async fn read_current(&self) -> Result<DockSnapshot> {
        let tool = self.locator.locate(self.runner.as_ref()).await?;
        let output = self.list(&tool).await.map_err(Error::List)?;
        let snapshot = DockSnapshot::new(parse_dock_list(&output.stdout));
        debug!("observed {} pinned dock items", snapshot.len());

        Ok(snapshot)
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        self.runner.as_ref()
    }

    pub(crate) async fn list(&self, tool: &Path) -> command::Result<CommandOutput> {
        self.runner.run(tool, &list_args()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dock::{
        fake::{FakeDock, FAKE_TOOL},
        model::DockEntry,
    };

    use pretty_assertions::assert_eq;

    fn reader(fake: &Arc<FakeDock>) -> DockReader<FakeDock> {
        DockReader::new(fake.clone(), Arc::new(DockToolLocator::with_path(FAKE_TOOL)))
    }

    #[tokio::test]
    async fn read_current_parses_pinned_items() -> anyhow::Result<()> {
        let fake = Arc::new(FakeDock::new().with_listing(concat!(
            "Safari\tfile:///Applications/Safari.app/\tpersistentApps\t/plist\n",
            "Downloads\tfile:///Users/blah/Downloads/\tpersistentOthers\t/plist\n",
        )));
        let result = reader(&fake).read_current().await?;
        let expect = DockSnapshot::new(vec![DockEntry::app("Safari", "/Applications/Safari.app")]);
        assert_eq!(result, expect);

        Ok(())
    }

    #[tokio::test]
    async fn read_current_accepts_empty_dock() -> anyhow::Result<()> {
        let fake = Arc::new(FakeDock::new());
        let result = reader(&fake).read_current().await?;
        assert!(result.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn read_current_never_caches_snapshots() -> anyhow::Result<()> {
        let fake = Arc::new(FakeDock::new());
        let reader = reader(&fake);
        assert!(reader.read_current().await?.is_empty());

        fake.pin(DockEntry::app("Mail", "/System/Applications/Mail.app"));
        assert_eq!(reader.read_current().await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn read_current_without_tool() {
        let fake = Arc::new(FakeDock::new().without_tool_on_path());
        let reader = DockReader::new(
            fake.clone(),
            Arc::new(DockToolLocator::new(["/definitely/not/here/dockutil"])),
        );
        let result = reader.read_current().await;
        assert!(matches!(result, Err(Error::ToolUnavailable(_))));
        assert_eq!(fake.calls_to(FAKE_TOOL), 0);
    }
}
