// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Locate dockutil.
//!
//! Every Dock read or write needs dockutil. Well-known install locations are
//! probed first since that costs no subprocess, then PATH is searched through
//! `which`. The first hit is cached for the life of the locator.
//!
//! There is no fallback to editing the Dock preference file by hand.

use crate::command::CommandRunner;

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, info, instrument};

/// Name of the Dock management tool.
pub const TOOL_NAME: &str = "dockutil";

/// Install locations probed before searching PATH.
pub const DEFAULT_CANDIDATES: [&str; 3] = [
    "/opt/homebrew/bin/dockutil",
    "/usr/local/bin/dockutil",
    "/usr/bin/dockutil",
];

/// Program used to search PATH.
pub const WHICH_PROGRAM: &str = "/usr/bin/which";

/// Find and remember where dockutil lives.
#[derive(Debug)]
pub struct DockToolLocator {
    candidates: Vec<PathBuf>,
    cached: Mutex<Option<PathBuf>>,
}

impl DockToolLocator {
    /// Construct new locator probing given candidate paths in order.
    pub fn new(candidates: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            cached: Mutex::new(None),
        }
    }

    /// Construct new locator that already knows where the tool is.
    ///
    /// No probing happens unless the locator gets invalidated.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: Vec::new(),
            cached: Mutex::new(Some(path.into())),
        }
    }

    /// Resolve path to dockutil.
    ///
    /// # Errors
    ///
    /// - Return [`ToolUnavailable`] if no candidate exists and PATH lookup
    ///   comes up empty.
    #[instrument(skip(self, runner), level = "debug")]
    pub async fn locate<R>(&self, runner: &R) -> Result<PathBuf>
    where
        R: CommandRunner,
    {
        if let Some(path) = self.cached() {
            return Ok(path);
        }

        let path = match self.probe_candidates() {
            Some(path) => path,
            None => search_path(runner).await.ok_or(ToolUnavailable)?,
        };

        info!("found {TOOL_NAME} at {:?}", path.display());
        self.store(path.clone());

        Ok(path)
    }

    /// Currently cached tool path.
    pub fn cached(&self) -> Option<PathBuf> {
        match self.cached.lock() {
            Ok(cached) => cached.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Forget cached tool path so that the next lookup probes again.
    pub fn invalidate(&self) {
        self.store_inner(None);
    }

    fn store(&self, path: PathBuf) {
        self.store_inner(Some(path));
    }

    fn store_inner(&self, path: Option<PathBuf>) {
        match self.cached.lock() {
            Ok(mut cached) => *cached = path,
            Err(poisoned) => *poisoned.into_inner() = path,
        }
    }

    fn probe_candidates(&self) -> Option<PathBuf> {
        self.candidates
            .iter()
            .inspect(|path| debug!("probe {:?}", path.display()))
            .find(|path| path.is_file())
            .cloned()
    }
}

impl Default for DockToolLocator {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATES)
    }
}

async fn search_path<R>(runner: &R) -> Option<PathBuf>
where
    R: CommandRunner,
{
    let args = [TOOL_NAME.to_string()];
    match runner.run(Path::new(WHICH_PROGRAM), &args).await {
        Ok(output) => {
            let path = output.stdout.trim();
            if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            }
        }
        Err(error) => {
            debug!("PATH lookup for {TOOL_NAME} failed: {error}");
            None
        }
    }
}

/// Dockutil cannot be found anywhere.
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot locate {TOOL_NAME} in any known install location or PATH")]
pub struct ToolUnavailable;

/// Friendly result alias :3
pub type Result<T, E = ToolUnavailable> = std::result::Result<T, E>;
