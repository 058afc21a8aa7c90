// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Converge the live Dock onto a target list.
//!
//! The Dock offers no transaction. All we can do is wipe it, add items back
//! one at a time, restart it, and look at what came out the other end. So a
//! write is a best-effort protocol:
//!
//! 1. __Validate__: drop apps and folders whose path does not exist, and URLs
//!    without a target. Adding a missing path silently does nothing in
//!    dockutil, which would otherwise pass for success.
//! 2. __Clear__: remove every pinned item. Any non-zero exit here aborts the
//!    write, since there is no safe partial state to continue from.
//! 3. __Add__: add the surviving entries strictly in caller order, pacing each
//!    addition. Dockutil drops or mangles rapid-fire additions. One failing
//!    entry becomes a warning and the rest still get added.
//! 4. __Commit__: restart the Dock once, then poll the listing until the Dock
//!    answers again or the timeout runs out.
//! 5. __Verify__: read the Dock back and compare counts. Shortfalls become
//!    warnings, never errors, because the read can race a Dock that is still
//!    settling.
//!
//! Additions are never issued concurrently. Dockutil corrupts the Dock
//! preference domain when several instances write to it at once.

use crate::{
    command::CommandRunner,
    dock::{
        locate::DockToolLocator,
        model::{ApplyResult, DockEntry, DockItemKind, TargetList},
        reader::{list_args, DockReader},
        Error, Result,
    },
};

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, instrument, warn};

/// Program used to restart the Dock.
pub const RESTART_PROGRAM: &str = "/usr/bin/killall";

/// Process name of the Dock.
pub const DOCK_PROCESS: &str = "Dock";

/// Stderr fragments dockutil prints for transient Dock hiccups.
///
/// Matched case-insensitively.
pub const BENIGN_STDERR: [&str; 2] = ["dock connection error", "connection interrupted"];

/// Timing knobs for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between consecutive additions.
    pub pacing: Duration,

    /// Delay before each readiness probe after the restart.
    pub poll_interval: Duration,

    /// Hard ceiling on the time spent waiting for the Dock to come back.
    pub poll_timeout: Duration,

    /// Most readiness probes to issue.
    pub poll_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(50),
            poll_interval: Duration::from_millis(250),
            poll_timeout: Duration::from_secs(10),
            poll_attempts: 40,
        }
    }
}

/// Check if stderr only reports a transient Dock connection problem.
pub fn is_benign_stderr(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    BENIGN_STDERR.iter().any(|benign| stderr.contains(benign))
}

/// Check if entry can be handed to dockutil.
///
/// Apps and folders must exist on disk. URLs need a target. Spacers always
/// pass.
pub fn is_applicable(entry: &DockEntry) -> bool {
    match entry.kind {
        DockItemKind::App | DockItemKind::Folder => {
            !entry.target.is_empty() && Path::new(&entry.target).exists()
        }
        DockItemKind::Url => !entry.target.is_empty(),
        DockItemKind::Spacer => true,
    }
}

/// Dockutil arguments that add one entry without restarting the Dock.
pub fn add_args(entry: &DockEntry) -> Vec<String> {
    let mut args: Vec<String> = match entry.kind {
        DockItemKind::App => vec![
            "--add".into(),
            entry.target.clone(),
            "--section".into(),
            "apps".into(),
        ],
        DockItemKind::Folder => vec![
            "--add".into(),
            entry.target.clone(),
            "--section".into(),
            "apps".into(),
            "--view".into(),
            "auto".into(),
            "--display".into(),
            "folder".into(),
        ],
        DockItemKind::Url => vec![
            "--add".into(),
            entry.target.clone(),
            "--section".into(),
            "apps".into(),
            "--label".into(),
            entry.name.clone(),
        ],
        DockItemKind::Spacer => vec![
            "--add".into(),
            String::new(),
            "--type".into(),
            "spacer".into(),
            "--section".into(),
            "apps".into(),
        ],
    };
    args.push("--no-restart".into());

    args
}

/// Dockutil arguments that remove every pinned item.
pub fn clear_args() -> Vec<String> {
    vec!["--remove".into(), "all".into()]
}

/// Push target lists onto the live Dock.
#[derive(Debug)]
pub struct DockWriter<R>
where
    R: CommandRunner,
{
    runner: Arc<R>,
    locator: Arc<DockToolLocator>,
    reader: DockReader<R>,
    policy: RetryPolicy,
    restart_program: PathBuf,
}

impl<R> DockWriter<R>
where
    R: CommandRunner,
{
    /// Construct new Dock writer.
    pub fn new(runner: Arc<R>, locator: Arc<DockToolLocator>, policy: RetryPolicy) -> Self {
        Self {
            reader: DockReader::new(runner.clone(), locator.clone()),
            runner,
            locator,
            policy,
            restart_program: PathBuf::from(RESTART_PROGRAM),
        }
    }

    /// Converge live Dock onto target list.
    ///
    /// Runs to completion once started. Anything confined to a single entry
    /// lands in the returned [`ApplyResult`] instead of failing the write.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ToolUnavailable`] if dockutil cannot be located.
    /// - Return [`Error::Clear`] if the Dock cannot be cleared.
    #[instrument(skip(self, target), fields(requested = target.len()))]
    pub async fn apply(&self, target: &TargetList) -> Result<ApplyResult> {
        let tool = self.locator.locate(self.runner.as_ref()).await?;
        let mut result = ApplyResult {
            requested_count: target.len(),
            ..Default::default()
        };

        let mut attempted = Vec::with_capacity(target.len());
        for entry in target.iter() {
            if is_applicable(entry) {
                attempted.push(entry);
            } else {
                warn!("skip {entry}: target is missing");
                result.skipped_entries.push(entry.clone());
            }
        }

        self.clear(&tool, &mut result).await?;

        for (index, entry) in attempted.iter().enumerate() {
            if index > 0 {
                sleep(self.policy.pacing).await;
            }

            match self.runner.run(&tool, &add_args(entry)).await {
                Ok(output) => {
                    debug!("added {entry}");
                    note_stderr(&format!("add {entry}"), &output.stderr, &mut result);
                    result.applied_count += 1;
                }
                Err(error) => {
                    warn!("failed to add {entry}: {error}");
                    result.warnings.push(format!("failed to add {entry}: {error}"));
                }
            }
        }

        self.restart(&mut result).await;
        self.wait_until_ready(&tool, &mut result).await;
        self.verify(attempted.len(), &mut result).await;

        info!(
            "applied {} of {} dock items ({} skipped, {} warnings)",
            result.applied_count,
            result.requested_count,
            result.skipped_entries.len(),
            result.warnings.len()
        );

        Ok(result)
    }

    async fn clear(&self, tool: &Path, result: &mut ApplyResult) -> Result<()> {
        // INVARIANT: Any non-zero exit aborts, benign stderr or not.
        let output = self
            .runner
            .run(tool, &clear_args())
            .await
            .map_err(Error::Clear)?;
        note_stderr("dock clear", &output.stderr, result);

        Ok(())
    }

    async fn restart(&self, result: &mut ApplyResult) {
        let args = [DOCK_PROCESS.to_string()];
        if let Err(error) = self.runner.run(&self.restart_program, &args).await {
            warn!("failed to restart dock: {error}");
            result.warnings.push(format!("failed to restart dock: {error}"));
        }
    }

    async fn wait_until_ready(&self, tool: &Path, result: &mut ApplyResult) {
        let deadline = Instant::now() + self.policy.poll_timeout;
        for attempt in 1..=self.policy.poll_attempts.max(1) {
            sleep(self.policy.poll_interval).await;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match timeout(remaining, self.runner.run(tool, &list_args())).await {
                Ok(Ok(_)) => {
                    debug!("dock ready after {attempt} probes");
                    return;
                }
                Ok(Err(error)) => debug!("dock not ready yet: {error}"),
                Err(_) => break,
            }
        }

        warn!("dock did not come back within {:?}", self.policy.poll_timeout);
        result.warnings.push(format!(
            "dock did not finish restarting within {:?}",
            self.policy.poll_timeout
        ));
    }

    async fn verify(&self, expected: usize, result: &mut ApplyResult) {
        match self.reader.read_current().await {
            Ok(snapshot) => {
                result.verified_count = snapshot.len();
                if snapshot.len() < expected {
                    warn!("expected {expected} dock items, found {}", snapshot.len());
                    result.warnings.push(format!(
                        "expected {expected} dock items after apply, found {}",
                        snapshot.len()
                    ));
                }
            }
            Err(error) => {
                warn!("failed to verify dock: {error}");
                result.warnings.push(format!("failed to verify dock: {error}"));
            }
        }
    }
}

/// Record stderr of a successful dockutil call.
///
/// Benign complaints only get logged. Anything else lands in the warnings.
fn note_stderr(step: &str, stderr: &str, result: &mut ApplyResult) {
    if stderr.is_empty() {
        return;
    }

    if is_benign_stderr(stderr) {
        debug!("ignore transient dockutil complaint during {step}: {stderr}");
    } else {
        warn!("dockutil complained during {step}: {stderr}");
        result
            .warnings
            .push(format!("dockutil complained during {step}: {stderr}"));
    }
}
