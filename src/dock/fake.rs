// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! In-memory stand-in for dockutil, killall, and which.

use crate::{
    command::{CommandOutput, CommandRunner, Error, Result},
    dock::{
        locate::WHICH_PROGRAM,
        model::{DockEntry, DockItemKind},
        parse::PINNED_SECTION,
        writer::{RetryPolicy, RESTART_PROGRAM},
    },
};

use futures::future::{BoxFuture, FutureExt};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

pub(crate) const FAKE_TOOL: &str = "/fake/bin/dockutil";

/// Retry policy that never sleeps.
pub(crate) fn immediate_policy() -> RetryPolicy {
    RetryPolicy {
        pacing: Duration::ZERO,
        poll_interval: Duration::ZERO,
        poll_timeout: Duration::from_secs(5),
        poll_attempts: 5,
    }
}

#[derive(Debug, Default)]
struct State {
    rows: Vec<String>,
    calls: Vec<(PathBuf, Vec<String>)>,
    not_ready_lists: u32,
}

/// Fake Dock driven through the same argv dockutil understands.
#[derive(Debug)]
pub(crate) struct FakeDock {
    state: Mutex<State>,
    tool_on_path: bool,
    failing_adds: HashMap<String, String>,
    noisy_adds: HashMap<String, String>,
    failing_clear: Option<String>,
    not_ready_after_restart: u32,
}

impl FakeDock {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            tool_on_path: true,
            failing_adds: HashMap::new(),
            noisy_adds: HashMap::new(),
            failing_clear: None,
            not_ready_after_restart: 0,
        }
    }

    /// Seed raw listing rows.
    pub(crate) fn with_listing(self, raw: &str) -> Self {
        self.lock().rows.extend(raw.lines().map(str::to_owned));
        self
    }

    /// Make PATH lookup for dockutil come up empty.
    pub(crate) fn without_tool_on_path(mut self) -> Self {
        self.tool_on_path = false;
        self
    }

    /// Make adding given target fail with stderr.
    pub(crate) fn failing_add(mut self, target: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.failing_adds.insert(target.into(), stderr.into());
        self
    }

    /// Make adding given target succeed but complain on stderr.
    pub(crate) fn noisy_add(mut self, target: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.noisy_adds.insert(target.into(), stderr.into());
        self
    }

    /// Make clearing the Dock fail with stderr.
    pub(crate) fn failing_clear(mut self, stderr: impl Into<String>) -> Self {
        self.failing_clear = Some(stderr.into());
        self
    }

    /// Make listing fail given number of times after every restart.
    pub(crate) fn not_ready_after_restart(mut self, lists: u32) -> Self {
        self.not_ready_after_restart = lists;
        self
    }

    /// Pin entry as if the user dragged it into the Dock.
    pub(crate) fn pin(&self, entry: DockEntry) {
        self.lock().rows.push(render_row(&entry.name, &entry.target, entry.kind));
    }

    pub(crate) fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.lock().calls.clone()
    }

    pub(crate) fn calls_to(&self, program: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(called, _)| called == Path::new(program))
            .count()
    }

    /// Targets of every successful or failed add invocation, in order.
    pub(crate) fn added_targets(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|(program, args)| program == Path::new(FAKE_TOOL) && args[0] == "--add")
            .filter(|(_, args)| !self.failing_adds.contains_key(&args[1]))
            .map(|(_, args)| args[1].clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn dispatch(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        let mut state = self.lock();
        state.calls.push((program.to_path_buf(), args.to_vec()));

        if program == Path::new(WHICH_PROGRAM) {
            return if self.tool_on_path {
                Ok(CommandOutput::success(format!("{FAKE_TOOL}\n")))
            } else {
                Err(failure(program, 1, ""))
            };
        }

        if program == Path::new(RESTART_PROGRAM) {
            state.not_ready_lists = self.not_ready_after_restart;
            return Ok(CommandOutput::default());
        }

        if program != Path::new(FAKE_TOOL) {
            return Err(Error::ExecutableNotFound {
                path: program.to_path_buf(),
            });
        }

        let args = args.iter().map(String::as_str).collect::<Vec<_>>();
        match args.as_slice() {
            ["--list"] => {
                if state.not_ready_lists > 0 {
                    state.not_ready_lists -= 1;
                    return Err(failure(program, 1, "Dock connection error"));
                }

                let mut stdout = state.rows.join("\n");
                stdout.push('\n');
                Ok(CommandOutput::success(stdout))
            }
            ["--remove", "all", ..] => {
                if let Some(stderr) = &self.failing_clear {
                    return Err(failure(program, 1, stderr));
                }

                state.rows.clear();
                Ok(CommandOutput::default())
            }
            ["--add", target, rest @ ..] => {
                if let Some(stderr) = self.failing_adds.get(*target) {
                    return Err(failure(program, 1, stderr));
                }

                let row = if rest.windows(2).any(|pair| pair == ["--type", "spacer"]) {
                    render_row("", "", DockItemKind::Spacer)
                } else {
                    let label = rest
                        .windows(2)
                        .find(|pair| pair[0] == "--label")
                        .map(|pair| pair[1].to_string())
                        .unwrap_or_else(|| default_label(target));
                    let kind = if target.starts_with("http") {
                        DockItemKind::Url
                    } else {
                        DockItemKind::App
                    };
                    render_row(&label, target, kind)
                };
                state.rows.push(row);
                match self.noisy_adds.get(*target) {
                    Some(stderr) => Ok(CommandOutput::default().with_stderr(stderr.as_str())),
                    None => Ok(CommandOutput::default()),
                }
            }
            _ => Err(failure(program, 64, "unknown option")),
        }
    }
}

impl CommandRunner for FakeDock {
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [String],
    ) -> BoxFuture<'a, Result<CommandOutput>> {
        async move { self.dispatch(program, args) }.boxed()
    }
}

fn failure(program: &Path, exit_code: i32, stderr: &str) -> Error {
    Error::CommandFailed {
        program: program.to_path_buf(),
        exit_code,
        stderr: stderr.to_string(),
    }
}

fn default_label(target: &str) -> String {
    Path::new(target)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn render_row(label: &str, target: &str, kind: DockItemKind) -> String {
    let encoded = match kind {
        DockItemKind::Spacer => "spacer-tile".to_string(),
        DockItemKind::Url => target.to_string(),
        DockItemKind::App | DockItemKind::Folder => {
            format!("file://{}/", target.replace('%', "%25").replace(' ', "%20"))
        }
    };

    format!("{label}\t{encoded}\t{PINNED_SECTION}\t/fake/com.apple.dock.plist")
}
