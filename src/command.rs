// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command execution.
//!
//! Every interaction with the Dock goes through an external program, e.g.,
//! dockutil for reading and editing pinned items, and killall for restarting
//! the Dock process. This module provides the one seam through which those
//! programs get spawned.
//!
//! Arguments are always handed over as discrete argv entries. Nothing is ever
//! routed through a shell, so labels and paths containing spaces or quotes
//! reach the program exactly as given.

use futures::future::{BoxFuture, FutureExt};
use std::{
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Everything the process wrote to stdout.
    pub stdout: String,

    /// Everything the process wrote to stderr, minus the trailing newline.
    pub stderr: String,

    /// Exit code, or -1 if the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Construct output of a successful run.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Attach stderr content to output.
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// Spawn external programs.
///
/// One call spawns one process, waits for it to exit, and hands back whatever
/// it printed. Implementations must never block the calling thread while the
/// process runs.
pub trait CommandRunner: Send + Sync + 'static {
    /// Run `program` with `args` to completion.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ExecutableNotFound`] if `program` does not exist.
    /// - Return [`Error::SpawnFailed`] if the OS refuses to start the process.
    /// - Return [`Error::CommandFailed`] if the process exits non-zero.
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [String],
    ) -> BoxFuture<'a, Result<CommandOutput>>;
}

/// Command runner backed by real OS processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Construct new process runner.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [String],
    ) -> BoxFuture<'a, Result<CommandOutput>> {
        async move {
            if !program.exists() {
                return Err(Error::ExecutableNotFound {
                    path: program.to_path_buf(),
                });
            }

            debug!("run {:?} with {args:?}", program.display());
            let output = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|source| Error::SpawnFailed {
                    source,
                    program: program.to_path_buf(),
                })?;

            let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
            let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

            // INVARIANT: Chomp trailing newlines.
            let stderr = stderr
                .strip_suffix("\r\n")
                .or(stderr.strip_suffix('\n'))
                .map(ToString::to_string)
                .unwrap_or(stderr);

            let exit_code = output.status.code().unwrap_or(-1);
            debug!("{:?} exited with status {exit_code}", program.display());

            if !output.status.success() {
                return Err(Error::CommandFailed {
                    program: program.to_path_buf(),
                    exit_code,
                    stderr,
                });
            }

            Ok(CommandOutput {
                stdout,
                stderr,
                exit_code,
            })
        }
        .boxed()
    }
}

/// Command execution error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Executable does not exist at the given path.
    #[error("executable {:?} does not exist", path.display())]
    ExecutableNotFound { path: PathBuf },

    /// Process could not be spawned.
    #[error("failed to spawn {:?}", program.display())]
    SpawnFailed {
        #[source]
        source: std::io::Error,
        program: PathBuf,
    },

    /// Process exited with non-zero status.
    #[error("command {:?} exited with status {exit_code}: {stderr}", program.display())]
    CommandFailed {
        program: PathBuf,
        exit_code: i32,
        stderr: String,
    },
}

impl Error {
    /// Stderr of a failed command, if the command got far enough to print one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".into(), script.into()]
    }

    #[tokio::test]
    async fn process_runner_captures_output() -> anyhow::Result<()> {
        let runner = ProcessRunner::new();
        let result = runner
            .run(Path::new("/bin/sh"), &sh("printf 'a\\tb\\n'; echo oops >&2"))
            .await?;
        let expect = CommandOutput {
            stdout: "a\tb\n".into(),
            stderr: "oops".into(),
            exit_code: 0,
        };
        assert_eq!(result, expect);

        Ok(())
    }

    #[tokio::test]
    async fn process_runner_passes_args_verbatim() -> anyhow::Result<()> {
        let runner = ProcessRunner::new();
        let args = vec![
            "-c".into(),
            "printf '%s|' \"$@\"".into(),
            "sh".into(),
            "".into(),
            "two words".into(),
            "it's".into(),
        ];
        let result = runner.run(Path::new("/bin/sh"), &args).await?;
        assert_eq!(result.stdout, "|two words|it's|");

        Ok(())
    }

    #[tokio::test]
    async fn process_runner_rejects_non_zero_exit() {
        let runner = ProcessRunner::new();
        let result = runner
            .run(Path::new("/bin/sh"), &sh("echo 'connection interrupted' >&2; exit 3"))
            .await;
        match result {
            Err(Error::CommandFailed {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "connection interrupted");
            }
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn process_runner_kills_abandoned_process() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let marker = dir.path().join("finished");
        let script = format!("sleep 1; touch '{}'", marker.display());
        let runner = ProcessRunner::new();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            runner.run(Path::new("/bin/sh"), &sh(&script)),
        )
        .await;
        assert!(result.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(!marker.exists());

        Ok(())
    }

    #[tokio::test]
    async fn process_runner_fails_fast_on_missing_executable() {
        let runner = ProcessRunner::new();
        let result = runner
            .run(Path::new("/definitely/not/here/dockutil"), &[])
            .await;
        assert!(matches!(result, Err(Error::ExecutableNotFound { .. })));
    }
}
