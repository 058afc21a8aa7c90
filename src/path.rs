// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where Dockfinity keeps its settings and profiles by default.

use std::path::PathBuf;

/// Determine default absolute path to profile store directory.
///
/// Uses `$XDG_DATA_HOME/dockfinity` on Linux, and
/// `~/Library/Application Support/dockfinity` on macOS. Does not check if the
/// path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_profile_store_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("dockfinity"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to settings file.
///
/// Uses `$XDG_CONFIG_HOME/dockfinity/config.toml` on Linux, and
/// `~/Library/Application Support/dockfinity/config.toml` on macOS. Does not
/// check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_settings_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("dockfinity").join("config.toml"))
        .ok_or(NoWayHome)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("XDG_DATA_HOME", "/home/blah/.local/share")])]
    fn profile_store_dir_follows_xdg() -> anyhow::Result<()> {
        let result = default_profile_store_dir()?;
        assert_eq!(result, PathBuf::from("/home/blah/.local/share/dockfinity"));

        Ok(())
    }

    #[sealed_test(env = [("XDG_CONFIG_HOME", "/home/blah/.config")])]
    fn settings_path_follows_xdg() -> anyhow::Result<()> {
        let result = default_settings_path()?;
        assert_eq!(result, PathBuf::from("/home/blah/.config/dockfinity/config.toml"));

        Ok(())
    }
}
