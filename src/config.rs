// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the settings file and for profile files that
//! Dockfinity uses to simplify the process of serialization and
//! deserialization. File I/O is mostly left to the caller to figure out.

use crate::dock::{
    locate::{DockToolLocator, DEFAULT_CANDIDATES},
    writer::RetryPolicy,
    DockEntry, DockItemKind, DockSection, DockSnapshot, TargetList,
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// Settings file layout.
///
/// Every table and field is optional. Anything left out falls back to the
/// built-in defaults.
///
/// # General Layout
///
/// ```toml
/// [dockutil]
/// path = "/opt/homebrew/bin/dockutil"
/// candidates = ["/opt/homebrew/bin/dockutil", "/usr/local/bin/dockutil"]
///
/// [apply]
/// pacing_ms = 50
/// poll_interval_ms = 250
/// poll_timeout_ms = 10000
/// poll_attempts = 40
/// ```
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Where to find dockutil.
    #[serde(default)]
    pub dockutil: ToolSettings,

    /// How to pace writes to the Dock.
    #[serde(default)]
    pub apply: ApplySettings,
}

impl Settings {
    /// Load settings file, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ReadSettings`] if the file exists but cannot be
    ///   read.
    /// - Return [`ConfigError::Deserialize`] if the file is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        read_to_string(path)
            .map_err(|err| ConfigError::ReadSettings {
                source: err,
                path: path.to_path_buf(),
            })?
            .parse()
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every tool path.
        if let Some(path) = settings.dockutil.path.take() {
            settings.dockutil.path = Some(expand_path(&path)?);
        }
        settings.dockutil.candidates = settings
            .dockutil
            .candidates
            .iter()
            .map(|path| expand_path(path))
            .collect::<Result<Vec<_>>>()?;

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Dockutil lookup settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ToolSettings {
    /// Pin dockutil to this path and skip probing entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Install locations to probe before searching PATH.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<PathBuf>,
}

impl ToolSettings {
    /// Build locator out of these settings.
    pub fn locator(&self) -> DockToolLocator {
        match &self.path {
            Some(path) => DockToolLocator::with_path(path),
            None => DockToolLocator::new(self.candidates.clone()),
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            path: None,
            candidates: default_candidates(),
        }
    }
}

fn default_candidates() -> Vec<PathBuf> {
    DEFAULT_CANDIDATES.iter().map(PathBuf::from).collect()
}

/// Write pacing settings.
///
/// All durations are in milliseconds.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplySettings {
    pub pacing_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
    pub poll_attempts: u32,
}

impl Default for ApplySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            pacing_ms: policy.pacing.as_millis() as u64,
            poll_interval_ms: policy.poll_interval.as_millis() as u64,
            poll_timeout_ms: policy.poll_timeout.as_millis() as u64,
            poll_attempts: policy.poll_attempts,
        }
    }
}

impl From<&ApplySettings> for RetryPolicy {
    fn from(settings: &ApplySettings) -> Self {
        Self {
            pacing: Duration::from_millis(settings.pacing_ms),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            poll_timeout: Duration::from_millis(settings.poll_timeout_ms),
            poll_attempts: settings.poll_attempts,
        }
    }
}

/// Profile file layout.
///
/// A __profile__ is a named, ordered list of Dock items. Item order in the
/// file is the order the items appear in the Dock.
///
/// # General Layout
///
/// ```toml
/// name = "work"
/// default = false
///
/// [[item]]
/// kind = "app"
/// name = "Safari"
/// path = "/Applications/Safari.app"
/// section = "apps"
/// ```
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProfileDefinition {
    /// Name of the profile.
    pub name: String,

    /// Profile captured on first run.
    #[serde(default)]
    pub default: bool,

    /// Dock items in Dock order.
    #[serde(default, rename = "item")]
    pub items: Vec<ProfileItem>,
}

impl ProfileDefinition {
    /// Construct new empty profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Construct profile out of a Dock snapshot.
    pub fn from_snapshot(name: impl Into<String>, snapshot: DockSnapshot) -> Self {
        Self {
            name: name.into(),
            default: false,
            items: snapshot
                .into_entries()
                .into_iter()
                .map(ProfileItem::from)
                .collect(),
        }
    }

    /// Target list that converges the Dock onto this profile.
    pub fn target_list(&self) -> TargetList {
        self.items.iter().cloned().map(DockEntry::from).collect()
    }

    /// Insert item at position, or append it if no position is given.
    ///
    /// Positions are zero-based. A position equal to the item count appends.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::MissingPath`] if a non-spacer item has no path.
    /// - Return [`ConfigError::NoSuchPosition`] if position is past the end.
    pub fn insert_item(&mut self, position: Option<usize>, item: ProfileItem) -> Result<()> {
        if item.kind != DockItemKind::Spacer && item.path.is_empty() {
            return Err(ConfigError::MissingPath(item.kind));
        }

        let position = position.unwrap_or(self.items.len());
        if position > self.items.len() {
            return Err(self.no_such_position(position));
        }
        self.items.insert(position, item);

        Ok(())
    }

    /// Remove item at zero-based position.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoSuchPosition`] if no item sits there.
    pub fn remove_item(&mut self, position: usize) -> Result<ProfileItem> {
        if position >= self.items.len() {
            return Err(self.no_such_position(position));
        }

        Ok(self.items.remove(position))
    }

    /// Move item between zero-based positions, shifting the rest.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoSuchPosition`] if either position is past
    ///   the last item.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        if to >= self.items.len() {
            return Err(self.no_such_position(to));
        }

        let item = self.remove_item(from)?;
        self.items.insert(to, item);

        Ok(())
    }

    fn no_such_position(&self, position: usize) -> ConfigError {
        ConfigError::NoSuchPosition {
            position,
            len: self.items.len(),
        }
    }
}

impl FromStr for ProfileDefinition {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut definition: ProfileDefinition =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on app and folder paths only.
        for item in definition.items.iter_mut() {
            if matches!(item.kind, DockItemKind::App | DockItemKind::Folder) {
                item.path = shellexpand::full(item.path.as_str())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned();
            }
        }

        Ok(definition)
    }
}

impl Display for ProfileDefinition {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Single Dock item of a profile.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProfileItem {
    /// Kind of Dock item.
    pub kind: DockItemKind,

    /// Label shown in the Dock.
    #[serde(default)]
    pub name: String,

    /// File system path, or URL for web shortcuts.
    #[serde(default)]
    pub path: String,

    /// Dock section the item belongs to.
    #[serde(default)]
    pub section: DockSection,
}

impl ProfileItem {
    /// Construct new profile item in the apps section.
    ///
    /// Apps and folders without a name are labelled after their path.
    pub fn new(kind: DockItemKind, name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let mut name = name.into();
        if name.is_empty() && matches!(kind, DockItemKind::App | DockItemKind::Folder) {
            name = Path::new(&path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
        }

        Self {
            kind,
            name,
            path,
            section: DockSection::Apps,
        }
    }
}

impl From<DockEntry> for ProfileItem {
    fn from(entry: DockEntry) -> Self {
        Self {
            kind: entry.kind,
            name: entry.name,
            path: entry.target,
            section: entry.section,
        }
    }
}

impl From<ProfileItem> for DockEntry {
    fn from(item: ProfileItem) -> Self {
        DockEntry::new(item.kind, item.name, item.path).in_section(item.section)
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read settings file.
    #[error("failed to read settings from {:?}", path.display())]
    ReadSettings {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Profile item needs a path but has none.
    #[error("{0} item needs a path")]
    MissingPath(DockItemKind),

    /// Profile has no item at position.
    #[error("no item at position {position}, profile has {len} items")]
    NoSuchPosition { position: usize, len: usize },

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
