// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Profile store management and manipulation.
//!
//! Dockfinity groups profiles together into one place called the
//! __profile store__. The profile store houses every profile the user can
//! apply to the Dock.
//!
//! # Profile Store Layout
//!
//! The profile store can generally be placed anywhere on the user's file
//! system. However, the default location is the user's data directory, see
//! [`default_profile_store_dir`](crate::path::default_profile_store_dir).
//! Each profile lives in its own TOML file named after the profile, so
//! `work.toml` means the store contains a profile named "work".
//!
//! The store also remembers which profile was applied last in a plain text
//! file named `current`, and whether the first launch already happened in an
//! empty file named `.launched`. That is the only state the store keeps
//! besides the profiles themselves.

use crate::{
    config::{ConfigError, ProfileDefinition},
    dock::DockSnapshot,
};

use std::{
    fs::{read_dir, read_to_string, remove_file, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

const PROFILE_EXTENSION: &str = "toml";
const CURRENT_FILE: &str = "current";
const FIRST_LAUNCH_FILE: &str = ".launched";

/// Name of the profile captured on first launch.
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// How to store a freshly captured Dock.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Replace existing profile of the same name.
    pub overwrite: bool,

    /// Accept a Dock without any pinned items.
    pub allow_empty: bool,

    /// Mark captured profile as the default profile.
    pub default: bool,
}

/// File-backed collection of profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    store_path: PathBuf,
}

impl ProfileStore {
    /// Open profile store at target path.
    ///
    /// Creates the store directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::CreateStore`] if the store directory cannot be
    ///   created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store_path = path.into();
        mkdirp::mkdirp(&store_path).map_err(|err| StoreError::CreateStore {
            source: err,
            store_path: store_path.clone(),
        })?;

        Ok(Self { store_path })
    }

    /// Path to the store directory.
    pub fn path(&self) -> &Path {
        self.store_path.as_path()
    }

    /// Store Dock snapshot as a profile.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::EmptyDockSnapshot`] if the snapshot holds no
    ///   items and empty captures are not allowed.
    /// - Return [`StoreError::ProfileExists`] if the profile exists and
    ///   overwriting is not allowed.
    #[instrument(skip(self, snapshot), level = "debug")]
    pub fn save_capture(
        &self,
        name: impl AsRef<str> + std::fmt::Debug,
        snapshot: DockSnapshot,
        options: CaptureOptions,
    ) -> Result<ProfileDefinition> {
        if snapshot.is_empty() && !options.allow_empty {
            return Err(StoreError::EmptyDockSnapshot);
        }

        let mut profile = ProfileDefinition::from_snapshot(name.as_ref(), snapshot);
        profile.default = options.default;
        self.save_profile(&profile, options.overwrite)?;

        Ok(profile)
    }

    /// Check if the store has never been launched before.
    pub fn is_first_launch(&self) -> bool {
        !self.store_path.join(FIRST_LAUNCH_FILE).exists()
    }

    /// Capture the Dock as it was before Dockfinity touched it.
    ///
    /// Stores the snapshot as the default profile, makes it current, and
    /// marks the first launch as done. An empty Dock is accepted. Does
    /// nothing if the first launch already happened, and only marks it done
    /// if a default profile is already stored.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::WriteFirstLaunch`] if the first launch marker
    ///   cannot be written.
    /// - Return any error [`ProfileStore::save_profile`] returns.
    #[instrument(skip(self, snapshot), level = "debug")]
    pub fn create_default_profile(
        &self,
        snapshot: DockSnapshot,
    ) -> Result<Option<ProfileDefinition>> {
        if !self.is_first_launch() {
            return Ok(None);
        }

        // INVARIANT: Never clobber a default profile the user made by hand.
        let profile = if self.profile_path(DEFAULT_PROFILE_NAME)?.exists() {
            None
        } else {
            let options = CaptureOptions {
                overwrite: false,
                allow_empty: true,
                default: true,
            };
            let profile = self.save_capture(DEFAULT_PROFILE_NAME, snapshot, options)?;
            self.set_current(&profile.name)?;
            info!("captured first launch dock into {:?}", profile.name);
            Some(profile)
        };

        write(self.store_path.join(FIRST_LAUNCH_FILE), "")
            .map_err(|err| StoreError::WriteFirstLaunch { source: err })?;

        Ok(profile)
    }

    /// Create new empty profile.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ProfileExists`] if the profile exists.
    /// - Return any error [`ProfileStore::save_profile`] returns.
    pub fn create_profile(
        &self,
        name: impl AsRef<str>,
        default: bool,
    ) -> Result<ProfileDefinition> {
        let mut profile = ProfileDefinition::new(name.as_ref());
        profile.default = default;
        self.save_profile(&profile, false)?;

        Ok(profile)
    }

    /// Rename stored profile.
    ///
    /// Keeps the current profile marker pointing at the renamed profile.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ProfileExists`] if the new name is taken.
    /// - Return any error [`ProfileStore::load_profile`] or
    ///   [`ProfileStore::remove_profile`] returns.
    pub fn rename_profile(
        &self,
        from: impl AsRef<str>,
        to: impl AsRef<str>,
    ) -> Result<ProfileDefinition> {
        let (from, to) = (from.as_ref(), to.as_ref());
        let mut profile = self.load_profile(from)?;
        if from == to {
            return Ok(profile);
        }

        let was_current = self.current()?.as_deref() == Some(from);
        profile.name = to.to_string();
        self.save_profile(&profile, false)?;
        self.remove_profile(from)?;
        if was_current {
            self.set_current(to)?;
        }
        info!("renamed profile {from:?} to {to:?}");

        Ok(profile)
    }

    /// Copy stored profile under a new name.
    ///
    /// The copy is never the default profile. Without a new name the copy
    /// is named after the source with a " Copy" suffix.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ProfileExists`] if the new name is taken.
    /// - Return any error [`ProfileStore::load_profile`] returns.
    pub fn duplicate_profile(
        &self,
        name: impl AsRef<str>,
        copy_name: Option<&str>,
    ) -> Result<ProfileDefinition> {
        let mut profile = self.load_profile(name.as_ref())?;
        profile.name = match copy_name {
            Some(copy_name) => copy_name.to_string(),
            None => format!("{} Copy", profile.name),
        };
        profile.default = false;
        self.save_profile(&profile, false)?;

        Ok(profile)
    }

    /// Edit stored profile in place.
    ///
    /// Load the profile, hand it to `editor`, and write the result back. Nothing
    /// gets written if `editor` fails.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Config`] if `editor` fails.
    /// - Return any error [`ProfileStore::load_profile`] or
    ///   [`ProfileStore::save_profile`] returns.
    pub fn edit_profile<E>(&self, name: impl AsRef<str>, editor: E) -> Result<ProfileDefinition>
    where
        E: FnOnce(&mut ProfileDefinition) -> Result<(), ConfigError>,
    {
        let name = name.as_ref();
        let mut profile = self.load_profile(name)?;
        editor(&mut profile)?;

        // INVARIANT: Editing never renames.
        profile.name = name.to_string();
        self.save_profile(&profile, true)?;

        Ok(profile)
    }

    /// Replace items of an existing profile with a Dock snapshot.
    ///
    /// Keeps the default marker of the stored profile.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::EmptyDockSnapshot`] if the snapshot holds no
    ///   items and empty captures are not allowed.
    /// - Return any error [`ProfileStore::load_profile`] returns.
    #[instrument(skip(self, snapshot), level = "debug")]
    pub fn refresh_profile(
        &self,
        name: impl AsRef<str> + std::fmt::Debug,
        snapshot: DockSnapshot,
        allow_empty: bool,
    ) -> Result<ProfileDefinition> {
        if snapshot.is_empty() && !allow_empty {
            return Err(StoreError::EmptyDockSnapshot);
        }

        let stored = self.load_profile(name.as_ref())?;
        let mut profile = ProfileDefinition::from_snapshot(stored.name, snapshot);
        profile.default = stored.default;
        self.save_profile(&profile, true)?;

        Ok(profile)
    }

    /// Write profile into the store.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::InvalidName`] if the profile name cannot be used
    ///   as a file name.
    /// - Return [`StoreError::ProfileExists`] if the profile exists and
    ///   overwriting is not allowed.
    /// - Return [`StoreError::WriteProfile`] if the profile cannot be written.
    pub fn save_profile(&self, profile: &ProfileDefinition, overwrite: bool) -> Result<()> {
        let profile_path = self.profile_path(&profile.name)?;
        if profile_path.exists() && !overwrite {
            return Err(StoreError::ProfileExists(profile.name.clone()));
        }

        info!("save profile {:?} with {} items", profile.name, profile.items.len());
        write(&profile_path, profile.to_string()).map_err(|err| StoreError::WriteProfile {
            source: err,
            profile_path: profile_path.clone(),
        })?;

        Ok(())
    }

    /// Read profile out of the store.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ProfileNotFound`] if no such profile exists.
    /// - Return [`StoreError::ReadProfile`] if the profile cannot be read.
    /// - Return [`StoreError::Config`] if the profile cannot be parsed.
    pub fn load_profile(&self, name: impl AsRef<str>) -> Result<ProfileDefinition> {
        let name = name.as_ref();
        let profile_path = self.profile_path(name)?;
        let content = read_to_string(&profile_path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StoreError::ProfileNotFound(name.to_string()),
            _ => StoreError::ReadProfile {
                source: err,
                profile_path: profile_path.clone(),
            },
        })?;

        let mut profile: ProfileDefinition = content.parse()?;

        // INVARIANT: File name is the source of truth for the profile name.
        profile.name = name.to_string();

        Ok(profile)
    }

    /// List every stored profile.
    ///
    /// The default profile comes first, everything else is sorted by name.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ReadStore`] if the store cannot be listed.
    /// - Return any error [`ProfileStore::load_profile`] returns.
    pub fn list_profiles(&self) -> Result<Vec<ProfileDefinition>> {
        let entries = read_dir(&self.store_path).map_err(|err| StoreError::ReadStore {
            source: err,
            store_path: self.store_path.clone(),
        })?;

        let mut profiles = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROFILE_EXTENSION) {
                continue;
            }

            if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
                debug!("found profile {name:?}");
                profiles.push(self.load_profile(name)?);
            }
        }

        profiles.sort_by(|a, b| b.default.cmp(&a.default).then_with(|| a.name.cmp(&b.name)));

        Ok(profiles)
    }

    /// Delete profile from the store.
    ///
    /// Forgets the current profile too if it was the deleted one.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ProfileNotFound`] if no such profile exists.
    /// - Return [`StoreError::RemoveProfile`] if the profile cannot be deleted.
    pub fn remove_profile(&self, name: impl AsRef<str>) -> Result<()> {
        let name = name.as_ref();
        let profile_path = self.profile_path(name)?;
        remove_file(&profile_path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StoreError::ProfileNotFound(name.to_string()),
            _ => StoreError::RemoveProfile {
                source: err,
                profile_path: profile_path.clone(),
            },
        })?;
        info!("removed profile {name:?}");

        if self.current()?.as_deref() == Some(name) {
            self.clear_current()?;
        }

        Ok(())
    }

    /// Remember profile as the one applied last.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ProfileNotFound`] if no such profile exists.
    /// - Return [`StoreError::WriteCurrent`] if the marker cannot be written.
    pub fn set_current(&self, name: impl AsRef<str>) -> Result<()> {
        let name = name.as_ref();
        if !self.profile_path(name)?.exists() {
            return Err(StoreError::ProfileNotFound(name.to_string()));
        }

        write(self.current_path(), name).map_err(|err| StoreError::WriteCurrent { source: err })
    }

    /// Name of the profile applied last, if any.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ReadCurrent`] if the marker exists but cannot be
    ///   read.
    pub fn current(&self) -> Result<Option<String>> {
        match read_to_string(self.current_path()) {
            Ok(name) => {
                let name = name.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::ReadCurrent { source: err }),
        }
    }

    /// Forget which profile was applied last.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::WriteCurrent`] if the marker cannot be removed.
    pub fn clear_current(&self) -> Result<()> {
        match remove_file(self.current_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::WriteCurrent { source: err }),
        }
    }

    fn profile_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        Ok(self
            .store_path
            .join(format!("{name}.{PROFILE_EXTENSION}")))
    }

    fn current_path(&self) -> PathBuf {
        self.store_path.join(CURRENT_FILE)
    }
}

/// All possible error types for profile store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store directory cannot be created.
    #[error("failed to create profile store at {:?}", store_path.display())]
    CreateStore {
        #[source]
        source: std::io::Error,
        store_path: PathBuf,
    },

    /// Store directory cannot be listed.
    #[error("failed to read profile store at {:?}", store_path.display())]
    ReadStore {
        #[source]
        source: std::io::Error,
        store_path: PathBuf,
    },

    /// Captured Dock has no pinned items.
    #[error("dock has no pinned items to capture")]
    EmptyDockSnapshot,

    /// Profile name cannot be used as a file name.
    #[error("invalid profile name {0:?}")]
    InvalidName(String),

    /// Profile already exists.
    #[error("profile {0:?} already exists")]
    ProfileExists(String),

    /// Profile does not exist.
    #[error("profile {0:?} does not exist")]
    ProfileNotFound(String),

    /// Profile file cannot be read.
    #[error("failed to read profile at {:?}", profile_path.display())]
    ReadProfile {
        #[source]
        source: std::io::Error,
        profile_path: PathBuf,
    },

    /// Profile file cannot be written.
    #[error("failed to write profile at {:?}", profile_path.display())]
    WriteProfile {
        #[source]
        source: std::io::Error,
        profile_path: PathBuf,
    },

    /// Profile file cannot be removed.
    #[error("failed to remove profile at {:?}", profile_path.display())]
    RemoveProfile {
        #[source]
        source: std::io::Error,
        profile_path: PathBuf,
    },

    /// Current profile marker cannot be read.
    #[error("failed to read current profile marker")]
    ReadCurrent {
        #[source]
        source: std::io::Error,
    },

    /// Current profile marker cannot be written.
    #[error("failed to write current profile marker")]
    WriteCurrent {
        #[source]
        source: std::io::Error,
    },

    /// First launch marker cannot be written.
    #[error("failed to write first launch marker")]
    WriteFirstLaunch {
        #[source]
        source: std::io::Error,
    },

    /// Profile file cannot be parsed or edited.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
