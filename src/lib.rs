// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dock profiles for macOS.
//!
//! Dockfinity captures the pinned items of the macOS Dock into named
//! profiles, and converges the live Dock back onto any stored profile on
//! demand. All Dock access goes through the external `dockutil` program.
//!
//! # See Also
//!
//! 1. [`dock::ReconciliationEngine`]
//! 2. [`store::ProfileStore`]

pub mod command;
pub mod config;
pub mod dock;
pub mod path;
pub mod store;

pub use command::{CommandOutput, CommandRunner, ProcessRunner};
pub use config::{ProfileDefinition, ProfileItem, Settings};
pub use dock::{
    ApplyResult, DockEntry, DockItemKind, DockSection, DockSnapshot, ReconciliationEngine,
    TargetList,
};
pub use store::{CaptureOptions, ProfileStore};
