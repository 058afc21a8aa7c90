// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dockfinity::{
    command::ProcessRunner,
    config::{ConfigError, ProfileItem, Settings},
    dock::{writer::RetryPolicy, Error as DockError},
    path::{default_profile_store_dir, default_settings_path},
    store::{CaptureOptions, ProfileStore, StoreError},
    ApplyResult, DockItemKind, ReconciliationEngine,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use std::{path::PathBuf, process::exit, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "dockfinity [options] <dockfinity-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to settings file to use instead of the default one.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let session = Session::load(self.config)?;
        session.first_launch().await;
        match self.command {
            Command::Capture(opts) => run_capture(session, opts).await,
            Command::New(opts) => run_new(session, opts),
            Command::Rename(opts) => run_rename(session, opts),
            Command::Duplicate(opts) => run_duplicate(session, opts),
            Command::Item(opts) => run_item(session, opts),
            Command::Refresh(opts) => run_refresh(session, opts).await,
            Command::Apply(opts) => run_apply(session, opts).await,
            Command::List => run_list(session),
            Command::Show(opts) => run_show(session, opts),
            Command::Remove(opts) => run_remove(session, opts),
            Command::Dock => run_dock(session).await,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Save pinned items of the live Dock as a profile.
    #[command(override_usage = "dockfinity capture [options] <profile_name>")]
    Capture(CaptureCliOptions),

    /// Create new empty profile.
    #[command(override_usage = "dockfinity new [options] <profile_name>")]
    New(NewOptions),

    /// Rename profile.
    #[command(override_usage = "dockfinity rename <profile_name> <new_name>")]
    Rename(RenameOptions),

    /// Copy profile under a new name.
    #[command(override_usage = "dockfinity duplicate <profile_name> [<copy_name>]")]
    Duplicate(DuplicateOptions),

    /// Edit items of a profile.
    #[command(subcommand)]
    Item(ItemCommand),

    /// Replace items of an existing profile with the live Dock.
    #[command(override_usage = "dockfinity refresh [options] <profile_name>")]
    Refresh(RefreshOptions),

    /// Converge the live Dock onto a profile.
    #[command(override_usage = "dockfinity apply [options] <profile_name>")]
    Apply(ApplyOptions),

    /// List stored profiles.
    #[command(override_usage = "dockfinity list")]
    List,

    /// Show items of a profile in Dock order.
    #[command(override_usage = "dockfinity show <profile_name>")]
    Show(ShowOptions),

    /// Remove profiles from profile store.
    #[command(override_usage = "dockfinity remove <profile_name>...")]
    Remove(RemoveOptions),

    /// Show pinned items of the live Dock.
    #[command(override_usage = "dockfinity dock")]
    Dock,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CaptureCliOptions {
    /// Name of profile to save the live Dock into.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// Replace profile if it already exists.
    #[arg(short, long)]
    pub force: bool,

    /// Save profile even if the Dock has no pinned items.
    #[arg(short, long)]
    pub allow_empty: bool,

    /// Mark profile as the default profile.
    #[arg(short, long)]
    pub default: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct NewOptions {
    /// Name of profile to create.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// Mark profile as the default profile.
    #[arg(short, long)]
    pub default: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RenameOptions {
    /// Name of profile to rename.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// New name of profile.
    #[arg(required = true, value_name = "new_name")]
    pub new_name: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DuplicateOptions {
    /// Name of profile to copy.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// Name of the copy, defaults to "<profile_name> Copy".
    #[arg(value_name = "copy_name")]
    pub copy_name: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
enum ItemCommand {
    /// Add item to profile.
    #[command(override_usage = "dockfinity item add [options] <profile_name> <kind> [<path>]")]
    Add(ItemAddOptions),

    /// Remove item from profile by position.
    #[command(override_usage = "dockfinity item remove <profile_name> <position>")]
    Remove(ItemRemoveOptions),

    /// Move item of profile to another position.
    #[command(override_usage = "dockfinity item move <profile_name> <from> <to>")]
    Move(ItemMoveOptions),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ItemKind {
    App,
    Folder,
    Url,
    Spacer,
}

impl From<ItemKind> for DockItemKind {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::App => DockItemKind::App,
            ItemKind::Folder => DockItemKind::Folder,
            ItemKind::Url => DockItemKind::Url,
            ItemKind::Spacer => DockItemKind::Spacer,
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ItemAddOptions {
    /// Name of profile to add item to.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// Kind of item to add.
    #[arg(required = true, value_enum, value_name = "kind")]
    pub kind: ItemKind,

    /// Path of app or folder, or URL of web shortcut.
    #[arg(value_name = "path")]
    pub path: Option<String>,

    /// Label shown in the Dock, defaults to the file name.
    #[arg(short, long, value_name = "label")]
    pub name: Option<String>,

    /// Position to insert item at, counting from 1. Appends by default.
    #[arg(short, long, value_name = "position")]
    pub position: Option<usize>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ItemRemoveOptions {
    /// Name of profile to remove item from.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// Position of item, counting from 1.
    #[arg(required = true, value_name = "position")]
    pub position: usize,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ItemMoveOptions {
    /// Name of profile to reorder.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// Current position of item, counting from 1.
    #[arg(required = true, value_name = "from")]
    pub from: usize,

    /// New position of item, counting from 1.
    #[arg(required = true, value_name = "to")]
    pub to: usize,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RefreshOptions {
    /// Name of profile to refresh.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// Refresh profile even if the Dock has no pinned items.
    #[arg(short, long)]
    pub allow_empty: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ApplyOptions {
    /// Name of profile to apply.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,

    /// Do not ask for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ShowOptions {
    /// Name of profile to show.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_name: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RemoveOptions {
    /// Names of profiles to remove from profile store.
    #[arg(required = true, value_name = "profile_name")]
    pub profile_names: Vec<String>,
}

/// Everything a command needs to touch the Dock and the profile store.
struct Session {
    store: ProfileStore,
    engine: ReconciliationEngine,
}

impl Session {
    fn load(config: Option<PathBuf>) -> Result<Self> {
        let settings_path = match config {
            Some(path) => path,
            None => default_settings_path()?,
        };
        let settings = Settings::load(&settings_path)
            .with_context(|| format!("failed to load settings from {:?}", settings_path.display()))?;

        let store = ProfileStore::open(default_profile_store_dir()?)?;
        let engine = ReconciliationEngine::new(
            ProcessRunner::new(),
            settings.dockutil.locator(),
            RetryPolicy::from(&settings.apply),
        );

        Ok(Self { store, engine })
    }

    /// Capture the untouched Dock as the default profile on first launch.
    async fn first_launch(&self) {
        if !self.store.is_first_launch() {
            return;
        }

        let captured: Result<_> = match self.engine.capture_current().await {
            Ok(snapshot) => self.store.create_default_profile(snapshot).map_err(Into::into),
            Err(error) => Err(error.into()),
        };
        if let Err(error) = captured {
            warn!("failed to capture default profile on first launch: {error}");
        }
    }
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        if let Some(hint) = hint_for(&error) {
            info!("{hint}");
        }
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

async fn run_capture(session: Session, opts: CaptureCliOptions) -> Result<()> {
    let snapshot = session.engine.capture_current().await?;
    let options = CaptureOptions {
        overwrite: opts.force,
        allow_empty: opts.allow_empty,
        default: opts.default,
    };
    let profile = session
        .store
        .save_capture(opts.profile_name, snapshot, options)?;
    info!("captured {} items into {:?}", profile.items.len(), profile.name);

    Ok(())
}

fn run_new(session: Session, opts: NewOptions) -> Result<()> {
    let profile = session
        .store
        .create_profile(opts.profile_name, opts.default)?;
    info!("created empty profile {:?}", profile.name);

    Ok(())
}

fn run_rename(session: Session, opts: RenameOptions) -> Result<()> {
    session
        .store
        .rename_profile(opts.profile_name, opts.new_name)?;

    Ok(())
}

fn run_duplicate(session: Session, opts: DuplicateOptions) -> Result<()> {
    let profile = session
        .store
        .duplicate_profile(opts.profile_name, opts.copy_name.as_deref())?;
    info!("copied into {:?}", profile.name);

    Ok(())
}

fn run_item(session: Session, command: ItemCommand) -> Result<()> {
    let profile = match command {
        ItemCommand::Add(opts) => {
            let item = ProfileItem::new(
                opts.kind.into(),
                opts.name.unwrap_or_default(),
                opts.path.unwrap_or_default(),
            );
            let position = opts.position.map(index_of).transpose()?;
            session.store.edit_profile(opts.profile_name, |profile| {
                profile.insert_item(position, item)
            })?
        }
        ItemCommand::Remove(opts) => {
            let position = index_of(opts.position)?;
            session.store.edit_profile(opts.profile_name, |profile| {
                profile.remove_item(position).map(|_| ())
            })?
        }
        ItemCommand::Move(opts) => {
            let (from, to) = (index_of(opts.from)?, index_of(opts.to)?);
            session
                .store
                .edit_profile(opts.profile_name, |profile| profile.move_item(from, to))?
        }
    };
    info!("profile {:?} now has {} items", profile.name, profile.items.len());

    Ok(())
}

/// Turn a position counting from 1 into an index.
fn index_of(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("positions count from 1"))
}

async fn run_refresh(session: Session, opts: RefreshOptions) -> Result<()> {
    // INVARIANT: Profile must exist before touching the Dock.
    session.store.load_profile(&opts.profile_name)?;

    let snapshot = session.engine.capture_current().await?;
    let profile = session
        .store
        .refresh_profile(opts.profile_name, snapshot, opts.allow_empty)?;
    info!("refreshed {:?} with {} items", profile.name, profile.items.len());

    Ok(())
}

async fn run_apply(session: Session, opts: ApplyOptions) -> Result<()> {
    let profile = session.store.load_profile(&opts.profile_name)?;
    let target = profile.target_list();

    if !opts.yes {
        let message = format!(
            "Replace every pinned Dock item with {} items from {:?}?",
            target.len(),
            profile.name
        );
        let confirmed = Confirm::new(&message).with_default(false).prompt()?;
        if !confirmed {
            info!("leaving the Dock alone");
            return Ok(());
        }
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{elapsed_precise:.green}  {spinner}  {msg}")?);
    bar.set_message(format!("applying {:?}", profile.name));
    bar.enable_steady_tick(Duration::from_millis(100));
    let result = session.engine.apply_profile(&target).await;
    bar.finish_and_clear();

    let result = result?;
    report(&result);
    session.store.set_current(&profile.name)?;

    Ok(())
}

fn run_list(session: Session) -> Result<()> {
    let current = session.store.current()?;
    for profile in session.store.list_profiles()? {
        let marker = if current.as_deref() == Some(profile.name.as_str()) {
            "*"
        } else {
            " "
        };
        let default = if profile.default { " (default)" } else { "" };
        println!("{marker} {}{default}  {} items", profile.name, profile.items.len());
    }

    Ok(())
}

fn run_show(session: Session, opts: ShowOptions) -> Result<()> {
    let profile = session.store.load_profile(opts.profile_name)?;
    for (position, entry) in profile.target_list().iter().enumerate() {
        println!("{:>3}  {entry}", position + 1);
    }

    Ok(())
}

fn run_remove(session: Session, opts: RemoveOptions) -> Result<()> {
    for profile_name in opts.profile_names {
        session.store.remove_profile(profile_name)?;
    }

    Ok(())
}

async fn run_dock(session: Session) -> Result<()> {
    let snapshot = session.engine.capture_current().await?;
    for (position, entry) in snapshot.iter().enumerate() {
        println!("{:>3}  {entry}", position + 1);
    }

    Ok(())
}

fn report(result: &ApplyResult) {
    info!(
        "applied {} of {} items, dock now shows {}",
        result.applied_count, result.requested_count, result.verified_count
    );
    for entry in &result.skipped_entries {
        warn!("skipped {entry}: target is missing");
    }
    for warning in &result.warnings {
        warn!("{warning}");
    }
}

fn hint_for(error: &anyhow::Error) -> Option<&'static str> {
    if let Some(DockError::ToolUnavailable(_)) = error.downcast_ref::<DockError>() {
        return Some("install dockutil with `brew install dockutil`");
    }

    match error.downcast_ref::<StoreError>() {
        Some(StoreError::EmptyDockSnapshot) => {
            Some("pin something to the Dock first, or pass --allow-empty")
        }
        Some(StoreError::ProfileNotFound(_)) => Some("run `dockfinity list` to see stored profiles"),
        Some(StoreError::Config(ConfigError::NoSuchPosition { .. })) => {
            Some("run `dockfinity show <profile_name>` to see item positions")
        }
        _ => None,
    }
}
