use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use syncker_domain::RemoteDrive;

use crate::config::{Config, GlobalOptions};
use crate::effects::{ConsentFlow, Effects, SharedEffects};
use crate::progress::ProgressReporter;
use crate::store::IndexStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandGroup {
    Auth,
    List,
    Index,
    Unindex,
    Link,
    Unlink,
    Sync,
    Backup,
    Download,
    Update,
    Upload,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Auth => "auth",
            CommandGroup::List => "list",
            CommandGroup::Index => "index",
            CommandGroup::Unindex => "unindex",
            CommandGroup::Link => "link",
            CommandGroup::Unlink => "unlink",
            CommandGroup::Sync => "sync",
            CommandGroup::Backup => "backup",
            CommandGroup::Download => "download",
            CommandGroup::Update => "update",
            CommandGroup::Upload => "upload",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    cwd: PathBuf,
    home: Option<PathBuf>,
    effects: SharedEffects,
}

impl<'a> CommandContext<'a> {
    /// Creates a new command context with the provided global options.
    ///
    /// # Errors
    /// Returns an error if the configuration or working directory cannot be read.
    pub fn new(global: &'a GlobalOptions, effects: SharedEffects) -> Result<Self> {
        let config = Config::from_env()?;
        let cwd = std::env::current_dir().context("unable to read the current directory")?;
        Ok(Self::from_parts(global, config, cwd, effects))
    }

    #[must_use]
    pub fn from_parts(
        global: &'a GlobalOptions,
        config: Config,
        cwd: PathBuf,
        effects: SharedEffects,
    ) -> Self {
        Self {
            global,
            config,
            cwd,
            home: dirs_next::home_dir(),
            effects,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Base directory for relative local paths given on the command line.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }

    pub fn consent(&self) -> &dyn ConsentFlow {
        self.effects.consent()
    }

    /// Opens the index store, creating the state directory on first use.
    ///
    /// # Errors
    /// Returns an error if the state directory cannot be created.
    pub fn store(&self) -> Result<IndexStore> {
        IndexStore::open(self.config.state())
    }

    /// Connects to Drive with the stored credentials.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn drive(&self) -> Result<Box<dyn RemoteDrive>> {
        self.effects.drive().connect(&self.config)
    }

    pub fn progress(&self) -> ProgressReporter {
        ProgressReporter::new(self.config.progress(), self.global.quiet)
    }
}
