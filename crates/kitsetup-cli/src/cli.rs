use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use kitsetup_core::catalog::Scope;
use kitsetup_core::document::DATA_FILE_NAME;
use kitsetup_core::entry::Category;

use crate::commands::{
    add::AddArgs, install::InstallArgs, list::ListArgs, remove::RemoveArgs,
    settings::SettingsArgs, silent_args::SilentArgsArgs, source::SourceArgs,
    transfer::{ExportArgs, ImportArgs},
};

/// kitsetup: install a curated list of software in one sequential batch
///
/// Keeps a database of installers (download links or local packages) with
/// their silent-install switches and runs them one after another.
#[derive(Parser, Debug)]
#[command(name = "kitsetup", version, about, long_about = None)]
pub struct Cli {
    /// Increase output verbosity (show debug info)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to the data file (overrides the platform data directory)
    #[arg(long, global = true, env = "KITSETUP_DATA")]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Verbosity level resolved from --verbose / --quiet flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// --quiet: only errors and essential output
    Quiet,
    /// default: normal output
    Normal,
    /// --verbose: extra debug info
    Verbose,
}

impl Cli {
    /// Resolve the verbosity level from CLI flags
    pub fn verbosity(&self) -> Verbosity {
        match (self.quiet, self.verbose) {
            (true, _) => Verbosity::Quiet,
            (_, true) => Verbosity::Verbose,
            _ => Verbosity::Normal,
        }
    }

    /// The data file to use: `--data-file` / `KITSETUP_DATA`, else the
    /// platform data directory, else the current directory.
    pub fn data_file(&self) -> PathBuf {
        if let Some(ref path) = self.data_file {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "kitsetup")
            .map(|dirs| dirs.data_dir().join(DATA_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DATA_FILE_NAME))
    }
}

/// Category of an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    #[default]
    App,
    Game,
    Unclassified,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::App => Category::App,
            CategoryArg::Game => Category::Game,
            CategoryArg::Unclassified => Category::Unclassified,
        }
    }
}

/// Which entries a command covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Every entry
    #[default]
    All,
    /// Entries in the app category
    Apps,
    /// Entries in the game category
    Games,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::All => Scope::All,
            ScopeArg::Apps => Scope::Apps,
            ScopeArg::Games => Scope::Games,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new entry to the database
    Add(AddArgs),

    /// Set or show an entry's silent-install arguments
    #[command(name = "args")]
    SilentArgs(SilentArgsArgs),

    /// Generate shell completion scripts
    Completion(CompletionArgs),

    /// Write the entry list to a JSON file
    Export(ExportArgs),

    /// Merge entries from a JSON file into the database
    Import(ImportArgs),

    /// Install entries one after another, stopping at the first failure
    Install(InstallArgs),

    /// List entries in the database
    #[command(alias = "ls")]
    List(ListArgs),

    /// Remove entries from the database
    #[command(alias = "rm")]
    Remove(RemoveArgs),

    /// Show or change settings
    Settings(SettingsArgs),

    /// Change where an entry's installer comes from
    Source(SourceArgs),
}

/// Arguments for the `completion` command
#[derive(Args, Debug)]
pub struct CompletionArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
