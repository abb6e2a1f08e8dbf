use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use kitsetup_core::entry::SourceDescriptor;

use super::add::package_path;
use crate::store::Store;

/// Arguments for the `source` command
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Name of the entry to change
    pub name: String,

    #[command(subcommand)]
    pub kind: SourceKind,
}

#[derive(Subcommand, Debug)]
pub enum SourceKind {
    /// Download the installer from a URL
    Link { url: String },
    /// Use an installer already on this machine
    Package { path: PathBuf },
    /// Clear the source (the entry can no longer be installed)
    Unknown,
}

/// Replace the source of an existing entry
pub fn run(store: &mut Store, args: SourceArgs) -> Result<()> {
    let source = match args.kind {
        SourceKind::Link { url } => SourceDescriptor::Link { url },
        SourceKind::Package { path } => SourceDescriptor::Package {
            path: package_path(&path)?,
        },
        SourceKind::Unknown => SourceDescriptor::Unknown,
    };

    let mut catalog = store.catalog();
    catalog.set_source(&args.name, source.clone())?;
    store.commit(&catalog)?;
    tracing::info!(name = %args.name, %source, "source changed");

    println!("{} {} -> {}", "~".cyan().bold(), args.name.bold(), source);
    Ok(())
}
