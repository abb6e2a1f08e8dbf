use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use kitsetup_core::document::{export_entries, import_entries};
use kitsetup_core::entry::SoftwareEntry;

use crate::cli::ScopeArg;
use crate::store::Store;

/// Arguments for the `export` command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// File to write
    pub file: PathBuf,

    /// Which entries to export
    #[arg(long, value_enum, default_value_t = ScopeArg::All)]
    pub scope: ScopeArg,
}

/// Arguments for the `import` command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Entry list or data file to read
    pub file: PathBuf,

    /// Overwrite entries that already exist
    #[arg(long)]
    pub replace: bool,
}

pub fn export(store: &Store, args: ExportArgs) -> Result<()> {
    let catalog = store.catalog();
    let entries: Vec<SoftwareEntry> = catalog.in_scope(args.scope.into()).cloned().collect();
    export_entries(&entries, &args.file)?;
    tracing::info!(count = entries.len(), file = %args.file.display(), "entries exported");

    println!(
        "Exported {} entr{} to {}",
        entries.len().to_string().cyan(),
        if entries.len() == 1 { "y" } else { "ies" },
        args.file.display()
    );
    Ok(())
}

pub fn import(store: &mut Store, args: ImportArgs) -> Result<()> {
    let entries = import_entries(&args.file)?;
    let total = entries.len();

    let mut catalog = store.catalog();
    let changed = catalog.merge(entries, args.replace);
    store.commit(&catalog)?;
    tracing::info!(total, changed, file = %args.file.display(), "entries imported");

    println!(
        "Imported {} of {} entries from {}",
        changed.to_string().cyan(),
        total,
        args.file.display()
    );
    if changed < total {
        println!(
            "{} {} skipped (already present or unnamed){}",
            "i".blue(),
            total - changed,
            if args.replace { "" } else { "; use --replace to overwrite" }
        );
    }
    Ok(())
}
