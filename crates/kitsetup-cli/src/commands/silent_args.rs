use anyhow::Result;
use clap::Args;
use colored::Colorize;

use kitsetup_core::executor::split_args;

use crate::store::Store;

/// Arguments for the `args` command
#[derive(Args, Debug)]
pub struct SilentArgsArgs {
    /// Name of the entry
    pub name: String,

    /// New silent-install arguments; omit to show the current ones
    #[arg(allow_hyphen_values = true, conflicts_with = "clear")]
    pub args: Option<String>,

    /// Remove the silent-install arguments
    #[arg(long)]
    pub clear: bool,
}

/// Set, clear or show an entry's silent-install arguments
pub fn run(store: &mut Store, args: SilentArgsArgs) -> Result<()> {
    let mut catalog = store.catalog();

    if !args.clear && args.args.is_none() {
        let entry = catalog
            .get(&args.name)
            .ok_or_else(|| anyhow::anyhow!("no entry named '{}'", args.name))?;
        match entry.silent_args.as_deref() {
            Some(current) => println!("{}: {:?}", entry.name.bold(), split_args(Some(current))),
            None => println!("{}: {}", entry.name.bold(), "no silent args".dimmed()),
        }
        return Ok(());
    }

    catalog.set_silent_args(&args.name, args.args.clone())?;
    store.commit(&catalog)?;
    tracing::info!(name = %args.name, args = ?args.args, "silent args changed");

    match args.args {
        Some(ref value) if !value.trim().is_empty() => println!(
            "{} {} will run with {:?}",
            "~".cyan().bold(),
            args.name.bold(),
            split_args(Some(value))
        ),
        _ => println!("{} Cleared silent args of {}", "~".cyan().bold(), args.name.bold()),
    }
    Ok(())
}
