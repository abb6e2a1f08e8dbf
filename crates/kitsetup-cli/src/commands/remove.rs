use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::store::Store;

/// Arguments for the `remove` command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Names of the entries to remove
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Remove entries from the database
///
/// All names must exist; otherwise nothing is removed.
pub fn run(store: &mut Store, args: RemoveArgs) -> Result<()> {
    let mut catalog = store.catalog();
    let removed = catalog.remove(&args.names)?;
    store.commit(&catalog)?;

    for entry in &removed {
        tracing::info!(name = %entry.name, "entry removed");
        println!("{} Removed {}", "-".red().bold(), entry.name.bold());
    }
    Ok(())
}
