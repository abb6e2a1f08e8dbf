use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use kitsetup_core::settings::Settings;

use crate::store::Store;

/// Arguments for the `settings` command
#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: Option<SettingsAction>,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Change a setting
    Set { key: String, value: String },
    /// Print a single setting
    Get { key: String },
}

/// Show all settings, or get/set one
pub fn run(store: &mut Store, args: SettingsArgs) -> Result<()> {
    match args.action {
        None => {
            let settings = &store.document.settings;
            for key in Settings::KEYS {
                println!("{:<20} {}", key.bold(), settings.get(key)?);
            }
        }
        Some(SettingsAction::Get { key }) => {
            println!("{}", store.document.settings.get(&key)?);
        }
        Some(SettingsAction::Set { key, value }) => {
            store.document.settings.set(&key, &value)?;
            store.save()?;
            let current = store.document.settings.get(&key)?;
            tracing::info!(%key, value = %current, "setting changed");
            println!("{} {} = {}", "~".cyan().bold(), key.bold(), current);
        }
    }
    Ok(())
}
