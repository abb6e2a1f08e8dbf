mod cli;
mod commands;
mod logging;
mod render;
mod store;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, Verbosity};
use colored::Colorize;
use commands::settings::SettingsAction;
use store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    // `completion` doesn't need the data file, so handle it early
    if let Commands::Completion(ref args) = cli.command {
        clap_complete::generate(
            args.shell,
            &mut <Cli as clap::CommandFactory>::command(),
            "kitsetup",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let data_file = cli.data_file();
    let data_dir = data_file.parent().unwrap_or(Path::new("."));
    let log_guard = logging::init(data_dir, verbosity);
    tracing::debug!(data_file = %data_file.display(), "starting kitsetup");

    let mut store = match Store::load(&data_file) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{} Failed to load data file: {:#}", "ERROR".red().bold(), e);
            std::process::exit(1);
        }
    };

    for row in store.document.shadowed_rows() {
        tracing::warn!(name = %row.name, "row hidden by an earlier entry or blank name");
        if verbosity != Verbosity::Quiet {
            eprintln!(
                "{} Row '{}' is hidden (blank or repeated name); it is kept in the data file",
                "WARNING:".yellow().bold(),
                row.name
            );
        }
    }

    if verbosity == Verbosity::Verbose {
        println!(
            "{} {} entries, data from {}",
            "DEBUG".dimmed(),
            store.document.database.len(),
            store.path().display()
        );
    }

    let announce = verbosity != Verbosity::Quiet && announces_result(&cli.command);

    let result = match cli.command {
        Commands::Add(args) => commands::add::run(&mut store, args),
        Commands::Completion(_) => unreachable!("completion handled above"),
        Commands::Export(args) => commands::transfer::export(&store, args),
        Commands::Import(args) => commands::transfer::import(&mut store, args),
        Commands::Install(args) => {
            commands::install::run(&store, args, verbosity == Verbosity::Quiet).await
        }
        Commands::List(args) => commands::list::run(&store, args),
        Commands::Remove(args) => commands::remove::run(&mut store, args),
        Commands::Settings(args) => commands::settings::run(&mut store, args),
        Commands::SilentArgs(args) => commands::silent_args::run(&mut store, args),
        Commands::Source(args) => commands::source::run(&mut store, args),
    };

    match result {
        Ok(()) => {
            if announce {
                println!("\n{}", "SUCCESS".green().bold());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("\n{} {:#}", "FAILED".red().bold(), e);
            // exit() skips destructors; flush the log writer first
            drop(log_guard);
            std::process::exit(1);
        }
    }
}

/// Commands whose output is data (listings, single values) skip the
/// trailing SUCCESS line so it can be piped.
fn announces_result(command: &Commands) -> bool {
    match command {
        Commands::List(_) | Commands::Completion(_) => false,
        Commands::Settings(args) => matches!(args.action, Some(SettingsAction::Set { .. })),
        Commands::SilentArgs(args) => args.clear || args.args.is_some(),
        _ => true,
    }
}
