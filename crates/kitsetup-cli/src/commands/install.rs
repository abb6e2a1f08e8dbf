use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use kitsetup_core::batch::BatchRequest;
use kitsetup_core::catalog::Catalog;
use kitsetup_core::executor::{InstallExecutor, OutputMode};
use kitsetup_core::resolver::SourceResolver;
use kitsetup_core::runner::{BatchRunner, RunnerOptions};

use crate::cli::ScopeArg;
use crate::store::Store;

/// Exit status after a second Ctrl-C (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Arguments for the `install` command
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Entries to install, in this order (default: every entry in --scope)
    pub names: Vec<String>,

    /// Which entries to install when no names are given
    #[arg(long, value_enum, default_value_t = ScopeArg::All, conflicts_with = "names")]
    pub scope: ScopeArg,

    /// Print the plan without downloading or running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Directory to stage downloads in (a fresh subdirectory is used and removed)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Disable the progress bar for this run
    #[arg(long)]
    pub no_progress: bool,

    /// Let installers write to this terminal
    #[arg(long)]
    pub show_output: bool,
}

/// Install the selected entries one after another
///
/// Stops at the first entry that fails to download or install.
pub async fn run(store: &Store, args: InstallArgs, quiet: bool) -> Result<()> {
    let catalog = store.catalog();
    let request = build_request(&catalog, &args)?;

    if request.is_empty() {
        println!("{}", "Nothing to install.".yellow());
        return Ok(());
    }

    println!(
        "\n{} Installing {} item(s):\n",
        "$".cyan(),
        request.len().to_string().cyan()
    );
    for entry in request.items() {
        println!("  {} {} ({})", "->".cyan(), entry.name, entry.source);
    }
    println!();

    if args.dry_run {
        println!("{}", "DRY RUN: nothing was installed.".yellow().bold());
        return Ok(());
    }

    let cancel = CancellationToken::new();
    tokio::spawn(watch_interrupts(cancel.clone()));

    let resolver = SourceResolver::new().context("Failed to create HTTP client")?;
    let output = if args.show_output {
        OutputMode::Inherit
    } else {
        OutputMode::Discard
    };
    let runner = BatchRunner::new(resolver, InstallExecutor::new(output))
        .with_options(RunnerOptions {
            work_root: args.work_dir.clone(),
        })
        .with_cancellation(cancel);

    let show_progress = store.document.settings.show_progress && !args.no_progress && !quiet;
    let (tx, render_handle) = crate::render::spawn_renderer(request.len(), show_progress);
    // `tx` moves into the runner and is dropped when it returns, ending the render loop
    let result = runner.run(&request, tx).await;
    render_handle.await??;
    let result = result?;

    tracing::info!(
        attempted = result.attempted,
        succeeded = result.succeeded,
        cancelled = result.cancelled,
        "batch finished"
    );

    if let Some(failed) = result.failed_item {
        anyhow::bail!(
            "'{}' failed: {} ({} of {} installed)",
            failed.name,
            failed.error,
            result.succeeded,
            request.len()
        );
    }
    if result.cancelled {
        anyhow::bail!(
            "cancelled ({} of {} installed)",
            result.succeeded,
            request.len()
        );
    }

    println!(
        "\n{}",
        format!("Installed {} item(s).", result.succeeded).green()
    );
    Ok(())
}

/// First Ctrl-C cancels the batch at the next item boundary; a second one
/// exits at once, leaving a hung installer or download behind.
async fn watch_interrupts(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    eprintln!(
        "\n{} Stopping after the current item (Ctrl-C again to abort)...",
        "!".yellow()
    );
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        eprintln!("\n{} Aborted", "!".red().bold());
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
}

/// Select entries by name, or by scope when no names are given. Entries
/// without a usable source are skipped with a warning.
fn build_request(catalog: &Catalog, args: &InstallArgs) -> Result<BatchRequest> {
    let candidates: Vec<_> = if args.names.is_empty() {
        catalog.in_scope(args.scope.into()).collect()
    } else {
        // validates every name before anything runs
        catalog.select(&args.names)?;
        args.names.iter().filter_map(|name| catalog.get(name)).collect()
    };

    for entry in candidates.iter().filter(|e| !e.is_installable()) {
        eprintln!(
            "{} Skipping '{}': no download link or package path",
            "WARNING:".yellow().bold(),
            entry.name
        );
    }

    Ok(BatchRequest::new(candidates.into_iter().cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use kitsetup_core::entry::{Category, SoftwareEntry, SourceDescriptor};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: InstallArgs,
    }

    fn catalog() -> Catalog {
        let link = |name: &str, category| {
            SoftwareEntry::new(name, category).with_source(SourceDescriptor::Link {
                url: format!("https://example.com/{name}.exe"),
            })
        };
        Catalog::from_entries([
            link("A", Category::App),
            link("G", Category::Game),
            SoftwareEntry::new("NoSource", Category::App),
            link("B", Category::App),
        ])
    }

    #[test]
    fn test_install_args_defaults() {
        let cli = TestCli::parse_from(["test"]);
        assert!(cli.args.names.is_empty());
        assert_eq!(cli.args.scope, ScopeArg::All);
        assert!(!cli.args.dry_run);
        assert!(!cli.args.show_output);
    }

    #[test]
    fn test_names_conflict_with_scope() {
        assert!(TestCli::try_parse_from(["test", "A", "--scope", "games"]).is_err());
    }

    #[test]
    fn test_request_by_scope_skips_uninstallable() {
        let cli = TestCli::parse_from(["test", "--scope", "apps"]);
        let request = build_request(&catalog(), &cli.args).expect("request");
        let names: Vec<_> = request.items().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn test_request_by_name_keeps_given_order() {
        let cli = TestCli::parse_from(["test", "B", "G", "A", "B"]);
        let request = build_request(&catalog(), &cli.args).expect("request");
        let names: Vec<_> = request.items().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["B", "G", "A"]);
    }

    #[test]
    fn test_request_unknown_name_is_error() {
        let cli = TestCli::parse_from(["test", "A", "Missing"]);
        assert!(build_request(&catalog(), &cli.args).is_err());
    }
}
