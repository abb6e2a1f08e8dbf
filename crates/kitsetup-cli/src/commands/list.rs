use anyhow::Result;
use clap::Args;
use colored::Colorize;

use kitsetup_core::entry::SoftwareEntry;

use crate::cli::ScopeArg;
use crate::store::Store;

/// Arguments for the `list` command
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Which entries to show
    #[arg(long, value_enum, default_value_t = ScopeArg::All)]
    pub scope: ScopeArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// List entries in the database
pub fn run(store: &Store, args: ListArgs) -> Result<()> {
    let catalog = store.catalog();
    let entries: Vec<&SoftwareEntry> = catalog.in_scope(args.scope.into()).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No entries found.".yellow());
        return Ok(());
    }

    println!();
    for entry in &entries {
        print_entry(entry);
    }
    println!(
        "\n{} entries, {} installable\n",
        entries.len(),
        entries.iter().filter(|e| e.is_installable()).count()
    );

    Ok(())
}

fn print_entry(entry: &SoftwareEntry) {
    let category = format!("[{}]", entry.category);
    let source = if entry.is_installable() {
        entry.source.to_string().normal()
    } else {
        format!("{} (not installable)", entry.source).dimmed()
    };
    let args = entry
        .silent_args
        .as_deref()
        .map(|a| format!(" args: {a}"))
        .unwrap_or_default();

    println!(
        "  {} {} {}{}",
        entry.name.bold(),
        category.cyan(),
        source,
        args.dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_defaults() {
        use clap::Parser;

        #[derive(Parser)]
        struct TestCli {
            #[command(flatten)]
            args: ListArgs,
        }

        let cli = TestCli::parse_from(["test"]);
        assert_eq!(cli.args.scope, ScopeArg::All);
        assert!(!cli.args.json);

        let cli = TestCli::parse_from(["test", "--scope", "games", "--json"]);
        assert_eq!(cli.args.scope, ScopeArg::Games);
        assert!(cli.args.json);
    }
}
