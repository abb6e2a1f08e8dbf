use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use kitsetup_core::entry::{SoftwareEntry, SourceDescriptor};

use crate::cli::CategoryArg;
use crate::store::Store;

/// Arguments for the `add` command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Unique name of the entry
    pub name: String,

    /// Category the entry is listed under
    #[arg(short, long, value_enum, default_value_t = CategoryArg::App)]
    pub category: CategoryArg,

    /// Download link of the installer
    #[arg(long, conflicts_with = "package")]
    pub link: Option<String>,

    /// Path to an installer on this machine
    #[arg(long)]
    pub package: Option<PathBuf>,

    /// Arguments for an unattended install (e.g. "/S /NORESTART")
    #[arg(long, allow_hyphen_values = true)]
    pub silent_args: Option<String>,
}

/// Add a new entry to the database
pub fn run(store: &mut Store, args: AddArgs) -> Result<()> {
    let source = match (args.link, args.package) {
        (Some(url), _) => SourceDescriptor::Link { url },
        (_, Some(path)) => SourceDescriptor::Package {
            path: package_path(&path)?,
        },
        (None, None) => SourceDescriptor::Unknown,
    };

    let mut entry = SoftwareEntry::new(args.name, args.category.into()).with_source(source);
    if let Some(silent_args) = args.silent_args {
        entry = entry.with_silent_args(silent_args);
    }

    let mut catalog = store.catalog();
    let installable = entry.is_installable();
    let name = entry.name.clone();
    catalog.add(entry)?;
    store.commit(&catalog)?;
    tracing::info!(%name, "entry added");

    println!("{} Added {}", "+".green().bold(), name.bold());
    if !installable {
        println!(
            "{} '{}' has no source yet; set one with `kitsetup source`",
            "i".blue(),
            name
        );
    }
    Ok(())
}

/// Store package paths as absolute paths so they resolve from any directory.
pub fn package_path(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Invalid package path {}", path.display()))?;
    Ok(absolute.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: AddArgs,
    }

    #[test]
    fn test_add_args_defaults() {
        let cli = TestCli::parse_from(["test", "Firefox"]);
        assert_eq!(cli.args.name, "Firefox");
        assert_eq!(cli.args.category, CategoryArg::App);
        assert!(cli.args.link.is_none());
        assert!(cli.args.package.is_none());
        assert!(cli.args.silent_args.is_none());
    }

    #[test]
    fn test_add_args_hyphenated_silent_args() {
        let cli = TestCli::parse_from([
            "test",
            "Tool",
            "--link",
            "https://x/tool.exe",
            "--silent-args",
            "--quiet --norestart",
        ]);
        assert_eq!(cli.args.silent_args.as_deref(), Some("--quiet --norestart"));
    }

    #[test]
    fn test_link_conflicts_with_package() {
        let result = TestCli::try_parse_from([
            "test",
            "Tool",
            "--link",
            "https://x/tool.exe",
            "--package",
            "/opt/tool.sh",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_package_path_is_absolute() {
        let path = package_path(Path::new("setup.exe")).expect("absolute");
        assert!(Path::new(&path).is_absolute());
    }
}
