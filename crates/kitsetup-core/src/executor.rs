use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;

/// `CREATE_NO_WINDOW` process creation flag.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start {}: {source}", path.display())]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The installer ran and reported failure. `-1` when it was terminated
    /// without an exit code.
    #[error("installer exited with code {0}")]
    NonZeroExit(i32),

    #[error("failed waiting for {}: {source}", path.display())]
    Wait {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Runs a resolved installer artifact.
pub trait Execute {
    fn execute(
        &self,
        artifact: &Path,
        extra_args: Option<&str>,
    ) -> impl Future<Output = Result<(), ExecError>> + Send;
}

/// What happens to an installer's stdout/stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Share the caller's terminal
    #[default]
    Inherit,
    /// Throw the output away
    Discard,
}

impl OutputMode {
    fn stdio(self) -> Stdio {
        match self {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Discard => Stdio::null(),
        }
    }
}

/// Spawns installers directly (never through a shell) and waits for them.
#[derive(Debug, Clone, Default)]
pub struct InstallExecutor {
    output: OutputMode,
}

impl InstallExecutor {
    pub fn new(output: OutputMode) -> Self {
        Self { output }
    }
}

impl Execute for InstallExecutor {
    async fn execute(&self, artifact: &Path, extra_args: Option<&str>) -> Result<(), ExecError> {
        let mut cmd = tokio::process::Command::new(artifact);
        cmd.args(split_args(extra_args))
            .stdin(Stdio::null())
            .stdout(self.output.stdio())
            .stderr(self.output.stdio())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn().map_err(|source| ExecError::SpawnFailed {
            path: artifact.to_path_buf(),
            source,
        })?;

        let status = child.wait().await.map_err(|source| ExecError::Wait {
            path: artifact.to_path_buf(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::NonZeroExit(status.code().unwrap_or(-1)))
        }
    }
}

/// Split silent-install arguments on whitespace. Quotes are not interpreted.
pub fn split_args(extra_args: Option<&str>) -> Vec<&str> {
    extra_args
        .map(|args| args.split_whitespace().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_args_two_switches() {
        assert_eq!(split_args(Some("/S /NOICON")), vec!["/S", "/NOICON"]);
    }

    #[test]
    fn test_split_args_collapses_whitespace() {
        assert_eq!(
            split_args(Some("  --quiet \t--norestart\n  ")),
            vec!["--quiet", "--norestart"]
        );
    }

    #[test]
    fn test_split_args_does_not_honor_quotes() {
        assert_eq!(
            split_args(Some(r#"/D="C:\Program Files""#)),
            vec![r#"/D="C:\Program"#, r#"Files""#]
        );
    }

    #[test]
    fn test_split_args_none_or_blank() {
        assert!(split_args(None).is_empty());
        assert!(split_args(Some("   ")).is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failed() {
        let executor = InstallExecutor::new(OutputMode::Discard);
        let result = executor
            .execute(Path::new("/no/such/installer.exe"), None)
            .await;
        assert!(
            matches!(result, Err(ExecError::SpawnFailed { .. })),
            "expected SpawnFailed, got: {result:?}"
        );
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn script(dir: &TempDir, name: &str, body: &str, mode: u32) -> PathBuf {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
                .expect("chmod");
            path
        }

        #[tokio::test]
        async fn test_args_are_passed_as_separate_argv_entries() {
            let dir = TempDir::new().expect("tempdir");
            let out = dir.path().join("argv.txt");
            let installer = script(
                &dir,
                "setup.sh",
                &format!(r#"for a in "$@"; do echo "$a" >> '{}'; done"#, out.display()),
                0o755,
            );

            let executor = InstallExecutor::new(OutputMode::Discard);
            executor
                .execute(&installer, Some("/S /NOICON"))
                .await
                .expect("installer should succeed");

            let argv = std::fs::read_to_string(&out).expect("read argv");
            assert_eq!(argv.lines().collect::<Vec<_>>(), vec!["/S", "/NOICON"]);
        }

        #[tokio::test]
        async fn test_args_are_not_shell_interpreted() {
            let dir = TempDir::new().expect("tempdir");
            let out = dir.path().join("argv.txt");
            let marker = dir.path().join("pwned");
            let installer = script(
                &dir,
                "setup.sh",
                &format!(r#"for a in "$@"; do echo "$a" >> '{}'; done"#, out.display()),
                0o755,
            );

            let args = format!(";touch {}", marker.display());
            let executor = InstallExecutor::new(OutputMode::Discard);
            executor
                .execute(&installer, Some(&args))
                .await
                .expect("installer should succeed");

            assert!(!marker.exists());
            let argv = std::fs::read_to_string(&out).expect("read argv");
            assert_eq!(argv.lines().count(), 2);
        }

        #[tokio::test]
        async fn test_non_zero_exit_reports_code() {
            let dir = TempDir::new().expect("tempdir");
            let installer = script(&dir, "fail.sh", "exit 3", 0o755);

            let executor = InstallExecutor::new(OutputMode::Discard);
            let result = executor.execute(&installer, None).await;
            assert!(
                matches!(result, Err(ExecError::NonZeroExit(3))),
                "expected exit code 3, got: {result:?}"
            );
        }

        #[tokio::test]
        async fn test_missing_exec_bit_is_spawn_failed() {
            let dir = TempDir::new().expect("tempdir");
            let installer = script(&dir, "noexec.sh", "exit 0", 0o644);

            let executor = InstallExecutor::new(OutputMode::Discard);
            let result = executor.execute(&installer, None).await;
            assert!(matches!(result, Err(ExecError::SpawnFailed { .. })));
        }
    }
}
