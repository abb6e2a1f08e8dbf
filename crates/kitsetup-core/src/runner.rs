use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchRequest, BatchResult, FailedItem, ItemError};
use crate::entry::{SoftwareEntry, SourceDescriptor};
use crate::events::{Phase, ProgressEvent, ProgressSink};
use crate::executor::Execute;
use crate::resolver::Resolve;

/// Prefix of the per-run working directory.
const WORK_DIR_PREFIX: &str = "kitsetup-";

/// Failure to set up a run. Item failures never surface here; they are
/// reported in [`BatchResult::failed_item`].
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to create working directory: {0}")]
    WorkDir(#[source] io::Error),
}

/// Options for the batch runner (clap-free).
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Parent of the per-run working directory (system temp dir if unset)
    pub work_root: Option<PathBuf>,
}

/// Sequential installer: resolves and runs one item at a time and stops at
/// the first failure.
///
/// Only one download or installer process is active at any moment. A failed
/// silent install may leave the host in a state later installers should not
/// build on, so the batch is not continued past it.
pub struct BatchRunner<R, E> {
    resolver: R,
    executor: E,
    options: RunnerOptions,
    cancel: CancellationToken,
}

impl<R: Resolve, E: Execute> BatchRunner<R, E> {
    pub fn new(resolver: R, executor: E) -> Self {
        Self {
            resolver,
            executor,
            options: RunnerOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop the run at the next item boundary (or between download and
    /// install) once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run every item of `request`, reporting progress to `sink`.
    ///
    /// Downloads are staged in a temporary directory that is removed when this
    /// returns, whatever the outcome. An empty request returns immediately
    /// without touching the file system.
    pub async fn run<S: ProgressSink>(
        &self,
        request: &BatchRequest,
        mut sink: S,
    ) -> Result<BatchResult, BatchError> {
        if request.is_empty() {
            return Ok(BatchResult::default());
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix(WORK_DIR_PREFIX);
        let work_dir = match &self.options.work_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(BatchError::WorkDir)?;

        Ok(self.run_in(request, &mut sink, work_dir.path()).await)
        // work_dir dropped here, removing every downloaded artifact
    }

    /// Run the batch using `work_dir` for downloads. The caller owns the
    /// directory's lifetime.
    pub async fn run_in<S: ProgressSink>(
        &self,
        request: &BatchRequest,
        mut sink: S,
        work_dir: &Path,
    ) -> BatchResult {
        let total = request.len();
        let mut result = BatchResult::default();

        for (index, item) in request.items().iter().enumerate() {
            let mut emit = |phase: Phase, error: Option<String>| {
                let index = if phase == Phase::Finished { index + 1 } else { index };
                sink.on_event(ProgressEvent {
                    index,
                    total,
                    phase,
                    item_name: item.name.clone(),
                    error,
                });
            };

            if self.cancel.is_cancelled() {
                emit(Phase::Cancelled, None);
                result.cancelled = true;
                return result;
            }

            result.attempted += 1;
            match self.install_item(item, work_dir, &mut emit).await {
                Ok(Step::Installed) => {
                    result.succeeded += 1;
                    emit(Phase::Finished, None);
                }
                Ok(Step::Cancelled) => {
                    emit(Phase::Cancelled, None);
                    result.cancelled = true;
                    return result;
                }
                Err(error) => {
                    emit(Phase::Failed, Some(error.to_string()));
                    result.failed_item = Some(FailedItem {
                        name: item.name.clone(),
                        error,
                    });
                    return result;
                }
            }
        }

        result
    }

    async fn install_item<F>(
        &self,
        item: &SoftwareEntry,
        work_dir: &Path,
        emit: &mut F,
    ) -> Result<Step, ItemError>
    where
        F: FnMut(Phase, Option<String>),
    {
        emit(Phase::Resolving, None);
        if matches!(item.source, SourceDescriptor::Link { .. }) {
            emit(Phase::Downloading, None);
        }
        let artifact = self.resolver.resolve(&item.source, work_dir).await?;

        if self.cancel.is_cancelled() {
            return Ok(Step::Cancelled);
        }

        emit(Phase::Installing, None);
        self.executor
            .execute(&artifact, item.silent_args.as_deref())
            .await?;
        Ok(Step::Installed)
    }
}

enum Step {
    Installed,
    Cancelled,
}
