use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use kitsetup_core::events::{Phase, ProgressEvent};

/// Create the batch progress bar.
///
/// `{spinner} [{bar}] {pos}/{len} {msg}`, where `pos` is the number of
/// finished items.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Spawn the render task for a batch run.
///
/// Returns the sink half (hand it to the runner) and the task handle. The
/// loop ends once the sender is dropped; await the handle afterwards.
pub fn spawn_renderer(
    total: usize,
    show_progress: bool,
) -> (mpsc::UnboundedSender<ProgressEvent>, JoinHandle<Result<()>>) {
    let pb = show_progress.then(|| create_progress_bar(total as u64));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move { render_loop(rx, pb).await });
    (tx, handle)
}

/// Render events as they arrive: log every one, then update the bar or print
/// a status line.
async fn render_loop(
    mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
    pb: Option<ProgressBar>,
) -> Result<()> {
    while let Some(event) = rx.recv().await {
        log_event(&event);

        match pb {
            Some(ref pb) => {
                if event.phase == Phase::Finished {
                    pb.set_position(event.index as u64);
                }
                if matches!(
                    event.phase,
                    Phase::Finished | Phase::Failed | Phase::Cancelled
                ) {
                    pb.println(status_line(&event));
                }
                pb.set_message(event.message());
            }
            None => match event.phase {
                Phase::Failed | Phase::Cancelled => eprintln!("{}", status_line(&event)),
                _ => println!("{}", status_line(&event)),
            },
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    Ok(())
}

/// Colored one-line rendering of `event`.
fn status_line(event: &ProgressEvent) -> String {
    let message = event.message();
    match event.phase {
        Phase::Finished => format!("{} {}", "✓".green().bold(), message),
        Phase::Failed => format!("{} {}", "✗".red().bold(), message.red()),
        Phase::Cancelled => format!("{} {}", "!".yellow().bold(), message.yellow()),
        Phase::Downloading => format!("{} {}", "↓".cyan(), message),
        Phase::Resolving | Phase::Installing => format!("{} {}", "->".cyan(), message),
    }
}

fn log_event(event: &ProgressEvent) {
    match event.phase {
        Phase::Failed => tracing::error!(
            item = %event.item_name,
            index = event.index,
            total = event.total,
            error = event.error.as_deref().unwrap_or_default(),
            "install failed"
        ),
        Phase::Cancelled => tracing::warn!(item = %event.item_name, "batch cancelled"),
        phase => tracing::info!(
            item = %event.item_name,
            index = event.index,
            total = event.total,
            %phase,
            "progress"
        ),
    }
}
