use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

/// Step of an item's lifecycle: Resolving → [Downloading] → Installing →
/// Finished | Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolving,
    Downloading,
    Installing,
    Finished,
    Failed,
    /// The run was stopped by its cancellation token at this item.
    Cancelled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Resolving => "Processing",
            Phase::Downloading => "Downloading",
            Phase::Installing => "Installing",
            Phase::Finished => "Finished",
            Phase::Failed => "Failed",
            Phase::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// Progress report emitted by the batch runner.
///
/// These events decouple the pipeline from the presentation layer: a CLI
/// progress bar, a GUI dialog and a test recorder all consume the same stream.
///
/// `index` is the item's position for every phase except `Finished`, which
/// carries the completed count (position + 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub index: usize,
    pub total: usize,
    pub phase: Phase,
    pub item_name: String,
    pub error: Option<String>,
}

impl ProgressEvent {
    /// One-based position of the item this event is about.
    pub fn position(&self) -> usize {
        match self.phase {
            Phase::Finished => self.index,
            _ => self.index + 1,
        }
    }

    /// Status line, e.g. `(2/3) Downloading Foo...`.
    pub fn message(&self) -> String {
        let counter = format!("({}/{})", self.position(), self.total);
        match (&self.phase, &self.error) {
            (Phase::Finished, _) => format!("{counter} Finished {}.", self.item_name),
            (Phase::Failed, Some(error)) => {
                format!("{counter} Failed {}: {error}", self.item_name)
            }
            (phase, _) => format!("{counter} {phase} {}...", self.item_name),
        }
    }
}

/// Receiver of progress events.
///
/// Called synchronously on the runner's own sequence, so implementations must
/// return quickly and hand events off to whatever loop renders them.
pub trait ProgressSink {
    fn on_event(&mut self, event: ProgressEvent);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn on_event(&mut self, event: ProgressEvent) {
        (**self).on_event(event);
    }
}

/// Forward to a render task. Send errors are ignored (the receiver may have
/// been dropped).
impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn on_event(&mut self, event: ProgressEvent) {
        let _ = self.send(event);
    }
}

/// Record every event in order.
impl ProgressSink for Vec<ProgressEvent> {
    fn on_event(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}
