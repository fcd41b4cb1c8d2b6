use eframe::egui;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

pub const PROGRESS_HIDE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.successful + self.failed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Started { total: usize },
    Progress { completed: usize, total: usize, percent: f32, message: String },
    NothingToDo,
    SetupFailed(String),
    Finished(BatchSummary),
}

impl WorkerEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerEvent::NothingToDo | WorkerEvent::SetupFailed(_) | WorkerEvent::Finished(_)
        )
    }
}

/// Worker side of the progress queue. Sends never block; a dropped
/// receiver (window closed mid-run) is ignored.
#[derive(Clone)]
pub struct ProgressSink {
    tx: Sender<WorkerEvent>,
    repaint: Option<egui::Context>,
}

impl ProgressSink {
    pub fn new(tx: Sender<WorkerEvent>, repaint: Option<egui::Context>) -> Self {
        Self { tx, repaint }
    }

    pub fn send(&self, event: WorkerEvent) {
        let _ = self.tx.send(event);
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}

/// Running fraction `(index + 1) / total * 100`.
pub fn percent_complete(index: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (index + 1) as f32 / total as f32 * 100.0
}

/// Interface-owned view of the running job, mutated only by applying
/// worker events on the update tick.
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    pub completed: usize,
    pub total: usize,
    pub percent: f32,
    pub message: String,
    pub visible: bool,
    hide_at: Option<Instant>,
}

impl ProgressState {
    pub fn apply(&mut self, event: WorkerEvent, now: Instant) {
        match event {
            WorkerEvent::Started { total } => {
                self.completed = 0;
                self.total = total;
                self.percent = 0.0;
                self.visible = true;
                self.hide_at = None;
                self.message = format!("Starting conversion of {} images...", total);
            }
            WorkerEvent::Progress { completed, total, percent, message } => {
                if total != self.total || completed < self.completed || completed > total {
                    tracing::warn!("Ignoring out-of-order progress {}/{}", completed, total);
                    return;
                }
                self.completed = completed;
                self.percent = percent.clamp(self.percent, 100.0);
                self.message = message;
            }
            WorkerEvent::NothingToDo => {
                self.visible = false;
                self.hide_at = None;
                self.message = "❌ No valid images found!".to_string();
            }
            WorkerEvent::SetupFailed(reason) => {
                self.message = format!("❌ Error: {}", reason);
                self.schedule_hide(now);
            }
            WorkerEvent::Finished(summary) => {
                self.message = if summary.failed > 0 {
                    format!(
                        "✅ Converted {} images, {} failed. Check log for details.",
                        summary.successful, summary.failed
                    )
                } else {
                    format!("✅ Successfully converted all {} images!", summary.total())
                };
                self.schedule_hide(now);
            }
        }
    }

    /// Worker went away without a terminal event.
    pub fn abandon(&mut self, now: Instant) {
        self.message = "❌ Conversion stopped unexpectedly.".to_string();
        self.schedule_hide(now);
    }

    fn schedule_hide(&mut self, now: Instant) {
        if self.visible {
            self.hide_at = Some(now + PROGRESS_HIDE_DELAY);
        }
    }

    /// Hides the bar once its deadline passed. Returns the time left until
    /// the pending hide, if any.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        let deadline = self.hide_at?;
        if now >= deadline {
            self.visible = false;
            self.hide_at = None;
            None
        } else {
            Some(deadline - now)
        }
    }

    pub fn fraction(&self) -> f32 {
        self.percent / 100.0
    }
}
