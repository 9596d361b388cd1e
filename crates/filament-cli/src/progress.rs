use indicatif::{ProgressBar, ProgressStyle};

use filament_core::batch::{BatchStage, ProgressReporter, RowStatus};

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:32} [{bar:40}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// One bar over all pairs of a batch; the message follows the latest stage.
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(bar_style());
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl ProgressReporter for BatchProgress {
    fn begin_batch(&self, total_pairs: usize) {
        self.bar.set_length(total_pairs as u64);
    }

    fn begin_stage(&self, name: &str, stage: BatchStage, _total_items: Option<usize>) {
        self.bar.set_message(format!("{name}: {stage}"));
    }

    fn finish_pair(&self, name: &str, status: RowStatus) {
        if status == RowStatus::Failed {
            self.bar.println(format!("  {name} failed"));
        }
        self.bar.inc(1);
    }

    fn pair_skipped(&self, _name: &str) {
        self.bar.inc(1);
    }
}

/// Per-frame bar for a single pair.
pub struct FrameProgress {
    bar: ProgressBar,
}

impl FrameProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(bar_style());
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl ProgressReporter for FrameProgress {
    fn begin_stage(&self, _name: &str, stage: BatchStage, total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
        self.bar.set_length(total_items.unwrap_or(1) as u64);
        self.bar.set_position(0);
    }

    fn advance(&self, _name: &str, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }

    fn finish_stage(&self, _name: &str) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}
