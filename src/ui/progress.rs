//! Percentage progress bar driven by manager `on_update` callbacks.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

pub struct Bar {
    bar: ProgressBar,
}

impl Bar {
    /// A 0–100 bar for operations reporting percentages.
    pub fn percent(description: &str) -> Result<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos:>3}% ({elapsed})")?
            .progress_chars("●○ ");

        bar.set_style(style);
        bar.set_message(description.to_string());

        Ok(Self { bar })
    }

    /// Moves the bar to `pct`, clamped to 0–100.
    pub fn set_pct(&self, pct: f64) {
        self.bar.set_position(pct.clamp(0.0, 100.0) as u64);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }
}
