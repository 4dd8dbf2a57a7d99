//! Progress reporting while a turn runs

use colored::Colorize;
use ensemble_application::TurnProgressNotifier;
use ensemble_domain::{Branch, FusionOutcome, FusionStatus, ModelId, TurnId};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with a dispatch bar and a fusion spinner
pub struct ProgressReporter {
    multi: MultiProgress,
    dispatch_bar: Mutex<Option<ProgressBar>>,
    fusion_spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            dispatch_bar: Mutex::new(None),
            fusion_spinner: Mutex::new(None),
        }
    }

    fn dispatch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn finish_dispatch(&self) {
        if let Ok(mut slot) = self.dispatch_bar.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_with_message(format!("{}", "all branches settled".green()));
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnProgressNotifier for ProgressReporter {
    fn on_turn_start(&self, _turn_id: &TurnId, selection: &[ModelId]) {
        let pb = self.multi.add(ProgressBar::new(selection.len() as u64));
        pb.set_style(Self::dispatch_style());
        pb.set_prefix("Dispatch");
        pb.set_message("Waiting for answers...");

        if let Ok(mut slot) = self.dispatch_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_branch_complete(&self, _index: usize, branch: &Branch) {
        if let Ok(slot) = self.dispatch_bar.lock()
            && let Some(pb) = slot.as_ref()
        {
            let status = if branch.is_success() {
                format!("{} {}", "v".green(), branch.backend_id)
            } else {
                format!("{} {}", "x".red(), branch.backend_id)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_fusion_start(&self, contributors: usize) {
        self.finish_dispatch();

        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix("Fusion");
        pb.set_message(format!("Combining {} answer(s)...", contributors));
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.fusion_spinner.lock() {
            *slot = Some(pb);
        }
    }

    fn on_fusion_complete(&self, outcome: &FusionOutcome) {
        self.finish_dispatch();

        let message = match outcome.status {
            FusionStatus::Synthesized => format!("{}", "synthesized".green()),
            FusionStatus::FallbackConcatenated => format!("{}", "synthesis failed, concatenated".yellow()),
            _ => format!("{}", "no answers to fuse".red()),
        };

        if let Ok(mut slot) = self.fusion_spinner.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_with_message(message);
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl TurnProgressNotifier for SimpleProgress {
    fn on_turn_start(&self, turn_id: &TurnId, selection: &[ModelId]) {
        println!(
            "{} {} ({} models, turn {})",
            "->".cyan(),
            "Dispatch".bold(),
            selection.len(),
            turn_id
        );
    }

    fn on_branch_complete(&self, _index: usize, branch: &Branch) {
        match (&branch.error, branch.elapsed_ms()) {
            (None, Some(ms)) => println!("  {} {} ({} ms)", "v".green(), branch.backend_id, ms),
            (None, None) => println!("  {} {}", "v".green(), branch.backend_id),
            (Some(error), _) => println!("  {} {} ({})", "x".red(), branch.backend_id, error.kind()),
        }
    }

    fn on_fusion_start(&self, contributors: usize) {
        println!(
            "{} {} ({} answers)",
            "->".cyan(),
            "Fusion".bold(),
            contributors
        );
    }

    fn on_fusion_complete(&self, outcome: &FusionOutcome) {
        println!("  {} {}", "=".cyan(), outcome.status);
        println!();
    }
}
