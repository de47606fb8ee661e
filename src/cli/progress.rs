use std::time::Instant;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::check::{CheckEvent, CheckResult, StepStatus};
use crate::cli::render::finding_line;

/// Progress bar plus status line for a running check.
pub struct CheckProgress {
    multi: MultiProgress,
    bar: ProgressBar,
    status_bar: ProgressBar,
    findings_seen: usize,
    start_time: Instant,
}

impl CheckProgress {
    pub fn new(hidden: bool) -> Self {
        let multi = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let bar = multi.add(ProgressBar::new(100));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:30.cyan/dark_gray} {pos:>3}% | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        status_bar.set_message("Starting check...");
        if !hidden {
            status_bar.enable_steady_tick(std::time::Duration::from_millis(120));
        }

        Self {
            multi,
            bar,
            status_bar,
            findings_seen: 0,
            start_time: Instant::now(),
        }
    }

    pub fn findings_seen(&self) -> usize {
        self.findings_seen
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Handle a check event and update the bars accordingly.
    pub fn handle_event(&mut self, event: &CheckEvent) {
        match event {
            CheckEvent::Started { state } => {
                self.bar.set_message(step_label(state));
            }
            CheckEvent::Updated { progress, state } => {
                self.bar.set_position(u64::from(*progress));
                self.bar.set_message(step_label(state));
                self.print_new_findings(state);
                self.update_status();
            }
            CheckEvent::Completed { result } => {
                self.print_new_findings(result);
                self.bar.set_position(100);
                self.bar.finish_with_message("Check complete");
                self.status_bar.finish_with_message(format!(
                    "{} findings, {} warnings | {}",
                    result.findings.len(),
                    result.warnings(),
                    format_elapsed(self.start_time.elapsed().as_millis() as u64),
                ));
            }
            CheckEvent::Cancelled { progress } => {
                self.bar.abandon_with_message("Cancelled");
                self.status_bar
                    .finish_with_message(format!("Check cancelled at {}%", progress));
            }
        }
    }

    fn print_new_findings(&mut self, state: &CheckResult) {
        for finding in state.findings.iter().skip(self.findings_seen) {
            self.println(&format!("  {}", finding_line(finding.kind, &finding.message)));
        }
        self.findings_seen = self.findings_seen.max(state.findings.len());
    }

    fn update_status(&self) {
        self.status_bar.set_message(format!(
            "{} | {} findings",
            format_elapsed(self.start_time.elapsed().as_millis() as u64),
            self.findings_seen,
        ));
    }

    /// Print a line through the multi-progress (won't interfere with bars).
    pub fn println(&self, msg: &str) {
        let _ = self.multi.println(msg);
    }
}

/// The step being worked on, or the next one to start.
fn step_label(state: &CheckResult) -> String {
    state
        .current_step()
        .and_then(|i| state.steps.get(i))
        .or_else(|| state.steps.iter().find(|s| s.status != StepStatus::Finish))
        .map(|s| s.title.clone())
        .unwrap_or_else(|| "Finishing".to_string())
}

fn format_elapsed(ms: u64) -> String {
    let secs = ms / 1000;
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    if mins > 0 {
        format!("{}m{}s", mins, remaining_secs)
    } else {
        format!("{}.{}s", secs, (ms % 1000) / 100)
    }
}
