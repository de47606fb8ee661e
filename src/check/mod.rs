//! Simulated multi-step compliance check.
//!
//! A run walks four fixed steps on a timeline measured in step units,
//! streaming every intermediate state as a [`CheckEvent`] and resolving to
//! the final [`CheckResult`].

pub mod events;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::resource::{DataSource, Emptiness, FetchError};

pub use events::CheckEvent;

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(1000);

const IN_PROGRESS: &str = "Check in progress...";
const COMPLETED_WITH_WARNINGS: &str = "Check completed with warnings. Some issues require attention.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Wait,
    Process,
    Finish,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStep {
    pub title: String,
    pub description: String,
    pub status: StepStatus,
}

impl CheckStep {
    fn waiting(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            status: StepStatus::Wait,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOverall {
    Success,
    Error,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFinding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub message: String,
}

impl CheckFinding {
    fn new(kind: FindingKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub overall: CheckOverall,
    pub steps: Vec<CheckStep>,
    pub summary: String,
    pub findings: Vec<CheckFinding>,
}

impl CheckResult {
    fn initial() -> Self {
        Self {
            overall: CheckOverall::Success,
            steps: vec![
                CheckStep::waiting("Initializing Check", "Preparing check process..."),
                CheckStep::waiting("Verifying Documents", "Analyzing uploaded documents..."),
                CheckStep::waiting("Checking Compliance", "Validating compliance requirements..."),
                CheckStep::waiting("Generating Report", "Creating final report..."),
            ],
            summary: IN_PROGRESS.to_string(),
            findings: Vec::new(),
        }
    }

    /// Index of the step currently being processed, if any.
    pub fn current_step(&self) -> Option<usize> {
        self.steps.iter().position(|s| s.status == StepStatus::Process)
    }

    pub fn warnings(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.kind == FindingKind::Warning)
            .count()
    }
}

impl Emptiness for CheckResult {}

/// One scripted change on the check timeline.
struct Milestone {
    /// Offset from the start of the run, in step units.
    at: f64,
    step: usize,
    status: StepStatus,
    progress: Option<u8>,
    finding: Option<(FindingKind, &'static str)>,
}

const TIMELINE: &[Milestone] = &[
    Milestone { at: 1.0, step: 0, status: StepStatus::Finish, progress: Some(25), finding: None },
    Milestone {
        at: 2.0,
        step: 1,
        status: StepStatus::Finish,
        progress: Some(50),
        finding: Some((FindingKind::Info, "Found 3 documents for analysis")),
    },
    Milestone {
        at: 3.0,
        step: 2,
        status: StepStatus::Process,
        progress: Some(75),
        finding: Some((FindingKind::Warning, "Missing required disclosure in section 2.3")),
    },
    Milestone {
        at: 3.8,
        step: 2,
        status: StepStatus::Finish,
        progress: None,
        finding: Some((FindingKind::Warning, "Potential compliance risk in financial statements")),
    },
    Milestone {
        at: 4.5,
        step: 3,
        status: StepStatus::Finish,
        progress: Some(100),
        finding: Some((FindingKind::Info, "Basic compliance requirements met")),
    },
];

/// Runs the scripted check. Reusable: every [`run`](Self::run) starts from
/// the initial state.
#[derive(Debug, Clone)]
pub struct CheckProcess {
    step_delay: Duration,
    cancel_token: CancellationToken,
    event_tx: Option<mpsc::UnboundedSender<CheckEvent>>,
}

impl CheckProcess {
    pub fn new(step_delay: Duration) -> Self {
        Self {
            step_delay,
            cancel_token: CancellationToken::new(),
            event_tx: None,
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<CheckEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    fn emit(&self, event: CheckEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Execute the timeline. Cancellation ends the run with an error and a
    /// [`CheckEvent::Cancelled`].
    pub async fn run(&self) -> Result<CheckResult, FetchError> {
        let mut state = CheckResult::initial();
        let mut progress = 0u8;
        let mut elapsed = 0.0;

        info!(step_delay_ms = self.step_delay.as_millis() as u64, "Check started");
        self.emit(CheckEvent::Started {
            state: state.clone(),
        });

        for milestone in TIMELINE {
            let wait = self.step_delay.mul_f64(milestone.at - elapsed);
            elapsed = milestone.at;

            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    if let Some(step) = state.current_step() {
                        state.steps[step].status = StepStatus::Error;
                    }
                    info!(progress, "Check cancelled");
                    self.emit(CheckEvent::Cancelled { progress });
                    return Err(FetchError::new("Check cancelled"));
                }
                _ = tokio::time::sleep(wait) => {}
            }

            state.steps[milestone.step].status = milestone.status;
            if let Some((kind, message)) = milestone.finding {
                state.findings.push(CheckFinding::new(kind, message));
            }
            if let Some(p) = milestone.progress {
                progress = p;
            }
            debug!(
                step = %state.steps[milestone.step].title,
                status = ?milestone.status,
                progress,
                "Check step updated"
            );
            self.emit(CheckEvent::Updated {
                progress,
                state: state.clone(),
            });
        }

        state.overall = CheckOverall::Partial;
        state.summary = COMPLETED_WITH_WARNINGS.to_string();
        info!(
            findings = state.findings.len(),
            warnings = state.warnings(),
            "Check completed"
        );
        self.emit(CheckEvent::Completed {
            result: state.clone(),
        });
        Ok(state)
    }
}

impl Default for CheckProcess {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY)
    }
}

#[async_trait]
impl DataSource<CheckResult> for CheckProcess {
    async fn fetch(&self) -> Result<CheckResult, FetchError> {
        self.run().await
    }
}
