use console::style;
use serde::Serialize;

use crate::check::{CheckOverall, CheckResult, FindingKind, StepStatus};
use crate::models::{Category, Issue, IssueState, RiskLevel, Severity, Statistics, Story};
use crate::resource::{Emptiness, StateRenderer};

/// Statistics together with the per-category counts they were computed with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub statistics: Statistics,
    pub categories: Vec<Category>,
}

impl Emptiness for Overview {}

/// Styled terminal lines for every resource state.
pub struct Terminal;

impl Terminal {
    fn loading_line(message: &str) -> String {
        format!("{} {}", style("…").cyan(), style(message).dim())
    }

    fn empty_line(message: &str) -> String {
        format!("  {}", style(message).dim())
    }

    fn error_line(title: &str, message: &str) -> String {
        format!("{} {}", style(format!("{}:", title)).red().bold(), message)
    }
}

fn severity_badge(severity: Severity) -> String {
    let label = format!("{:<6}", severity.as_str());
    match severity {
        Severity::High => style(label).red().bold().to_string(),
        Severity::Medium => style(label).yellow().to_string(),
        Severity::Low => style(label).dim().to_string(),
    }
}

fn state_badge(state: IssueState) -> String {
    let label = format!("{:<9}", state.to_string());
    match state {
        IssueState::Open => style(label).white().bold().to_string(),
        IssueState::Solved => style(label).green().to_string(),
        IssueState::Dismissed => style(label).dim().to_string(),
    }
}

pub fn issue_line(issue: &Issue) -> String {
    format!(
        "  {:>4}  {}  {:<4}  {}  {} ({}%)",
        style(format!("#{}", issue.id)).cyan(),
        severity_badge(issue.severity),
        issue.category.as_str(),
        state_badge(issue.state),
        issue.title,
        issue.materiality,
    )
}

impl StateRenderer<Vec<Issue>> for Terminal {
    type Output = String;

    fn loading(&self, message: &str) -> String {
        Self::loading_line(message)
    }

    fn success(&self, issues: &Vec<Issue>) -> String {
        let mut lines: Vec<String> = issues.iter().map(issue_line).collect();
        lines.push(format!("\n  {} issues", issues.len()));
        lines.join("\n")
    }

    fn empty(&self, message: &str) -> String {
        Self::empty_line(message)
    }

    fn error(&self, title: &str, message: &str) -> String {
        Self::error_line(title, message)
    }
}

impl StateRenderer<Overview> for Terminal {
    type Output = String;

    fn loading(&self, message: &str) -> String {
        Self::loading_line(message)
    }

    fn success(&self, overview: &Overview) -> String {
        let stats = &overview.statistics;
        let risk = match stats.risk {
            RiskLevel::High => style(stats.risk.to_string()).red().bold(),
            RiskLevel::Medium => style(stats.risk.to_string()).yellow(),
            RiskLevel::Low => style(stats.risk.to_string()).green(),
        };
        let mut lines = vec![
            format!("  KYC quality     {:>3}%", stats.kyc_quality),
            format!("  Corroboration   {:>3}%", stats.corroboration),
            format!("  Risk            {}", risk),
            String::new(),
        ];
        for category in &overview.categories {
            lines.push(format!("  {:<6} {:>3}", category.name, category.count));
        }
        lines.join("\n")
    }

    fn empty(&self, message: &str) -> String {
        Self::empty_line(message)
    }

    fn error(&self, title: &str, message: &str) -> String {
        Self::error_line(title, message)
    }
}

impl StateRenderer<Vec<Story>> for Terminal {
    type Output = String;

    fn loading(&self, message: &str) -> String {
        Self::loading_line(message)
    }

    fn success(&self, stories: &Vec<Story>) -> String {
        stories
            .iter()
            .map(|story| {
                let verified = if story.verified {
                    style("verified").green().to_string()
                } else {
                    style("unverified").yellow().to_string()
                };
                format!(
                    "  {:>4}  {:<4}  {}  {} ({}), {} issues, {}",
                    style(format!("#{}", story.id)).cyan(),
                    story.category.as_str(),
                    story.title,
                    story.company.name,
                    story.period,
                    story.issue_ids.len(),
                    verified,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn empty(&self, message: &str) -> String {
        Self::empty_line(message)
    }

    fn error(&self, title: &str, message: &str) -> String {
        Self::error_line(title, message)
    }
}

impl StateRenderer<CheckResult> for Terminal {
    type Output = String;

    fn loading(&self, message: &str) -> String {
        Self::loading_line(message)
    }

    fn success(&self, result: &CheckResult) -> String {
        let headline = match result.overall {
            CheckOverall::Success => style(&result.summary).green().bold(),
            CheckOverall::Partial => style(&result.summary).yellow().bold(),
            CheckOverall::Error => style(&result.summary).red().bold(),
        };
        let mut lines = vec![format!("\n{}", headline)];
        for step in &result.steps {
            let mark = match step.status {
                StepStatus::Finish => style("✓").green(),
                StepStatus::Process => style("…").cyan(),
                StepStatus::Wait => style("·").dim(),
                StepStatus::Error => style("✗").red(),
            };
            lines.push(format!("  {} {}", mark, step.title));
        }
        if !result.findings.is_empty() {
            lines.push(format!("\n  {}", style("Findings").bold()));
            for finding in &result.findings {
                lines.push(format!("  {}", finding_line(finding.kind, &finding.message)));
            }
        }
        lines.join("\n")
    }

    fn empty(&self, message: &str) -> String {
        Self::empty_line(message)
    }

    fn error(&self, title: &str, message: &str) -> String {
        Self::error_line(title, message)
    }
}

pub fn finding_line(kind: FindingKind, message: &str) -> String {
    match kind {
        FindingKind::Info => format!("{} {}", style("ℹ").blue(), message),
        FindingKind::Warning => format!("{} {}", style("⚠").yellow(), style(message).yellow()),
        FindingKind::Error => format!("{} {}", style("✗").red(), style(message).red()),
    }
}
