use crate::models::{Category, Issue, IssueState, RiskLevel, Severity, Statistics};

/// Corroboration score reported when no configured value is supplied.
pub const DEFAULT_CORROBORATION: u8 = 78;

const HIGH_OPEN_PENALTY: f64 = 5.0;
const MEDIUM_OPEN_PENALTY: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    total: usize,
    resolved: usize,
    high_open: usize,
    medium_open: usize,
}

fn tally(issues: &[Issue]) -> Tally {
    issues.iter().fold(Tally::default(), |mut t, issue| {
        t.total += 1;
        if issue.state.is_resolved() {
            t.resolved += 1;
        }
        if issue.state == IssueState::Open {
            match issue.severity {
                Severity::High => t.high_open += 1,
                Severity::Medium => t.medium_open += 1,
                Severity::Low => {}
            }
        }
        t
    })
}

/// Share of resolved issues as a percentage, minus 5 points per open High
/// issue and 2 per open Medium one, rounded and clamped to 0..=100.
/// An empty issue list scores 100.
pub fn kyc_quality(issues: &[Issue]) -> u8 {
    let t = tally(issues);
    if t.total == 0 {
        return 100;
    }

    let resolved_score = t.resolved as f64 / t.total as f64 * 100.0;
    let score = resolved_score
        - t.high_open as f64 * HIGH_OPEN_PENALTY
        - t.medium_open as f64 * MEDIUM_OPEN_PENALTY;

    score.round().clamp(0.0, 100.0) as u8
}

/// High with two or more open High issues; Medium with exactly one open High
/// or at least three open Medium; Low otherwise (including no issues).
pub fn risk_level(issues: &[Issue]) -> RiskLevel {
    let t = tally(issues);
    if t.high_open >= 2 {
        RiskLevel::High
    } else if t.high_open == 1 || t.medium_open >= 3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn compute_statistics(issues: &[Issue], corroboration: u8) -> Statistics {
    Statistics {
        kyc_quality: kyc_quality(issues),
        corroboration,
        risk: risk_level(issues),
    }
}

/// Recount every category over the full issue list.
pub fn category_counts(categories: &[Category], issues: &[Issue]) -> Vec<Category> {
    categories
        .iter()
        .map(|category| Category {
            count: issues.iter().filter(|i| i.category == category.id).count(),
            ..category.clone()
        })
        .collect()
}
