use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::check::{CheckEvent, CheckResult};
use crate::errors::KycError;
use crate::models::{CompanyId, IssueCategory, IssueState};

/// Decode a raw JSON request body. Syntax and shape errors are both
/// validation failures, so they share the `{"error": ...}` response.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, KycError> {
    serde_json::from_slice(body).map_err(|e| KycError::Validation(format!("Invalid request body: {}", e)))
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueQuery {
    pub category: Option<String>,
    pub company: Option<CompanyId>,
    pub state: Option<String>,
}

impl IssueQuery {
    pub fn category(&self) -> Result<Option<IssueCategory>, KycError> {
        self.category
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(KycError::Validation)
    }

    pub fn state(&self) -> Result<Option<IssueState>, KycError> {
        self.state
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(KycError::Validation)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
}

/// Latest known state of a check run started over HTTP.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRun {
    pub id: String,
    pub status: RunStatus,
    pub progress: u8,
    pub result: Option<CheckResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CheckRun {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            status: RunStatus::Running,
            progress: 0,
            result: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != RunStatus::Running
    }

    pub fn apply(&mut self, event: &CheckEvent) {
        self.progress = event.progress();
        if let Some(state) = event.state() {
            self.result = Some(state.clone());
        }
        match event {
            CheckEvent::Completed { .. } => self.finish(RunStatus::Completed),
            CheckEvent::Cancelled { .. } => self.finish(RunStatus::Cancelled),
            CheckEvent::Started { .. } | CheckEvent::Updated { .. } => {}
        }
    }

    fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_query_parsing() {
        let query = IssueQuery {
            category: Some("ubo".into()),
            company: Some(1),
            state: Some("Solved".into()),
        };
        assert_eq!(query.category().unwrap(), Some(IssueCategory::Ubo));
        assert_eq!(query.state().unwrap(), Some(IssueState::Solved));

        let bad = IssueQuery {
            state: Some("closed".into()),
            ..Default::default()
        };
        assert!(matches!(bad.state(), Err(KycError::Validation(_))));
    }

    #[test]
    fn test_check_run_follows_events() {
        let mut run = CheckRun::new("abc");
        run.apply(&CheckEvent::Cancelled { progress: 50 });
        assert_eq!(run.status, RunStatus::Cancelled);
        assert_eq!(run.progress, 50);
        assert!(run.is_finished());
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_parse_body_reports_validation() {
        let err = parse_body::<crate::models::NewIssue>(br#"{"title": 1}"#).unwrap_err();
        assert!(matches!(err, KycError::Validation(_)));

        let err = parse_body::<crate::models::NewIssue>(b"{not json").unwrap_err();
        assert!(matches!(err, KycError::Validation(_)));
    }
}
