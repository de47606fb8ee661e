use serde::{Deserialize, Serialize};

pub type IssueId = u32;
pub type CompanyId = u32;

/// Severity of a compliance issue, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Returns a numeric rank where lower values indicate higher severity.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display hint for an issue card. Not a lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Warning,
    Success,
    Neutral,
}

/// Coarse classification shared by issues, stories and categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueCategory {
    /// Source of wealth
    Sow,
    /// Ultimate beneficial owner
    Ubo,
    Risk,
    /// Corroboration
    Corr,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 4] = [
        IssueCategory::Sow,
        IssueCategory::Ubo,
        IssueCategory::Risk,
        IssueCategory::Corr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sow => "SOW",
            Self::Ubo => "UBO",
            Self::Risk => "RISK",
            Self::Corr => "CORR",
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SOW" => Ok(Self::Sow),
            "UBO" => Ok(Self::Ubo),
            "RISK" => Ok(Self::Risk),
            "CORR" => Ok(Self::Corr),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Review lifecycle of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Solved,
    Dismissed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Solved => "solved",
            Self::Dismissed => "dismissed",
        }
    }

    /// Solved and dismissed issues both count as resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Solved | Self::Dismissed)
    }
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "solved" => Ok(Self::Solved),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(format!("unknown issue state '{}'", other)),
        }
    }
}

/// A single compliance finding tracked through the review lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub severity: Severity,
    pub status: IssueStatus,
    pub company_id: CompanyId,
    /// Relative weight of the issue, as a percentage.
    pub materiality: u8,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub considerations: Vec<String>,
    pub category: IssueCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    /// Screening hit annotation, e.g. a matched name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit: Option<String>,
    #[serde(default)]
    pub state: IssueState,
}

/// An issue that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub severity: Severity,
    pub status: IssueStatus,
    pub company_id: CompanyId,
    pub materiality: u8,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub considerations: Vec<String>,
    pub category: IssueCategory,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub hit: Option<String>,
    #[serde(default)]
    pub state: IssueState,
}

impl NewIssue {
    pub fn into_issue(self, id: IssueId) -> Issue {
        Issue {
            id,
            title: self.title,
            description: self.description,
            severity: self.severity,
            status: self.status,
            company_id: self.company_id,
            materiality: self.materiality,
            requirements: self.requirements,
            considerations: self.considerations,
            category: self.category,
            badge: self.badge,
            hit: self.hit,
            state: self.state,
        }
    }
}

/// Shallow partial update of an issue. `None` leaves a field untouched.
///
/// The optional fields take a nested option so a patch can clear them:
/// `Some(None)` removes the value, `Some(Some(v))` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub severity: Option<Severity>,
    pub status: Option<IssueStatus>,
    pub company_id: Option<CompanyId>,
    pub materiality: Option<u8>,
    pub requirements: Option<Vec<String>>,
    pub considerations: Option<Vec<String>>,
    pub category: Option<IssueCategory>,
    #[serde(default, deserialize_with = "double_option")]
    pub badge: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub hit: Option<Option<String>>,
    pub state: Option<IssueState>,
}

impl IssuePatch {
    pub fn state(state: IssueState) -> Self {
        Self { state: Some(state), ..Default::default() }
    }

    /// Merge the patch into `issue`. The id is never touched.
    pub fn apply_to(self, issue: &mut Issue) {
        if let Some(v) = self.title { issue.title = v; }
        if let Some(v) = self.description { issue.description = v; }
        if let Some(v) = self.severity { issue.severity = v; }
        if let Some(v) = self.status { issue.status = v; }
        if let Some(v) = self.company_id { issue.company_id = v; }
        if let Some(v) = self.materiality { issue.materiality = v; }
        if let Some(v) = self.requirements { issue.requirements = v; }
        if let Some(v) = self.considerations { issue.considerations = v; }
        if let Some(v) = self.category { issue.category = v; }
        if let Some(v) = self.badge { issue.badge = v; }
        if let Some(v) = self.hit { issue.hit = v; }
        if let Some(v) = self.state { issue.state = v; }
    }
}

/// Distinguishes an absent field from an explicit `null` when deserializing patches.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Review actions offered on an issue card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueAction {
    Approve,
    Reject,
    Reopen,
}

impl IssueAction {
    /// Lifecycle state an issue moves to when the action is applied.
    pub fn target_state(&self) -> IssueState {
        match self {
            Self::Approve => IssueState::Solved,
            Self::Reject => IssueState::Dismissed,
            Self::Reopen => IssueState::Open,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::Reject => "Reject",
            Self::Reopen => "Reopen",
        }
    }
}

impl std::str::FromStr for IssueAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "reopen" => Ok(Self::Reopen),
            other => Err(format!("unknown issue action '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issue() -> Issue {
        Issue {
            id: 7,
            title: "Negative Screening Hit".to_string(),
            description: Some("Negative screening has produced significant matches".to_string()),
            severity: Severity::High,
            status: IssueStatus::Warning,
            company_id: 1,
            materiality: 85,
            requirements: vec!["Adverse media screening".to_string()],
            considerations: vec!["Determination of risk level".to_string()],
            category: IssueCategory::Risk,
            badge: Some("3".to_string()),
            hit: None,
            state: IssueState::Open,
        }
    }

    #[test]
    fn test_issue_wire_names() {
        let json = serde_json::to_value(sample_issue()).unwrap();
        assert_eq!(json["severity"], "High");
        assert_eq!(json["status"], "warning");
        assert_eq!(json["category"], "RISK");
        assert_eq!(json["state"], "open");
        assert_eq!(json["companyId"], 1);
        assert!(json.get("hit").is_none());
    }

    #[test]
    fn test_new_issue_state_defaults_to_open() {
        let new: NewIssue = serde_json::from_value(serde_json::json!({
            "title": "Unverified address",
            "severity": "Low",
            "status": "neutral",
            "companyId": 2,
            "materiality": 10,
            "category": "UBO"
        })).unwrap();
        assert_eq!(new.state, IssueState::Open);
        assert!(new.requirements.is_empty());
    }

    #[test]
    fn test_patch_changes_only_named_fields() {
        let mut issue = sample_issue();
        let before = issue.clone();
        IssuePatch::state(IssueState::Solved).apply_to(&mut issue);

        assert_eq!(issue.state, IssueState::Solved);
        assert_eq!(Issue { state: IssueState::Open, ..issue }, before);
    }

    #[test]
    fn test_patch_null_clears_optional_field() {
        let patch: IssuePatch = serde_json::from_str(r#"{"badge": null}"#).unwrap();
        assert_eq!(patch.badge, Some(None));
        assert_eq!(patch.description, None);

        let mut issue = sample_issue();
        patch.apply_to(&mut issue);
        assert_eq!(issue.badge, None);
        assert!(issue.description.is_some());
    }

    #[test]
    fn test_severity_rank_ordering() {
        assert!(Severity::High.rank() < Severity::Medium.rank());
        assert!(Severity::Medium.rank() < Severity::Low.rank());
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("corr".parse::<IssueCategory>().unwrap(), IssueCategory::Corr);
        assert!("KYB".parse::<IssueCategory>().is_err());
    }

    #[test]
    fn test_action_target_states() {
        assert_eq!(IssueAction::Approve.target_state(), IssueState::Solved);
        assert_eq!(IssueAction::Reject.target_state(), IssueState::Dismissed);
        assert_eq!(IssueAction::Reopen.target_state(), IssueState::Open);
    }
}
