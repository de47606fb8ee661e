use serde::{Deserialize, Serialize};
use super::company::Company;
use super::issue::{IssueCategory, IssueId};

/// A fixed, named grouping of existing issues reviewed together.
///
/// Membership is static: it is not recomputed from issue categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: u32,
    pub title: String,
    pub company: Company,
    pub period: String,
    pub category: IssueCategory,
    pub verified: bool,
    pub issue_ids: Vec<IssueId>,
}

impl Story {
    pub fn contains(&self, issue_id: IssueId) -> bool {
        self.issue_ids.contains(&issue_id)
    }
}
