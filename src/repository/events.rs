use serde::Serialize;
use crate::models::{CompanyId, IssueCategory, IssueId};

/// Change notifications published by the repository after every successful
/// mutation. Consumers re-read what they need; events carry only ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepositoryEvent {
    IssueAdded {
        id: IssueId,
        category: IssueCategory,
        revision: u64,
    },
    IssueUpdated {
        id: IssueId,
        category: IssueCategory,
        revision: u64,
    },
    IssueDeleted {
        id: IssueId,
        category: IssueCategory,
        revision: u64,
    },
    CompanyAdded {
        id: CompanyId,
        revision: u64,
    },
    CompanyUpdated {
        id: CompanyId,
        revision: u64,
    },
    CompanyDeleted {
        id: CompanyId,
        revision: u64,
    },
}

impl RepositoryEvent {
    pub fn revision(&self) -> u64 {
        match self {
            Self::IssueAdded { revision, .. }
            | Self::IssueUpdated { revision, .. }
            | Self::IssueDeleted { revision, .. }
            | Self::CompanyAdded { revision, .. }
            | Self::CompanyUpdated { revision, .. }
            | Self::CompanyDeleted { revision, .. } => *revision,
        }
    }

    pub fn touches_issues(&self) -> bool {
        matches!(
            self,
            Self::IssueAdded { .. } | Self::IssueUpdated { .. } | Self::IssueDeleted { .. }
        )
    }
}
