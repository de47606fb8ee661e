use std::collections::HashMap;
use crate::errors::KycError;
use crate::models::{Issue, IssueId};
use super::{IssueStore, StoreMeta};

/// Issues held in process memory: a vector for order, an index for lookup.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    issues: Vec<Issue>,
    index: HashMap<IssueId, usize>,
    meta: StoreMeta,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issues(issues: Vec<Issue>) -> Result<Self, KycError> {
        let mut store = Self::new();
        for issue in issues {
            store.insert(issue)?;
        }
        Ok(store)
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, issue) in self.issues.iter().enumerate().skip(start) {
            self.index.insert(issue.id, pos);
        }
    }
}

impl IssueStore for MemoryStore {
    fn all(&self) -> Result<Vec<Issue>, KycError> {
        Ok(self.issues.clone())
    }

    fn get(&self, id: IssueId) -> Result<Option<Issue>, KycError> {
        Ok(self.index.get(&id).map(|&pos| self.issues[pos].clone()))
    }

    fn insert(&mut self, issue: Issue) -> Result<(), KycError> {
        if self.index.contains_key(&issue.id) {
            return Err(KycError::Conflict(format!("issue {} already exists", issue.id)));
        }
        self.index.insert(issue.id, self.issues.len());
        self.issues.push(issue);
        Ok(())
    }

    fn replace(&mut self, issue: Issue) -> Result<bool, KycError> {
        match self.index.get(&issue.id) {
            Some(&pos) => {
                self.issues[pos] = issue;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&mut self, id: IssueId) -> Result<bool, KycError> {
        let Some(pos) = self.index.remove(&id) else {
            return Ok(false);
        };
        self.issues.remove(pos);
        self.reindex_from(pos);
        Ok(true)
    }

    fn meta(&self) -> Result<StoreMeta, KycError> {
        Ok(self.meta)
    }

    fn save_meta(&mut self, meta: StoreMeta) -> Result<(), KycError> {
        self.meta = meta;
        Ok(())
    }

    fn len(&self) -> Result<usize, KycError> {
        Ok(self.issues.len())
    }

    fn max_id(&self) -> Result<Option<IssueId>, KycError> {
        Ok(self.index.keys().copied().max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueCategory, IssueState, IssueStatus, Severity};

    fn make_issue(id: IssueId, category: IssueCategory) -> Issue {
        Issue {
            id,
            title: format!("Issue {}", id),
            description: Some("Test description".to_string()),
            severity: Severity::Medium,
            status: IssueStatus::Warning,
            company_id: 1,
            materiality: 60,
            requirements: vec!["First requirement".to_string()],
            considerations: vec!["First consideration".to_string()],
            category,
            badge: None,
            hit: None,
            state: IssueState::Open,
        }
    }

    #[test]
    fn test_memory_insert_preserves_order() {
        let mut store = MemoryStore::new();
        store.insert(make_issue(3, IssueCategory::Sow)).unwrap();
        store.insert(make_issue(1, IssueCategory::Ubo)).unwrap();
        store.insert(make_issue(2, IssueCategory::Sow)).unwrap();

        let ids: Vec<_> = store.all().unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(store.max_id().unwrap(), Some(3));
    }

    #[test]
    fn test_memory_duplicate_id_rejected() {
        let mut store = MemoryStore::new();
        store.insert(make_issue(1, IssueCategory::Sow)).unwrap();
        let err = store.insert(make_issue(1, IssueCategory::Risk)).unwrap_err();
        assert!(matches!(err, KycError::Conflict(_)));
    }

    #[test]
    fn test_memory_remove_keeps_lookup_consistent() {
        let mut store = MemoryStore::with_issues(vec![
            make_issue(1, IssueCategory::Sow),
            make_issue(2, IssueCategory::Ubo),
            make_issue(3, IssueCategory::Risk),
        ]).unwrap();

        assert!(store.remove(1).unwrap());
        assert!(!store.remove(1).unwrap());
        assert_eq!(store.get(3).unwrap().unwrap().category, IssueCategory::Risk);
        assert_eq!(store.get(2).unwrap().unwrap().category, IssueCategory::Ubo);
        assert!(store.get(1).unwrap().is_none());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_memory_replace_keeps_position() {
        let mut store = MemoryStore::with_issues(vec![
            make_issue(1, IssueCategory::Sow),
            make_issue(2, IssueCategory::Ubo),
        ]).unwrap();

        let mut updated = make_issue(1, IssueCategory::Corr);
        updated.state = IssueState::Solved;
        assert!(store.replace(updated).unwrap());
        assert!(!store.replace(make_issue(9, IssueCategory::Sow)).unwrap());

        let all = store.all().unwrap();
        assert_eq!(all[0].id, 1);
        assert_eq!(all[0].state, IssueState::Solved);
    }

    #[test]
    fn test_memory_filters() {
        let mut other = make_issue(3, IssueCategory::Sow);
        other.company_id = 2;
        other.state = IssueState::Dismissed;
        let store = MemoryStore::with_issues(vec![
            make_issue(1, IssueCategory::Sow),
            make_issue(2, IssueCategory::Ubo),
            other,
        ]).unwrap();

        let sow: Vec<_> = store.by_category(IssueCategory::Sow).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(sow, vec![1, 3]);
        assert_eq!(store.by_company(2).unwrap().len(), 1);
        assert_eq!(store.by_state(IssueState::Open).unwrap().len(), 2);
    }
}
