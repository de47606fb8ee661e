//! The issue repository: single source of truth for review data.
//!
//! Every issue mutation recomputes category counts and statistics before it
//! returns, then publishes a [`RepositoryEvent`]. Nothing else holds a copy
//! that is expected to stay in sync; subscribers re-read on each event.

pub mod events;

pub use events::RepositoryEvent;

use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};
use crate::config::{KycConfig, StorageBackend};
use crate::errors::KycError;
use crate::models::*;
use crate::seed::SeedData;
use crate::stats;
use crate::store::{IssueStore, MemoryStore, SqliteStore, StoreMeta};

#[derive(Debug, Clone, Copy)]
pub struct RepositoryOptions {
    /// Corroboration score reported in statistics.
    pub corroboration: u8,
    /// Capacity of the change-event channel; slow subscribers lag past it.
    pub event_capacity: usize,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            corroboration: stats::DEFAULT_CORROBORATION,
            event_capacity: 64,
        }
    }
}

pub struct Repository {
    store: Box<dyn IssueStore>,
    companies: Vec<Company>,
    stories: Vec<Story>,
    support: HashMap<u32, CorroborationSupport>,
    categories: Vec<Category>,
    statistics: Statistics,
    corroboration: u8,
    /// Highest issue id ever handed out. Never decreases, so ids of deleted
    /// issues are not reused and an emptied repository still allocates.
    last_issue_id: IssueId,
    last_company_id: CompanyId,
    revision: u64,
    events: broadcast::Sender<RepositoryEvent>,
}

impl Repository {
    /// In-memory repository populated from `seed`.
    pub fn new(seed: SeedData) -> Result<Self, KycError> {
        Self::with_store(Box::new(MemoryStore::new()), seed, RepositoryOptions::default())
    }

    /// In-memory repository with the built-in review data.
    pub fn builtin() -> Result<Self, KycError> {
        Self::new(SeedData::builtin()?)
    }

    /// Open the store and seed data named by `config`.
    pub async fn from_config(config: &KycConfig) -> Result<Self, KycError> {
        let seed = match config.seed_file() {
            Some(path) => {
                let content = tokio::fs::read_to_string(path).await?;
                SeedData::from_yaml(&content)?
            }
            None => SeedData::builtin()?,
        };

        let store: Box<dyn IssueStore> = match (config.backend(), config.database_path()) {
            (StorageBackend::Sqlite, Some(path)) => {
                Box::new(SqliteStore::open(&path.to_string_lossy())?)
            }
            (StorageBackend::Sqlite, None) => {
                return Err(KycError::Config("sqlite backend requires storage.path".into()))
            }
            (StorageBackend::Memory, _) => Box::new(MemoryStore::new()),
        };

        info!(backend = ?config.backend(), "Opening repository");
        Self::with_store(store, seed, config.repository_options())
    }

    /// Build a repository over an arbitrary store. Seed issues are written
    /// at most once per store, so a persistent store keeps its contents even
    /// after every issue was deleted.
    pub fn with_store(
        mut store: Box<dyn IssueStore>,
        seed: SeedData,
        options: RepositoryOptions,
    ) -> Result<Self, KycError> {
        let mut meta = store.meta()?;
        if meta.seeded {
            info!(issues = store.len()?, "Using existing issues from store");
        } else if store.is_empty()? {
            for issue in seed.issues {
                validate_materiality(issue.materiality)?;
                store.insert(issue)?;
            }
        } else {
            // Store filled before metadata was tracked
            info!(issues = store.len()?, "Adopting existing issues from store");
        }

        meta.seeded = true;
        meta.id_high_water = meta.id_high_water.max(store.max_id()?.unwrap_or(0));
        store.save_meta(meta)?;

        let last_issue_id = meta.id_high_water;
        let last_company_id = seed.companies.iter().map(|c| c.id).max().unwrap_or(0);
        let (events, _) = broadcast::channel(options.event_capacity.max(1));

        let mut repo = Self {
            store,
            companies: seed.companies,
            stories: seed.stories,
            support: seed.support,
            categories: Category::defaults(),
            statistics: stats::compute_statistics(&[], options.corroboration),
            corroboration: options.corroboration,
            last_issue_id,
            last_company_id,
            revision: 0,
            events,
        };
        repo.recompute()?;
        Ok(repo)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RepositoryEvent> {
        self.events.subscribe()
    }

    /// Number of successful mutations since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn recompute(&mut self) -> Result<(), KycError> {
        let issues = self.store.all()?;
        self.categories = stats::category_counts(&self.categories, &issues);
        self.statistics = stats::compute_statistics(&issues, self.corroboration);
        Ok(())
    }

    /// Recompute derived data, bump the revision and notify subscribers.
    fn commit(&mut self, make_event: impl FnOnce(u64) -> RepositoryEvent) -> Result<(), KycError> {
        self.recompute()?;
        self.revision += 1;
        let event = make_event(self.revision);
        debug!(?event, "Repository changed");
        // No subscribers is fine
        let _ = self.events.send(event);
        Ok(())
    }

    // Issues

    pub fn issues(&self) -> Result<Vec<Issue>, KycError> {
        self.store.all()
    }

    pub fn get_issue(&self, id: IssueId) -> Result<Option<Issue>, KycError> {
        self.store.get(id)
    }

    pub fn issues_by_category(&self, category: IssueCategory) -> Result<Vec<Issue>, KycError> {
        self.store.by_category(category)
    }

    pub fn issues_by_company(&self, company_id: CompanyId) -> Result<Vec<Issue>, KycError> {
        self.store.by_company(company_id)
    }

    pub fn issues_by_state(&self, state: IssueState) -> Result<Vec<Issue>, KycError> {
        self.store.by_state(state)
    }

    pub fn add_issue(&mut self, new: NewIssue) -> Result<Issue, KycError> {
        validate_materiality(new.materiality)?;
        let id = self.last_issue_id.checked_add(1)
            .ok_or_else(|| KycError::Internal("issue id space exhausted".into()))?;

        // Record the id before using it so a reopened store never hands it out again
        self.store.save_meta(StoreMeta { seeded: true, id_high_water: id })?;
        self.last_issue_id = id;

        let issue = new.into_issue(id);
        self.store.insert(issue.clone())?;

        let category = issue.category;
        self.commit(|revision| RepositoryEvent::IssueAdded { id, category, revision })?;
        info!(id, category = %category, "Issue added");
        Ok(issue)
    }

    /// Merge `patch` into the issue. Returns `None` if no issue has this id.
    pub fn update_issue(&mut self, id: IssueId, patch: IssuePatch) -> Result<Option<Issue>, KycError> {
        if let Some(materiality) = patch.materiality {
            validate_materiality(materiality)?;
        }
        let Some(mut issue) = self.store.get(id)? else {
            return Ok(None);
        };

        patch.apply_to(&mut issue);
        if !self.store.replace(issue.clone())? {
            return Ok(None);
        }

        let category = issue.category;
        self.commit(|revision| RepositoryEvent::IssueUpdated { id, category, revision })?;
        debug!(id, state = %issue.state, "Issue updated");
        Ok(Some(issue))
    }

    pub fn delete_issue(&mut self, id: IssueId) -> Result<bool, KycError> {
        let Some(issue) = self.store.get(id)? else {
            return Ok(false);
        };
        if !self.store.remove(id)? {
            return Ok(false);
        }

        let category = issue.category;
        self.commit(|revision| RepositoryEvent::IssueDeleted { id, category, revision })?;
        info!(id, "Issue deleted");
        Ok(true)
    }

    /// Apply a review action; an update of the issue's lifecycle state.
    pub fn apply_action(&mut self, id: IssueId, action: IssueAction) -> Result<Option<Issue>, KycError> {
        self.update_issue(id, IssuePatch::state(action.target_state()))
    }

    // Categories and statistics

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: IssueCategory) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    /// Recompute category counts and statistics from the store right now.
    pub fn refresh(&mut self) -> Result<Statistics, KycError> {
        self.recompute()?;
        Ok(self.statistics)
    }

    // Companies

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn get_company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.iter().find(|c| c.id == id)
    }

    pub fn add_company(&mut self, new: NewCompany) -> Result<Company, KycError> {
        let id = self.last_company_id.checked_add(1)
            .ok_or_else(|| KycError::Internal("company id space exhausted".into()))?;
        let company = new.into_company(id);
        self.companies.push(company.clone());
        self.last_company_id = id;

        self.commit(|revision| RepositoryEvent::CompanyAdded { id, revision })?;
        Ok(company)
    }

    /// Stories embed a copy of their company; those copies are updated too.
    pub fn update_company(&mut self, id: CompanyId, patch: CompanyPatch) -> Result<Option<Company>, KycError> {
        let Some(company) = self.companies.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        patch.apply_to(company);
        let updated = company.clone();

        for story in self.stories.iter_mut().filter(|s| s.company.id == id) {
            story.company = updated.clone();
        }

        self.commit(|revision| RepositoryEvent::CompanyUpdated { id, revision })?;
        Ok(Some(updated))
    }

    /// Delete a company nothing refers to. Returns false if absent; a company
    /// still referenced by an issue or story is a `Conflict`.
    pub fn delete_company(&mut self, id: CompanyId) -> Result<bool, KycError> {
        let Some(pos) = self.companies.iter().position(|c| c.id == id) else {
            return Ok(false);
        };

        let referencing = self.store.by_company(id)?;
        if !referencing.is_empty() {
            return Err(KycError::Conflict(format!(
                "company {} is referenced by {} issue(s)",
                id,
                referencing.len()
            )));
        }
        if let Some(story) = self.stories.iter().find(|s| s.company.id == id) {
            return Err(KycError::Conflict(format!(
                "company {} is referenced by story {}",
                id, story.id
            )));
        }

        self.companies.remove(pos);
        self.commit(|revision| RepositoryEvent::CompanyDeleted { id, revision })?;
        Ok(true)
    }

    // Stories

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn get_story(&self, id: u32) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }

    pub fn stories_by_category(&self, category: IssueCategory) -> Vec<&Story> {
        self.stories.iter().filter(|s| s.category == category).collect()
    }

    /// Current issues belonging to a story, sorted by id. Ids that no longer
    /// exist are skipped; an unknown story yields nothing.
    pub fn issues_for_story(&self, story_id: u32) -> Result<Vec<Issue>, KycError> {
        let Some(story) = self.get_story(story_id) else {
            return Ok(Vec::new());
        };
        let mut issues: Vec<Issue> = self.store.all()?
            .into_iter()
            .filter(|i| story.contains(i.id))
            .collect();
        issues.sort_by_key(|i| i.id);
        Ok(issues)
    }

    pub fn corroboration_support(&self, story_id: u32) -> CorroborationSupport {
        self.support.get(&story_id).cloned().unwrap_or_default()
    }
}

fn validate_materiality(materiality: u8) -> Result<(), KycError> {
    if materiality > 100 {
        return Err(KycError::Validation(format!(
            "materiality must be between 0 and 100, got {}",
            materiality
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn new_issue(category: IssueCategory, severity: Severity) -> NewIssue {
        NewIssue {
            title: "Missing proof of address".to_string(),
            description: None,
            severity,
            status: IssueStatus::Warning,
            company_id: 2,
            materiality: 40,
            requirements: vec!["Utility bill".to_string()],
            considerations: vec![],
            category,
            badge: None,
            hit: None,
            state: IssueState::Open,
        }
    }

    fn count(repo: &Repository, category: IssueCategory) -> usize {
        repo.category(category).unwrap().count
    }

    #[test]
    fn test_builtin_category_counts_and_statistics() {
        let repo = Repository::builtin().unwrap();
        for category in IssueCategory::ALL {
            assert_eq!(count(&repo, category), 5);
        }
        // 11 of 20 resolved (55%), 2 open High (-10), 6 open Medium (-12)
        let stats = repo.statistics();
        assert_eq!(stats.kyc_quality, 33);
        assert_eq!(stats.risk, RiskLevel::High);
        assert_eq!(stats.corroboration, 78);
    }

    #[test]
    fn test_add_assigns_greater_id_and_counts() {
        let mut repo = Repository::builtin().unwrap();
        let max_before = repo.issues().unwrap().iter().map(|i| i.id).max().unwrap();
        let ubo_before = count(&repo, IssueCategory::Ubo);

        let issue = repo.add_issue(new_issue(IssueCategory::Ubo, Severity::Low)).unwrap();

        assert!(issue.id > max_before);
        assert_eq!(issue.state, IssueState::Open);
        assert!(repo.issues_by_category(IssueCategory::Ubo).unwrap().iter().any(|i| i.id == issue.id));
        assert_eq!(count(&repo, IssueCategory::Ubo), ubo_before + 1);
        assert_eq!(repo.issues().unwrap().last().unwrap().id, issue.id);
    }

    #[test]
    fn test_delete_then_get_returns_none() {
        let mut repo = Repository::builtin().unwrap();
        let risk_before = count(&repo, IssueCategory::Risk);

        assert!(repo.delete_issue(7).unwrap());
        assert!(repo.get_issue(7).unwrap().is_none());
        assert_eq!(count(&repo, IssueCategory::Risk), risk_before - 1);
        assert!(!repo.delete_issue(7).unwrap());
    }

    #[test]
    fn test_update_state_only_changes_state() {
        let mut repo = Repository::builtin().unwrap();
        let before = repo.get_issue(1).unwrap().unwrap();
        let solved_before = repo.issues_by_state(IssueState::Solved).unwrap().len();

        let after = repo.update_issue(1, IssuePatch::state(IssueState::Solved)).unwrap().unwrap();

        assert_eq!(after, Issue { state: IssueState::Solved, ..before });
        assert_eq!(repo.issues_by_state(IssueState::Solved).unwrap().len(), solved_before + 1);
        // 12 of 20 resolved (60%), 2 open High, 5 open Medium
        assert_eq!(repo.statistics().kyc_quality, 40);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut repo = Repository::builtin().unwrap();
        assert!(repo.update_issue(999, IssuePatch::state(IssueState::Solved)).unwrap().is_none());
        assert_eq!(repo.revision(), 0);
    }

    #[test]
    fn test_update_rejects_materiality_over_100() {
        let mut repo = Repository::builtin().unwrap();
        let patch = IssuePatch { materiality: Some(101), ..Default::default() };
        assert!(matches!(repo.update_issue(1, patch), Err(KycError::Validation(_))));
    }

    #[test]
    fn test_ids_keep_growing_after_emptying() {
        let mut repo = Repository::new(SeedData::empty()).unwrap();
        let first = repo.add_issue(new_issue(IssueCategory::Sow, Severity::Low)).unwrap();
        assert_eq!(first.id, 1);

        assert!(repo.delete_issue(first.id).unwrap());
        assert!(repo.issues().unwrap().is_empty());
        assert_eq!(repo.statistics().kyc_quality, 100);

        let second = repo.add_issue(new_issue(IssueCategory::Sow, Severity::Low)).unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_apply_action() {
        let mut repo = Repository::builtin().unwrap();
        let rejected = repo.apply_action(7, IssueAction::Reject).unwrap().unwrap();
        assert_eq!(rejected.state, IssueState::Dismissed);
        let reopened = repo.apply_action(7, IssueAction::Reopen).unwrap().unwrap();
        assert_eq!(reopened.state, IssueState::Open);
    }

    #[test]
    fn test_mutations_publish_events() {
        let mut repo = Repository::builtin().unwrap();
        let mut rx = repo.subscribe();

        let issue = repo.add_issue(new_issue(IssueCategory::Corr, Severity::High)).unwrap();
        repo.apply_action(issue.id, IssueAction::Approve).unwrap();
        repo.delete_issue(issue.id).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            RepositoryEvent::IssueAdded { id: issue.id, category: IssueCategory::Corr, revision: 1 }
        );
        assert!(matches!(rx.try_recv().unwrap(), RepositoryEvent::IssueUpdated { revision: 2, .. }));
        assert!(matches!(rx.try_recv().unwrap(), RepositoryEvent::IssueDeleted { revision: 3, .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_delete_referenced_company_is_rejected() {
        let mut repo = Repository::builtin().unwrap();
        assert!(matches!(repo.delete_company(1), Err(KycError::Conflict(_))));
        assert!(repo.get_company(1).is_some());

        // Company 3 has no issues and no stories
        assert!(repo.delete_company(3).unwrap());
        assert!(!repo.delete_company(3).unwrap());
    }

    #[test]
    fn test_company_add_and_update() {
        let mut repo = Repository::builtin().unwrap();
        let company = repo.add_company(NewCompany {
            name: "Ningbo Harbour Logistics".to_string(),
            period: "2019-2024".to_string(),
            verified: false,
            badge: None,
        }).unwrap();
        assert_eq!(company.id, 4);

        let updated = repo.update_company(1, CompanyPatch { verified: Some(true), ..Default::default() })
            .unwrap()
            .unwrap();
        assert!(updated.verified);
        assert!(repo.get_story(1).unwrap().company.verified);
        assert!(repo.update_company(42, CompanyPatch::default()).unwrap().is_none());
    }

    #[test]
    fn test_issues_for_story_sorted_by_id() {
        let repo = Repository::builtin().unwrap();
        let ids: Vec<_> = repo.issues_for_story(12).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 4, 12, 19, 20]);
        assert!(repo.issues_for_story(99).unwrap().is_empty());
        assert_eq!(repo.stories_by_category(IssueCategory::Risk).len(), 3);
    }

    #[test]
    fn test_corroboration_support_lookup() {
        let repo = Repository::builtin().unwrap();
        assert!(!repo.corroboration_support(3).is_empty());
        assert!(repo.corroboration_support(1).is_empty());
    }

    #[test]
    fn test_sqlite_store_matches_memory() {
        let memory = Repository::builtin().unwrap();
        let sqlite = Repository::with_store(
            Box::new(SqliteStore::in_memory().unwrap()),
            SeedData::builtin().unwrap(),
            RepositoryOptions::default(),
        ).unwrap();

        assert_eq!(memory.issues().unwrap(), sqlite.issues().unwrap());
        assert_eq!(memory.categories(), sqlite.categories());
        assert_eq!(memory.statistics(), sqlite.statistics());
    }

    #[test]
    fn test_custom_corroboration() {
        let repo = Repository::with_store(
            Box::new(MemoryStore::new()),
            SeedData::empty(),
            RepositoryOptions { corroboration: 64, ..Default::default() },
        ).unwrap();
        assert_eq!(repo.statistics().corroboration, 64);
    }

    #[tokio::test]
    async fn test_sqlite_repository_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let config: KycConfig = serde_yaml::from_str(&format!(
            "storage:\n  backend: sqlite\n  path: {}\n",
            dir.path().join("kyc.db").display()
        ))
        .unwrap();

        let mut first = Repository::from_config(&config).await.unwrap();
        assert_eq!(first.issues().unwrap().len(), 20);
        assert!(first.delete_issue(20).unwrap());
        drop(first);

        let mut reopened = Repository::from_config(&config).await.unwrap();
        assert_eq!(reopened.issues().unwrap().len(), 19);
        assert!(reopened.get_issue(20).unwrap().is_none());

        // The deleted top id stays retired
        let added = reopened.add_issue(new_issue(IssueCategory::Risk, Severity::Low)).unwrap();
        assert_eq!(added.id, 21);
        drop(reopened);

        let mut emptied = Repository::from_config(&config).await.unwrap();
        for issue in emptied.issues().unwrap() {
            assert!(emptied.delete_issue(issue.id).unwrap());
        }
        drop(emptied);

        let mut after_empty = Repository::from_config(&config).await.unwrap();
        assert!(after_empty.issues().unwrap().is_empty());
        assert_eq!(after_empty.statistics().kyc_quality, 100);
        let next = after_empty.add_issue(new_issue(IssueCategory::Sow, Severity::Low)).unwrap();
        assert_eq!(next.id, 22);
    }
}
