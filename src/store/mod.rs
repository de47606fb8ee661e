//! Issue storage backends.
//!
//! The repository talks to storage only through [`IssueStore`], so the
//! in-memory backend used by tests and the SQLite backend used by the
//! server are interchangeable.

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::errors::KycError;
use crate::models::{CompanyId, Issue, IssueCategory, IssueId, IssueState};

/// Bookkeeping that has to outlive the process for persistent stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMeta {
    /// Seed issues were written once. Set even if they were later deleted.
    pub seeded: bool,
    /// Highest issue id ever allocated.
    pub id_high_water: IssueId,
}

/// Ordered issue storage keyed by id.
///
/// Implementations must return issues in insertion order, and a replaced
/// issue keeps its original position.
pub trait IssueStore: Send + Sync {
    fn all(&self) -> Result<Vec<Issue>, KycError>;

    fn get(&self, id: IssueId) -> Result<Option<Issue>, KycError>;

    /// Append a new issue. Fails with `Conflict` if the id is taken.
    fn insert(&mut self, issue: Issue) -> Result<(), KycError>;

    /// Overwrite the issue with the same id in place. Returns false if absent.
    fn replace(&mut self, issue: Issue) -> Result<bool, KycError>;

    fn remove(&mut self, id: IssueId) -> Result<bool, KycError>;

    fn meta(&self) -> Result<StoreMeta, KycError>;

    fn save_meta(&mut self, meta: StoreMeta) -> Result<(), KycError>;

    fn len(&self) -> Result<usize, KycError> {
        Ok(self.all()?.len())
    }

    fn is_empty(&self) -> Result<bool, KycError> {
        Ok(self.len()? == 0)
    }

    fn max_id(&self) -> Result<Option<IssueId>, KycError> {
        Ok(self.all()?.iter().map(|i| i.id).max())
    }

    fn by_category(&self, category: IssueCategory) -> Result<Vec<Issue>, KycError> {
        Ok(self.all()?.into_iter().filter(|i| i.category == category).collect())
    }

    fn by_company(&self, company_id: CompanyId) -> Result<Vec<Issue>, KycError> {
        Ok(self.all()?.into_iter().filter(|i| i.company_id == company_id).collect())
    }

    fn by_state(&self, state: IssueState) -> Result<Vec<Issue>, KycError> {
        Ok(self.all()?.into_iter().filter(|i| i.state == state).collect())
    }
}
