use serde::{Deserialize, Serialize};
use super::issue::IssueCategory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: IssueCategory,
    pub name: String,
    /// Number of issues currently in this category. Derived, never edited directly.
    pub count: usize,
}

impl Category {
    pub fn new(id: IssueCategory) -> Self {
        Self { id, name: id.as_str().to_string(), count: 0 }
    }

    /// One entry per category, in display order, with zero counts.
    pub fn defaults() -> Vec<Category> {
        IssueCategory::ALL.iter().copied().map(Category::new).collect()
    }
}
