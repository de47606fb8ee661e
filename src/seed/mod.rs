//! Built-in review data: companies, issues, stories and corroboration support.

use std::collections::{HashMap, HashSet};
use serde::Deserialize;
use tracing::debug;
use crate::errors::KycError;
use crate::models::{Company, CompanyId, CorroborationSupport, Issue, IssueCategory, IssueId, Story, SupportItem};

const BUILTIN_SEED: &str = include_str!("seed.yaml");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedStory {
    id: u32,
    title: String,
    company_id: CompanyId,
    period: String,
    category: IssueCategory,
    verified: bool,
    issue_ids: Vec<IssueId>,
}

#[derive(Debug, Deserialize)]
struct SeedSupport {
    story: u32,
    #[serde(default)]
    documents: Vec<SupportItem>,
    #[serde(default)]
    links: Vec<SupportItem>,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    companies: Vec<Company>,
    #[serde(default)]
    issues: Vec<Issue>,
    #[serde(default)]
    stories: Vec<SeedStory>,
    #[serde(default)]
    support: Vec<SeedSupport>,
}

/// Initial repository contents.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub companies: Vec<Company>,
    pub issues: Vec<Issue>,
    pub stories: Vec<Story>,
    pub support: HashMap<u32, CorroborationSupport>,
}

impl SeedData {
    pub fn builtin() -> Result<Self, KycError> {
        Self::from_yaml(BUILTIN_SEED)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate seed data. Stories embed a copy of their company,
    /// so every story must name a known company.
    pub fn from_yaml(content: &str) -> Result<Self, KycError> {
        let file: SeedFile = serde_yaml::from_str(content)?;

        let mut seen = HashSet::new();
        for issue in &file.issues {
            if !seen.insert(issue.id) {
                return Err(KycError::Validation(format!("duplicate issue id {} in seed data", issue.id)));
            }
            if issue.materiality > 100 {
                return Err(KycError::Validation(format!(
                    "issue {} has materiality {} (must be 0-100)",
                    issue.id, issue.materiality
                )));
            }
        }

        let companies_by_id: HashMap<CompanyId, &Company> =
            file.companies.iter().map(|c| (c.id, c)).collect();

        let stories = file.stories.into_iter()
            .map(|s| {
                let company = companies_by_id.get(&s.company_id).ok_or_else(|| {
                    KycError::Validation(format!("story {} references unknown company {}", s.id, s.company_id))
                })?;
                Ok(Story {
                    id: s.id,
                    title: s.title,
                    company: (*company).clone(),
                    period: s.period,
                    category: s.category,
                    verified: s.verified,
                    issue_ids: s.issue_ids,
                })
            })
            .collect::<Result<Vec<_>, KycError>>()?;

        let support = file.support.into_iter()
            .map(|s| (s.story, CorroborationSupport { documents: s.documents, links: s.links }))
            .collect();

        debug!(
            companies = file.companies.len(),
            issues = file.issues.len(),
            stories = stories.len(),
            "Loaded seed data"
        );

        Ok(Self {
            companies: file.companies,
            issues: file.issues,
            stories,
            support,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueState, SupportKind};

    #[test]
    fn test_builtin_seed_loads() {
        let seed = SeedData::builtin().unwrap();
        assert_eq!(seed.companies.len(), 3);
        assert_eq!(seed.issues.len(), 20);
        assert_eq!(seed.stories.len(), 12);

        // SOW block first, in declaration order
        let first: Vec<_> = seed.issues.iter().take(5).map(|i| i.id).collect();
        assert_eq!(first, vec![1, 2, 3, 13, 14]);
    }

    #[test]
    fn test_builtin_seed_fields() {
        let seed = SeedData::builtin().unwrap();
        let hit = seed.issues.iter().find(|i| i.id == 8).unwrap();
        assert_eq!(hit.hit.as_deref(), Some("Zhang Yunfeng Hit"));
        assert_eq!(hit.state, IssueState::Solved);

        let story = seed.stories.iter().find(|s| s.id == 12).unwrap();
        assert_eq!(story.issue_ids, vec![12, 19, 20, 3, 4]);
        assert_eq!(story.company.name, "Xiamen Limbach Aircraft Engine Co.Ltd");
        assert_eq!(seed.companies[0].badge.as_deref(), Some("2"));
    }

    #[test]
    fn test_builtin_support() {
        let seed = SeedData::builtin().unwrap();
        let support = &seed.support[&3];
        assert_eq!(support.documents.len(), 2);
        assert!(support.documents.iter().all(|d| d.kind == SupportKind::Document));
        assert!(support.links.iter().all(|l| l.kind == SupportKind::Link));
        assert!(!seed.support.contains_key(&1));
    }

    #[test]
    fn test_seed_rejects_duplicate_ids() {
        let yaml = r#"
issues:
  - { id: 1, title: A, severity: Low, status: neutral, companyId: 1, materiality: 5, category: SOW }
  - { id: 1, title: B, severity: Low, status: neutral, companyId: 1, materiality: 5, category: UBO }
"#;
        assert!(matches!(SeedData::from_yaml(yaml), Err(KycError::Validation(_))));
    }

    #[test]
    fn test_seed_rejects_unknown_story_company() {
        let yaml = r#"
stories:
  - { id: 1, title: Orphan, companyId: 9, period: "2020", category: RISK, verified: false, issueIds: [] }
"#;
        assert!(matches!(SeedData::from_yaml(yaml), Err(KycError::Validation(_))));
    }
}
