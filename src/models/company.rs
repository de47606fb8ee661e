use serde::{Deserialize, Serialize};
use super::issue::{double_option, CompanyId};

/// A company under review. Issues reference it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// Review period, e.g. "2015-2022".
    pub period: String,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub period: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub badge: Option<String>,
}

impl NewCompany {
    pub fn into_company(self, id: CompanyId) -> Company {
        Company {
            id,
            name: self.name,
            period: self.period,
            verified: self.verified,
            badge: self.badge,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub period: Option<String>,
    pub verified: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub badge: Option<Option<String>>,
}

impl CompanyPatch {
    pub fn apply_to(self, company: &mut Company) {
        if let Some(v) = self.name { company.name = v; }
        if let Some(v) = self.period { company.period = v; }
        if let Some(v) = self.verified { company.verified = v; }
        if let Some(v) = self.badge { company.badge = v; }
    }
}
