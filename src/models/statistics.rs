use serde::{Deserialize, Serialize};

/// Overall risk classification derived from open High/Medium issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// Aggregate review figures for the current issue set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// 0-100 score of how resolved and healthy the issue set is.
    pub kyc_quality: u8,
    /// 0-100, configured rather than derived.
    pub corroboration: u8,
    pub risk: RiskLevel,
}
