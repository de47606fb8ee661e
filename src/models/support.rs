use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportKind {
    Document,
    Link,
}

/// Evidence attached to a story: a supporting document or a mentioned link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SupportKind,
    /// Markdown body.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorroborationSupport {
    pub documents: Vec<SupportItem>,
    pub links: Vec<SupportItem>,
}

impl CorroborationSupport {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.links.is_empty()
    }
}
