use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope every Graph API list endpoint answers with.
#[derive(Debug, Deserialize)]
pub struct GraphPage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> GraphPage<T> {
    /// Cursor for the following page, if the API announced one.
    pub fn next_url(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdSet {
    pub id: String,
    pub name: String,
}

/// An arm of an ad study experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdStudyCell {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceSize {
    pub id: String,
    #[serde(default)]
    pub approximate_count_lower_bound: Option<Value>,
    #[serde(default)]
    pub approximate_count_upper_bound: Option<Value>,
}
