use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A game title in one owner's collection.
/// Identity is the id; the name may be edited between dedup runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Title {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Title {
    /// Create a new title with a fresh time-ordered id.
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id,
            name: name.into(),
            platform: None,
            added_at: now,
            updated_at: now,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}
