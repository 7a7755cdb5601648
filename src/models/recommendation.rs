use serde::{Deserialize, Serialize};

/// A voteable song recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Surrogate key assigned by storage
    pub id: i32,
    /// Unique, case-sensitive song name
    pub name: String,
    /// Video link, stored verbatim
    #[sqlx(rename = "youtubeLink")]
    pub youtube_link: String,
    pub score: i32,
}

/// Fields supplied when creating a recommendation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecommendation {
    pub name: String,
    pub youtube_link: String,
}

impl NewRecommendation {
    pub fn new(name: impl Into<String>, youtube_link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            youtube_link: youtube_link.into(),
        }
    }
}

/// Result of a downvote
///
/// A downvote either leaves the recommendation in place with its new score,
/// or pushes it past the deletion threshold, in which case it no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "recommendation", rename_all = "snake_case")]
pub enum VoteOutcome {
    Updated(Recommendation),
    Deleted,
}

impl VoteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, VoteOutcome::Deleted)
    }
}
