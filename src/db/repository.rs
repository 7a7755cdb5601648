use std::fmt::Display;

use crate::{
    error::AppResult,
    models::{NewRecommendation, Recommendation},
};

/// How a [`ScoreFilter`] compares stored scores against its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreComparison {
    /// `score > threshold`
    GreaterThan,
    /// `score <= threshold`
    LessOrEqual,
}

/// Restricts a listing to one side of a score threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreFilter {
    pub score: i32,
    pub comparison: ScoreComparison,
}

impl ScoreFilter {
    pub fn above(score: i32) -> Self {
        Self {
            score,
            comparison: ScoreComparison::GreaterThan,
        }
    }

    pub fn at_most(score: i32) -> Self {
        Self {
            score,
            comparison: ScoreComparison::LessOrEqual,
        }
    }

    pub fn matches(&self, score: i32) -> bool {
        match self.comparison {
            ScoreComparison::GreaterThan => score > self.score,
            ScoreComparison::LessOrEqual => score <= self.score,
        }
    }
}

/// Direction of a single-step score update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOperation {
    Increment,
    Decrement,
}

impl ScoreOperation {
    pub fn delta(self) -> i32 {
        match self {
            ScoreOperation::Increment => 1,
            ScoreOperation::Decrement => -1,
        }
    }
}

impl Display for ScoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreOperation::Increment => write!(f, "increment"),
            ScoreOperation::Decrement => write!(f, "decrement"),
        }
    }
}

/// Storage contract for recommendations
///
/// Implementations own every storage detail. The service layer only relies on
/// the semantics documented here:
///
/// - `create` must reject duplicate names with [`AppError::ConstraintViolation`],
///   independently of any check the caller performed beforehand.
/// - `update_score` must apply the delta atomically and return the row as it
///   is after the update.
///
/// [`AppError::ConstraintViolation`]: crate::error::AppError::ConstraintViolation
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// Inserts a recommendation with score 0
    async fn create(&self, new: &NewRecommendation) -> AppResult<Recommendation>;

    async fn find(&self, id: i32) -> AppResult<Option<Recommendation>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Recommendation>>;

    /// Lists recommendations, optionally restricted to one side of a score threshold
    async fn find_all(&self, filter: Option<ScoreFilter>) -> AppResult<Vec<Recommendation>>;

    /// Lists the `limit` most recently created recommendations, newest first
    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Recommendation>>;

    /// Lists up to `amount` recommendations ordered by score, highest first
    async fn get_amount_by_score(&self, amount: i64) -> AppResult<Vec<Recommendation>>;

    /// Applies `operation` and returns the updated row
    ///
    /// Fails with `NotFound` if the row no longer exists.
    async fn update_score(&self, id: i32, operation: ScoreOperation) -> AppResult<Recommendation>;

    async fn remove(&self, id: i32) -> AppResult<()>;

    /// Deletes every recommendation and restarts id assignment
    async fn reset(&self) -> AppResult<()>;
}
