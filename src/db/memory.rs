use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    db::repository::{RecommendationRepository, ScoreFilter, ScoreOperation},
    error::{AppError, AppResult},
    models::{NewRecommendation, Recommendation},
};

/// In-process recommendation storage
///
/// Mirrors the PostgreSQL adapter's semantics (unique names, sequential ids,
/// atomic score updates) so the HTTP layer can be exercised without a database.
#[derive(Clone, Default)]
pub struct InMemoryRecommendationRepository {
    inner: Arc<RwLock<InMemoryInner>>,
}

#[derive(Default)]
struct InMemoryInner {
    last_id: i32,
    rows: BTreeMap<i32, Recommendation>,
}

impl InMemoryRecommendationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a score directly, bypassing the vote rules
    ///
    /// Returns `false` when no recommendation has the given id.
    pub async fn set_score(&self, id: i32, score: i32) -> bool {
        let mut inner = self.inner.write().await;
        match inner.rows.get_mut(&id) {
            Some(row) => {
                row.score = score;
                true
            }
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for InMemoryRecommendationRepository {
    async fn create(&self, new: &NewRecommendation) -> AppResult<Recommendation> {
        let mut inner = self.inner.write().await;

        if inner.rows.values().any(|row| row.name == new.name) {
            return Err(AppError::ConstraintViolation(format!(
                "duplicate recommendation name: {}",
                new.name
            )));
        }

        inner.last_id += 1;
        let recommendation = Recommendation {
            id: inner.last_id,
            name: new.name.clone(),
            youtube_link: new.youtube_link.clone(),
            score: 0,
        };
        inner.rows.insert(recommendation.id, recommendation.clone());

        Ok(recommendation)
    }

    async fn find(&self, id: i32) -> AppResult<Option<Recommendation>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Recommendation>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().find(|row| row.name == name).cloned())
    }

    async fn find_all(&self, filter: Option<ScoreFilter>) -> AppResult<Vec<Recommendation>> {
        let inner = self.inner.read().await;
        let rows = inner
            .rows
            .values()
            .rev()
            .filter(|row| filter.map_or(true, |f| f.matches(row.score)))
            .cloned()
            .collect();

        Ok(rows)
    }

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Recommendation>> {
        let inner = self.inner.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(inner.rows.values().rev().take(limit).cloned().collect())
    }

    async fn get_amount_by_score(&self, amount: i64) -> AppResult<Vec<Recommendation>> {
        let inner = self.inner.read().await;
        let amount = usize::try_from(amount).unwrap_or(0);

        // BTreeMap iterates by id, so the stable sort keeps ties in id order
        let mut rows: Vec<Recommendation> = inner.rows.values().cloned().collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows.truncate(amount);

        Ok(rows)
    }

    async fn update_score(&self, id: i32, operation: ScoreOperation) -> AppResult<Recommendation> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id).ok_or_else(AppError::not_found)?;
        row.score = row
            .score
            .checked_add(operation.delta())
            .ok_or_else(|| {
                AppError::Internal(format!("score out of range for recommendation {id}"))
            })?;

        Ok(row.clone())
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.rows.remove(&id);
        Ok(())
    }

    async fn reset(&self) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        *inner = InMemoryInner::default();
        Ok(())
    }
}
