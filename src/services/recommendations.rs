use std::sync::Arc;

use crate::{
    db::{RecommendationRepository, ScoreFilter, ScoreOperation},
    error::{AppError, AppResult},
    models::{NewRecommendation, Recommendation, VoteOutcome},
    services::random::RandomSource,
};

/// Recommendations scoring below this are deleted by a downvote
pub const DELETE_BELOW_SCORE: i32 = -5;

/// Scores above this form the popular tier of the weighted pick
pub const POPULAR_SCORE_THRESHOLD: i32 = 10;

/// Share of draws that prefer the popular tier
pub const POPULAR_PICK_PROBABILITY: f64 = 0.7;

/// Number of recommendations returned by [`RecommendationService::get`]
pub const RECENT_WINDOW: i64 = 10;

/// Business rules for creating, voting on and selecting recommendations
///
/// The service talks only to the [`RecommendationRepository`] contract and an
/// injected [`RandomSource`], so every rule can be exercised without storage.
#[derive(Clone)]
pub struct RecommendationService {
    repository: Arc<dyn RecommendationRepository>,
    random: Arc<dyn RandomSource>,
}

impl RecommendationService {
    pub fn new(
        repository: Arc<dyn RecommendationRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self { repository, random }
    }

    /// Creates a recommendation, rejecting names already in use
    pub async fn insert(&self, new: NewRecommendation) -> AppResult<Recommendation> {
        if self.repository.find_by_name(&new.name).await?.is_some() {
            tracing::debug!(name = %new.name, "Rejected duplicate recommendation name");
            return Err(AppError::duplicate_name());
        }

        // The storage constraint catches inserts that raced past the check above
        let created = self
            .repository
            .create(&new)
            .await
            .map_err(|e| match e {
                AppError::ConstraintViolation(detail) => {
                    tracing::warn!(
                        name = %new.name,
                        detail = %detail,
                        "Lost create race on recommendation name"
                    );
                    AppError::duplicate_name()
                }
                other => other,
            })?;

        tracing::info!(recommendation_id = created.id, "Recommendation created");

        Ok(created)
    }

    pub async fn upvote(&self, id: i32) -> AppResult<Recommendation> {
        self.apply_vote(id, ScoreOperation::Increment).await
    }

    /// Lowers the score, deleting the recommendation once it falls below the floor
    pub async fn downvote(&self, id: i32) -> AppResult<VoteOutcome> {
        let updated = self.apply_vote(id, ScoreOperation::Decrement).await?;

        if updated.score < DELETE_BELOW_SCORE {
            self.repository.remove(id).await?;
            tracing::info!(
                recommendation_id = id,
                score = updated.score,
                "Recommendation deleted after downvote"
            );
            return Ok(VoteOutcome::Deleted);
        }

        Ok(VoteOutcome::Updated(updated))
    }

    async fn apply_vote(&self, id: i32, operation: ScoreOperation) -> AppResult<Recommendation> {
        self.get_by_id(id).await?;

        let updated = self.repository.update_score(id, operation).await?;

        tracing::debug!(
            recommendation_id = id,
            operation = %operation,
            score = updated.score,
            "Vote applied"
        );

        Ok(updated)
    }

    /// Picks one recommendation, favouring the popular tier
    ///
    /// A draw below [`POPULAR_PICK_PROBABILITY`] prefers recommendations scoring
    /// above [`POPULAR_SCORE_THRESHOLD`]; any other draw prefers the rest. When
    /// the preferred tier is empty the other tier is used instead, and only when
    /// both are empty does the pick fail with `NotFound`.
    pub async fn get_random(&self) -> AppResult<Recommendation> {
        let popular = self
            .repository
            .find_all(Some(ScoreFilter::above(POPULAR_SCORE_THRESHOLD)))
            .await?;
        let rest = self
            .repository
            .find_all(Some(ScoreFilter::at_most(POPULAR_SCORE_THRESHOLD)))
            .await?;

        let draw = self.random.draw();
        let (preferred, fallback) = if draw < POPULAR_PICK_PROBABILITY {
            (popular, rest)
        } else {
            (rest, popular)
        };

        let mut pool = if preferred.is_empty() {
            fallback
        } else {
            preferred
        };

        if pool.is_empty() {
            return Err(AppError::not_found());
        }

        let index = self.random.pick(pool.len());
        Ok(pool.swap_remove(index))
    }

    /// The most recently created recommendations, newest first
    pub async fn get(&self) -> AppResult<Vec<Recommendation>> {
        self.repository.find_recent(RECENT_WINDOW).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Recommendation> {
        self.repository
            .find(id)
            .await?
            .ok_or_else(AppError::not_found)
    }

    /// Up to `amount` recommendations ordered by score, highest first
    pub async fn get_top(&self, amount: u32) -> AppResult<Vec<Recommendation>> {
        self.repository
            .get_amount_by_score(i64::from(amount))
            .await
    }

    /// Wipes all recommendations
    pub async fn reset(&self) -> AppResult<()> {
        self.repository.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{MockRecommendationRepository, ScoreComparison};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    /// Always returns the same draw and the first index
    struct FixedRandom(f64);

    impl RandomSource for FixedRandom {
        fn draw(&self) -> f64 {
            self.0
        }

        fn pick(&self, _len: usize) -> usize {
            0
        }
    }

    fn recommendation(id: i32, score: i32) -> Recommendation {
        Recommendation {
            id,
            name: format!("Song {id}"),
            youtube_link: format!("https://www.youtube.com/watch?v=song{id}"),
            score,
        }
    }

    fn service(repo: MockRecommendationRepository) -> RecommendationService {
        service_with_draw(repo, 0.5)
    }

    fn service_with_draw(repo: MockRecommendationRepository, draw: f64) -> RecommendationService {
        RecommendationService::new(Arc::new(repo), Arc::new(FixedRandom(draw)))
    }

    /// Pool A holds scores above 10, pool B the rest
    fn with_pools(
        popular: Vec<Recommendation>,
        rest: Vec<Recommendation>,
    ) -> MockRecommendationRepository {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_all()
            .times(2)
            .returning(move |filter| match filter.map(|f| f.comparison) {
                Some(ScoreComparison::GreaterThan) => Ok(popular.clone()),
                Some(ScoreComparison::LessOrEqual) => Ok(rest.clone()),
                None => panic!("weighted pick must filter by score"),
            });
        repo
    }

    #[tokio::test]
    async fn test_insert_creates_recommendation() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_by_name()
            .withf(|name| name == "Xote dos Milagres")
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_create()
            .withf(|new| new.name == "Xote dos Milagres")
            .times(1)
            .returning(|new| {
                Ok(Recommendation {
                    id: 1,
                    name: new.name.clone(),
                    youtube_link: new.youtube_link.clone(),
                    score: 0,
                })
            });

        let created = service(repo)
            .insert(NewRecommendation::new(
                "Xote dos Milagres",
                "https://www.youtube.com/watch?v=chwyjJbcs1Y",
            ))
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.score, 0);
    }

    #[tokio::test]
    async fn test_insert_duplicate_name_is_conflict() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_by_name()
            .times(1)
            .returning(|_| Ok(Some(recommendation(1, 0))));
        repo.expect_create().never();

        let result = service(repo)
            .insert(NewRecommendation::new("Song 1", "https://youtu.be/x"))
            .await;

        match result {
            Err(AppError::Conflict(msg)) => {
                assert_eq!(msg, "Recommendations names must be unique")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_lost_race_is_conflict() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_by_name().returning(|_| Ok(None));
        repo.expect_create().times(1).returning(|_| {
            Err(AppError::ConstraintViolation(
                "duplicate key value violates unique constraint".to_string(),
            ))
        });

        let result = service(repo)
            .insert(NewRecommendation::new("Song 1", "https://youtu.be/x"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_insert_propagates_storage_errors() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_by_name()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let result = service(repo)
            .insert(NewRecommendation::new("Song 1", "https://youtu.be/x"))
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_upvote_increments_score() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find()
            .with(eq(3))
            .returning(|id| Ok(Some(recommendation(id, 4))));
        repo.expect_update_score()
            .with(eq(3), eq(ScoreOperation::Increment))
            .times(1)
            .returning(|id, _| Ok(recommendation(id, 5)));
        repo.expect_remove().never();

        let updated = assert_ok!(service(repo).upvote(3).await);
        assert_eq!(updated.score, 5);
    }

    #[tokio::test]
    async fn test_downvote_keeps_recommendation_at_floor() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find().returning(|id| Ok(Some(recommendation(id, -4))));
        repo.expect_update_score()
            .with(eq(1), eq(ScoreOperation::Decrement))
            .returning(|id, _| Ok(recommendation(id, -5)));
        repo.expect_remove().never();

        let outcome = service(repo).downvote(1).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Updated(recommendation(1, -5)));
    }

    #[tokio::test]
    async fn test_downvote_below_floor_deletes() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find().returning(|id| Ok(Some(recommendation(id, -5))));
        repo.expect_update_score()
            .with(eq(1), eq(ScoreOperation::Decrement))
            .returning(|id, _| Ok(recommendation(id, -6)));
        repo.expect_remove().with(eq(1)).times(1).returning(|_| Ok(()));

        let outcome = service(repo).downvote(1).await.unwrap();
        assert!(outcome.is_deleted());
    }

    #[tokio::test]
    async fn test_missing_recommendation_is_not_found() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find().returning(|_| Ok(None));
        repo.expect_update_score().never();
        let service = service(repo);

        for result in [
            service.upvote(99).await.map(|_| ()),
            service.downvote(99).await.map(|_| ()),
            service.get_by_id(99).await.map(|_| ()),
        ] {
            match result {
                Err(AppError::NotFound(msg)) => assert!(msg.is_empty()),
                other => panic!("expected not found, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_get_random_low_draw_prefers_popular_tier() {
        let repo = with_pools(vec![recommendation(1, 11)], vec![recommendation(2, 9)]);
        let picked = service_with_draw(repo, 0.6).get_random().await.unwrap();
        assert_eq!(picked.id, 1);
    }

    #[tokio::test]
    async fn test_get_random_high_draw_prefers_rest() {
        let repo = with_pools(vec![recommendation(1, 11)], vec![recommendation(2, 9)]);
        let picked = service_with_draw(repo, 0.8).get_random().await.unwrap();
        assert_eq!(picked.id, 2);
    }

    #[tokio::test]
    async fn test_get_random_threshold_draw_prefers_rest() {
        let repo = with_pools(vec![recommendation(1, 11)], vec![recommendation(2, 9)]);
        let picked = service_with_draw(repo, 0.7).get_random().await.unwrap();
        assert_eq!(picked.id, 2);
    }

    #[tokio::test]
    async fn test_get_random_falls_back_to_other_tier() {
        let repo = with_pools(vec![], vec![recommendation(2, 9)]);
        let picked = service_with_draw(repo, 0.1).get_random().await.unwrap();
        assert_eq!(picked.id, 2);

        let repo = with_pools(vec![recommendation(1, 30)], vec![]);
        let picked = service_with_draw(repo, 0.9).get_random().await.unwrap();
        assert_eq!(picked.id, 1);
    }

    #[tokio::test]
    async fn test_get_random_empty_is_not_found() {
        let repo = with_pools(vec![], vec![]);
        let result = service_with_draw(repo, 0.3).get_random().await;
        let err = assert_err!(result);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_uses_recent_window() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_find_recent()
            .with(eq(10))
            .times(1)
            .returning(|limit| {
                Ok((1..=limit as i32)
                    .rev()
                    .map(|id| recommendation(id, 0))
                    .collect())
            });

        let recent = service(repo).get().await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, 10);
    }

    #[tokio::test]
    async fn test_get_top_passes_amount() {
        let mut repo = MockRecommendationRepository::new();
        repo.expect_get_amount_by_score()
            .with(eq(5))
            .times(1)
            .returning(|_| Ok(vec![recommendation(11, 11), recommendation(10, 10)]));

        let top = service(repo).get_top(5).await.unwrap();
        assert_eq!(top[0].score, 11);
    }
}
