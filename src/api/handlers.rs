use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{NewRecommendation, Recommendation, VoteOutcome},
};

use super::AppState;

static YOUTUBE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.youtube\.com|youtu\.?be)/.+$")
        .expect("youtube link pattern is valid")
});

// Request types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecommendationRequest {
    pub name: String,
    pub youtube_link: String,
}

impl CreateRecommendationRequest {
    /// Checks the payload and converts it into a creation command
    pub fn validate(self) -> AppResult<NewRecommendation> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "\"name\" is not allowed to be empty".to_string(),
            ));
        }

        if !YOUTUBE_LINK.is_match(&self.youtube_link) {
            return Err(AppError::Validation(
                "\"youtubeLink\" must be a YouTube video link".to_string(),
            ));
        }

        Ok(NewRecommendation::new(self.name, self.youtube_link))
    }
}

/// Unwraps a path parameter, reporting parse failures as JSON errors
fn path_param<T>(param: Result<Path<T>, PathRejection>) -> AppResult<T> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Create a new recommendation
pub async fn create_recommendation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<CreateRecommendationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Recommendation>)> {
    let Json(request) =
        payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let new = request.validate()?;

    tracing::info!(request_id = %request_id, name = %new.name, "Creating recommendation");

    let created = state.recommendations.insert(new).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Latest recommendations, newest first
pub async fn list_recommendations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let recommendations = state.recommendations.get().await?;
    Ok(Json(recommendations))
}

/// Weighted random recommendation
pub async fn random_recommendation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Recommendation>> {
    let recommendation = state.recommendations.get_random().await?;

    tracing::debug!(
        request_id = %request_id,
        recommendation_id = recommendation.id,
        "Random recommendation selected"
    );

    Ok(Json(recommendation))
}

/// Highest scoring recommendations
pub async fn top_recommendations(
    State(state): State<AppState>,
    amount: Result<Path<u32>, PathRejection>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let amount = path_param(amount)?;
    let recommendations = state.recommendations.get_top(amount).await?;
    Ok(Json(recommendations))
}

/// Get a recommendation by id
pub async fn get_recommendation(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Recommendation>> {
    let id = path_param(id)?;
    let recommendation = state.recommendations.get_by_id(id).await?;
    Ok(Json(recommendation))
}

/// Add one point to a recommendation
pub async fn upvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Recommendation>> {
    let id = path_param(id)?;
    tracing::info!(request_id = %request_id, recommendation_id = id, "Upvote");

    let recommendation = state.recommendations.upvote(id).await?;
    Ok(Json(recommendation))
}

/// Remove one point from a recommendation, deleting it past the floor
pub async fn downvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<VoteOutcome>> {
    let id = path_param(id)?;
    tracing::info!(request_id = %request_id, recommendation_id = id, "Downvote");

    let outcome = state.recommendations.downvote(id).await?;
    Ok(Json(outcome))
}

/// Delete every recommendation (test environments only)
pub async fn reset(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<StatusCode> {
    tracing::warn!(request_id = %request_id, "Resetting recommendations");

    state.recommendations.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}
