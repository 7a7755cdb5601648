use std::sync::Arc;

use crate::{
    db::RecommendationRepository,
    services::{RandomSource, RecommendationService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: RecommendationService,
    /// Whether `DELETE /reset-database` is mounted
    pub reset_enabled: bool,
}

impl AppState {
    /// Builds state around a storage backend and random source
    pub fn new(
        repository: Arc<dyn RecommendationRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            recommendations: RecommendationService::new(repository, random),
            reset_enabled: false,
        }
    }

    /// Mounts the reset route used by end-to-end test environments
    pub fn with_reset_route(mut self, enabled: bool) -> Self {
        self.reset_enabled = enabled;
        self
    }
}
