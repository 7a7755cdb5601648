pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryRecommendationRepository;
pub use postgres::{create_pool, run_migrations, PgRecommendationRepository};
pub use repository::{RecommendationRepository, ScoreComparison, ScoreFilter, ScoreOperation};
