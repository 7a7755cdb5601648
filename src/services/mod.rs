pub mod random;
pub mod recommendations;

pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use recommendations::RecommendationService;
