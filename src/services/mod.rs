pub mod affinity;
pub mod matching;
pub mod profiles;
pub mod sentiment;
pub mod sessions;

pub use affinity::AffinityScorer;
pub use matching::MatchService;
pub use profiles::{InMemoryProfileStore, PostgresProfileStore, ProfileStore};
pub use sentiment::SentimentAnalyzer;
pub use sessions::SessionRegistry;
