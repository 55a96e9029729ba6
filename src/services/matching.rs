use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{CandidateScore, UserId, UserProfile},
    services::{
        affinity::AffinityScorer,
        profiles::ProfileStore,
        sentiment::SentimentAnalyzer,
    },
};

/// Ranks candidate readers for a target reader
///
/// Resolves every review the ranking needs in one concurrent sentiment
/// pre-pass, then hands the scorer a finished polarity table so scoring
/// itself stays synchronous.
#[derive(Clone)]
pub struct MatchService {
    scorer: AffinityScorer,
    analyzer: Arc<dyn SentimentAnalyzer>,
    sentiment_timeout: Duration,
    max_matches: usize,
}

impl MatchService {
    pub fn new(
        scorer: AffinityScorer,
        analyzer: Arc<dyn SentimentAnalyzer>,
        sentiment_timeout: Duration,
        max_matches: usize,
    ) -> Self {
        Self {
            scorer,
            analyzer,
            sentiment_timeout,
            max_matches,
        }
    }

    fn effective_limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.max_matches).min(self.max_matches)
    }

    pub async fn rank(
        &self,
        target: &UserProfile,
        candidates: &[UserProfile],
        limit: Option<usize>,
    ) -> AppResult<Vec<CandidateScore>> {
        let texts = self.scorer.review_texts(target, candidates);
        let requested = texts.len();

        let polarities = self
            .analyzer
            .polarity_batch(texts, self.sentiment_timeout)
            .await;

        let matches = self.scorer.rank(
            target,
            candidates,
            &polarities,
            Some(self.effective_limit(limit)),
        )?;

        tracing::info!(
            user_id = %target.user_id,
            candidates = candidates.len(),
            reviews = requested,
            resolved = polarities.len(),
            matches = matches.len(),
            analyzer = self.analyzer.name(),
            policy = ?self.scorer.config().scoring_policy,
            "Match ranking completed"
        );

        Ok(matches)
    }

    /// Ranks the stored readers who share at least one item with `user_id`
    pub async fn matches_for_user(
        &self,
        store: &dyn ProfileStore,
        user_id: UserId,
        limit: Option<usize>,
    ) -> AppResult<Vec<CandidateScore>> {
        let target = store
            .profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No saved books for user {}", user_id)))?;

        let candidates = store.candidates_for(&target).await?;
        self.rank(&target, &candidates, limit).await
    }
}
