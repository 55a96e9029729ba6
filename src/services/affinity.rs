use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    AffinityVector, CandidateScore, ItemId, RatedItem, UserId, UserProfile, RATING_MAX, RATING_MIN,
};
use crate::services::sentiment::PolarityTable;

/// Distance recorded for a shared item when either opinion is incomplete
pub const INCOMPLETE_PENALTY: f64 = 1.0;
/// Maps a 1..=5 rating toward the unit range
pub const DEFAULT_RATING_SCALE: f64 = 0.2;
/// Moves polarity from [-1, 1] into [0, 2]
pub const DEFAULT_SENTIMENT_SHIFT: f64 = 1.0;

/// Error types for affinity scoring
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("invalid input for user {user_id}, item {item_id}: {reason}")]
    InvalidInput {
        user_id: UserId,
        item_id: ItemId,
        reason: String,
    },
    #[error("affinity vector for user {user_id}, item {item_id} has no usable magnitude")]
    DegenerateVector { user_id: UserId, item_id: ItemId },
    #[error("candidate {0} listed more than once")]
    DuplicateCandidate(UserId),
    #[error("invalid scorer configuration: {0}")]
    InvalidConfig(String),
}

impl ScoringError {
    /// User whose data caused the error, if it concerns one user's item
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            ScoringError::InvalidInput { user_id, .. }
            | ScoringError::DegenerateVector { user_id, .. } => Some(*user_id),
            ScoringError::DuplicateCandidate(_) | ScoringError::InvalidConfig(_) => None,
        }
    }
}

/// Which items count toward the shared-item set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedItemFilter {
    /// Every item present on both lists
    #[default]
    All,
    /// Only items the target has flagged to-be-read
    TargetToBeRead,
    /// Only items both readers have flagged to-be-read
    BothToBeRead,
}

impl SharedItemFilter {
    fn admits(&self, target_item: &RatedItem, candidate_item: &RatedItem) -> bool {
        match self {
            SharedItemFilter::All => true,
            SharedItemFilter::TargetToBeRead => target_item.to_be_read,
            SharedItemFilter::BothToBeRead => target_item.to_be_read && candidate_item.to_be_read,
        }
    }
}

/// What to do when a candidate's data cannot be scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Surface the first error to the caller
    Strict,
    /// Drop the offending candidate and rank the rest
    #[default]
    SkipInvalidCandidates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    pub rating_scale: f64,
    pub sentiment_shift: f64,
    pub shared_item_filter: SharedItemFilter,
    pub scoring_policy: ScoringPolicy,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            rating_scale: DEFAULT_RATING_SCALE,
            sentiment_shift: DEFAULT_SENTIMENT_SHIFT,
            shared_item_filter: SharedItemFilter::default(),
            scoring_policy: ScoringPolicy::default(),
        }
    }
}

impl ScorerConfig {
    /// Rejects constants that could produce a degenerate vector
    ///
    /// Ratings are at least 1, so a strictly positive rating scale keeps the
    /// first component away from zero whatever the sentiment shift is. The
    /// largest possible vector must also keep a finite squared length, since
    /// the angle is computed from products of components.
    pub fn validate(&self) -> Result<(), ScoringError> {
        if !self.rating_scale.is_finite() || self.rating_scale <= 0.0 {
            return Err(ScoringError::InvalidConfig(format!(
                "rating scale must be finite and positive, got {}",
                self.rating_scale
            )));
        }

        if !self.sentiment_shift.is_finite() {
            return Err(ScoringError::InvalidConfig(format!(
                "sentiment shift must be finite, got {}",
                self.sentiment_shift
            )));
        }

        let extreme =
            (RATING_MAX as f64 * self.rating_scale).hypot(self.sentiment_shift.abs() + 1.0);
        if !(extreme * extreme).is_finite() {
            return Err(ScoringError::InvalidConfig(format!(
                "rating scale {} with sentiment shift {} overflows the vector length",
                self.rating_scale, self.sentiment_shift
            )));
        }

        Ok(())
    }
}

/// Per-item outcome of comparing two opinions
#[derive(Debug, Clone, Copy, PartialEq)]
enum ItemDistance {
    Angle(f64),
    Penalty,
}

impl ItemDistance {
    fn value(self) -> f64 {
        match self {
            ItemDistance::Angle(angle) => angle,
            ItemDistance::Penalty => INCOMPLETE_PENALTY,
        }
    }
}

/// Ranks readers by how closely their opinions on shared books match
///
/// Each opinion becomes a 2-D vector (scaled rating, shifted polarity); two
/// readers are compared by the angle between their vectors on every book both
/// have, and the angles are summed. Distances are summed, not averaged, so a
/// candidate with more shared books accumulates more terms.
///
/// The scorer holds no state besides its configuration and performs no I/O:
/// review polarities are resolved beforehand into a [`PolarityTable`].
#[derive(Debug, Clone)]
pub struct AffinityScorer {
    config: ScorerConfig,
}

impl AffinityScorer {
    /// Creates a scorer, validating the configured constants
    pub fn new(config: ScorerConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Turns one opinion into its affinity vector
    pub fn quantify(
        &self,
        user_id: UserId,
        item: &RatedItem,
        polarity: f64,
    ) -> Result<AffinityVector, ScoringError> {
        let rating = item.rating.ok_or_else(|| ScoringError::InvalidInput {
            user_id,
            item_id: item.item_id.clone(),
            reason: "cannot quantify an unrated item".to_string(),
        })?;

        if !(-1.0..=1.0).contains(&polarity) {
            return Err(ScoringError::InvalidInput {
                user_id,
                item_id: item.item_id.clone(),
                reason: format!("polarity {} outside [-1, 1]", polarity),
            });
        }

        let vector = AffinityVector::new(
            rating as f64 * self.config.rating_scale,
            polarity + self.config.sentiment_shift,
        );

        let norm = vector.norm();
        if !norm.is_finite() || norm == 0.0 {
            return Err(ScoringError::DegenerateVector {
                user_id,
                item_id: item.item_id.clone(),
            });
        }

        Ok(vector)
    }

    /// Items present on both lists, after the configured filter, sorted by id
    pub fn shared_items(&self, target: &UserProfile, candidate: &UserProfile) -> Vec<ItemId> {
        shared_items(target, candidate, self.config.shared_item_filter)
    }

    /// Scores one candidate against the target
    ///
    /// Returns `Ok(None)` when the two readers share no items; such a
    /// candidate is excluded rather than penalised.
    pub fn score_candidate(
        &self,
        target: &UserProfile,
        candidate: &UserProfile,
        polarities: &PolarityTable,
    ) -> Result<Option<CandidateScore>, ScoringError> {
        validate_profile(target)?;
        validate_profile(candidate)?;
        self.score_validated(target, candidate, polarities)
    }

    fn score_validated(
        &self,
        target: &UserProfile,
        candidate: &UserProfile,
        polarities: &PolarityTable,
    ) -> Result<Option<CandidateScore>, ScoringError> {
        let target_items = index_items(target);
        let candidate_items = index_items(candidate);
        let filter = self.config.shared_item_filter;

        let mut shared: Vec<(&RatedItem, &RatedItem)> = target_items
            .iter()
            .filter_map(|(id, t)| candidate_items.get(id).map(|c| (*t, *c)))
            .filter(|(t, c)| filter.admits(t, c))
            .collect();

        if shared.is_empty() {
            return Ok(None);
        }

        shared.sort_by(|a, b| a.0.item_id.cmp(&b.0.item_id));

        let mut aggregate_distance = 0.0;
        let mut penalized_items = 0;

        for (target_item, candidate_item) in &shared {
            let distance = self.item_distance(
                target.user_id,
                target_item,
                candidate.user_id,
                candidate_item,
                polarities,
            )?;

            if distance == ItemDistance::Penalty {
                penalized_items += 1;
            }
            aggregate_distance += distance.value();
        }

        Ok(Some(CandidateScore {
            candidate_user_id: candidate.user_id,
            aggregate_distance,
            shared_items: shared.len(),
            penalized_items,
        }))
    }

    fn item_distance(
        &self,
        target_id: UserId,
        target_item: &RatedItem,
        candidate_id: UserId,
        candidate_item: &RatedItem,
        polarities: &PolarityTable,
    ) -> Result<ItemDistance, ScoringError> {
        if !target_item.is_complete() || !candidate_item.is_complete() {
            return Ok(ItemDistance::Penalty);
        }

        let target_polarity = target_item.review_text().and_then(|t| polarities.get(t));
        let candidate_polarity = candidate_item.review_text().and_then(|t| polarities.get(t));

        let (Some(target_polarity), Some(candidate_polarity)) =
            (target_polarity, candidate_polarity)
        else {
            tracing::debug!(
                item_id = %target_item.item_id,
                candidate_user_id = %candidate_id,
                "Review polarity unresolved, applying penalty"
            );
            return Ok(ItemDistance::Penalty);
        };

        let target_vector = self.quantify(target_id, target_item, target_polarity)?;
        let candidate_vector = self.quantify(candidate_id, candidate_item, candidate_polarity)?;

        Ok(ItemDistance::Angle(target_vector.angle_to(&candidate_vector)))
    }

    /// Ranks candidates from most to least similar to the target
    ///
    /// Ordering is ascending aggregate distance, ties broken by ascending
    /// candidate id. The result is truncated to `limit` when given.
    pub fn rank(
        &self,
        target: &UserProfile,
        candidates: &[UserProfile],
        polarities: &PolarityTable,
        limit: Option<usize>,
    ) -> Result<Vec<CandidateScore>, ScoringError> {
        validate_profile(target)?;

        if target.is_empty() || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        if let Some(repeated) = candidates.iter().find(|c| !seen.insert(c.user_id)) {
            return Err(ScoringError::DuplicateCandidate(repeated.user_id));
        }

        let mut scores = Vec::new();

        for candidate in candidates {
            if candidate.user_id == target.user_id {
                continue;
            }

            let outcome = validate_profile(candidate)
                .and_then(|_| self.score_validated(target, candidate, polarities));

            match outcome {
                Ok(Some(score)) => scores.push(score),
                Ok(None) => {}
                // the target's own data is never a reason to drop a candidate
                Err(e) if e.user_id() == Some(target.user_id) => return Err(e),
                Err(e) => match self.config.scoring_policy {
                    ScoringPolicy::Strict => return Err(e),
                    ScoringPolicy::SkipInvalidCandidates => {
                        tracing::warn!(
                            candidate_user_id = %candidate.user_id,
                            error = %e,
                            "Excluding candidate from ranking"
                        );
                    }
                },
            }
        }

        scores.sort_by(compare_scores);

        if let Some(limit) = limit {
            scores.truncate(limit);
        }

        tracing::debug!(
            user_id = %target.user_id,
            pool = candidates.len(),
            ranked = scores.len(),
            "Candidates ranked"
        );

        Ok(scores)
    }

    /// Review texts whose polarity the ranking will need
    ///
    /// Only complete opinions on shared items are included, so a pre-pass
    /// over this list resolves exactly what `rank` looks up.
    pub fn review_texts(&self, target: &UserProfile, candidates: &[UserProfile]) -> Vec<String> {
        let mut texts = Vec::new();

        for candidate in candidates {
            if candidate.user_id == target.user_id {
                continue;
            }

            for item_id in self.shared_items(target, candidate) {
                let pair = (target.item(&item_id), candidate.item(&item_id));
                if let (Some(t), Some(c)) = pair {
                    if t.is_complete() && c.is_complete() {
                        texts.extend(t.review_text().map(str::to_string));
                        texts.extend(c.review_text().map(str::to_string));
                    }
                }
            }
        }

        texts.sort();
        texts.dedup();
        texts
    }
}

/// Items present on both lists, after `filter`, sorted by id
pub fn shared_items(
    target: &UserProfile,
    candidate: &UserProfile,
    filter: SharedItemFilter,
) -> Vec<ItemId> {
    let candidate_items = index_items(candidate);

    let mut shared: Vec<ItemId> = target
        .reading_list
        .iter()
        .filter(|t| {
            candidate_items
                .get(&t.item_id)
                .is_some_and(|c| filter.admits(t, c))
        })
        .map(|t| t.item_id.clone())
        .collect();

    shared.sort();
    shared.dedup();
    shared
}

/// Checks ratings against the declared domain and rejects duplicate items
pub fn validate_profile(profile: &UserProfile) -> Result<(), ScoringError> {
    if let Some(item) = profile.reading_list.iter().find(|i| !i.has_valid_rating()) {
        return Err(ScoringError::InvalidInput {
            user_id: profile.user_id,
            item_id: item.item_id.clone(),
            reason: format!(
                "rating {} outside {}..={}",
                item.rating.unwrap_or_default(),
                RATING_MIN,
                RATING_MAX
            ),
        });
    }

    if let Some(item_id) = profile.duplicate_item() {
        return Err(ScoringError::InvalidInput {
            user_id: profile.user_id,
            item_id: item_id.clone(),
            reason: "item listed more than once".to_string(),
        });
    }

    Ok(())
}

fn index_items(profile: &UserProfile) -> HashMap<&ItemId, &RatedItem> {
    profile
        .reading_list
        .iter()
        .map(|item| (&item.item_id, item))
        .collect()
}

fn compare_scores(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    a.aggregate_distance
        .total_cmp(&b.aggregate_distance)
        .then_with(|| a.candidate_user_id.cmp(&b.candidate_user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn scorer() -> AffinityScorer {
        AffinityScorer::new(ScorerConfig::default()).unwrap()
    }

    fn strict_scorer() -> AffinityScorer {
        AffinityScorer::new(ScorerConfig {
            scoring_policy: ScoringPolicy::Strict,
            ..ScorerConfig::default()
        })
        .unwrap()
    }

    fn polarities() -> PolarityTable {
        [
            ("loved it", 0.8),
            ("hated it", -0.8),
            ("it was fine", 0.1),
            ("a masterpiece", 1.0),
        ]
        .into_iter()
        .collect()
    }

    fn profile(user_id: i64, items: Vec<RatedItem>) -> UserProfile {
        UserProfile {
            user_id: UserId(user_id),
            reading_list: items,
        }
    }

    fn loved(item_id: &str) -> RatedItem {
        RatedItem::new(item_id, Some(5), Some("loved it"))
    }

    fn hated(item_id: &str) -> RatedItem {
        RatedItem::new(item_id, Some(1), Some("hated it"))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        for rating_scale in [0.0, -0.2, f64::NAN, f64::INFINITY] {
            let config = ScorerConfig {
                rating_scale,
                ..ScorerConfig::default()
            };
            assert!(matches!(
                AffinityScorer::new(config),
                Err(ScoringError::InvalidConfig(_))
            ));
        }

        let config = ScorerConfig {
            sentiment_shift: f64::NEG_INFINITY,
            ..ScorerConfig::default()
        };
        assert!(AffinityScorer::new(config).is_err());
    }

    #[test]
    fn test_quantify_scales_rating_and_shifts_polarity() {
        let vector = scorer().quantify(UserId(1), &loved("B1"), 0.8).unwrap();
        assert!((vector.rating_component - 1.0).abs() < 1e-12);
        assert!((vector.sentiment_component - 1.8).abs() < 1e-12);
    }

    #[test]
    fn test_quantify_hard_negative_polarity_is_not_degenerate() {
        let vector = scorer().quantify(UserId(1), &hated("B1"), -1.0).unwrap();
        assert_eq!(vector.sentiment_component, 0.0);
        assert!(vector.norm() > 0.0);
    }

    #[test]
    fn test_quantify_rejects_polarity_out_of_range() {
        let result = scorer().quantify(UserId(1), &loved("B1"), 1.5);
        assert!(matches!(result, Err(ScoringError::InvalidInput { .. })));
    }

    #[test]
    fn test_new_rejects_overflowing_constants() {
        for (rating_scale, sentiment_shift) in [(1e300, 1.0), (f64::MAX, 1.0), (0.2, 1e200)] {
            let config = ScorerConfig {
                rating_scale,
                sentiment_shift,
                ..ScorerConfig::default()
            };
            assert!(matches!(
                AffinityScorer::new(config),
                Err(ScoringError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_large_but_finite_scale_still_scores() {
        let scorer = AffinityScorer::new(ScorerConfig {
            rating_scale: 1e100,
            ..ScorerConfig::default()
        })
        .unwrap();

        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![profile(2, vec![loved("B1")]), profile(3, vec![hated("B1")])];
        let ranked = scorer
            .rank(&target, &candidates, &polarities(), None)
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].aggregate_distance, 0.0);
        assert!(ranked[1].aggregate_distance.is_finite());
    }

    #[test]
    fn test_target_side_error_is_returned_under_default_policy() {
        let table: PolarityTable = [("loved it", 1.5), ("fine", 0.2)].into_iter().collect();
        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![profile(2, vec![RatedItem::new("B1", Some(3), Some("fine"))])];

        let result = scorer().rank(&target, &candidates, &table, None);
        assert!(matches!(
            result,
            Err(ScoringError::InvalidInput { user_id: UserId(1), .. })
        ));
    }

    #[test]
    fn test_candidate_side_error_is_skipped_under_default_policy() {
        let table: PolarityTable = [("loved it", 0.8), ("off the scale", 2.0)]
            .into_iter()
            .collect();
        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![
            profile(2, vec![RatedItem::new("B1", Some(3), Some("off the scale"))]),
            profile(3, vec![loved("B1")]),
        ];

        let ranked = scorer().rank(&target, &candidates, &table, None).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate_user_id, UserId(3));
    }

    #[test]
    fn test_repeated_candidate_is_rejected() {
        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![profile(2, vec![loved("B1")]), profile(2, vec![hated("B1")])];

        for scorer in [scorer(), strict_scorer()] {
            let result = scorer.rank(&target, &candidates, &polarities(), None);
            assert_eq!(result, Err(ScoringError::DuplicateCandidate(UserId(2))));
        }
    }

    #[test]
    fn test_shared_items_symmetric() {
        let a = profile(1, vec![loved("B1"), loved("B2"), loved("B3")]);
        let b = profile(2, vec![hated("B3"), hated("B4"), hated("B1")]);

        let from_a = shared_items(&a, &b, SharedItemFilter::All);
        let from_b = shared_items(&b, &a, SharedItemFilter::All);

        assert_eq!(from_a, vec![ItemId::new("B1"), ItemId::new("B3")]);
        assert_eq!(from_a, from_b);
    }

    #[test]
    fn test_shared_items_to_be_read_filters() {
        let target = profile(1, vec![loved("B1").marked_to_be_read(), loved("B2")]);
        let candidate = profile(2, vec![loved("B1"), loved("B2").marked_to_be_read()]);

        assert_eq!(
            shared_items(&target, &candidate, SharedItemFilter::TargetToBeRead),
            vec![ItemId::new("B1")]
        );
        assert!(shared_items(&target, &candidate, SharedItemFilter::BothToBeRead).is_empty());
    }

    #[test]
    fn test_self_distance_is_zero() {
        let target = profile(
            1,
            vec![
                loved("B1"),
                hated("B2"),
                RatedItem::new("B3", Some(3), Some("it was fine")),
            ],
        );
        let twin = UserProfile {
            user_id: UserId(2),
            ..target.clone()
        };

        let score = scorer()
            .score_candidate(&target, &twin, &polarities())
            .unwrap()
            .unwrap();

        assert_eq!(score.aggregate_distance, 0.0);
        assert_eq!(score.shared_items, 3);
        assert_eq!(score.penalized_items, 0);
    }

    #[test]
    fn test_per_item_distance_bounded() {
        let scorer = scorer();
        let table: PolarityTable = [("neg", -1.0), ("mid", 0.0), ("pos", 1.0), ("mild", 0.3)]
            .into_iter()
            .collect();
        let texts = ["neg", "mid", "pos", "mild"];

        for rating_a in RATING_MIN..=RATING_MAX {
            for rating_b in RATING_MIN..=RATING_MAX {
                for text_a in texts {
                    for text_b in texts {
                        let target =
                            profile(1, vec![RatedItem::new("B1", Some(rating_a), Some(text_a))]);
                        let candidate =
                            profile(2, vec![RatedItem::new("B1", Some(rating_b), Some(text_b))]);

                        let score = scorer
                            .score_candidate(&target, &candidate, &table)
                            .unwrap()
                            .unwrap();
                        assert!((0.0..=PI).contains(&score.aggregate_distance));
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_pool_yields_empty_ranking() {
        let target = profile(1, vec![loved("B1")]);
        let ranked = scorer().rank(&target, &[], &polarities(), None).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_empty_target_yields_empty_ranking() {
        let target = profile(1, vec![]);
        let candidates = vec![profile(2, vec![loved("B1")])];
        let ranked = scorer()
            .rank(&target, &candidates, &polarities(), None)
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_concrete_scenario() {
        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![
            profile(3, vec![loved("B7")]),
            profile(2, vec![hated("B1")]),
            profile(4, vec![RatedItem::new("B1", None, Some(""))]),
            profile(5, vec![loved("B1")]),
        ];

        let ranked = scorer()
            .rank(&target, &candidates, &polarities(), None)
            .unwrap();

        let order: Vec<UserId> = ranked.iter().map(|s| s.candidate_user_id).collect();
        assert_eq!(order, vec![UserId(5), UserId(2), UserId(4)]);

        // identical opinion
        assert_eq!(ranked[0].aggregate_distance, 0.0);

        // (1.0, 1.8) against (0.2, 0.2)
        let expected = (0.56_f64 / (4.24_f64.sqrt() * 0.08_f64.sqrt())).acos();
        assert!((ranked[1].aggregate_distance - expected).abs() < 1e-9);
        assert!(ranked[1].aggregate_distance > 0.0);

        // incomplete opinion
        assert_eq!(ranked[2].aggregate_distance, INCOMPLETE_PENALTY);
        assert_eq!(ranked[2].penalized_items, 1);
    }

    #[test]
    fn test_unresolved_polarity_is_penalised() {
        let target = profile(1, vec![loved("B1")]);
        let candidate = profile(2, vec![RatedItem::new("B1", Some(4), Some("no idea"))]);

        let score = scorer()
            .score_candidate(&target, &candidate, &polarities())
            .unwrap()
            .unwrap();

        assert_eq!(score.aggregate_distance, INCOMPLETE_PENALTY);
        assert_eq!(score.penalized_items, 1);
    }

    #[test]
    fn test_distances_sum_across_shared_items() {
        let target = profile(1, vec![loved("B1"), loved("B2"), loved("B3")]);
        let candidate = profile(
            2,
            vec![
                RatedItem::new("B1", None, None),
                RatedItem::new("B2", Some(3), None),
                loved("B3"),
            ],
        );

        let score = scorer()
            .score_candidate(&target, &candidate, &polarities())
            .unwrap()
            .unwrap();

        assert_eq!(score.shared_items, 3);
        assert_eq!(score.penalized_items, 2);
        assert_eq!(score.aggregate_distance, 2.0 * INCOMPLETE_PENALTY);
    }

    #[test]
    fn test_ties_broken_by_candidate_id_and_deterministic() {
        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![
            profile(9, vec![hated("B1")]),
            profile(3, vec![hated("B1")]),
            profile(6, vec![hated("B1")]),
        ];

        let scorer = scorer();
        let first = scorer
            .rank(&target, &candidates, &polarities(), None)
            .unwrap();
        let second = scorer
            .rank(&target, &candidates, &polarities(), None)
            .unwrap();

        let order: Vec<UserId> = first.iter().map(|s| s.candidate_user_id).collect();
        assert_eq!(order, vec![UserId(3), UserId(6), UserId(9)]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let target = profile(1, vec![loved("B1")]);
        let candidates: Vec<UserProfile> = (2..20).map(|id| profile(id, vec![loved("B1")])).collect();

        let ranked = scorer()
            .rank(&target, &candidates, &polarities(), Some(10))
            .unwrap();

        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].candidate_user_id, UserId(2));
    }

    #[test]
    fn test_target_never_matches_itself() {
        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![target.clone(), profile(2, vec![loved("B1")])];

        let ranked = scorer()
            .rank(&target, &candidates, &polarities(), None)
            .unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate_user_id, UserId(2));
    }

    #[test]
    fn test_invalid_target_rating_is_rejected() {
        let target = profile(1, vec![RatedItem::new("B1", Some(7), Some("loved it"))]);
        let candidates = vec![profile(2, vec![loved("B1")])];

        let result = scorer().rank(&target, &candidates, &polarities(), None);
        assert!(matches!(
            result,
            Err(ScoringError::InvalidInput { user_id: UserId(1), .. })
        ));
    }

    #[test]
    fn test_duplicate_target_items_are_rejected() {
        let target = profile(1, vec![loved("B1"), hated("B1")]);
        let result = scorer().rank(&target, &[], &polarities(), None);
        assert!(matches!(result, Err(ScoringError::InvalidInput { .. })));
    }

    #[test]
    fn test_strict_policy_surfaces_invalid_candidate() {
        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![
            profile(2, vec![loved("B1")]),
            profile(3, vec![RatedItem::new("B1", Some(0), Some("loved it"))]),
        ];

        let result = strict_scorer().rank(&target, &candidates, &polarities(), None);
        match result {
            Err(ScoringError::InvalidInput { user_id, item_id, .. }) => {
                assert_eq!(user_id, UserId(3));
                assert_eq!(item_id, ItemId::new("B1"));
            }
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_default_policy_skips_invalid_candidate() {
        let target = profile(1, vec![loved("B1")]);
        let candidates = vec![
            profile(2, vec![loved("B1")]),
            profile(3, vec![RatedItem::new("B1", Some(0), Some("loved it"))]),
        ];

        let ranked = scorer()
            .rank(&target, &candidates, &polarities(), None)
            .unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate_user_id, UserId(2));
    }

    #[test]
    fn test_review_texts_cover_only_complete_shared_opinions() {
        let target = profile(
            1,
            vec![loved("B1"), RatedItem::new("B2", Some(3), Some("it was fine")), loved("B5")],
        );
        let candidates = vec![
            profile(2, vec![hated("B1"), RatedItem::new("B2", None, Some("a masterpiece"))]),
            profile(3, vec![RatedItem::new("B9", Some(2), Some("unshared"))]),
        ];

        let texts = scorer().review_texts(&target, &candidates);
        assert_eq!(texts, vec!["hated it".to_string(), "loved it".to_string()]);
    }
}
