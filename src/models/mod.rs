use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod message_session;
pub mod profile;
pub mod rated_item;

pub use message_session::MessageSession;
pub use profile::UserProfile;
pub use rated_item::{RatedItem, RATING_MAX, RATING_MIN};

/// Identifier of a registered reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a catalogue item (a book)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Two-dimensional encoding of one opinion: (scaled rating, shifted polarity)
///
/// Only lives for the duration of a scoring call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffinityVector {
    pub rating_component: f64,
    pub sentiment_component: f64,
}

impl AffinityVector {
    pub fn new(rating_component: f64, sentiment_component: f64) -> Self {
        Self {
            rating_component,
            sentiment_component,
        }
    }

    pub fn dot(&self, other: &AffinityVector) -> f64 {
        self.rating_component * other.rating_component
            + self.sentiment_component * other.sentiment_component
    }

    /// Euclidean length
    pub fn norm(&self) -> f64 {
        self.rating_component.hypot(self.sentiment_component)
    }

    /// Angle between the two vectors in radians, within [0, π]
    ///
    /// Equal to `acos(dot / (|a| * |b|))`. Computed as `atan2(|cross|, dot)`
    /// so parallel vectors yield exactly 0 instead of a rounding residue.
    pub fn angle_to(&self, other: &AffinityVector) -> f64 {
        let cross = self.rating_component * other.sentiment_component
            - self.sentiment_component * other.rating_component;
        cross.abs().atan2(self.dot(other))
    }
}

/// One ranked match for the requesting user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateScore {
    pub candidate_user_id: UserId,
    /// Sum of per-item angular distances and penalties; lower is closer
    pub aggregate_distance: f64,
    /// Number of items both users have on their lists
    pub shared_items: usize,
    /// Shared items that fell back to the fixed penalty
    pub penalized_items: usize,
}

/// Body of a stateless match request
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub target: UserProfile,
    #[serde(default)]
    pub candidates: Vec<UserProfile>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub user_id: UserId,
    pub matches: Vec<CandidateScore>,
}
