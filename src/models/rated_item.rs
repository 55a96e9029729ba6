use serde::{Deserialize, Serialize};

use super::ItemId;

/// Lowest rating a reader can give
pub const RATING_MIN: i32 = 1;
/// Highest rating a reader can give
pub const RATING_MAX: i32 = 5;

/// One reader's opinion of one catalogue item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatedItem {
    pub item_id: ItemId,
    /// Star rating, `None` until the reader rates the item
    #[serde(default)]
    pub rating: Option<i32>,
    /// Free-text review, `None` or blank until the reader writes one
    #[serde(default)]
    pub review: Option<String>,
    /// Whether the item sits on the reader's to-be-read shelf
    #[serde(default)]
    pub to_be_read: bool,
}

impl RatedItem {
    pub fn new(item_id: impl Into<ItemId>, rating: Option<i32>, review: Option<&str>) -> Self {
        Self {
            item_id: item_id.into(),
            rating,
            review: review.map(str::to_string),
            to_be_read: false,
        }
    }

    /// Marks the item as to-be-read
    pub fn marked_to_be_read(mut self) -> Self {
        self.to_be_read = true;
        self
    }

    /// Checks the rating against the declared domain (unset is allowed)
    pub fn has_valid_rating(&self) -> bool {
        self.rating
            .map_or(true, |r| (RATING_MIN..=RATING_MAX).contains(&r))
    }

    /// Trimmed review text, or `None` when missing or blank
    pub fn review_text(&self) -> Option<&str> {
        self.review
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// An item is complete once it carries both a rating and a non-blank review
    pub fn is_complete(&self) -> bool {
        self.rating.is_some() && self.review_text().is_some()
    }
}
