use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{ItemId, RatedItem, UserId};

/// A reader together with every item on their lists
///
/// Owned by the caller; scoring only ever borrows it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    #[serde(default)]
    pub reading_list: Vec<RatedItem>,
}

impl UserProfile {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            reading_list: Vec::new(),
        }
    }

    /// Builder-style helper used when assembling profiles
    pub fn with_item(mut self, item: RatedItem) -> Self {
        self.reading_list.push(item);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.reading_list.is_empty()
    }

    /// Looks up the reader's record for an item
    pub fn item(&self, item_id: &ItemId) -> Option<&RatedItem> {
        self.reading_list.iter().find(|i| &i.item_id == item_id)
    }

    pub fn item_ids(&self) -> HashSet<&ItemId> {
        self.reading_list.iter().map(|i| &i.item_id).collect()
    }

    /// Returns the first item id that appears more than once
    pub fn duplicate_item(&self) -> Option<&ItemId> {
        let mut seen = HashSet::new();
        self.reading_list
            .iter()
            .map(|i| &i.item_id)
            .find(|id| !seen.insert(*id))
    }

    /// Inserts or replaces the record for `item.item_id`
    pub fn upsert(&mut self, item: RatedItem) {
        match self
            .reading_list
            .iter_mut()
            .find(|existing| existing.item_id == item.item_id)
        {
            Some(existing) => *existing = item,
            None => self.reading_list.push(item),
        }
    }

    /// Removes the record for an item, reporting whether one existed
    pub fn remove(&mut self, item_id: &ItemId) -> bool {
        let before = self.reading_list.len();
        self.reading_list.retain(|i| &i.item_id != item_id);
        self.reading_list.len() != before
    }
}
