// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Saved gift registry.
//!
//! A saved gift's id is `<batch-local suggestion id>-<epoch ms>`. The numeric
//! prefix is how a suggestion in the current batch is recognised as already
//! saved: the registry keeps the set of prefixes of every saved id and
//! refuses to save a suggestion whose id is in that set.
//!
//! Batch-local ids repeat across generations, so a saved `3` also marks the
//! `3` of any later batch as saved until the gift is removed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Budget, GiftSuggestion, SavedGift};
use crate::pricing::{reconcile_price_label, PRICE_PLACEHOLDER};
use crate::storage::{PersistedStore, StorageKey};

/// Ordering of the saved-gift list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GiftSort {
    /// Most recently saved first.
    #[default]
    Date,
    Name,
    Price,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredGift {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    reason: String,
    recipient_name: String,
    saved_at: String,
}

impl StoredGift {
    fn into_saved(self) -> Option<SavedGift> {
        let saved_at = DateTime::parse_from_rfc3339(&self.saved_at)
            .ok()?
            .with_timezone(&Utc);
        let price = self
            .price
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string());
        Some(SavedGift {
            id: self.id,
            name: self.name,
            description: self.description,
            price,
            category: self.category,
            reason: self.reason,
            recipient_name: self.recipient_name,
            saved_at,
        })
    }
}

/// Registry of gifts the user explicitly kept.
#[derive(Debug)]
pub struct SavedGiftRegistry {
    store: PersistedStore,
    gifts: Vec<SavedGift>,
    original_ids: HashSet<u32>,
}

impl SavedGiftRegistry {
    /// Load the registry, dropping entries that fail to decode.
    pub fn load(store: PersistedStore) -> Self {
        let gifts = store
            .get::<Vec<Value>>(StorageKey::SavedGifts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| {
                let decoded = serde_json::from_value::<StoredGift>(entry)
                    .ok()
                    .and_then(StoredGift::into_saved);
                if decoded.is_none() {
                    tracing::warn!("Dropping corrupt saved gift entry");
                }
                decoded
            })
            .collect();

        let mut registry = Self {
            store,
            gifts,
            original_ids: HashSet::new(),
        };
        registry.refresh_original_ids();
        registry
    }

    pub fn all(&self) -> &[SavedGift] {
        &self.gifts
    }

    pub fn len(&self) -> usize {
        self.gifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gifts.is_empty()
    }

    /// Batch-local ids recovered from every saved gift.
    pub fn saved_original_ids(&self) -> &HashSet<u32> {
        &self.original_ids
    }

    pub fn is_saved(&self, suggestion_id: u32) -> bool {
        self.original_ids.contains(&suggestion_id)
    }

    /// Keep a suggestion for `recipient_name`.
    ///
    /// Returns `None` without touching storage when the suggestion's id is
    /// already saved. Ids are batch-local, so a later batch reusing a saved
    /// id is treated as saved too.
    pub fn save(
        &mut self,
        suggestion: &GiftSuggestion,
        recipient_name: &str,
        budget: Option<Budget>,
    ) -> Option<&SavedGift> {
        if self.is_saved(suggestion.id) {
            tracing::debug!(suggestion_id = suggestion.id, "Suggestion already saved");
            return None;
        }

        let now = Utc::now();
        self.gifts.push(SavedGift {
            id: format!("{}-{}", suggestion.id, now.timestamp_millis()),
            name: suggestion.name.clone(),
            description: suggestion.description.clone(),
            price: reconcile_price_label(&suggestion.price, budget),
            category: suggestion.category.clone(),
            reason: suggestion.reason.clone(),
            recipient_name: recipient_name.to_string(),
            saved_at: now,
        });
        self.refresh_original_ids();
        self.persist();
        self.gifts.last()
    }

    /// Delete the gift with exactly this composite id.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.gifts.len();
        self.gifts.retain(|g| g.id != id);
        if self.gifts.len() == before {
            return false;
        }
        self.refresh_original_ids();
        self.persist();
        true
    }

    /// Gifts saved under exactly this recipient name.
    pub fn for_recipient<'a>(&'a self, recipient_name: &'a str) -> impl Iterator<Item = &'a SavedGift> {
        self.gifts
            .iter()
            .filter(move |g| g.recipient_name == recipient_name)
    }

    /// Names to keep out of the next prompt for this recipient.
    pub fn names_for_recipient(&self, recipient_name: &str) -> Vec<String> {
        self.for_recipient(recipient_name)
            .map(|g| g.name.clone())
            .collect()
    }

    /// Distinct categories, first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for gift in &self.gifts {
            if !seen.contains(&gift.category.as_str()) {
                seen.push(&gift.category);
            }
        }
        seen
    }

    /// Saved gifts restricted to one category (all when `None`) and sorted.
    pub fn view(&self, category: Option<&str>, sort: GiftSort) -> Vec<&SavedGift> {
        let mut gifts: Vec<&SavedGift> = self
            .gifts
            .iter()
            .filter(|g| category.is_none_or(|c| g.category == c))
            .collect();
        match sort {
            GiftSort::Date => gifts.sort_by(|a, b| b.saved_at.cmp(&a.saved_at)),
            GiftSort::Name => gifts.sort_by_key(|g| g.name.to_lowercase()),
            GiftSort::Price => gifts.sort_by_key(|g| g.price.to_lowercase()),
        }
        gifts
    }

    fn refresh_original_ids(&mut self) {
        self.original_ids = self.gifts.iter().filter_map(SavedGift::original_id).collect();
    }

    fn persist(&self) {
        if self.gifts.is_empty() {
            self.store.remove(StorageKey::SavedGifts);
        } else {
            self.store.set(StorageKey::SavedGifts, &self.gifts);
        }
    }
}
