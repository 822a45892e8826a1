// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipient profile registry.
//!
//! Profiles are deduplicated by [`RecipientProfile::signature`]: saving a
//! profile whose signature is already known refreshes that entry instead of
//! adding a second one. The whole collection lives under a single storage
//! key and is rewritten after every mutation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{RecipientProfile, Relationship, SavedRecipient};
use crate::storage::{PersistedStore, StorageKey};

/// Stored shape with a not-yet-validated timestamp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecipient {
    id: String,
    #[serde(flatten)]
    profile: RecipientProfile,
    saved_at: String,
}

impl StoredRecipient {
    fn into_saved(self) -> Option<SavedRecipient> {
        let saved_at = DateTime::parse_from_rfc3339(&self.saved_at)
            .ok()?
            .with_timezone(&Utc);
        Some(SavedRecipient {
            id: self.id,
            profile: self.profile,
            saved_at,
        })
    }
}

/// Registry of recipients the user has generated gifts for.
#[derive(Debug)]
pub struct RecipientRegistry {
    store: PersistedStore,
    recipients: Vec<SavedRecipient>,
}

impl RecipientRegistry {
    /// Load the registry, dropping entries that fail to decode.
    pub fn load(store: PersistedStore) -> Self {
        let recipients = store
            .get::<Vec<Value>>(StorageKey::SavedRecipients)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| {
                let decoded = serde_json::from_value::<StoredRecipient>(entry)
                    .ok()
                    .and_then(StoredRecipient::into_saved);
                if decoded.is_none() {
                    tracing::warn!("Dropping corrupt saved recipient entry");
                }
                decoded
            })
            .collect();

        Self { store, recipients }
    }

    pub fn all(&self) -> &[SavedRecipient] {
        &self.recipients
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SavedRecipient> {
        self.recipients.iter().find(|r| r.id == id)
    }

    /// Insert a new recipient or refresh the one with the same signature.
    pub fn upsert(&mut self, profile: RecipientProfile) -> &SavedRecipient {
        let now = Utc::now();
        let index = match self.position_by_signature(&profile) {
            Some(index) => {
                let existing = &mut self.recipients[index];
                existing.profile = profile;
                existing.saved_at = now;
                tracing::debug!(id = %existing.id, "Refreshed saved recipient");
                index
            }
            None => {
                let id = self.mint_id(&profile.name, now);
                tracing::debug!(id = %id, "Saved new recipient");
                self.recipients.push(SavedRecipient {
                    id,
                    profile,
                    saved_at: now,
                });
                self.recipients.len() - 1
            }
        };

        self.persist();
        &self.recipients[index]
    }

    /// Delete by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.recipients.len();
        self.recipients.retain(|r| r.id != id);
        let removed = self.recipients.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Recipients matching `term` (name, occasion or any interest,
    /// case-insensitive) and optionally one relationship, newest first.
    pub fn search(&self, term: &str, relationship: Option<Relationship>) -> Vec<&SavedRecipient> {
        let term = term.trim().to_lowercase();
        let mut matches: Vec<&SavedRecipient> = self
            .recipients
            .iter()
            .filter(|r| relationship.is_none_or(|rel| r.profile.relationship == rel))
            .filter(|r| {
                term.is_empty()
                    || r.profile.name.to_lowercase().contains(&term)
                    || r.profile.occasion.as_str().contains(&term)
                    || r.profile
                        .interests
                        .iter()
                        .any(|i| i.to_lowercase().contains(&term))
            })
            .collect();
        matches.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        matches
    }

    /// Distinct relationships among saved recipients, first-seen order.
    pub fn relationships(&self) -> Vec<Relationship> {
        let mut seen = Vec::new();
        for recipient in &self.recipients {
            if !seen.contains(&recipient.profile.relationship) {
                seen.push(recipient.profile.relationship);
            }
        }
        seen
    }

    fn position_by_signature(&self, profile: &RecipientProfile) -> Option<usize> {
        let signature = profile.signature();
        self.recipients
            .iter()
            .position(|r| r.profile.signature() == signature)
    }

    fn mint_id(&self, name: &str, now: DateTime<Utc>) -> String {
        let slug = slugify(name);
        let mut millis = now.timestamp_millis();
        loop {
            let id = format!("{slug}-{millis}");
            if self.get(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }

    fn persist(&self) {
        if self.recipients.is_empty() {
            self.store.remove(StorageKey::SavedRecipients);
        } else {
            self.store.set(StorageKey::SavedRecipients, &self.recipients);
        }
    }
}

/// Lowercase ASCII slug; `"recipient"` when nothing usable remains.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "recipient".to_string()
    } else {
        slug.to_string()
    }
}
